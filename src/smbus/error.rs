// Licensed under the Apache-2.0 license

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource, SevenBitAddress};

/// Why a transfer did not complete.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferError {
    /// The target NACKed its address or a data byte and ack-polling was off.
    Nacked,
    /// Ack-polling gave up before the target answered.
    AckPollExhausted,
    /// Arbitration was lost and no retry was left, or was lost on a master phase.
    ArbitrationLost,
    /// The peripheral reported a status the current role cannot produce.
    ProtocolDesync { status: u8 },
    /// SCL was held low past the configured timeout.
    Timeout,
    /// The request was rejected before any bus traffic.
    InvalidRequest,
    /// The outcome was evicted before it was collected.
    OutcomeLost,
}

impl embedded_hal::i2c::Error for TransferError {
    fn kind(&self) -> ErrorKind {
        match self {
            TransferError::Nacked => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            TransferError::AckPollExhausted => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
            }
            TransferError::ArbitrationLost => ErrorKind::ArbitrationLoss,
            TransferError::ProtocolDesync { .. } => ErrorKind::Bus,
            TransferError::Timeout | TransferError::InvalidRequest | TransferError::OutcomeLost => {
                ErrorKind::Other
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    InvalidOwnAddress(SevenBitAddress),
    ZeroTimeout,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusRecoveryError {
    /// A pin operation failed.
    Pin,
    /// SDA stayed low after every allowed clock pulse.
    StillHung { pulses: u32 },
}
