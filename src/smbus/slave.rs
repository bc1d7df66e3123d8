// Licensed under the Apache-2.0 license

//! Slave role of a multimaster node.
//!
//! Bytes written to the own address land in a receive buffer and raise
//! `data_ready`. A master reading the own address is served from a response
//! set by the application; each ACK from the master advances to the next byte.

use crate::common::Logger;
use crate::smbus::common::{SlaveEvent, SlaveStatus, SLAVE_BUF_SIZE};
use crate::smbus::controller::SmbusController;
use crate::smbus::error::TransferError;
use crate::smbus::traits::SmbusHardware;
use embedded_hal::i2c::SevenBitAddress;
use heapless::Vec;

/// Sent once the response is exhausted; what a released SDA reads as.
const IDLE_BYTE: u8 = 0xFF;

#[derive(Clone, Debug, Default)]
pub struct SlaveMailbox {
    rx: Vec<u8, SLAVE_BUF_SIZE>,
    data_ready: bool,
    tx: Vec<u8, SLAVE_BUF_SIZE>,
    tx_pos: usize,
    last_event: Option<SlaveEvent>,
}

impl SlaveMailbox {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rx: Vec::new(),
            data_ready: false,
            tx: Vec::new(),
            tx_pos: 0,
            last_event: None,
        }
    }

    /// Store a received byte. Returns whether to ACK it.
    pub fn receive(&mut self, byte: u8) -> bool {
        self.last_event = Some(SlaveEvent::ByteReceived);
        if self.rx.push(byte).is_ok() {
            self.data_ready = true;
            true
        } else {
            false
        }
    }

    /// First byte of the response for a new master read.
    pub fn begin_response(&mut self) -> u8 {
        self.tx_pos = 0;
        self.next_response_byte()
    }

    pub fn next_response_byte(&mut self) -> u8 {
        match self.tx.get(self.tx_pos) {
            Some(&byte) => {
                self.tx_pos += 1;
                byte
            }
            None => IDLE_BYTE,
        }
    }

    pub fn note(&mut self, event: SlaveEvent) {
        self.last_event = Some(event);
    }

    #[must_use]
    pub fn data_ready(&self) -> bool {
        self.data_ready
    }

    /// Move received bytes into `buffer` and clear `data_ready`.
    ///
    /// Bytes that do not fit in `buffer` are discarded.
    pub fn take(&mut self, buffer: &mut [u8]) -> usize {
        let count = self.rx.len().min(buffer.len());
        if let (Some(dst), Some(src)) = (buffer.get_mut(..count), self.rx.get(..count)) {
            dst.copy_from_slice(src);
        }
        self.rx.clear();
        self.data_ready = false;
        count
    }

    /// Replace the response served to master reads.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidRequest`] if `response` exceeds the
    /// slave buffer size.
    pub fn set_response(&mut self, response: &[u8]) -> Result<(), TransferError> {
        self.tx = Vec::from_slice(response).map_err(|()| TransferError::InvalidRequest)?;
        self.tx_pos = 0;
        Ok(())
    }

    #[must_use]
    pub fn status(&self, enabled: bool, address: Option<SevenBitAddress>) -> SlaveStatus {
        SlaveStatus {
            enabled,
            address,
            data_ready: self.data_ready,
            rx_buffer_count: self.rx.len(),
            tx_buffer_count: self.tx.len().saturating_sub(self.tx_pos),
            last_event: self.last_event,
        }
    }
}

impl<H: SmbusHardware, L: Logger> SmbusController<H, L> {
    /// Whether a master wrote to the own address since the last
    /// [`take_slave_data`](Self::take_slave_data).
    pub fn data_ready(&self) -> bool {
        self.slave.data_ready()
    }

    pub fn take_slave_data(&mut self, buffer: &mut [u8]) -> usize {
        self.slave.take(buffer)
    }

    /// # Errors
    ///
    /// Returns [`TransferError::InvalidRequest`] if `response` is too long.
    pub fn set_slave_response(&mut self, response: &[u8]) -> Result<(), TransferError> {
        self.slave.set_response(response)
    }
}
