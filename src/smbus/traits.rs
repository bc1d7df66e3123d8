// Licensed under the Apache-2.0 license

//! # SMBus Hardware Abstraction Traits
//!
//! The engine drives the peripheral only through these traits, so the same
//! state machine runs against the real SMBus0 registers or a simulated bus.
//!
//! ```text
//! SmbusPeripheral (SMB0CN / SMB0DAT / SMB0CF)
//! SclLowTimer     (Timer3 configured for SCL-low detection)
//!     └── SmbusHardware (blanket composite)
//! BlockingSmbus   (caller-facing blocking write/read with sub-address)
//! ```

use crate::smbus::error::TransferError;
use embedded_hal::i2c::SevenBitAddress;
use fugit::MillisDurationU32;

/// Register-level view of the SMBus peripheral.
///
/// Request bits (`STA`, `STO`, `ACK`) are latched by the hardware and acted on
/// once the pending interrupt is cleared with [`clear_interrupt`](Self::clear_interrupt).
pub trait SmbusPeripheral {
    /// Raw status vector: the upper nibble of the control register shifted
    /// down, `0..=0xF`.
    fn status_vector(&self) -> u8;

    /// `SI`: a bus phase completed and is waiting to be serviced.
    fn interrupt_pending(&self) -> bool;

    /// Clear `SI`, releasing SCL so the latched request bits take effect.
    fn clear_interrupt(&mut self);

    /// `ACK` as reported by the last byte transmitted.
    fn ack_received(&self) -> bool;

    /// `ARBLOST` for the current phase.
    fn arbitration_lost(&self) -> bool;

    fn read_data(&self) -> u8;

    fn write_data(&mut self, byte: u8);

    /// Set or clear `STA`. The hardware never clears it on its own.
    fn request_start(&mut self, start: bool);

    /// Set or clear `STO`.
    fn request_stop(&mut self, stop: bool);

    /// ACK (`true`) or NACK (`false`) to drive on the next acknowledge slot.
    fn set_ack(&mut self, ack: bool);

    /// `ENSMB`. Toggling it off and on returns the peripheral to idle.
    fn set_enabled(&mut self, enabled: bool);

    /// Enable or inhibit slave address recognition (`INH` inverted).
    fn enable_slave(&mut self, enabled: bool);
}

/// Timer dedicated to detecting SCL held low.
pub trait SclLowTimer {
    /// Program the period after which a continuously low SCL raises the flag.
    fn configure(&mut self, timeout: MillisDurationU32);

    /// Whether the timeout flag is raised.
    fn timeout_pending(&mut self) -> bool;

    fn clear_timeout(&mut self);
}

/// Everything the controller needs from the hardware.
pub trait SmbusHardware: SmbusPeripheral + SclLowTimer {}

impl<T> SmbusHardware for T where T: SmbusPeripheral + SclLowTimer {}

/// Blocking transfers addressed with an optional one-byte sub-address.
///
/// This is the calling convention of the serial EEPROM examples; both the
/// owned controller and the interrupt-shared wrapper provide it.
pub trait BlockingSmbus {
    /// Write `data` to `target`, preceded by `sub_address` when present.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`TransferError`] of the transfer.
    fn write(
        &mut self,
        target: SevenBitAddress,
        sub_address: Option<u8>,
        data: &[u8],
    ) -> Result<(), TransferError>;

    /// Fill `buffer` from `target`. With a sub-address this is a random read.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`TransferError`] of the transfer. The buffer is
    /// left untouched on failure.
    fn read(
        &mut self,
        target: SevenBitAddress,
        sub_address: Option<u8>,
        buffer: &mut [u8],
    ) -> Result<(), TransferError>;
}

impl<T: BlockingSmbus + ?Sized> BlockingSmbus for &mut T {
    fn write(
        &mut self,
        target: SevenBitAddress,
        sub_address: Option<u8>,
        data: &[u8],
    ) -> Result<(), TransferError> {
        (**self).write(target, sub_address, data)
    }

    fn read(
        &mut self,
        target: SevenBitAddress,
        sub_address: Option<u8>,
        buffer: &mut [u8],
    ) -> Result<(), TransferError> {
        (**self).read(target, sub_address, buffer)
    }
}
