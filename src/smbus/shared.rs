// Licensed under the Apache-2.0 license

//! Interrupt-shared controller.
//!
//! Firmware keeps the controller in a `static SharedSmbus` so the SMBus and
//! Timer3 interrupt handlers can reach it. Foreground calls take the critical
//! section once per poll, never across a whole transfer.
//!
//! ```rust,ignore
//! static BUS: SharedSmbus<Smbus0> = SharedSmbus::new();
//!
//! fn main() {
//!     BUS.install(SmbusController::new(Smbus0::take(), config));
//!     let mut eeprom = Eeprom24x::new(&BUS);
//!     eeprom.byte_write(0x25, 0xAA)?;
//! }
//!
//! #[interrupt]
//! fn SMBUS0() {
//!     BUS.on_interrupt();
//! }
//! ```

use crate::common::{Logger, NoOpLogger};
use crate::smbus::controller::SmbusController;
use crate::smbus::error::TransferError;
use crate::smbus::request::TransferId;
use crate::smbus::traits::{BlockingSmbus, SmbusHardware};
use core::cell::RefCell;
use critical_section::Mutex;
use embedded_hal::i2c::SevenBitAddress;

pub struct SharedSmbus<H: SmbusHardware, L: Logger = NoOpLogger> {
    inner: Mutex<RefCell<Option<SmbusController<H, L>>>>,
}

impl<H: SmbusHardware, L: Logger> Default for SharedSmbus<H, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: SmbusHardware, L: Logger> SharedSmbus<H, L> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    pub fn install(&self, controller: SmbusController<H, L>) {
        critical_section::with(|cs| {
            self.inner.borrow(cs).replace(Some(controller));
        });
    }

    pub fn take(&self) -> Option<SmbusController<H, L>> {
        critical_section::with(|cs| self.inner.borrow(cs).take())
    }

    /// Run `f` on the controller inside a critical section.
    ///
    /// Returns `None` if no controller is installed.
    pub fn with<R>(&self, f: impl FnOnce(&mut SmbusController<H, L>) -> R) -> Option<R> {
        critical_section::with(|cs| self.inner.borrow(cs).borrow_mut().as_mut().map(f))
    }

    /// Entry point for both the SMBus and the timer interrupt.
    pub fn on_interrupt(&self) {
        self.with(SmbusController::service);
    }

    /// # Errors
    ///
    /// Returns [`TransferError::InvalidRequest`] if no controller is installed,
    /// or the terminal error of the transfer.
    pub fn write(
        &self,
        target: SevenBitAddress,
        sub_address: Option<u8>,
        data: &[u8],
    ) -> Result<(), TransferError> {
        let id = nb::block!(self
            .with(|bus| bus.begin_write(target, sub_address, data))
            .unwrap_or(Err(nb::Error::Other(TransferError::InvalidRequest))))?;
        nb::block!(self.poll(id, &mut []))?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`TransferError::InvalidRequest`] if no controller is installed,
    /// or the terminal error of the transfer.
    pub fn read(
        &self,
        target: SevenBitAddress,
        sub_address: Option<u8>,
        buffer: &mut [u8],
    ) -> Result<(), TransferError> {
        let count = buffer.len();
        let id = nb::block!(self
            .with(|bus| bus.begin_read(target, sub_address, count))
            .unwrap_or(Err(nb::Error::Other(TransferError::InvalidRequest))))?;
        nb::block!(self.poll(id, buffer))?;
        Ok(())
    }

    fn poll(&self, id: TransferId, buffer: &mut [u8]) -> nb::Result<usize, TransferError> {
        self.with(|bus| bus.poll(id, buffer))
            .unwrap_or(Err(nb::Error::Other(TransferError::OutcomeLost)))
    }
}

impl<H: SmbusHardware, L: Logger> BlockingSmbus for &SharedSmbus<H, L> {
    fn write(
        &mut self,
        target: SevenBitAddress,
        sub_address: Option<u8>,
        data: &[u8],
    ) -> Result<(), TransferError> {
        SharedSmbus::write(*self, target, sub_address, data)
    }

    fn read(
        &mut self,
        target: SevenBitAddress,
        sub_address: Option<u8>,
        buffer: &mut [u8],
    ) -> Result<(), TransferError> {
        SharedSmbus::read(*self, target, sub_address, buffer)
    }
}
