// Licensed under the Apache-2.0 license

//! SCL-low timeout watchdog.
//!
//! A slave holding SCL low past the configured period (25 ms by default, the
//! SMBus limit) raises the timer flag. The handler forces the peripheral back
//! to idle so the next transfer can claim the bus.

use crate::common::Logger;
use crate::smbus::controller::SmbusController;
use crate::smbus::error::{ConfigurationError, TransferError};
use crate::smbus::traits::SmbusHardware;
use fugit::MillisDurationU32;

impl<H: SmbusHardware, L: Logger> SmbusController<H, L> {
    pub(crate) fn arm_watchdog(&mut self) {
        self.hardware.configure(self.config.scl_low_timeout);
    }

    /// Change the SCL-low period at run time.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ZeroTimeout`] for a zero period; the
    /// running period is kept.
    pub fn set_scl_low_timeout(
        &mut self,
        timeout: MillisDurationU32,
    ) -> Result<(), ConfigurationError> {
        if timeout.ticks() == 0 {
            return Err(ConfigurationError::ZeroTimeout);
        }
        self.config.scl_low_timeout = timeout;
        self.arm_watchdog();
        Ok(())
    }

    /// SCL-low timer interrupt handler.
    ///
    /// Toggles the peripheral enable, clears the timer flag and `STA`, and
    /// releases ownership. A transfer in flight fails with
    /// [`TransferError::Timeout`].
    pub fn on_timeout_interrupt(&mut self) {
        self.hardware.set_enabled(false);
        self.hardware.set_enabled(true);
        self.hardware.clear_timeout();
        self.hardware.request_start(false);
        self.fsm.reset();

        if self.active.is_some() {
            self.fail_active(TransferError::Timeout);
        } else {
            self.logger
                .debug(format_args!("smbus: SCL low timeout with no transfer in flight"));
            self.ownership.release();
        }
    }
}
