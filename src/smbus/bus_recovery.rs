// Licensed under the Apache-2.0 license

//! Hung-bus recovery, run before the peripheral is enabled.
//!
//! A slave that was mid-read when the master reset keeps SDA low while it waits
//! for clocks that never come. Clocking SCL by hand lets it finish the byte and
//! release the line. The pins must be in GPIO mode (crossbar disabled) while
//! this runs.

use crate::smbus::common::SmbusConfig;
use crate::smbus::error::BusRecoveryError;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Nine clocks drain any byte in flight; a few extra cover slow slaves.
pub const DEFAULT_MAX_PULSES: u32 = 16;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecoveryOutcome {
    BusNotHung,
    Recovered { pulses: u32 },
}

/// Pulse SCL until SDA reads high, at most `max_pulses` times.
///
/// # Arguments
///
/// * `scl` - SCL driven as a GPIO output
/// * `sda` - SDA sampled as a GPIO input
/// * `delay` - provides the half-period between SCL edges
/// * `config` - bus configuration; its `speed` sets the half-period
/// * `max_pulses` - clock pulses to try before giving up
///
/// # Errors
///
/// Returns [`BusRecoveryError::StillHung`] if SDA is still low after the last
/// pulse, or [`BusRecoveryError::Pin`] if a pin operation fails.
pub fn unstick_bus<SCL, SDA, D>(
    scl: &mut SCL,
    sda: &mut SDA,
    delay: &mut D,
    config: &SmbusConfig,
    max_pulses: u32,
) -> Result<RecoveryOutcome, BusRecoveryError>
where
    SCL: OutputPin,
    SDA: InputPin,
    D: DelayNs,
{
    let half_period_ns = 1_000_000_000 / (config.speed as u32 * 2);

    scl.set_high().map_err(|_| BusRecoveryError::Pin)?;
    delay.delay_ns(half_period_ns);
    if sda.is_high().map_err(|_| BusRecoveryError::Pin)? {
        return Ok(RecoveryOutcome::BusNotHung);
    }

    for pulse in 1..=max_pulses {
        scl.set_low().map_err(|_| BusRecoveryError::Pin)?;
        delay.delay_ns(half_period_ns);
        scl.set_high().map_err(|_| BusRecoveryError::Pin)?;
        delay.delay_ns(half_period_ns);
        if sda.is_high().map_err(|_| BusRecoveryError::Pin)? {
            return Ok(RecoveryOutcome::Recovered { pulses: pulse });
        }
    }

    Err(BusRecoveryError::StillHung { pulses: max_pulses })
}
