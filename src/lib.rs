// Licensed under the Apache-2.0 license

//! Interrupt-driven SMBus master and multimaster transfer engine for the
//! SMBus0 peripheral of 8051-family microcontrollers, with a serial EEPROM
//! driver on top.

// Keep panic-prone patterns out of production code only
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::indexing_slicing))]
#![cfg_attr(not(test), warn(clippy::expect_used))]
#![cfg_attr(not(test), no_std)]
pub mod common;
pub mod eeprom;
pub mod smbus;
#[cfg(test)]
mod tests;
