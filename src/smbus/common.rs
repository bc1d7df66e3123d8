// Licensed under the Apache-2.0 license

//! Common types and constants for the SMBus transfer engine.
//!
//! This module provides the shared definitions for configuration, status-vector
//! decoding, transfer direction and retry policy used across the engine.

use crate::smbus::error::ConfigurationError;
use embedded_hal::i2c::SevenBitAddress;
use fugit::MillisDurationU32;

/// Largest payload a single transfer can carry.
pub const MAX_TRANSFER_LEN: usize = 32;

/// Number of completed transfer outcomes kept until their caller collects them.
pub const RECORD_DEPTH: usize = 4;

/// Capacity of the slave-role receive and transmit buffers.
pub const SLAVE_BUF_SIZE: usize = 16;

/// Largest valid 7-bit bus address.
pub const MAX_SEVEN_BIT_ADDRESS: SevenBitAddress = 0x7F;

/// Default SCL-low timeout period (Timer3 reload of SYSCLK/12/40).
pub const DEFAULT_SCL_LOW_TIMEOUT_MS: u32 = 25;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum SmbusSpeed {
    Slow = 10_000,
    Standard = 100_000,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    Write = 0,
    Read = 1,
}

impl Direction {
    /// Address byte for `target` with the R/W bit in the LSB.
    #[must_use]
    pub const fn address_byte(self, target: SevenBitAddress) -> u8 {
        (target << 1) | self as u8
    }
}

/// Upper nibble of SMB0CN: the phase that just completed on the bus.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum StatusVector {
    /// (MT) START transmitted
    MasterStartSent = 0xE,
    /// (MT) address or data byte transmitted
    MasterDataSent = 0xC,
    /// (MR) data byte received
    MasterDataReceived = 0x8,
    /// (SR) START + address received, possibly after lost arbitration
    SlaveAddressReceived = 0x2,
    /// (SR) STOP detected while slave receiver or transmitter
    SlaveStopReceived = 0x1,
    /// (SR) data byte received
    SlaveDataReceived = 0x0,
    /// (ST) data byte transmitted
    SlaveTransmitDataSent = 0x4,
    /// (ST) STOP detected during a transmission; bus error
    SlaveTransmitStopReceived = 0x5,
}

impl StatusVector {
    #[must_use]
    pub const fn is_master(self) -> bool {
        matches!(
            self,
            StatusVector::MasterStartSent
                | StatusVector::MasterDataSent
                | StatusVector::MasterDataReceived
        )
    }
}

impl TryFrom<u8> for StatusVector {
    type Error = u8;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0xE => Ok(StatusVector::MasterStartSent),
            0xC => Ok(StatusVector::MasterDataSent),
            0x8 => Ok(StatusVector::MasterDataReceived),
            0x2 => Ok(StatusVector::SlaveAddressReceived),
            0x1 => Ok(StatusVector::SlaveStopReceived),
            0x0 => Ok(StatusVector::SlaveDataReceived),
            0x4 => Ok(StatusVector::SlaveTransmitDataSent),
            0x5 => Ok(StatusVector::SlaveTransmitStopReceived),
            _ => Err(raw),
        }
    }
}

/// Bound on automatic retries.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RetryLimit {
    /// Retry forever. Only the SCL-low timeout bounds it.
    Unbounded,
    /// Give up once this many retries have been spent.
    Attempts(u32),
}

impl RetryLimit {
    #[must_use]
    pub const fn allows(self, spent: u32) -> bool {
        match self {
            RetryLimit::Unbounded => true,
            RetryLimit::Attempts(max) => spent < max,
        }
    }
}

/// Slave-role events, in the order a master drives them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SlaveEvent {
    AddressMatched,
    AddressIgnored,
    ByteReceived,
    ByteSent,
    Stop,
}

/// Status information for the slave role of a multimaster controller
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SlaveStatus {
    /// Whether the slave role is active (multimaster configuration)
    pub enabled: bool,
    /// Own address the controller answers to
    pub address: Option<SevenBitAddress>,
    /// Set when a byte was received and not yet taken
    pub data_ready: bool,
    /// Bytes waiting in the receive buffer
    pub rx_buffer_count: usize,
    /// Response bytes still queued for a master read
    pub tx_buffer_count: usize,
    /// Last slave event that occurred
    pub last_event: Option<SlaveEvent>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SmbusConfig {
    pub multi_master: bool,
    pub own_address: Option<SevenBitAddress>,
    pub scl_low_timeout: MillisDurationU32,
    pub ack_poll_limit: RetryLimit,
    pub arbitration_retry_limit: RetryLimit,
    /// SCL rate; also paces the clocks of [`unstick_bus`](crate::smbus::bus_recovery::unstick_bus).
    pub speed: SmbusSpeed,
}

impl SmbusConfig {
    /// Whether slave-role status codes are expected.
    #[must_use]
    pub const fn slave_enabled(&self) -> bool {
        self.multi_master && self.own_address.is_some()
    }
}

impl Default for SmbusConfig {
    fn default() -> Self {
        Self {
            multi_master: false,
            own_address: None,
            scl_low_timeout: MillisDurationU32::millis(DEFAULT_SCL_LOW_TIMEOUT_MS),
            ack_poll_limit: RetryLimit::Attempts(256),
            arbitration_retry_limit: RetryLimit::Attempts(16),
            speed: SmbusSpeed::Standard,
        }
    }
}

pub struct SmbusConfigBuilder {
    multi_master: bool,
    own_address: Option<SevenBitAddress>,
    scl_low_timeout: MillisDurationU32,
    ack_poll_limit: RetryLimit,
    arbitration_retry_limit: RetryLimit,
    speed: SmbusSpeed,
}

impl Default for SmbusConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SmbusConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        let defaults = SmbusConfig::default();
        Self {
            multi_master: defaults.multi_master,
            own_address: defaults.own_address,
            scl_low_timeout: defaults.scl_low_timeout,
            ack_poll_limit: defaults.ack_poll_limit,
            arbitration_retry_limit: defaults.arbitration_retry_limit,
            speed: defaults.speed,
        }
    }
    #[must_use]
    pub fn multi_master(mut self, own_address: SevenBitAddress) -> Self {
        self.multi_master = true;
        self.own_address = Some(own_address);
        self
    }
    /// Change the own address without changing the master mode.
    #[must_use]
    pub fn own_address(mut self, own_address: SevenBitAddress) -> Self {
        self.own_address = Some(own_address);
        self
    }
    #[must_use]
    pub fn single_master(mut self) -> Self {
        self.multi_master = false;
        self.own_address = None;
        self
    }
    #[must_use]
    pub fn scl_low_timeout(mut self, timeout: MillisDurationU32) -> Self {
        self.scl_low_timeout = timeout;
        self
    }
    #[must_use]
    pub fn ack_poll_limit(mut self, limit: RetryLimit) -> Self {
        self.ack_poll_limit = limit;
        self
    }
    #[must_use]
    pub fn arbitration_retry_limit(mut self, limit: RetryLimit) -> Self {
        self.arbitration_retry_limit = limit;
        self
    }
    #[must_use]
    pub fn speed(mut self, speed: SmbusSpeed) -> Self {
        self.speed = speed;
        self
    }

    /// Validate and produce the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the own address does not fit in 7 bits or the
    /// SCL-low timeout is zero.
    pub fn build(self) -> Result<SmbusConfig, ConfigurationError> {
        if let Some(addr) = self.own_address {
            if addr > MAX_SEVEN_BIT_ADDRESS {
                return Err(ConfigurationError::InvalidOwnAddress(addr));
            }
        }
        if self.scl_low_timeout.ticks() == 0 {
            return Err(ConfigurationError::ZeroTimeout);
        }
        Ok(SmbusConfig {
            multi_master: self.multi_master,
            own_address: self.own_address,
            scl_low_timeout: self.scl_low_timeout,
            ack_poll_limit: self.ack_poll_limit,
            arbitration_retry_limit: self.arbitration_retry_limit,
            speed: self.speed,
        })
    }
}
