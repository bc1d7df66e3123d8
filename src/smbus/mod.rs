// Licensed under the Apache-2.0 license

//! SMBus0 master and multimaster transfer engine.
//!
//! Modelled on the SMBus peripheral of 8051-family microcontrollers: a status
//! vector interrupt per bus phase, software-driven START/STOP/ACK bits, an
//! arbitration-lost flag, and a timer watching for SCL held low. The engine is
//! hardware agnostic and reaches the registers only through [`SmbusHardware`].

pub mod bus_recovery;
pub mod common;
pub mod controller;
pub mod error;
pub mod ownership;
pub mod request;
pub mod shared;
pub mod slave;
pub mod state_machine;
pub mod traits;
pub mod watchdog;

pub use common::{
    Direction, RetryLimit, SlaveEvent, SlaveStatus, SmbusConfig, SmbusConfigBuilder, SmbusSpeed,
    StatusVector, MAX_TRANSFER_LEN,
};
pub use controller::{SmbusController, TransferStats};
pub use error::{BusRecoveryError, ConfigurationError, TransferError};
pub use request::{TransferId, TransferRecord, TransferRequest};
pub use shared::SharedSmbus;
pub use state_machine::{BusEvent, MasterPhase};
pub use traits::{BlockingSmbus, SclLowTimer, SmbusHardware, SmbusPeripheral};
