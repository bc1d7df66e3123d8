// Licensed under the Apache-2.0 license

//! SMBus controller.
//!
//! [`SmbusController`] owns all state of one bus: the hardware, the transfer in
//! flight, the outcomes waiting to be collected, and the slave mailbox. The
//! request layer, the state machine and the watchdog all operate on it.

use crate::common::{Logger, NoOpLogger};
use crate::smbus::common::{Direction, SlaveStatus, SmbusConfig, MAX_TRANSFER_LEN, RECORD_DEPTH};
use crate::smbus::error::TransferError;
use crate::smbus::ownership::BusOwnership;
use crate::smbus::request::{TransferBuffer, TransferId, TransferRecord, TransferRequest};
use crate::smbus::slave::SlaveMailbox;
use crate::smbus::state_machine::{BusStateMachine, MasterPhase};
use crate::smbus::traits::{BlockingSmbus, SmbusHardware};
use embedded_hal::i2c::{Operation, SevenBitAddress};
use heapless::{Deque, Vec};

/// Per-kind transfer counters. Saturating, never reset.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub completed: u32,
    pub nacked: u32,
    pub ack_poll_exhausted: u32,
    pub arbitration_lost: u32,
    pub desync: u32,
    pub timeouts: u32,
    /// NACKs absorbed by ack-polling; not failures.
    pub ack_poll_retries: u32,
    /// STARTs re-issued after lost arbitration; not failures.
    pub arbitration_reschedules: u32,
}

impl TransferStats {
    /// Failed transfers of every kind.
    #[must_use]
    pub fn errors(&self) -> u32 {
        self.nacked
            .saturating_add(self.ack_poll_exhausted)
            .saturating_add(self.arbitration_lost)
            .saturating_add(self.desync)
            .saturating_add(self.timeouts)
    }

    pub(crate) fn record_failure(&mut self, error: TransferError) {
        let counter = match error {
            TransferError::Nacked => &mut self.nacked,
            TransferError::AckPollExhausted => &mut self.ack_poll_exhausted,
            TransferError::ArbitrationLost => &mut self.arbitration_lost,
            TransferError::ProtocolDesync { .. } => &mut self.desync,
            TransferError::Timeout => &mut self.timeouts,
            TransferError::InvalidRequest | TransferError::OutcomeLost => return,
        };
        *counter = counter.saturating_add(1);
    }
}

/// The transfer currently owning the bus.
#[derive(Clone, Debug)]
pub(crate) struct ActiveTransfer {
    pub(crate) id: TransferId,
    pub(crate) request: TransferRequest,
    pub(crate) buffer: TransferBuffer,
    /// Bytes sent or received in the current attempt.
    pub(crate) cursor: usize,
    /// Direction of the current bus phase; a random read starts as a write.
    pub(crate) direction: Direction,
    pub(crate) sub_address_pending: bool,
    pub(crate) ack_poll_attempts: u32,
    pub(crate) reschedules: u32,
}

impl ActiveTransfer {
    pub(crate) fn new(id: TransferId, request: TransferRequest, buffer: TransferBuffer) -> Self {
        let mut active = Self {
            id,
            request,
            buffer,
            cursor: 0,
            direction: request.direction,
            sub_address_pending: false,
            ack_poll_attempts: 0,
            reschedules: 0,
        };
        active.begin_cycle(true);
        active
    }

    /// Reset for a new START. A fresh START replays the transfer from the
    /// top; a repeated START continues a random read with its read phase.
    pub(crate) fn begin_cycle(&mut self, fresh: bool) {
        if fresh {
            self.sub_address_pending = self.request.sub_address_present();
            self.direction = if self.sub_address_pending {
                Direction::Write
            } else {
                self.request.direction
            };
        } else {
            self.direction = Direction::Read;
        }
        self.cursor = 0;
        if let TransferBuffer::Read(data) = &mut self.buffer {
            data.clear();
        }
    }

    pub(crate) fn next_write_byte(&mut self) -> Option<u8> {
        let TransferBuffer::Write(data) = &self.buffer else {
            return None;
        };
        let byte = data.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(byte)
    }
}

pub struct SmbusController<H: SmbusHardware, L: Logger = NoOpLogger> {
    pub(crate) hardware: H,
    pub(crate) config: SmbusConfig,
    pub(crate) logger: L,
    pub(crate) ownership: BusOwnership,
    pub(crate) fsm: BusStateMachine,
    pub(crate) active: Option<ActiveTransfer>,
    pub(crate) records: Deque<TransferRecord, RECORD_DEPTH>,
    pub(crate) next_id: u32,
    pub(crate) slave: SlaveMailbox,
    pub(crate) stats: TransferStats,
}

impl<H: SmbusHardware> SmbusController<H> {
    pub fn new(hardware: H, config: SmbusConfig) -> Self {
        Self::with_logger(hardware, config, NoOpLogger)
    }
}

impl<H: SmbusHardware, L: Logger> SmbusController<H, L> {
    /// Take over `hardware`, arm the SCL-low timer and enable the peripheral.
    pub fn with_logger(hardware: H, config: SmbusConfig, logger: L) -> Self {
        let mut controller = Self {
            hardware,
            config,
            logger,
            ownership: BusOwnership::new(),
            fsm: BusStateMachine::new(),
            active: None,
            records: Deque::new(),
            next_id: 0,
            slave: SlaveMailbox::new(),
            stats: TransferStats::default(),
        };
        controller.init();
        controller
    }

    fn init(&mut self) {
        self.arm_watchdog();
        self.hardware.enable_slave(self.config.slave_enabled());
        self.hardware.set_enabled(true);
    }

    /// Polled-mode dispatcher: run whichever interrupt handler has its flag raised.
    pub fn service(&mut self) {
        if self.hardware.timeout_pending() {
            self.on_timeout_interrupt();
        }
        if self.hardware.interrupt_pending() {
            self.on_bus_interrupt();
        }
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    pub fn config(&self) -> &SmbusConfig {
        &self.config
    }

    pub fn logger_mut(&mut self) -> &mut L {
        &mut self.logger
    }

    pub fn is_busy(&self) -> bool {
        self.ownership.is_busy()
    }

    pub fn phase(&self) -> MasterPhase {
        self.fsm.phase
    }

    pub fn stats(&self) -> TransferStats {
        self.stats
    }

    /// Number of transfers that ended in failure since start-up.
    pub fn transfer_error_count(&self) -> u32 {
        self.stats.errors()
    }

    pub fn slave_status(&self) -> SlaveStatus {
        self.slave
            .status(self.config.slave_enabled(), self.slave_address())
    }

    pub(crate) fn slave_address(&self) -> Option<SevenBitAddress> {
        if self.config.slave_enabled() {
            self.config.own_address
        } else {
            None
        }
    }

    /// Complete the active transfer successfully and STOP.
    pub(crate) fn finish(&mut self) {
        self.hardware.request_stop(true);
        self.fsm.phase = MasterPhase::Idle;
        if let Some(active) = self.active.take() {
            self.stats.completed = self.stats.completed.saturating_add(1);
            self.logger.debug(format_args!(
                "smbus: #{} done after {} byte(s)",
                active.id.value(),
                active.cursor
            ));
            self.push_record(active.id, Ok(()), active.buffer.into_received());
        }
        self.ownership.release();
    }

    /// Failure recovery: reset the peripheral to idle and fail the active transfer.
    pub(crate) fn recover(&mut self, error: TransferError) {
        self.hardware.set_enabled(false);
        self.hardware.set_enabled(true);
        self.hardware.request_start(false);
        self.hardware.request_stop(false);
        self.hardware.set_ack(false);
        self.fsm.reset();
        self.fail_active(error);
    }

    pub(crate) fn fail_active(&mut self, error: TransferError) {
        self.stats.record_failure(error);
        match self.active.take() {
            Some(active) => {
                self.logger.error(format_args!(
                    "smbus: #{} to 0x{:02x} failed: {:?}",
                    active.id.value(),
                    active.request.target,
                    error
                ));
                self.push_record(active.id, Err(error), Vec::new());
            }
            None => self
                .logger
                .error(format_args!("smbus: bus reset while idle: {error:?}")),
        }
        self.ownership.release();
    }

    fn push_record(
        &mut self,
        id: TransferId,
        result: Result<(), TransferError>,
        data: Vec<u8, MAX_TRANSFER_LEN>,
    ) {
        if self.records.is_full() {
            if let Some(evicted) = self.records.pop_front() {
                self.logger.debug(format_args!(
                    "smbus: outcome of #{} dropped uncollected",
                    evicted.id.value()
                ));
            }
        }
        let _ = self.records.push_back(TransferRecord { id, result, data });
    }
}

impl<H: SmbusHardware, L: Logger> BlockingSmbus for SmbusController<H, L> {
    fn write(
        &mut self,
        target: SevenBitAddress,
        sub_address: Option<u8>,
        data: &[u8],
    ) -> Result<(), TransferError> {
        SmbusController::write(self, target, sub_address, data)
    }

    fn read(
        &mut self,
        target: SevenBitAddress,
        sub_address: Option<u8>,
        buffer: &mut [u8],
    ) -> Result<(), TransferError> {
        SmbusController::read(self, target, sub_address, buffer)
    }
}

impl<H: SmbusHardware, L: Logger> embedded_hal::i2c::ErrorType for SmbusController<H, L> {
    type Error = TransferError;
}

/// Only the shapes the engine can put on the wire are accepted: a plain write,
/// a plain read, and a one-byte register write followed by a repeated-START read.
impl<H: SmbusHardware, L: Logger> embedded_hal::i2c::I2c for SmbusController<H, L> {
    fn read(&mut self, addr: SevenBitAddress, buffer: &mut [u8]) -> Result<(), Self::Error> {
        SmbusController::read(self, addr, None, buffer)
    }

    fn write(&mut self, addr: SevenBitAddress, bytes: &[u8]) -> Result<(), Self::Error> {
        SmbusController::write(self, addr, None, bytes)
    }

    fn write_read(
        &mut self,
        addr: SevenBitAddress,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        match bytes {
            [] => SmbusController::read(self, addr, None, buffer),
            [register] => SmbusController::read(self, addr, Some(*register), buffer),
            _ => Err(TransferError::InvalidRequest),
        }
    }

    fn transaction(
        &mut self,
        addr: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        match operations {
            [] => Ok(()),
            [Operation::Write(bytes)] => SmbusController::write(self, addr, None, bytes),
            [Operation::Read(buffer)] => SmbusController::read(self, addr, None, buffer),
            [Operation::Write([register]), Operation::Read(buffer)] => {
                SmbusController::read(self, addr, Some(*register), buffer)
            }
            _ => Err(TransferError::InvalidRequest),
        }
    }
}
