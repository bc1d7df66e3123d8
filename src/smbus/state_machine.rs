// Licensed under the Apache-2.0 license

//! Bus state machine.
//!
//! Every SMBus interrupt is sampled into a [`StatusSample`], decoded into one
//! [`BusEvent`] and applied as a single transition. The master side of the
//! transition is driven by [`MasterPhase`]; the slave side only exists when the
//! controller runs as a multimaster node with an own address.

use crate::common::Logger;
use crate::smbus::common::{Direction, SlaveEvent, StatusVector};
use crate::smbus::controller::SmbusController;
use crate::smbus::error::TransferError;
use crate::smbus::request::TransferBuffer;
use crate::smbus::traits::{SmbusHardware, SmbusPeripheral};
use embedded_hal::i2c::SevenBitAddress;

/// Where the master side of the controller is within a transfer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MasterPhase {
    Idle,
    /// START requested for a fresh attempt.
    Starting,
    /// Repeated START requested to switch a random read to the read phase.
    Restarting,
    AddressSent,
    /// Sub-address on the wire; `restart` means a repeated START follows its ACK.
    SubAddressSent { restart: bool },
    Writing,
    Reading,
    /// Arbitration lost on our address; START is re-issued at the next STOP.
    Rescheduled,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusEvent {
    StartSent,
    AddressAcked,
    AddressNacked,
    DataAcked,
    DataNacked,
    ByteReceived(u8),
    ArbitrationLost,
    BusError(u8),
    SlaveAddressed {
        matched: bool,
        read: bool,
        arbitration_lost: bool,
    },
    SlaveByteReceived(u8),
    SlaveReceiveError,
    SlaveByteSent { acked: bool },
    SlaveStopSeen,
    SlaveTransmitStop,
}

/// Register state captured at the top of the interrupt handler.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StatusSample {
    pub status: u8,
    pub ack: bool,
    pub arbitration_lost: bool,
    pub data: u8,
}

impl StatusSample {
    pub fn capture<P: SmbusPeripheral>(peripheral: &P) -> Self {
        Self {
            status: peripheral.status_vector(),
            ack: peripheral.ack_received(),
            arbitration_lost: peripheral.arbitration_lost(),
            data: peripheral.read_data(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BusStateMachine {
    pub phase: MasterPhase,
    /// Sticky until the slave STOP that follows the lost arbitration.
    pub arbitration_lost: bool,
}

impl Default for BusStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl BusStateMachine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: MasterPhase::Idle,
            arbitration_lost: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Turn a status sample into an event.
    ///
    /// `slave_address` is the own address when the slave role is enabled;
    /// without it every slave-role status decodes as a bus error.
    #[must_use]
    pub fn decode(&self, sample: StatusSample, slave_address: Option<SevenBitAddress>) -> BusEvent {
        let Ok(vector) = StatusVector::try_from(sample.status) else {
            return BusEvent::BusError(sample.status);
        };
        if vector.is_master() && sample.arbitration_lost {
            return BusEvent::ArbitrationLost;
        }

        match vector {
            StatusVector::MasterStartSent => BusEvent::StartSent,
            StatusVector::MasterDataSent => {
                let address_phase = self.phase == MasterPhase::AddressSent;
                match (address_phase, sample.ack) {
                    (true, true) => BusEvent::AddressAcked,
                    (true, false) => BusEvent::AddressNacked,
                    (false, true) => BusEvent::DataAcked,
                    (false, false) => BusEvent::DataNacked,
                }
            }
            StatusVector::MasterDataReceived => BusEvent::ByteReceived(sample.data),
            _ if slave_address.is_none() => BusEvent::BusError(sample.status),
            StatusVector::SlaveAddressReceived => BusEvent::SlaveAddressed {
                matched: slave_address == Some(sample.data >> 1),
                read: sample.data & 0x01 == Direction::Read as u8,
                arbitration_lost: sample.arbitration_lost,
            },
            StatusVector::SlaveDataReceived if sample.arbitration_lost => BusEvent::SlaveReceiveError,
            StatusVector::SlaveDataReceived => BusEvent::SlaveByteReceived(sample.data),
            StatusVector::SlaveTransmitDataSent => BusEvent::SlaveByteSent { acked: sample.ack },
            StatusVector::SlaveStopReceived => BusEvent::SlaveStopSeen,
            StatusVector::SlaveTransmitStopReceived => BusEvent::SlaveTransmitStop,
        }
    }
}

/// Next action of the master after an acknowledged byte.
enum MasterStep {
    Send(u8, MasterPhase),
    Receive,
    Restart,
    Finish,
    Desync,
}

impl<H: SmbusHardware, L: Logger> SmbusController<H, L> {
    /// SMBus interrupt handler. Services exactly one bus phase and clears `SI`.
    pub fn on_bus_interrupt(&mut self) {
        let sample = StatusSample::capture(&self.hardware);
        let event = self.fsm.decode(sample, self.slave_address());
        self.dispatch(event, sample.status);
        self.hardware.clear_interrupt();
    }

    fn dispatch(&mut self, event: BusEvent, status: u8) {
        match event {
            BusEvent::StartSent => self.on_start_sent(status),
            BusEvent::AddressAcked | BusEvent::DataAcked => self.on_master_ack(status),
            BusEvent::AddressNacked | BusEvent::DataNacked => self.on_master_nack(status),
            BusEvent::ByteReceived(byte) => self.on_byte_received(byte, status),
            BusEvent::ArbitrationLost => self.recover(TransferError::ArbitrationLost),
            BusEvent::BusError(raw) => self.recover(TransferError::ProtocolDesync { status: raw }),
            BusEvent::SlaveAddressed {
                matched,
                read,
                arbitration_lost,
            } => self.on_slave_addressed(matched, read, arbitration_lost),
            BusEvent::SlaveByteReceived(byte) => {
                let ack = self.slave.receive(byte);
                self.hardware.set_ack(ack);
            }
            BusEvent::SlaveReceiveError => {
                self.hardware.request_start(false);
                self.hardware.request_stop(false);
                self.hardware.set_ack(false);
            }
            BusEvent::SlaveByteSent { acked } => {
                if acked {
                    let byte = self.slave.next_response_byte();
                    self.hardware.write_data(byte);
                }
                self.slave.note(SlaveEvent::ByteSent);
            }
            BusEvent::SlaveStopSeen => self.on_slave_stop(),
            BusEvent::SlaveTransmitStop => {
                self.hardware.request_stop(false);
                self.slave.note(SlaveEvent::Stop);
            }
        }
    }

    fn on_start_sent(&mut self, status: u8) {
        let fresh = match self.fsm.phase {
            MasterPhase::Restarting => false,
            MasterPhase::Starting | MasterPhase::Rescheduled => true,
            _ => return self.recover(TransferError::ProtocolDesync { status }),
        };
        let Some(active) = self.active.as_mut() else {
            return self.recover(TransferError::ProtocolDesync { status });
        };

        active.begin_cycle(fresh);
        let address = active.direction.address_byte(active.request.target);
        self.hardware.write_data(address);
        // STA is not cleared by hardware.
        self.hardware.request_start(false);
        self.fsm.phase = MasterPhase::AddressSent;
    }

    fn on_master_ack(&mut self, status: u8) {
        let phase = self.fsm.phase;
        let Some(active) = self.active.as_mut() else {
            return self.recover(TransferError::ProtocolDesync { status });
        };

        let step = match phase {
            MasterPhase::AddressSent if active.sub_address_pending => {
                active.sub_address_pending = false;
                let restart = active.request.restart_to_read;
                if restart {
                    active.direction = Direction::Read;
                }
                match active.request.sub_address {
                    Some(sub) => MasterStep::Send(sub, MasterPhase::SubAddressSent { restart }),
                    None => MasterStep::Desync,
                }
            }
            MasterPhase::SubAddressSent { restart: true } => MasterStep::Restart,
            MasterPhase::AddressSent
            | MasterPhase::SubAddressSent { restart: false }
            | MasterPhase::Writing => match active.direction {
                Direction::Write => match active.next_write_byte() {
                    Some(byte) => MasterStep::Send(byte, MasterPhase::Writing),
                    None => MasterStep::Finish,
                },
                Direction::Read if active.request.byte_count > 0 => MasterStep::Receive,
                Direction::Read => MasterStep::Finish,
            },
            _ => MasterStep::Desync,
        };

        match step {
            MasterStep::Send(byte, next) => {
                self.hardware.write_data(byte);
                self.fsm.phase = next;
            }
            MasterStep::Receive => self.fsm.phase = MasterPhase::Reading,
            MasterStep::Restart => {
                self.hardware.request_start(true);
                self.fsm.phase = MasterPhase::Restarting;
            }
            MasterStep::Finish => self.finish(),
            MasterStep::Desync => self.recover(TransferError::ProtocolDesync { status }),
        }
    }

    fn on_master_nack(&mut self, status: u8) {
        let Some(active) = self.active.as_mut() else {
            return self.recover(TransferError::ProtocolDesync { status });
        };
        if !active.request.ack_poll {
            return self.recover(TransferError::Nacked);
        }
        if !self.config.ack_poll_limit.allows(active.ack_poll_attempts) {
            return self.recover(TransferError::AckPollExhausted);
        }

        active.ack_poll_attempts = active.ack_poll_attempts.saturating_add(1);
        self.stats.ack_poll_retries = self.stats.ack_poll_retries.saturating_add(1);
        self.logger.debug(format_args!(
            "smbus: #{} 0x{:02x} busy, ack-poll {}",
            active.id.value(),
            active.request.target,
            active.ack_poll_attempts
        ));
        // STOP followed by START: retry from the top.
        self.hardware.request_stop(true);
        self.hardware.request_start(true);
        self.fsm.phase = MasterPhase::Starting;
    }

    fn on_byte_received(&mut self, byte: u8, status: u8) {
        let desync = TransferError::ProtocolDesync { status };
        if self.fsm.phase != MasterPhase::Reading {
            return self.recover(desync);
        }
        let Some(active) = self.active.as_mut() else {
            return self.recover(desync);
        };
        let TransferBuffer::Read(data) = &mut active.buffer else {
            return self.recover(desync);
        };
        if data.push(byte).is_err() {
            return self.recover(desync);
        }

        active.cursor += 1;
        if active.cursor < active.request.byte_count {
            self.hardware.set_ack(true);
        } else {
            // NACK the last byte, then STOP.
            self.hardware.set_ack(false);
            self.finish();
        }
    }

    fn on_slave_addressed(&mut self, matched: bool, read: bool, arbitration_lost: bool) {
        self.hardware.request_start(false);
        if arbitration_lost {
            self.fsm.arbitration_lost = true;
            if let Some(active) = &self.active {
                self.fsm.phase = MasterPhase::Rescheduled;
                self.logger.debug(format_args!(
                    "smbus: #{} lost arbitration, waiting for STOP",
                    active.id.value()
                ));
            }
        }

        if matched {
            self.hardware.set_ack(true);
            if read {
                let byte = self.slave.begin_response();
                self.hardware.write_data(byte);
            }
            self.slave.note(SlaveEvent::AddressMatched);
        } else {
            self.hardware.set_ack(false);
            self.slave.note(SlaveEvent::AddressIgnored);
        }
    }

    fn on_slave_stop(&mut self) {
        self.hardware.request_stop(false);
        self.slave.note(SlaveEvent::Stop);
        if !self.fsm.arbitration_lost {
            return;
        }
        self.fsm.arbitration_lost = false;

        let Some(active) = self.active.as_mut() else {
            self.fsm.phase = MasterPhase::Idle;
            return;
        };
        if !self.config.arbitration_retry_limit.allows(active.reschedules) {
            return self.recover(TransferError::ArbitrationLost);
        }

        active.reschedules = active.reschedules.saturating_add(1);
        self.stats.arbitration_reschedules = self.stats.arbitration_reschedules.saturating_add(1);
        self.logger.debug(format_args!(
            "smbus: #{} rescheduled ({})",
            active.id.value(),
            active.reschedules
        ));
        self.hardware.request_start(true);
        self.fsm.phase = MasterPhase::Starting;
    }
}
