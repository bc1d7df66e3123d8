// Licensed under the Apache-2.0 license

//! End-to-end behaviour of the transfer engine on the simulated bus.

use crate::common::{LogLevel, Logger};
use crate::eeprom::Eeprom24x;
use crate::smbus::common::{RetryLimit, SlaveEvent, SmbusConfig, SmbusConfigBuilder};
use crate::smbus::controller::SmbusController;
use crate::smbus::error::{ConfigurationError, TransferError};
use crate::smbus::shared::SharedSmbus;
use crate::smbus::state_machine::MasterPhase;
use crate::tests::sim::WireEvent::{
    Address, Byte, MasterAck, MasterNack, RepeatedStart, SlaveAck, SlaveNack, Start, Stop,
};
use crate::tests::sim::{RivalMaster, ScriptedSlave, SimBus, SimEeprom};
use core::fmt;
use core::future::Future;
use core::task::{Context, Poll, Waker};
use embedded_hal::i2c::{I2c, Operation};
use fugit::MillisDurationU32;
use hex_literal::hex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::Wake;
use std::thread;

fn single_master() -> SmbusConfig {
    SmbusConfigBuilder::new().build().unwrap()
}

fn multi_master(limit: RetryLimit) -> SmbusConfig {
    SmbusConfigBuilder::new()
        .multi_master(0x78)
        .arbitration_retry_limit(limit)
        .build()
        .unwrap()
}

fn eeprom_bus(write_cycle_nacks: u32) -> SmbusController<SimBus> {
    SmbusController::new(
        SimBus::new().with_eeprom(SimEeprom::new(write_cycle_nacks)),
        single_master(),
    )
}

fn slave_bus(slave: ScriptedSlave) -> SmbusController<SimBus> {
    SmbusController::new(SimBus::new().with_scripted(slave), single_master())
}

fn drive(bus: &mut SmbusController<SimBus>) {
    while bus.is_busy() {
        bus.service();
    }
}

struct NoopWake;

impl Wake for NoopWake {
    fn wake(self: Arc<Self>) {}
}

fn block_on<F: Future>(future: F) -> F::Output {
    let waker = Waker::from(Arc::new(NoopWake));
    let mut cx = Context::from_waker(&waker);
    let mut future = std::pin::pin!(future);
    loop {
        if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
            return output;
        }
    }
}

#[derive(Default)]
struct LineLog(Vec<String>);

impl Logger for LineLog {
    fn log(&mut self, level: LogLevel, args: fmt::Arguments<'_>) {
        self.0.push(format!("{}: {}", level.tag(), args));
    }
}

#[test]
fn test_multi_byte_write_keeps_byte_order() {
    let mut bus = slave_bus(ScriptedSlave::new(0x30));
    bus.write(0x30, None, &[0x01, 0x02, 0x03]).unwrap();

    let hw = bus.hardware();
    assert_eq!(
        hw.wire,
        vec![
            Start,
            Address { addr: 0x30, read: false },
            SlaveAck,
            Byte(0x01),
            SlaveAck,
            Byte(0x02),
            SlaveAck,
            Byte(0x03),
            SlaveAck,
            Stop,
        ]
    );
    assert_eq!(hw.scripted.as_ref().unwrap().received, vec![0x01, 0x02, 0x03]);
    assert!(!bus.is_busy());
    assert_eq!(bus.phase(), MasterPhase::Idle);
    assert_eq!(bus.stats().completed, 1);
}

#[test]
fn test_read_acks_all_but_last_byte() {
    let mut slave = ScriptedSlave::new(0x30);
    slave.response = vec![0x09, 0x08, 0x07, 0x06];
    let mut bus = slave_bus(slave);

    let mut buf = [0u8; 4];
    bus.read(0x30, None, &mut buf).unwrap();

    assert_eq!(buf, [0x09, 0x08, 0x07, 0x06]);
    assert_eq!(
        bus.hardware().wire,
        vec![
            Start,
            Address { addr: 0x30, read: true },
            SlaveAck,
            Byte(0x09),
            MasterAck,
            Byte(0x08),
            MasterAck,
            Byte(0x07),
            MasterAck,
            Byte(0x06),
            MasterNack,
            Stop,
        ]
    );
}

#[test]
fn test_random_read_uses_repeated_start() {
    let mut bus = eeprom_bus(0);
    bus.hardware_mut().eeprom.as_mut().unwrap().memory[0x38] = 0xCC;

    let mut buf = [0u8; 1];
    bus.read(0x50, Some(0x38), &mut buf).unwrap();

    assert_eq!(buf, [0xCC]);
    assert_eq!(
        bus.hardware().wire,
        vec![
            Start,
            Address { addr: 0x50, read: false },
            SlaveAck,
            Byte(0x38),
            SlaveAck,
            RepeatedStart,
            Address { addr: 0x50, read: true },
            SlaveAck,
            Byte(0xCC),
            MasterNack,
            Stop,
        ]
    );
}

#[test]
fn test_ack_poll_waits_out_write_cycle() {
    let mut bus = eeprom_bus(3);
    bus.write(0x50, Some(0x25), &[0xAA]).unwrap();
    bus.hardware_mut().clear_wire();

    let mut buf = [0u8; 1];
    bus.read(0x50, Some(0x25), &mut buf).unwrap();

    assert_eq!(buf, [0xAA]);
    assert_eq!(bus.stats().ack_poll_retries, 3);
    assert_eq!(bus.transfer_error_count(), 0);
    assert_eq!(bus.hardware().enable_toggles, 0);

    let busy_attempt = [Start, Address { addr: 0x50, read: false }, SlaveNack, Stop];
    let wire = &bus.hardware().wire;
    assert_eq!(wire[..4], busy_attempt);
    assert_eq!(wire[4..8], busy_attempt);
    assert_eq!(wire[8..12], busy_attempt);
    assert_eq!(wire[12], Start);
    assert_eq!(wire[14], SlaveAck);
}

#[test]
fn test_ack_poll_limit_fails_transfer() {
    let config = SmbusConfigBuilder::new()
        .ack_poll_limit(RetryLimit::Attempts(2))
        .build()
        .unwrap();
    let mut bus = SmbusController::new(SimBus::new().with_eeprom(SimEeprom::new(5)), config);

    bus.write(0x50, Some(0x00), &[0x11]).unwrap();
    assert_eq!(
        bus.write(0x50, Some(0x01), &[0x22]),
        Err(TransferError::AckPollExhausted)
    );
    assert_eq!(bus.stats().ack_poll_retries, 2);
    assert_eq!(bus.stats().ack_poll_exhausted, 1);
    assert_eq!(bus.transfer_error_count(), 1);
    assert_eq!(bus.hardware().enable_toggles, 1);
    assert!(!bus.is_busy());
}

#[test]
fn test_eeprom_byte_and_array_scenario() {
    let mut bus = eeprom_bus(2);
    let mut eeprom = Eeprom24x::new(&mut bus);

    eeprom.byte_write(0x25, 0xAA).unwrap();
    assert_eq!(eeprom.byte_read(0x25).unwrap(), 0xAA);
    eeprom.byte_write(0x25, 0xBB).unwrap();
    eeprom.byte_write(0x38, 0xCC).unwrap();
    assert_eq!(eeprom.byte_read(0x25).unwrap(), 0xBB);
    assert_eq!(eeprom.byte_read(0x38).unwrap(), 0xCC);

    eeprom.write_array(0x50, b"ABCDEFG").unwrap();
    let mut buf = [0u8; 7];
    eeprom.read_array(0x50, &mut buf).unwrap();
    assert_eq!(buf, hex!("41 42 43 44 45 46 47"));

    let mut bytewise = [0u8; 7];
    eeprom.read_array_bytewise(0x50, &mut bytewise).unwrap();
    assert_eq!(bytewise, buf);

    assert_eq!(bus.transfer_error_count(), 0);
    let memory = &bus.hardware().eeprom.as_ref().unwrap().memory;
    assert_eq!(memory[0x25], 0xBB);
    assert_eq!(&memory[0x50..0x57], b"ABCDEFG");
}

#[test]
fn test_missing_device_nack_recovers_bus() {
    let mut bus = slave_bus(ScriptedSlave::new(0x30));
    assert_eq!(bus.write(0x33, None, &[0x01]), Err(TransferError::Nacked));

    assert_eq!(bus.transfer_error_count(), 1);
    assert_eq!(bus.stats().nacked, 1);
    assert_eq!(bus.hardware().enable_toggles, 1);
    assert!(!bus.is_busy());
    assert_eq!(
        bus.hardware().wire,
        vec![Start, Address { addr: 0x33, read: false }, SlaveNack]
    );

    bus.write(0x30, None, &[0x02]).unwrap();
    assert_eq!(bus.hardware().scripted.as_ref().unwrap().received, vec![0x02]);
}

#[test]
fn test_data_nack_fails_without_ack_poll() {
    let mut slave = ScriptedSlave::new(0x30);
    slave.nack_data_after = Some(1);
    let mut bus = slave_bus(slave);

    assert_eq!(
        bus.write(0x30, None, &[0x01, 0x02, 0x03]),
        Err(TransferError::Nacked)
    );
    assert_eq!(bus.hardware().scripted.as_ref().unwrap().received, vec![0x01]);
}

#[test]
fn test_failed_read_leaves_buffer_untouched() {
    let mut bus = slave_bus(ScriptedSlave::new(0x30));
    let mut buf = [0x5Au8; 2];
    assert_eq!(bus.read(0x31, None, &mut buf), Err(TransferError::Nacked));
    assert_eq!(buf, [0x5A, 0x5A]);
}

#[test]
fn test_begin_would_block_while_busy() {
    let mut bus = slave_bus(ScriptedSlave::new(0x30));
    let first = bus.begin_write(0x30, None, &[0x01]).unwrap();
    assert!(bus.is_busy());
    assert_eq!(bus.begin_write(0x30, None, &[0x02]), Err(nb::Error::WouldBlock));
    assert_eq!(bus.poll_write(first), Err(nb::Error::WouldBlock));

    drive(&mut bus);
    assert_eq!(bus.poll_write(first), Ok(()));
    assert!(bus.begin_write(0x30, None, &[0x02]).is_ok());
}

#[test]
fn test_invalid_request_never_touches_bus() {
    let mut bus = slave_bus(ScriptedSlave::new(0x30));
    let long = [0u8; 33];
    assert_eq!(
        bus.begin_write(0x30, None, &long),
        Err(nb::Error::Other(TransferError::InvalidRequest))
    );
    assert_eq!(
        bus.begin_read(0x90, None, 1),
        Err(nb::Error::Other(TransferError::InvalidRequest))
    );
    assert!(!bus.is_busy());
    assert!(bus.hardware().wire.is_empty());
    assert_eq!(bus.transfer_error_count(), 0);
}

#[test]
fn test_uncollected_outcomes_are_evicted() {
    let mut bus = slave_bus(ScriptedSlave::new(0x30));
    let mut ids = Vec::new();
    for byte in 0..5u8 {
        ids.push(bus.begin_write(0x30, None, &[byte]).unwrap());
        drive(&mut bus);
    }

    assert_eq!(bus.poll_write(ids[0]), Err(nb::Error::Other(TransferError::OutcomeLost)));
    assert_eq!(bus.poll_write(ids[4]), Ok(()));
    assert_eq!(bus.poll_write(ids[2]), Ok(()));
    // Collected once, gone afterwards.
    assert_eq!(bus.poll_write(ids[4]), Err(nb::Error::Other(TransferError::OutcomeLost)));
}

#[test]
fn test_wait_completes_read() {
    let mut slave = ScriptedSlave::new(0x30);
    slave.response = vec![0xDE, 0xAD];
    let mut bus = slave_bus(slave);

    let id = bus.begin_read(0x30, None, 2).unwrap();
    let mut buf = [0u8; 2];
    let count = block_on(bus.wait(id, &mut buf));
    assert_eq!(count, Ok(2));
    assert_eq!(buf, hex!("DE AD"));
}

#[test]
fn test_timeout_while_scl_held_low() {
    let mut bus = slave_bus(ScriptedSlave::new(0x30));
    let id = bus.begin_write(0x30, None, &[0x01, 0x02]).unwrap();
    bus.service();
    bus.hardware_mut().hold_scl_low();

    let mut result = bus.poll_write(id);
    for _ in 0..100 {
        if result != Err(nb::Error::WouldBlock) {
            break;
        }
        bus.service();
        result = bus.poll_write(id);
    }

    assert_eq!(result, Err(nb::Error::Other(TransferError::Timeout)));
    assert_eq!(bus.stats().timeouts, 1);
    assert_eq!(bus.transfer_error_count(), 1);
    assert_eq!(bus.hardware().enable_toggles, 1);
    assert!(!bus.is_busy());
    assert_eq!(bus.phase(), MasterPhase::Idle);

    bus.hardware_mut().release_scl();
    bus.write(0x30, None, &[0x03]).unwrap();
}

#[test]
fn test_blocking_write_returns_timeout() {
    let mut bus = slave_bus(ScriptedSlave::new(0x30));
    bus.hardware_mut().hold_scl_low();
    assert_eq!(bus.write(0x30, None, &[0x01]), Err(TransferError::Timeout));
    assert!(bus.hardware().wire.is_empty());
}

#[test]
fn test_idle_timeout_is_not_an_error() {
    let mut bus = slave_bus(ScriptedSlave::new(0x30));
    assert_eq!(bus.set_scl_low_timeout(MillisDurationU32::millis(10)), Ok(()));
    assert_eq!(bus.hardware().timeout_period_ms(), 10);
    bus.hardware_mut().hold_scl_low();

    for _ in 0..9 {
        bus.service();
    }
    assert_eq!(bus.hardware().enable_toggles, 0);
    bus.service();
    assert_eq!(bus.hardware().enable_toggles, 1);
    assert_eq!(bus.transfer_error_count(), 0);
}

#[test]
fn test_zero_timeout_is_rejected_at_run_time() {
    let mut bus = slave_bus(ScriptedSlave::new(0x30));
    assert_eq!(
        bus.set_scl_low_timeout(MillisDurationU32::millis(0)),
        Err(ConfigurationError::ZeroTimeout)
    );
    assert_eq!(bus.config().scl_low_timeout, MillisDurationU32::millis(25));
    assert_eq!(bus.hardware().timeout_period_ms(), 25);
}

#[test]
fn test_arbitration_loss_reschedules_transfer() {
    let mut bus = SmbusController::new(
        SimBus::new().with_scripted(ScriptedSlave::new(0x30)),
        multi_master(RetryLimit::Attempts(4)),
    );
    bus.hardware_mut().arm_rival(RivalMaster::Write {
        target: 0x78,
        payload: vec![0x11, 0x22],
    });

    bus.write(0x30, None, &[0xAB]).unwrap();

    assert_eq!(
        bus.hardware().wire,
        vec![
            Start,
            Address { addr: 0x78, read: false },
            SlaveAck,
            Byte(0x11),
            SlaveAck,
            Byte(0x22),
            SlaveAck,
            Stop,
            Start,
            Address { addr: 0x30, read: false },
            SlaveAck,
            Byte(0xAB),
            SlaveAck,
            Stop,
        ]
    );
    assert_eq!(bus.stats().arbitration_reschedules, 1);
    assert_eq!(bus.transfer_error_count(), 0);
    assert!(bus.data_ready());

    let mut inbox = [0u8; 4];
    assert_eq!(bus.take_slave_data(&mut inbox), 2);
    assert_eq!(inbox[..2], [0x11, 0x22]);
    assert!(!bus.data_ready());
    assert_eq!(bus.slave_status().last_event, Some(SlaveEvent::Stop));
}

#[test]
fn test_rival_reads_slave_response() {
    let mut bus = SmbusController::new(
        SimBus::new().with_scripted(ScriptedSlave::new(0x30)),
        multi_master(RetryLimit::Unbounded),
    );
    bus.set_slave_response(&[0xDE, 0xAD, 0xBE]).unwrap();
    bus.hardware_mut().arm_rival(RivalMaster::Read {
        target: 0x78,
        count: 2,
    });

    bus.write(0x30, None, &[0x01]).unwrap();

    assert_eq!(bus.hardware().rival_received, vec![0xDE, 0xAD]);
    assert_eq!(bus.hardware().scripted.as_ref().unwrap().received, vec![0x01]);
    assert_eq!(bus.slave_status().tx_buffer_count, 1);
}

#[test]
fn test_slave_data_with_arbitration_lost_is_dropped() {
    let mut bus = SmbusController::new(
        SimBus::new().with_scripted(ScriptedSlave::new(0x30)),
        multi_master(RetryLimit::Attempts(4)),
    );
    bus.hardware_mut().arm_rival(RivalMaster::Write {
        target: 0x78,
        payload: vec![0x11, 0x22],
    });
    bus.hardware_mut().arblost_on_slave_data = true;

    bus.write(0x30, None, &[0xAB]).unwrap();

    let receive_error = bus
        .hardware()
        .serviced
        .iter()
        .find(|serviced| serviced.status == 0x0)
        .copied()
        .unwrap();
    assert!(!receive_error.sta);
    assert!(!receive_error.sto);
    assert!(!receive_error.ack);

    assert_eq!(
        bus.hardware().wire,
        vec![
            Start,
            Address { addr: 0x78, read: false },
            SlaveAck,
            Byte(0x11),
            SlaveNack,
            Stop,
            Start,
            Address { addr: 0x30, read: false },
            SlaveAck,
            Byte(0xAB),
            SlaveAck,
            Stop,
        ]
    );
    assert!(!bus.data_ready());
    assert_eq!(bus.slave_status().rx_buffer_count, 0);
    assert_eq!(bus.stats().arbitration_reschedules, 1);
    assert_eq!(bus.stats().completed, 1);
    assert_eq!(bus.transfer_error_count(), 0);
    assert_eq!(bus.hardware().enable_toggles, 0);
    assert!(!bus.is_busy());
}

#[test]
fn test_transmit_stop_keeps_pending_transfer() {
    let mut bus = SmbusController::new(
        SimBus::new().with_scripted(ScriptedSlave::new(0x30)),
        multi_master(RetryLimit::Unbounded),
    );
    bus.set_slave_response(&[0xDE, 0xAD]).unwrap();
    bus.hardware_mut().stop_while_transmitting = true;
    bus.hardware_mut().start_rival(RivalMaster::Read {
        target: 0x78,
        count: 1,
    });

    // Address match, then queue our own write while the rival still owns the bus.
    bus.service();
    let id = bus.begin_write(0x30, None, &[0x01]).unwrap();
    assert!(bus.is_busy());
    drive(&mut bus);

    let transmit_stop = bus
        .hardware()
        .serviced
        .iter()
        .find(|serviced| serviced.status == 0x5)
        .copied()
        .unwrap();
    assert!(!transmit_stop.sto);
    // The START latched for our write survives the rival's STOP.
    assert!(transmit_stop.sta);

    assert_eq!(bus.poll_write(id), Ok(()));
    assert_eq!(
        bus.hardware().wire,
        vec![
            Start,
            Address { addr: 0x78, read: true },
            SlaveAck,
            Byte(0xDE),
            MasterNack,
            Stop,
            Start,
            Address { addr: 0x30, read: false },
            SlaveAck,
            Byte(0x01),
            SlaveAck,
            Stop,
        ]
    );
    assert_eq!(bus.hardware().rival_received, vec![0xDE]);
    assert_eq!(bus.hardware().scripted.as_ref().unwrap().received, vec![0x01]);
    assert_eq!(bus.stats().arbitration_reschedules, 0);
    assert_eq!(bus.transfer_error_count(), 0);
    assert_eq!(bus.hardware().enable_toggles, 0);
    assert!(!bus.is_busy());
}

#[test]
fn test_arbitration_retry_limit() {
    let mut bus = SmbusController::new(
        SimBus::new().with_scripted(ScriptedSlave::new(0x30)),
        multi_master(RetryLimit::Attempts(0)),
    );
    bus.hardware_mut().arm_rival(RivalMaster::Write {
        target: 0x22,
        payload: vec![0x01],
    });

    assert_eq!(bus.write(0x30, None, &[0xAB]), Err(TransferError::ArbitrationLost));
    assert_eq!(bus.stats().arbitration_lost, 1);
    assert_eq!(bus.hardware().enable_toggles, 1);
    assert!(!bus.data_ready());
    assert_eq!(bus.slave_status().last_event, Some(SlaveEvent::Stop));
}

#[test]
fn test_slave_status_in_single_master_mode_is_desync() {
    let mut bus = slave_bus(ScriptedSlave::new(0x30));
    bus.hardware_mut().arm_rival(RivalMaster::Write {
        target: 0x78,
        payload: vec![0x11],
    });

    assert_eq!(
        bus.write(0x30, None, &[0xAB]),
        Err(TransferError::ProtocolDesync { status: 0x2 })
    );
    assert_eq!(bus.stats().desync, 1);
    assert_eq!(bus.hardware().enable_toggles, 1);
}

#[test]
fn test_failures_are_logged() {
    let mut bus = SmbusController::with_logger(
        SimBus::new().with_eeprom(SimEeprom::new(1)),
        single_master(),
        LineLog::default(),
    );
    bus.write(0x50, Some(0x00), &[0x01]).unwrap();
    bus.write(0x50, Some(0x01), &[0x02]).unwrap();
    let _ = bus.write(0x44, None, &[0x03]);

    let lines = &bus.logger_mut().0;
    assert!(lines.iter().any(|line| line.contains("ack-poll 1")));
    assert!(lines
        .iter()
        .any(|line| line.starts_with("error:") && line.contains("0x44") && line.contains("Nacked")));
}

#[test]
fn test_embedded_hal_write_read() {
    let mut bus = eeprom_bus(0);
    I2c::write(&mut bus, 0x50, &[0x10, 0x99]).unwrap();

    let mut buf = [0u8; 1];
    I2c::write_read(&mut bus, 0x50, &[0x10], &mut buf).unwrap();
    assert_eq!(buf, [0x99]);

    let mut reg = [0u8; 1];
    let mut ops = [Operation::Write(&[0x10]), Operation::Read(&mut reg)];
    I2c::transaction(&mut bus, 0x50, &mut ops).unwrap();
    assert_eq!(reg, [0x99]);

    assert_eq!(
        I2c::write_read(&mut bus, 0x50, &[0x10, 0x11], &mut buf),
        Err(TransferError::InvalidRequest)
    );
}

#[test]
fn test_shared_bus_serves_isr_and_foreground() {
    static BUS: SharedSmbus<SimBus> = SharedSmbus::new();
    static STOP: AtomicBool = AtomicBool::new(false);

    BUS.install(SmbusController::new(
        SimBus::new().with_eeprom(SimEeprom::new(2)),
        single_master(),
    ));
    let isr = thread::spawn(|| {
        while !STOP.load(Ordering::Relaxed) {
            BUS.on_interrupt();
            thread::yield_now();
        }
    });

    let mut eeprom = Eeprom24x::new(&BUS);
    eeprom.byte_write(0x10, 0x5A).unwrap();
    assert_eq!(eeprom.byte_read(0x10).unwrap(), 0x5A);

    STOP.store(true, Ordering::Relaxed);
    isr.join().unwrap();

    let bus = BUS.take().unwrap();
    assert_eq!(bus.stats().completed, 2);
    assert_eq!(bus.stats().ack_poll_retries, 2);
}

#[test]
fn test_concurrent_callers_never_interleave() {
    static BUS: SharedSmbus<SimBus> = SharedSmbus::new();
    static STOP: AtomicBool = AtomicBool::new(false);
    const ROUNDS: u8 = 20;

    BUS.install(SmbusController::new(
        SimBus::new().with_scripted(ScriptedSlave::new(0x30)),
        single_master(),
    ));
    let isr = thread::spawn(|| {
        while !STOP.load(Ordering::Relaxed) {
            BUS.on_interrupt();
            thread::yield_now();
        }
    });

    let callers: Vec<_> = [0xAAu8, 0xBB]
        .into_iter()
        .map(|tag| {
            thread::spawn(move || {
                for round in 0..ROUNDS {
                    BUS.write(0x30, None, &[tag, round]).unwrap();
                }
            })
        })
        .collect();
    for caller in callers {
        caller.join().unwrap();
    }
    STOP.store(true, Ordering::Relaxed);
    isr.join().unwrap();

    let bus = BUS.take().unwrap();
    let hw = bus.hardware();
    let received = &hw.scripted.as_ref().unwrap().received;
    assert_eq!(received.len(), 4 * usize::from(ROUNDS));
    for pair in received.chunks(2) {
        assert!(pair[0] == 0xAA || pair[0] == 0xBB);
        assert!(pair[1] < ROUNDS);
    }
    let starts = hw.wire.iter().filter(|event| **event == Start).count();
    let stops = hw.wire.iter().filter(|event| **event == Stop).count();
    assert_eq!(starts, 2 * usize::from(ROUNDS));
    assert_eq!(stops, starts);
}
