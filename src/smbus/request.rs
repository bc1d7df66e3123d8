// Licensed under the Apache-2.0 license

//! Transfer request layer.
//!
//! Claims the bus, arms a [`TransferRequest`] on the controller and issues
//! START. Completion is reported through a [`TransferId`] that the caller polls,
//! blocks on, or awaits. The interrupt handlers do all the bus work.

use crate::common::Logger;
use crate::smbus::common::{Direction, MAX_SEVEN_BIT_ADDRESS, MAX_TRANSFER_LEN};
use crate::smbus::controller::{ActiveTransfer, SmbusController};
use crate::smbus::error::TransferError;
use crate::smbus::state_machine::MasterPhase;
use crate::smbus::traits::SmbusHardware;
use core::future::poll_fn;
use core::task::Poll;
use embedded_hal::i2c::SevenBitAddress;
use heapless::Vec;

/// One master transfer, as armed by the caller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    pub target: SevenBitAddress,
    /// Final direction of the data phase.
    pub direction: Direction,
    /// Byte written after the address, before any data.
    pub sub_address: Option<u8>,
    /// After the sub-address, issue a repeated START and read.
    pub restart_to_read: bool,
    /// Treat a NACK as "device busy" and retry with STOP+START.
    pub ack_poll: bool,
    pub byte_count: usize,
}

impl TransferRequest {
    #[must_use]
    pub const fn write(target: SevenBitAddress, byte_count: usize) -> Self {
        Self {
            target,
            direction: Direction::Write,
            sub_address: None,
            restart_to_read: false,
            ack_poll: false,
            byte_count,
        }
    }

    #[must_use]
    pub const fn read(target: SevenBitAddress, byte_count: usize) -> Self {
        Self {
            target,
            direction: Direction::Read,
            sub_address: None,
            restart_to_read: false,
            ack_poll: false,
            byte_count,
        }
    }

    /// Prefix the data with `sub_address`. On a read this makes it a random read.
    #[must_use]
    pub const fn with_sub_address(mut self, sub_address: u8) -> Self {
        self.sub_address = Some(sub_address);
        if matches!(self.direction, Direction::Read) {
            self.restart_to_read = true;
        }
        self
    }

    #[must_use]
    pub const fn with_ack_poll(mut self, ack_poll: bool) -> Self {
        self.ack_poll = ack_poll;
        self
    }

    #[must_use]
    pub const fn sub_address_present(&self) -> bool {
        self.sub_address.is_some()
    }

    /// Check the request against `payload_len` bytes supplied for a write.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidRequest`] when the target does not fit
    /// in 7 bits, the count exceeds [`MAX_TRANSFER_LEN`], a write payload does
    /// not match the count, or the sub-address and restart flags disagree with
    /// the direction.
    pub fn validate(&self, payload_len: usize) -> Result<(), TransferError> {
        if self.target > MAX_SEVEN_BIT_ADDRESS || self.byte_count > MAX_TRANSFER_LEN {
            return Err(TransferError::InvalidRequest);
        }
        let consistent = match self.direction {
            Direction::Write => !self.restart_to_read && payload_len == self.byte_count,
            Direction::Read => self.restart_to_read == self.sub_address_present(),
        };
        if consistent {
            Ok(())
        } else {
            Err(TransferError::InvalidRequest)
        }
    }
}

/// Ticket for an armed transfer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TransferId(pub(crate) u32);

impl TransferId {
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Controller-owned data for the transfer in flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferBuffer {
    Write(Vec<u8, MAX_TRANSFER_LEN>),
    Read(Vec<u8, MAX_TRANSFER_LEN>),
}

impl TransferBuffer {
    pub(crate) fn for_request(
        request: &TransferRequest,
        payload: &[u8],
    ) -> Result<Self, TransferError> {
        match request.direction {
            Direction::Write => Vec::from_slice(payload)
                .map(TransferBuffer::Write)
                .map_err(|()| TransferError::InvalidRequest),
            Direction::Read => Ok(TransferBuffer::Read(Vec::new())),
        }
    }

    /// Bytes the caller may collect: received data for a read, nothing for a write.
    pub(crate) fn into_received(self) -> Vec<u8, MAX_TRANSFER_LEN> {
        match self {
            TransferBuffer::Read(data) => data,
            TransferBuffer::Write(_) => Vec::new(),
        }
    }
}

/// Outcome of a finished transfer, held until the caller collects it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRecord {
    pub id: TransferId,
    pub result: Result<(), TransferError>,
    pub data: Vec<u8, MAX_TRANSFER_LEN>,
}

impl<H: SmbusHardware, L: Logger> SmbusController<H, L> {
    /// Arm `request` and issue START.
    ///
    /// `payload` carries the bytes of a write and is ignored for a read.
    ///
    /// # Errors
    ///
    /// * `nb::Error::WouldBlock` while another transfer owns the bus
    /// * [`TransferError::InvalidRequest`] if the request fails validation
    pub fn begin(
        &mut self,
        request: TransferRequest,
        payload: &[u8],
    ) -> nb::Result<TransferId, TransferError> {
        let payload: &[u8] = match request.direction {
            Direction::Write => payload,
            Direction::Read => &[],
        };
        request.validate(payload.len())?;
        let buffer = TransferBuffer::for_request(&request, payload)?;

        if !self.ownership.try_claim() {
            return Err(nb::Error::WouldBlock);
        }

        let id = TransferId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.active = Some(ActiveTransfer::new(id, request, buffer));
        self.fsm.phase = MasterPhase::Starting;
        self.logger.debug(format_args!(
            "smbus: #{} {:?} 0x{:02x} sub {:?} len {}",
            id.0, request.direction, request.target, request.sub_address, request.byte_count
        ));
        self.hardware.request_start(true);
        Ok(id)
    }

    /// Start writing `bytes` to `target`.
    ///
    /// With a sub-address the transfer ack-polls, so a device still busy with
    /// an internal write cycle is retried rather than failed.
    ///
    /// # Errors
    ///
    /// See [`begin`](Self::begin).
    pub fn begin_write(
        &mut self,
        target: SevenBitAddress,
        sub_address: Option<u8>,
        bytes: &[u8],
    ) -> nb::Result<TransferId, TransferError> {
        let mut request = TransferRequest::write(target, bytes.len());
        if let Some(sub) = sub_address {
            request = request.with_sub_address(sub).with_ack_poll(true);
        }
        self.begin(request, bytes)
    }

    /// Start reading `count` bytes from `target`, as a random read when a
    /// sub-address is given.
    ///
    /// # Errors
    ///
    /// See [`begin`](Self::begin).
    pub fn begin_read(
        &mut self,
        target: SevenBitAddress,
        sub_address: Option<u8>,
        count: usize,
    ) -> nb::Result<TransferId, TransferError> {
        let mut request = TransferRequest::read(target, count);
        if let Some(sub) = sub_address {
            request = request.with_sub_address(sub).with_ack_poll(true);
        }
        self.begin(request, &[])
    }

    /// Collect the outcome of `id`, copying received bytes into `buffer`.
    ///
    /// Returns the number of bytes copied. Nothing is copied for a failed
    /// transfer.
    ///
    /// # Errors
    ///
    /// * `nb::Error::WouldBlock` while `id` is still in flight
    /// * the transfer's own [`TransferError`] if it failed
    /// * [`TransferError::OutcomeLost`] if the outcome was evicted or `id` is unknown
    pub fn poll(&mut self, id: TransferId, buffer: &mut [u8]) -> nb::Result<usize, TransferError> {
        if let Some(record) = self.take_record(id) {
            record.result?;
            let count = record.data.len().min(buffer.len());
            if let (Some(dst), Some(src)) = (buffer.get_mut(..count), record.data.get(..count)) {
                dst.copy_from_slice(src);
            }
            return Ok(count);
        }
        match &self.active {
            Some(active) if active.id == id => Err(nb::Error::WouldBlock),
            _ => Err(nb::Error::Other(TransferError::OutcomeLost)),
        }
    }

    /// # Errors
    ///
    /// See [`poll`](Self::poll).
    pub fn poll_write(&mut self, id: TransferId) -> nb::Result<(), TransferError> {
        self.poll(id, &mut []).map(|_| ())
    }

    /// # Errors
    ///
    /// See [`poll`](Self::poll).
    pub fn poll_read(&mut self, id: TransferId, buffer: &mut [u8]) -> nb::Result<usize, TransferError> {
        self.poll(id, buffer)
    }

    /// Wait for `id` to finish, servicing the hardware on every poll.
    ///
    /// # Errors
    ///
    /// See [`poll`](Self::poll).
    pub async fn wait(&mut self, id: TransferId, buffer: &mut [u8]) -> Result<usize, TransferError> {
        poll_fn(|cx| {
            self.service();
            match self.poll(id, buffer) {
                Ok(count) => Poll::Ready(Ok(count)),
                Err(nb::Error::Other(e)) => Poll::Ready(Err(e)),
                Err(nb::Error::WouldBlock) => {
                    cx.waker().wake_by_ref();
                    Poll::Pending
                }
            }
        })
        .await
    }

    /// Write `data` to `target` and block until the transfer finishes.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`TransferError`] of the transfer.
    pub fn write(
        &mut self,
        target: SevenBitAddress,
        sub_address: Option<u8>,
        data: &[u8],
    ) -> Result<(), TransferError> {
        let id = nb::block!({
            self.service();
            self.begin_write(target, sub_address, data)
        })?;
        nb::block!({
            self.service();
            self.poll_write(id)
        })
    }

    /// Fill `buffer` from `target` and block until the transfer finishes.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`TransferError`] of the transfer. `buffer` is
    /// untouched on failure.
    pub fn read(
        &mut self,
        target: SevenBitAddress,
        sub_address: Option<u8>,
        buffer: &mut [u8],
    ) -> Result<(), TransferError> {
        let id = nb::block!({
            self.service();
            self.begin_read(target, sub_address, buffer.len())
        })?;
        nb::block!({
            self.service();
            self.poll_read(id, buffer)
        })
        .map(|_| ())
    }

    fn take_record(&mut self, id: TransferId) -> Option<TransferRecord> {
        let mut found = None;
        for _ in 0..self.records.len() {
            let Some(record) = self.records.pop_front() else {
                break;
            };
            if found.is_none() && record.id == id {
                found = Some(record);
            } else {
                // Cannot overflow: one slot was just freed.
                let _ = self.records.push_back(record);
            }
        }
        found
    }
}
