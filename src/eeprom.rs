// Licensed under the Apache-2.0 license

//! Driver for 24LC02B-style serial EEPROMs.
//!
//! Every access carries the one-byte word address as a sub-address. Writes
//! are single-byte write cycles, ack-polled until the device finishes its
//! internal write; reads are random reads.

use crate::smbus::common::MAX_TRANSFER_LEN;
use crate::smbus::error::TransferError;
use crate::smbus::traits::BlockingSmbus;
use embedded_hal::i2c::SevenBitAddress;

/// Bus address of the device with A2..A0 tied low (0xA0 in 8-bit form).
pub const EEPROM_ADDRESS: SevenBitAddress = 0x50;

pub struct Eeprom24x<B: BlockingSmbus> {
    bus: B,
    address: SevenBitAddress,
}

impl<B: BlockingSmbus> Eeprom24x<B> {
    pub fn new(bus: B) -> Self {
        Self::with_address(bus, EEPROM_ADDRESS)
    }

    pub fn with_address(bus: B, address: SevenBitAddress) -> Self {
        Self { bus, address }
    }

    pub fn release(self) -> B {
        self.bus
    }

    /// Write `data` at word address `addr`.
    ///
    /// # Errors
    ///
    /// Returns the [`TransferError`] of the failed write cycle.
    pub fn byte_write(&mut self, addr: u8, data: u8) -> Result<(), TransferError> {
        self.bus.write(self.address, Some(addr), &[data])
    }

    /// Write `src` starting at `dest`, one byte-write cycle per byte.
    ///
    /// The word address wraps from 0xFF to 0x00.
    ///
    /// # Errors
    ///
    /// Stops at the first failed byte and returns its error.
    pub fn write_array(&mut self, dest: u8, src: &[u8]) -> Result<(), TransferError> {
        let mut addr = dest;
        for &byte in src {
            self.byte_write(addr, byte)?;
            addr = addr.wrapping_add(1);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the [`TransferError`] of the failed random read.
    pub fn byte_read(&mut self, addr: u8) -> Result<u8, TransferError> {
        let mut byte = [0u8; 1];
        self.bus.read(self.address, Some(addr), &mut byte)?;
        let [value] = byte;
        Ok(value)
    }

    /// Fill `dest` from word address `src` with sequential random reads.
    ///
    /// Each transaction reads up to [`MAX_TRANSFER_LEN`] bytes.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failed transaction.
    pub fn read_array(&mut self, src: u8, dest: &mut [u8]) -> Result<(), TransferError> {
        let mut addr = src;
        for chunk in dest.chunks_mut(MAX_TRANSFER_LEN) {
            self.bus.read(self.address, Some(addr), chunk)?;
            // Chunks are at most 32 bytes, so this never truncates.
            addr = addr.wrapping_add(chunk.len() as u8);
        }
        Ok(())
    }

    /// Fill `dest` one random read per byte.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failed read.
    pub fn read_array_bytewise(&mut self, src: u8, dest: &mut [u8]) -> Result<(), TransferError> {
        let mut addr = src;
        for slot in dest.iter_mut() {
            *slot = self.byte_read(addr)?;
            addr = addr.wrapping_add(1);
        }
        Ok(())
    }
}
