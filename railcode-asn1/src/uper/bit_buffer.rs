//! Bit-addressable storage for UPER encoding and decoding
//!
//! `BitBuffer` keeps two independent cursors measured in bits: a read
//! cursor that consumes bits and a write cursor that appends them. Bits are
//! ordered MSB-first within each byte, which is the canonical UPER order.
//!
//! # Usage Example
//!
//! ```rust
//! use railcode_asn1::uper::BitBuffer;
//!
//! let mut buffer = BitBuffer::new();
//! buffer.put_bits(0b101, 3).unwrap();
//! buffer.put_bit(true).unwrap();
//! assert_eq!(buffer.get_bits(3).unwrap(), 0b101);
//! assert_eq!(buffer.into_bytes(), vec![0xB0]);
//! ```

use crate::uper::config::{CodecConfig, DEFAULT_MAX_BUFFER_BYTES};
use railcode_core::{RailcodeError, RailcodeResult};
use std::borrow::Cow;
use std::fmt;

/// Bit-level read/write buffer
///
/// # Cursors
///
/// - The read cursor never passes the write cursor. Reading beyond the
///   written bits fails with `BufferExhausted`; nothing is zero-filled.
/// - The write cursor only moves forward. When it reaches the end of the
///   allocated storage the storage doubles, up to the configured maximum.
///
/// A buffer built with [`BitBuffer::from_slice`] borrows its bytes and
/// treats all of them as written, so it can be decoded without a copy.
#[derive(Debug, Clone)]
pub struct BitBuffer<'a> {
    data: Cow<'a, [u8]>,
    read_pos: usize,
    write_pos: usize,
    max_bytes: usize,
}

impl BitBuffer<'static> {
    /// Create an empty buffer with the default configuration
    pub fn new() -> Self {
        Self::with_config(&CodecConfig::default())
    }

    /// Create an empty buffer pre-sized according to `config`
    pub fn with_config(config: &CodecConfig) -> Self {
        Self {
            data: Cow::Owned(vec![0u8; config.initial_capacity]),
            read_pos: 0,
            write_pos: 0,
            max_bytes: config.max_buffer_bytes,
        }
    }

    /// Take ownership of already-encoded bytes; every bit counts as written
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let write_pos = bytes.len() * 8;
        let max_bytes = DEFAULT_MAX_BUFFER_BYTES.max(bytes.len());
        Self {
            data: Cow::Owned(bytes),
            read_pos: 0,
            write_pos,
            max_bytes,
        }
    }
}

impl<'a> BitBuffer<'a> {
    /// Wrap externally supplied bytes for decoding
    pub fn from_slice(bytes: &'a [u8]) -> Self {
        Self {
            data: Cow::Borrowed(bytes),
            read_pos: 0,
            write_pos: bytes.len() * 8,
            max_bytes: DEFAULT_MAX_BUFFER_BYTES.max(bytes.len()),
        }
    }

    /// Read cursor, in bits from the start of the buffer
    pub fn position(&self) -> usize {
        self.read_pos
    }

    /// Write cursor, in bits from the start of the buffer
    pub fn write_position(&self) -> usize {
        self.write_pos
    }

    /// Bits available to read
    pub fn remaining(&self) -> usize {
        self.write_pos - self.read_pos
    }

    /// Allocated storage, in bits
    pub fn capacity_bits(&self) -> usize {
        self.data.len() * 8
    }

    /// Move the read cursor to an absolute bit position
    ///
    /// # Error Handling
    /// Returns error if `position` lies beyond the written bits.
    pub fn seek(&mut self, position: usize) -> RailcodeResult<()> {
        if position > self.write_pos {
            return Err(RailcodeError::InvalidData(format!(
                "Cannot seek to bit {}, only {} bits written",
                position, self.write_pos
            )));
        }
        self.read_pos = position;
        Ok(())
    }

    pub(crate) fn require(&self, count: usize) -> RailcodeResult<()> {
        let available = self.remaining();
        if count > available {
            return Err(RailcodeError::BufferExhausted {
                needed: count,
                available,
            });
        }
        Ok(())
    }

    /// Read a single bit
    pub fn get_bit(&mut self) -> RailcodeResult<bool> {
        let bit = self.peek_bit()?;
        self.read_pos += 1;
        Ok(bit)
    }

    /// Look at the next bit without consuming it
    pub fn peek_bit(&self) -> RailcodeResult<bool> {
        self.require(1)?;
        let byte = self.data[self.read_pos / 8];
        Ok((byte >> (7 - self.read_pos % 8)) & 1 == 1)
    }

    /// Read `count` bits (0-64) as an unsigned integer, first bit most significant
    ///
    /// Reading zero bits is a no-op returning 0.
    pub fn get_bits(&mut self, count: u32) -> RailcodeResult<u64> {
        if count > 64 {
            return Err(RailcodeError::InvalidData(format!(
                "Cannot read {} bits into a 64-bit value",
                count
            )));
        }
        let count = count as usize;
        self.require(count)?;

        let mut value = 0u64;
        let mut left = count;
        while left > 0 {
            let byte = self.data[self.read_pos / 8];
            let offset = self.read_pos % 8;
            let take = left.min(8 - offset);
            let chunk = (byte >> (8 - offset - take)) & (0xFFu8 >> (8 - take));
            value = (value << take) | u64::from(chunk);
            self.read_pos += take;
            left -= take;
        }
        Ok(value)
    }

    /// Read 8 bits
    pub fn get_byte(&mut self) -> RailcodeResult<u8> {
        Ok(self.get_bits(8)? as u8)
    }

    /// Read `count` bytes, which need not be byte aligned in the buffer
    pub fn get_bytes(&mut self, count: usize) -> RailcodeResult<Vec<u8>> {
        let bits = count.checked_mul(8).ok_or_else(|| {
            RailcodeError::InvalidData(format!("Byte count {} overflows bit position", count))
        })?;
        self.require(bits)?;

        if self.read_pos % 8 == 0 {
            let start = self.read_pos / 8;
            self.read_pos += bits;
            return Ok(self.data[start..start + count].to_vec());
        }

        let mut bytes = Vec::with_capacity(count);
        for _ in 0..count {
            bytes.push(self.get_byte()?);
        }
        Ok(bytes)
    }

    /// Discard `count` bits
    pub fn skip(&mut self, count: usize) -> RailcodeResult<()> {
        self.require(count)?;
        self.read_pos += count;
        Ok(())
    }

    /// Discard bits up to the next multiple of 8
    pub fn align_read(&mut self) -> RailcodeResult<()> {
        let padding = (8 - self.read_pos % 8) % 8;
        self.skip(padding)
    }

    /// Make room for `extra` more bits after the write cursor
    ///
    /// # Growth Strategy
    /// Storage doubles until it fits, capped at the configured maximum.
    fn reserve_bits(&mut self, extra: usize) -> RailcodeResult<()> {
        let needed_bytes = self
            .write_pos
            .checked_add(extra)
            .map(|bits| bits.div_ceil(8))
            .ok_or(RailcodeError::BufferLimit {
                requested: usize::MAX,
                limit: self.max_bytes,
            })?;
        if needed_bytes <= self.data.len() {
            return Ok(());
        }
        if needed_bytes > self.max_bytes {
            return Err(RailcodeError::BufferLimit {
                requested: needed_bytes,
                limit: self.max_bytes,
            });
        }
        let grown = (self.data.len() * 2).max(needed_bytes).min(self.max_bytes);
        self.data.to_mut().resize(grown, 0);
        Ok(())
    }

    /// Write a single bit
    pub fn put_bit(&mut self, bit: bool) -> RailcodeResult<()> {
        self.put_bits(u64::from(bit), 1)
    }

    /// Write the low `count` bits (0-64) of `value`, most significant first
    ///
    /// Bits of `value` above `count` are ignored. Writing zero bits is a no-op.
    pub fn put_bits(&mut self, value: u64, count: u32) -> RailcodeResult<()> {
        if count > 64 {
            return Err(RailcodeError::InvalidData(format!(
                "Cannot write {} bits from a 64-bit value",
                count
            )));
        }
        let count = count as usize;
        self.reserve_bits(count)?;

        let data = self.data.to_mut();
        let mut left = count;
        while left > 0 {
            let offset = self.write_pos % 8;
            let take = left.min(8 - offset);
            let chunk = ((value >> (left - take)) as u8) & (0xFFu8 >> (8 - take));
            let shift = 8 - offset - take;
            let mask = (0xFFu8 >> (8 - take)) << shift;
            let byte = &mut data[self.write_pos / 8];
            *byte = (*byte & !mask) | (chunk << shift);
            self.write_pos += take;
            left -= take;
        }
        Ok(())
    }

    /// Write 8 bits
    pub fn put_byte(&mut self, byte: u8) -> RailcodeResult<()> {
        self.put_bits(u64::from(byte), 8)
    }

    /// Write whole bytes at the current bit position
    pub fn put_bytes(&mut self, bytes: &[u8]) -> RailcodeResult<()> {
        if self.write_pos % 8 == 0 {
            self.reserve_bits(bytes.len() * 8)?;
            let start = self.write_pos / 8;
            self.data.to_mut()[start..start + bytes.len()].copy_from_slice(bytes);
            self.write_pos += bytes.len() * 8;
            return Ok(());
        }
        for &byte in bytes {
            self.put_byte(byte)?;
        }
        Ok(())
    }

    /// Pad with zero bits up to the next multiple of 8
    pub fn align_write(&mut self) -> RailcodeResult<()> {
        let padding = (8 - self.write_pos % 8) % 8;
        self.put_bits(0, padding as u32)
    }

    /// The written bytes, the last one zero padded
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.write_pos.div_ceil(8)]
    }

    /// Materialize the written bits as `ceil(bits / 8)` bytes
    ///
    /// Unused storage is dropped and the trailing partial byte is zero padded.
    pub fn into_bytes(self) -> Vec<u8> {
        let len = self.write_pos.div_ceil(8);
        let used = self.write_pos % 8;
        let mut bytes = self.data.into_owned();
        bytes.truncate(len);
        if used != 0 {
            if let Some(last) = bytes.last_mut() {
                *last &= 0xFFu8 << (8 - used);
            }
        }
        bytes
    }

    /// The written bits as a string of `0` and `1` characters
    pub fn to_bit_string(&self) -> String {
        (0..self.write_pos)
            .map(|index| {
                if (self.data[index / 8] >> (7 - index % 8)) & 1 == 1 {
                    '1'
                } else {
                    '0'
                }
            })
            .collect()
    }
}

impl Default for BitBuffer<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BitBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bit_string())
    }
}
