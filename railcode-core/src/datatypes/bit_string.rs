//! Bit string type for ASN.1 BIT STRING values

use crate::error::{RailcodeError, RailcodeResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of an ASN.1 BIT STRING, possibly empty
///
/// Bit 0 is the most significant bit of the first byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitString {
    #[serde(with = "serde_bytes")]
    bytes: Vec<u8>,
    num_bits: usize,
}

impl BitString {
    /// Wrap `bytes` as a string of `num_bits` bits
    ///
    /// # Arguments
    /// * `bytes` - Packed bits, MSB first
    /// * `num_bits` - Number of meaningful bits in `bytes`
    ///
    /// # Error Handling
    /// Returns `InvalidData` if `num_bits > bytes.len() * 8` or if `bytes` carries
    /// whole bytes beyond the ones needed for `num_bits`.
    pub fn new(bytes: Vec<u8>, num_bits: usize) -> RailcodeResult<Self> {
        if num_bits > bytes.len() * 8 {
            return Err(RailcodeError::InvalidData(format!(
                "bit string is too short to hold all bits. Need {} bytes for {} bits",
                num_bits.div_ceil(8),
                num_bits
            )));
        }
        if bytes.len() > num_bits.div_ceil(8) {
            return Err(RailcodeError::InvalidData(format!(
                "bit string has {} bytes but only {} bits",
                bytes.len(),
                num_bits
            )));
        }

        let mut bit_string = Self { bytes, num_bits };
        bit_string.clear_unused_bits();
        Ok(bit_string)
    }

    /// Create an all-zero bit string of `num_bits` bits
    pub fn zeros(num_bits: usize) -> Self {
        Self {
            bytes: vec![0u8; num_bits.div_ceil(8)],
            num_bits,
        }
    }

    /// Create a bit string from individual bit values, first element first
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut bit_string = Self::zeros(bits.len());
        for (index, &bit) in bits.iter().enumerate() {
            if bit {
                bit_string.bytes[index / 8] |= 0x80 >> (index % 8);
            }
        }
        bit_string
    }

    /// Packed bits, MSB first, with the unused tail of the last byte cleared
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length in bits
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    pub fn is_empty(&self) -> bool {
        self.num_bits == 0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Value of bit `index`, or `None` past the end
    pub fn get(&self, index: usize) -> Option<bool> {
        (index < self.num_bits).then(|| self.bytes[index / 8] & (0x80 >> (index % 8)) != 0)
    }

    /// Flip bit `index` to `value`
    ///
    /// # Error Handling
    /// Returns `InvalidData` when `index` is not below `num_bits()`.
    pub fn set(&mut self, index: usize, value: bool) -> RailcodeResult<()> {
        if index >= self.num_bits {
            return Err(RailcodeError::InvalidData(format!(
                "bit {} is outside a {}-bit string",
                index, self.num_bits
            )));
        }
        let mask = 0x80 >> (index % 8);
        let byte = &mut self.bytes[index / 8];
        *byte = if value { *byte | mask } else { *byte & !mask };
        Ok(())
    }

    /// Iterate over the bits, first bit first
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.num_bits).map(move |index| self.bytes[index / 8] & (0x80 >> (index % 8)) != 0)
    }

    fn clear_unused_bits(&mut self) {
        let used = self.num_bits % 8;
        if used != 0 {
            if let Some(last) = self.bytes.last_mut() {
                *last &= 0xFF << (8 - used);
            }
        }
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}
