//! UPER decoder for ASN.1 values
//!
//! This module provides one decode primitive per ASN.1 construct. Schema
//! types call them in declaration order from their `Decodable` impl.
//!
//! # Usage Example
//!
//! ```rust
//! use railcode_asn1::uper::{IntegerConstraint, UperDecoder};
//!
//! let data = [0b1010_0000];
//! let mut decoder = UperDecoder::new(&data);
//! let value = decoder.decode_constrained_int(&IntegerConstraint::new(0, 7)).unwrap();
//! assert_eq!(value, 5);
//! ```

use crate::uper::bit_buffer::BitBuffer;
use crate::uper::codec::Decodable;
use crate::uper::types::{
    ChoiceDescriptor, EnumDescriptor, ExtensionAdditions, IntegerConstraint, LengthForm,
    SequenceHeader, SizeConstraint, StringConstraint, bits_needed,
};
use railcode_core::{BitString, RailcodeError, RailcodeResult};

/// UPER decoder
///
/// The decoder's whole state is the read cursor of its `BitBuffer`. It is
/// created per payload and threaded through nested `decode_from` calls as
/// `&mut`.
///
/// # Error Handling
///
/// The first failing primitive aborts the decode. Errors can occur due to:
/// - Buffer exhaustion (payload shorter than the schema requires)
/// - Decoded values outside their declared constraint
/// - Extension bits this codec does not follow (fragmented lengths,
///   extended integer values)
/// - Malformed content such as invalid UTF-8
pub struct UperDecoder<'a> {
    buffer: BitBuffer<'a>,
}

impl<'a> UperDecoder<'a> {
    /// Create a decoder reading `bytes` from the first bit
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            buffer: BitBuffer::from_slice(bytes),
        }
    }

    /// Create a decoder over an existing buffer, starting at its read position
    pub fn from_buffer(buffer: BitBuffer<'a>) -> Self {
        Self { buffer }
    }

    /// Current bit position
    pub fn position(&self) -> usize {
        self.buffer.position()
    }

    /// Bits left to decode
    pub fn remaining(&self) -> usize {
        self.buffer.remaining()
    }

    pub fn buffer(&self) -> &BitBuffer<'a> {
        &self.buffer
    }

    /// Direct access to the bits, for primitives this decoder does not cover
    pub fn buffer_mut(&mut self) -> &mut BitBuffer<'a> {
        &mut self.buffer
    }

    /// Decode a length determinant
    ///
    /// # Decoding Format
    /// - `0LLLLLLL`: length 0-127
    /// - `10LLLLLL LLLLLLLL`: length 128-16383
    /// - `11......`: fragmented, rejected
    pub fn decode_length_determinant(&mut self) -> RailcodeResult<usize> {
        if !self.buffer.get_bit()? {
            return Ok(self.buffer.get_bits(7)? as usize);
        }
        if !self.buffer.get_bit()? {
            return Ok(self.buffer.get_bits(14)? as usize);
        }
        Err(RailcodeError::UnsupportedExtension(format!(
            "Fragmented length determinant at bit {}",
            self.buffer.position() - 2
        )))
    }

    /// Decode a constrained whole number
    ///
    /// # Decoding Process
    /// 1. Read the extension bit if the constraint has a marker; a set bit fails
    /// 2. If the range holds a single value, return `min` without reading
    /// 3. Read `bits_needed(max - min)` bits and add `min`
    /// 4. Check the result against `max`
    pub fn decode_constrained_int(&mut self, constraint: &IntegerConstraint) -> RailcodeResult<i64> {
        let span = constraint.span()?;
        if constraint.has_extension_marker && self.buffer.get_bit()? {
            return Err(RailcodeError::UnsupportedExtension(format!(
                "Integer value outside the extensible range {}..{}",
                constraint.min, constraint.max
            )));
        }
        if span == 0 {
            return Ok(constraint.min);
        }

        let offset = self.buffer.get_bits(bits_needed(span))?;
        let value = i128::from(constraint.min) + i128::from(offset);
        if value > i128::from(constraint.max) {
            return Err(RailcodeError::ConstraintViolation(format!(
                "Decoded value {} exceeds {}..{}",
                value, constraint.min, constraint.max
            )));
        }
        Ok(value as i64)
    }

    /// Decode a constrained whole number from bare bounds
    pub fn decode_constrained_int_in(
        &mut self,
        min: i64,
        max: i64,
        has_extension_marker: bool,
    ) -> RailcodeResult<i64> {
        self.decode_constrained_int(&IntegerConstraint {
            min,
            max,
            has_extension_marker,
        })
    }

    /// Decode an unconstrained INTEGER: a length determinant followed by
    /// that many octets of big-endian two's complement
    pub fn decode_unconstrained_integer(&mut self) -> RailcodeResult<i64> {
        let length = self.decode_length_determinant()?;
        self.decode_unconstrained_integer_with_length(length)
    }

    /// Decode `length` octets of two's complement without a length prefix
    ///
    /// The high bit of the first octet is the sign and is extended through
    /// the remaining bits of the `i64`.
    pub fn decode_unconstrained_integer_with_length(&mut self, length: usize) -> RailcodeResult<i64> {
        check_integer_length(length)?;
        let bytes = self.buffer.get_bytes(length)?;

        let mut value: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        for &byte in &bytes {
            value = (value << 8) | i64::from(byte);
        }
        Ok(value)
    }

    /// Decode a semi-constrained INTEGER `(min..MAX)`: a length-prefixed
    /// unsigned offset from `min`
    pub fn decode_semi_constrained_integer(&mut self, min: i64) -> RailcodeResult<i64> {
        let length = self.decode_length_determinant()?;
        check_integer_length(length)?;
        let magnitude = self
            .buffer
            .get_bytes(length)?
            .iter()
            .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));

        let value = i128::from(min) + i128::from(magnitude);
        i64::try_from(value).map_err(|_| {
            RailcodeError::ConstraintViolation(format!(
                "Semi-constrained value {} does not fit in 64 bits",
                value
            ))
        })
    }

    /// Decode a BOOLEAN (one bit)
    pub fn decode_boolean(&mut self) -> RailcodeResult<bool> {
        self.buffer.get_bit()
    }

    /// Decode an ENUMERATED value index
    ///
    /// Extension values are numbered from `root_count` upwards.
    pub fn decode_enumerated(&mut self, descriptor: &EnumDescriptor) -> RailcodeResult<u64> {
        if descriptor.has_extension_marker && self.buffer.get_bit()? {
            let extension = self.decode_small_non_negative_integer()?;
            return descriptor.root_count.checked_add(extension).ok_or_else(|| {
                RailcodeError::MalformedContent(format!(
                    "Enumeration extension index {} overflows",
                    extension
                ))
            });
        }
        let constraint = descriptor.root_constraint()?;
        Ok(self.decode_constrained_int(&constraint)? as u64)
    }

    /// Decode a normally small non-negative whole number
    ///
    /// # Decoding Format
    /// - `0` + 6 bits: values 0-63
    /// - `1` + unconstrained integer: larger values
    pub fn decode_small_non_negative_integer(&mut self) -> RailcodeResult<u64> {
        if !self.buffer.get_bit()? {
            return self.buffer.get_bits(6);
        }
        let value = self.decode_unconstrained_integer()?;
        u64::try_from(value).map_err(|_| {
            RailcodeError::MalformedContent(format!(
                "Normally small number {} is negative",
                value
            ))
        })
    }

    /// Decode the length of an extension bitmask, which is written as `length - 1`
    pub fn decode_bitmask_length(&mut self) -> RailcodeResult<usize> {
        let value = self.decode_small_non_negative_integer()?;
        usize::try_from(value)
            .ok()
            .and_then(|value| value.checked_add(1))
            .ok_or_else(|| {
                RailcodeError::MalformedContent(format!("Bitmask length {} is too large", value))
            })
    }

    /// Resolve the length or count of a sized value
    fn decode_size(&mut self, size: &SizeConstraint) -> RailcodeResult<usize> {
        match size.form()? {
            LengthForm::Fixed { length, extensible } => {
                if extensible && self.buffer.get_bit()? {
                    return Err(RailcodeError::UnsupportedExtension(format!(
                        "Size outside the extensible fixed size {}",
                        length
                    )));
                }
                Ok(length)
            }
            LengthForm::Constrained(constraint) => Ok(self.decode_constrained_int(&constraint)? as usize),
            LengthForm::Unbounded { min } => {
                let length = self.decode_length_determinant()?;
                if !size.contains(length) {
                    return Err(RailcodeError::ConstraintViolation(format!(
                        "Length {} is below the minimum size {}",
                        length, min
                    )));
                }
                Ok(length)
            }
        }
    }

    /// Decode a character string of any supported kind
    ///
    /// IA5String, VisibleString and NumericString write each character as a
    /// constrained integer: the code point within the kind's range, or the
    /// index into the sorted permitted alphabet. UTF8String is delegated to
    /// [`decode_utf8_string`](Self::decode_utf8_string).
    pub fn decode_string(&mut self, constraint: &StringConstraint) -> RailcodeResult<String> {
        let Some(charset) = constraint.character_set()? else {
            return self.decode_utf8_string(&constraint.size);
        };

        let length = self.decode_size(&constraint.size)?;
        let char_constraint = charset.constraint();
        let mut text = String::with_capacity(length.min(self.buffer.remaining()));
        for _ in 0..length {
            let value = self.decode_constrained_int(&char_constraint)?;
            let c = charset.char_of(value).ok_or_else(|| {
                RailcodeError::MalformedContent(format!("Character value {} is not a character", value))
            })?;
            text.push(c);
        }
        Ok(text)
    }

    pub fn decode_ia5_string(&mut self, size: &SizeConstraint) -> RailcodeResult<String> {
        self.decode_string(&StringConstraint::ia5().with_size(*size))
    }

    pub fn decode_visible_string(&mut self, size: &SizeConstraint) -> RailcodeResult<String> {
        self.decode_string(&StringConstraint::visible().with_size(*size))
    }

    pub fn decode_numeric_string(&mut self, size: &SizeConstraint) -> RailcodeResult<String> {
        self.decode_string(&StringConstraint::numeric().with_size(*size))
    }

    /// Decode a UTF8String: a length determinant counting octets, then the
    /// octets themselves
    ///
    /// `size` bounds the number of characters; it does not change the wire form.
    pub fn decode_utf8_string(&mut self, size: &SizeConstraint) -> RailcodeResult<String> {
        let length = self.decode_length_determinant()?;
        let text = String::from_utf8(self.buffer.get_bytes(length)?)?;
        let chars = text.chars().count();
        if !size.contains(chars) {
            return Err(RailcodeError::ConstraintViolation(format!(
                "UTF8String of {} characters violates its size constraint",
                chars
            )));
        }
        Ok(text)
    }

    /// Decode an OCTET STRING
    pub fn decode_octet_string(&mut self, size: &SizeConstraint) -> RailcodeResult<Vec<u8>> {
        let length = self.decode_size(size)?;
        self.buffer.get_bytes(length)
    }

    /// Decode a BIT STRING
    pub fn decode_bit_string(&mut self, size: &SizeConstraint) -> RailcodeResult<BitString> {
        let num_bits = self.decode_size(size)?;
        self.buffer.require(num_bits)?;
        let mut bytes = Vec::with_capacity(num_bits.div_ceil(8));
        for _ in 0..num_bits / 8 {
            bytes.push(self.buffer.get_byte()?);
        }
        let tail = num_bits % 8;
        if tail != 0 {
            let bits = self.buffer.get_bits(tail as u32)? as u8;
            bytes.push(bits << (8 - tail));
        }
        BitString::new(bytes, num_bits)
    }

    /// Decode a SEQUENCE OF schema values
    pub fn decode_sequence_of<T: Decodable>(&mut self, size: &SizeConstraint) -> RailcodeResult<Vec<T>> {
        self.decode_sequence_of_with(size, T::decode_from)
    }

    /// Decode a SEQUENCE OF values read by `decode_item`, for element types
    /// that are primitives with their own constraint
    pub fn decode_sequence_of_with<T, F>(&mut self, size: &SizeConstraint, mut decode_item: F) -> RailcodeResult<Vec<T>>
    where
        F: FnMut(&mut Self) -> RailcodeResult<T>,
    {
        let count = self.decode_size(size)?;
        // Zero-bit elements make `count` unbounded by the input
        let mut items = Vec::with_capacity(count.min(self.buffer.remaining()));
        for _ in 0..count {
            items.push(decode_item(self)?);
        }
        Ok(items)
    }

    /// Decode the index of the chosen CHOICE alternative
    ///
    /// # Decoding Format
    /// - extension bit set: `root_count` + normally small number
    /// - one root alternative: index 0, no bits
    /// - otherwise: constrained integer over `0..root_count - 1`
    pub fn decode_choice_index(&mut self, descriptor: &ChoiceDescriptor) -> RailcodeResult<usize> {
        let root_count = descriptor.root_count();
        if descriptor.has_extension_marker && self.buffer.get_bit()? {
            let extension = self.decode_small_non_negative_integer()?;
            return usize::try_from(extension)
                .ok()
                .and_then(|extension| root_count.checked_add(extension))
                .ok_or_else(|| {
                    RailcodeError::MalformedContent(format!(
                        "Choice extension index {} overflows",
                        extension
                    ))
                });
        }
        match root_count {
            0 => Err(RailcodeError::ConstraintViolation(
                "CHOICE has no root alternatives".to_string(),
            )),
            1 => Ok(0),
            count => Ok(self.decode_constrained_int(&IntegerConstraint::new(0, count as i64 - 1))? as usize),
        }
    }

    /// Decode an open type holding a `T`
    ///
    /// The value is decoded by a fresh decoder scoped to exactly the
    /// length-prefixed bytes, so padding after the value is ignored and the
    /// outer cursor always lands after the open type.
    pub fn decode_open_type<T: Decodable>(&mut self) -> RailcodeResult<T> {
        self.decode_open_type_with(T::decode_from)
    }

    /// Decode an open type with a custom reader
    pub fn decode_open_type_with<T, F>(&mut self, decode_inner: F) -> RailcodeResult<T>
    where
        F: FnOnce(&mut UperDecoder<'_>) -> RailcodeResult<T>,
    {
        let length = self.decode_length_determinant()?;
        let bytes = self.buffer.get_bytes(length)?;
        let mut inner = UperDecoder::from_buffer(BitBuffer::from_vec(bytes));
        decode_inner(&mut inner)
    }

    /// Skip an open type without looking at its content
    ///
    /// # Returns
    /// Returns the number of bytes skipped.
    pub fn skip_open_type(&mut self) -> RailcodeResult<usize> {
        let length = self.decode_length_determinant()?;
        self.buffer.skip(length * 8)?;
        log::trace!(
            "Skipped open type of {} bytes, now at bit {}",
            length,
            self.buffer.position()
        );
        Ok(length)
    }

    /// Decode `count` presence bits, in field declaration order
    pub fn decode_presence_bitmap(&mut self, count: usize) -> RailcodeResult<Vec<bool>> {
        (0..count).map(|_| self.buffer.get_bit()).collect()
    }

    /// Decode the extension bit and the presence bitmap of a SEQUENCE
    ///
    /// `optional_count` is the number of OPTIONAL and DEFAULT fields the
    /// schema declares for the type.
    pub fn decode_sequence_header(
        &mut self,
        has_extension_marker: bool,
        optional_count: usize,
    ) -> RailcodeResult<SequenceHeader> {
        let extended = has_extension_marker && self.buffer.get_bit()?;
        let presence = self.decode_presence_bitmap(optional_count)?;
        Ok(SequenceHeader { extended, presence })
    }

    /// Decode the presence bitmap of the extension additions that follow the
    /// root fields of an extended SEQUENCE
    pub fn decode_extension_additions(&mut self) -> RailcodeResult<ExtensionAdditions> {
        let length = self.decode_bitmask_length()?;
        let presence = self.decode_presence_bitmap(length)?;
        let additions = ExtensionAdditions { presence };
        log::debug!(
            "SEQUENCE carries {} of {} extension additions",
            additions.present_count(),
            additions.len()
        );
        Ok(additions)
    }

    /// Decode extension addition `index` if present
    pub fn decode_extension_addition<T: Decodable>(
        &mut self,
        additions: &ExtensionAdditions,
        index: usize,
    ) -> RailcodeResult<Option<T>> {
        if !additions.is_present(index) {
            return Ok(None);
        }
        self.decode_open_type().map(Some)
    }

    /// Skip every present addition from slot `from` onwards
    ///
    /// # Returns
    /// Returns the number of additions skipped.
    pub fn skip_extension_additions(
        &mut self,
        additions: &ExtensionAdditions,
        from: usize,
    ) -> RailcodeResult<usize> {
        let mut skipped = 0;
        for index in from..additions.len() {
            if additions.is_present(index) {
                self.skip_open_type()?;
                skipped += 1;
            }
        }
        if skipped > 0 {
            log::warn!("Skipped {} unknown extension additions", skipped);
        }
        Ok(skipped)
    }

    /// Finish a SEQUENCE whose type knows no extension additions
    pub fn skip_unknown_extensions(&mut self, header: &SequenceHeader) -> RailcodeResult<()> {
        if header.extended {
            let additions = self.decode_extension_additions()?;
            self.skip_extension_additions(&additions, 0)?;
        }
        Ok(())
    }

    /// Decode an OPTIONAL schema value gated by its presence bit
    pub fn decode_optional<T: Decodable>(&mut self, present: bool) -> RailcodeResult<Option<T>> {
        self.decode_optional_with(present, T::decode_from)
    }

    /// Decode an OPTIONAL value with a custom reader
    pub fn decode_optional_with<T, F>(&mut self, present: bool, decode_value: F) -> RailcodeResult<Option<T>>
    where
        F: FnOnce(&mut Self) -> RailcodeResult<T>,
    {
        if present { decode_value(self).map(Some) } else { Ok(None) }
    }

    /// Decode a DEFAULT schema value; `default` stands in when the presence bit is clear
    pub fn decode_default<T: Decodable>(&mut self, present: bool, default: T) -> RailcodeResult<T> {
        self.decode_default_with(present, default, T::decode_from)
    }

    /// Decode a DEFAULT value with a custom reader
    pub fn decode_default_with<T, F>(&mut self, present: bool, default: T, decode_value: F) -> RailcodeResult<T>
    where
        F: FnOnce(&mut Self) -> RailcodeResult<T>,
    {
        if present { decode_value(self) } else { Ok(default) }
    }
}

fn check_integer_length(length: usize) -> RailcodeResult<()> {
    if length == 0 {
        return Err(RailcodeError::MalformedContent(
            "Integer encoding has no content octets".to_string(),
        ));
    }
    if length > 8 {
        return Err(RailcodeError::MalformedContent(format!(
            "Integer of {} octets does not fit in 64 bits",
            length
        )));
    }
    Ok(())
}
