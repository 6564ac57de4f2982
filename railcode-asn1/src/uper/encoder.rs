//! UPER encoder for ASN.1 values
//!
//! This module mirrors [`UperDecoder`](crate::uper::UperDecoder): every
//! decode primitive has an `encode_*` counterpart with the same branch
//! conditions, producing the inverse bit pattern.
//!
//! # Usage Example
//!
//! ```rust
//! use railcode_asn1::uper::{IntegerConstraint, UperEncoder};
//!
//! let mut encoder = UperEncoder::new();
//! encoder.encode_constrained_int(5, &IntegerConstraint::new(0, 7)).unwrap();
//! assert_eq!(encoder.into_bytes(), vec![0b1010_0000]);
//! ```

use crate::uper::MAX_LENGTH_DETERMINANT;
use crate::uper::bit_buffer::BitBuffer;
use crate::uper::codec::Encodable;
use crate::uper::config::CodecConfig;
use crate::uper::types::{
    ChoiceDescriptor, EnumDescriptor, IntegerConstraint, LengthForm, SizeConstraint,
    StringConstraint, bits_needed,
};
use railcode_core::{BitString, RailcodeError, RailcodeResult};

/// UPER encoder
///
/// Bits accumulate in a growable `BitBuffer`; [`into_bytes`](Self::into_bytes)
/// materializes them as `ceil(bits / 8)` bytes with zero padding.
///
/// # Root-only Output
///
/// The encoder can write every primitive, including open types, but the
/// SEQUENCE header helper always writes the extension bit as 0. Payloads
/// produced through schema types therefore never carry extension additions.
///
/// # Error Handling
///
/// Encoding fails, without wrapping or truncating, when:
/// - A value lies outside its declared constraint
/// - A length reaches 16384, which needs the unsupported fragmented form
/// - The buffer would grow past its configured maximum
pub struct UperEncoder {
    buffer: BitBuffer<'static>,
    config: CodecConfig,
}

impl UperEncoder {
    /// Create an encoder with the default configuration
    pub fn new() -> Self {
        let config = CodecConfig::default();
        Self {
            buffer: BitBuffer::with_config(&config),
            config,
        }
    }

    /// Create an encoder with a custom buffer configuration
    ///
    /// # Error Handling
    /// Returns error if the configuration does not validate.
    pub fn with_config(config: &CodecConfig) -> RailcodeResult<Self> {
        config.validate()?;
        Ok(Self {
            buffer: BitBuffer::with_config(config),
            config: *config,
        })
    }

    /// Bits written so far
    pub fn position(&self) -> usize {
        self.buffer.write_position()
    }

    pub fn buffer(&self) -> &BitBuffer<'static> {
        &self.buffer
    }

    /// Direct access to the bits, for primitives this encoder does not cover
    pub fn buffer_mut(&mut self) -> &mut BitBuffer<'static> {
        &mut self.buffer
    }

    /// The written bits as `0`/`1` characters
    pub fn to_bit_string(&self) -> String {
        self.buffer.to_bit_string()
    }

    /// Materialize the encoded payload
    pub fn into_bytes(self) -> Vec<u8> {
        let bits = self.buffer.write_position();
        let bytes = self.buffer.into_bytes();
        log::debug!("Encoded {} bits into {} bytes", bits, bytes.len());
        bytes
    }

    /// Encode a length determinant
    ///
    /// # Encoding Format
    /// - 0-127: `0LLLLLLL`
    /// - 128-16383: `10LLLLLL LLLLLLLL`
    /// - 16384 and above: rejected, the fragmented form is not supported
    pub fn encode_length_determinant(&mut self, length: usize) -> RailcodeResult<()> {
        if length < 128 {
            self.buffer.put_bit(false)?;
            return self.buffer.put_bits(length as u64, 7);
        }
        if length <= MAX_LENGTH_DETERMINANT {
            self.buffer.put_bits(0b10, 2)?;
            return self.buffer.put_bits(length as u64, 14);
        }
        Err(RailcodeError::UnsupportedExtension(format!(
            "Length {} needs a fragmented length determinant",
            length
        )))
    }

    /// Encode a constrained whole number
    ///
    /// # Encoding Process
    /// 1. Check `value` against `min..=max`; out-of-range values fail
    /// 2. Write a 0 extension bit if the constraint has a marker
    /// 3. Write `value - min` in `bits_needed(max - min)` bits
    pub fn encode_constrained_int(&mut self, value: i64, constraint: &IntegerConstraint) -> RailcodeResult<()> {
        let span = constraint.span()?;
        if !constraint.contains(value) {
            return Err(RailcodeError::ConstraintViolation(format!(
                "Value {} outside {}..{}",
                value, constraint.min, constraint.max
            )));
        }
        if constraint.has_extension_marker {
            self.buffer.put_bit(false)?;
        }
        let offset = value.wrapping_sub(constraint.min) as u64;
        self.buffer.put_bits(offset, bits_needed(span))
    }

    /// Encode a constrained whole number from bare bounds
    pub fn encode_constrained_int_in(
        &mut self,
        value: i64,
        min: i64,
        max: i64,
        has_extension_marker: bool,
    ) -> RailcodeResult<()> {
        self.encode_constrained_int(
            value,
            &IntegerConstraint {
                min,
                max,
                has_extension_marker,
            },
        )
    }

    /// Encode an unconstrained INTEGER as a length determinant and the
    /// minimal big-endian two's complement octets
    pub fn encode_unconstrained_integer(&mut self, value: i64) -> RailcodeResult<()> {
        let octets = twos_complement_octets(value);
        self.encode_length_determinant(octets.len())?;
        self.buffer.put_bytes(&octets)
    }

    /// Encode the two's complement octets of `value` without a length prefix
    ///
    /// # Returns
    /// Returns the number of octets written.
    pub fn encode_unconstrained_integer_content(&mut self, value: i64) -> RailcodeResult<usize> {
        let octets = twos_complement_octets(value);
        self.buffer.put_bytes(&octets)?;
        Ok(octets.len())
    }

    /// Encode a semi-constrained INTEGER `(min..MAX)` as a length-prefixed
    /// unsigned offset from `min`
    pub fn encode_semi_constrained_integer(&mut self, value: i64, min: i64) -> RailcodeResult<()> {
        if value < min {
            return Err(RailcodeError::ConstraintViolation(format!(
                "Value {} below the lower bound {}",
                value, min
            )));
        }
        let magnitude = value.wrapping_sub(min) as u64;
        let octets = unsigned_octets(magnitude);
        self.encode_length_determinant(octets.len())?;
        self.buffer.put_bytes(&octets)
    }

    /// Encode a BOOLEAN (one bit)
    pub fn encode_boolean(&mut self, value: bool) -> RailcodeResult<()> {
        self.buffer.put_bit(value)
    }

    /// Encode an ENUMERATED value index
    ///
    /// Indexes at or above `root_count` are extension values and need an
    /// extension marker on the descriptor.
    pub fn encode_enumerated(&mut self, value: u64, descriptor: &EnumDescriptor) -> RailcodeResult<()> {
        if value < descriptor.root_count {
            if descriptor.has_extension_marker {
                self.buffer.put_bit(false)?;
            }
            let constraint = descriptor.root_constraint()?;
            return self.encode_constrained_int(value as i64, &constraint);
        }
        if !descriptor.has_extension_marker {
            return Err(RailcodeError::ConstraintViolation(format!(
                "Enumeration value {} outside {} root values",
                value, descriptor.root_count
            )));
        }
        self.buffer.put_bit(true)?;
        self.encode_small_non_negative_integer(value - descriptor.root_count)
    }

    /// Encode a normally small non-negative whole number
    ///
    /// # Encoding Format
    /// - 0-63: `0` + 6 bits
    /// - larger: `1` + unconstrained integer
    pub fn encode_small_non_negative_integer(&mut self, value: u64) -> RailcodeResult<()> {
        if value <= 63 {
            self.buffer.put_bit(false)?;
            return self.buffer.put_bits(value, 6);
        }
        let value = i64::try_from(value).map_err(|_| {
            RailcodeError::ConstraintViolation(format!("Normally small number {} is too large", value))
        })?;
        self.buffer.put_bit(true)?;
        self.encode_unconstrained_integer(value)
    }

    /// Encode the length of an extension bitmask as `length - 1`
    pub fn encode_bitmask_length(&mut self, length: usize) -> RailcodeResult<()> {
        if length == 0 {
            return Err(RailcodeError::InvalidData(
                "Extension bitmask must have at least one bit".to_string(),
            ));
        }
        self.encode_small_non_negative_integer(length as u64 - 1)
    }

    /// Write the length or count of a sized value
    fn encode_size(&mut self, length: usize, size: &SizeConstraint) -> RailcodeResult<()> {
        if !size.contains(length) {
            return Err(RailcodeError::ConstraintViolation(format!(
                "Length {} violates size constraint {:?}..{:?}",
                length, size.min, size.max
            )));
        }
        match size.form()? {
            LengthForm::Fixed { extensible, .. } => {
                if extensible {
                    self.buffer.put_bit(false)?;
                }
                Ok(())
            }
            LengthForm::Constrained(constraint) => self.encode_constrained_int(length as i64, &constraint),
            LengthForm::Unbounded { .. } => self.encode_length_determinant(length),
        }
    }

    /// Encode a character string of any supported kind
    pub fn encode_string(&mut self, text: &str, constraint: &StringConstraint) -> RailcodeResult<()> {
        let Some(charset) = constraint.character_set()? else {
            return self.encode_utf8_string(text, &constraint.size);
        };

        let values = text
            .chars()
            .map(|c| {
                charset.value_of(c).ok_or_else(|| {
                    RailcodeError::ConstraintViolation(format!(
                        "Character {:?} is not permitted in {:?} string",
                        c, constraint.kind
                    ))
                })
            })
            .collect::<RailcodeResult<Vec<i64>>>()?;

        self.encode_size(values.len(), &constraint.size)?;
        let char_constraint = charset.constraint();
        for value in values {
            self.encode_constrained_int(value, &char_constraint)?;
        }
        Ok(())
    }

    pub fn encode_ia5_string(&mut self, text: &str, size: &SizeConstraint) -> RailcodeResult<()> {
        self.encode_string(text, &StringConstraint::ia5().with_size(*size))
    }

    pub fn encode_visible_string(&mut self, text: &str, size: &SizeConstraint) -> RailcodeResult<()> {
        self.encode_string(text, &StringConstraint::visible().with_size(*size))
    }

    pub fn encode_numeric_string(&mut self, text: &str, size: &SizeConstraint) -> RailcodeResult<()> {
        self.encode_string(text, &StringConstraint::numeric().with_size(*size))
    }

    /// Encode a UTF8String as a length determinant and its octets
    pub fn encode_utf8_string(&mut self, text: &str, size: &SizeConstraint) -> RailcodeResult<()> {
        let chars = text.chars().count();
        if !size.contains(chars) {
            return Err(RailcodeError::ConstraintViolation(format!(
                "UTF8String of {} characters violates its size constraint",
                chars
            )));
        }
        self.encode_length_determinant(text.len())?;
        self.buffer.put_bytes(text.as_bytes())
    }

    /// Encode an OCTET STRING
    pub fn encode_octet_string(&mut self, value: &[u8], size: &SizeConstraint) -> RailcodeResult<()> {
        self.encode_size(value.len(), size)?;
        self.buffer.put_bytes(value)
    }

    /// Encode a BIT STRING
    pub fn encode_bit_string(&mut self, value: &BitString, size: &SizeConstraint) -> RailcodeResult<()> {
        let num_bits = value.num_bits();
        self.encode_size(num_bits, size)?;
        let bytes = value.as_bytes();
        for &byte in &bytes[..num_bits / 8] {
            self.buffer.put_byte(byte)?;
        }
        let tail = num_bits % 8;
        if tail != 0 {
            let last = bytes[num_bits / 8] >> (8 - tail);
            self.buffer.put_bits(u64::from(last), tail as u32)?;
        }
        Ok(())
    }

    /// Encode a SEQUENCE OF schema values
    pub fn encode_sequence_of<T: Encodable>(&mut self, items: &[T], size: &SizeConstraint) -> RailcodeResult<()> {
        self.encode_sequence_of_with(items, size, |encoder, item| item.encode_to(encoder))
    }

    /// Encode a SEQUENCE OF values written by `encode_item`
    pub fn encode_sequence_of_with<T, F>(&mut self, items: &[T], size: &SizeConstraint, mut encode_item: F) -> RailcodeResult<()>
    where
        F: FnMut(&mut Self, &T) -> RailcodeResult<()>,
    {
        self.encode_size(items.len(), size)?;
        for item in items {
            encode_item(self, item)?;
        }
        Ok(())
    }

    /// Encode the index of the chosen CHOICE alternative
    pub fn encode_choice_index(&mut self, index: usize, descriptor: &ChoiceDescriptor) -> RailcodeResult<()> {
        let root_count = descriptor.root_count();
        if index < root_count {
            if descriptor.has_extension_marker {
                self.buffer.put_bit(false)?;
            }
            if root_count == 1 {
                return Ok(());
            }
            return self.encode_constrained_int(index as i64, &IntegerConstraint::new(0, root_count as i64 - 1));
        }
        if !descriptor.has_extension_marker {
            return Err(RailcodeError::InvalidData(format!(
                "Choice index {} outside {} root alternatives",
                index, root_count
            )));
        }
        self.buffer.put_bit(true)?;
        self.encode_small_non_negative_integer((index - root_count) as u64)
    }

    /// Encode `value` as an open type: a length determinant followed by its
    /// complete encoding, padded to whole bytes
    ///
    /// An empty encoding is written as a single zero octet.
    pub fn encode_open_type<T: Encodable>(&mut self, value: &T) -> RailcodeResult<()> {
        self.encode_open_type_with(|inner| value.encode_to(inner))
    }

    /// Encode an open type with a custom writer
    pub fn encode_open_type_with<F>(&mut self, encode_inner: F) -> RailcodeResult<()>
    where
        F: FnOnce(&mut UperEncoder) -> RailcodeResult<()>,
    {
        let mut inner = UperEncoder::with_config(&self.config)?;
        encode_inner(&mut inner)?;
        let mut bytes = inner.buffer.into_bytes();
        if bytes.is_empty() {
            bytes.push(0);
        }
        self.encode_length_determinant(bytes.len())?;
        self.buffer.put_bytes(&bytes)
    }

    /// Encode presence bits, in field declaration order
    pub fn encode_presence_bitmap(&mut self, presence: &[bool]) -> RailcodeResult<()> {
        for &present in presence {
            self.buffer.put_bit(present)?;
        }
        Ok(())
    }

    /// Encode the header of a SEQUENCE: a 0 extension bit when the type is
    /// extensible, then the presence bitmap
    pub fn encode_sequence_header(&mut self, has_extension_marker: bool, presence: &[bool]) -> RailcodeResult<()> {
        if has_extension_marker {
            self.buffer.put_bit(false)?;
        }
        self.encode_presence_bitmap(presence)
    }

    /// Encode an OPTIONAL value if present
    pub fn encode_optional_with<T, F>(&mut self, value: Option<&T>, encode_value: F) -> RailcodeResult<()>
    where
        F: FnOnce(&mut Self, &T) -> RailcodeResult<()>,
    {
        match value {
            Some(value) => encode_value(self, value),
            None => Ok(()),
        }
    }

    /// Encode an OPTIONAL schema value if present
    pub fn encode_optional<T: Encodable>(&mut self, value: Option<&T>) -> RailcodeResult<()> {
        self.encode_optional_with(value, |encoder, value| value.encode_to(encoder))
    }
}

impl Default for UperEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal big-endian two's complement octets of `value`
///
/// A leading 0x00 or 0xFF octet is kept only when dropping it would flip
/// the sign of the remaining octets.
pub fn twos_complement_octets(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

/// Minimal big-endian unsigned octets of `value`, at least one
fn unsigned_octets(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&byte| byte != 0).unwrap_or(bytes.len() - 1);
    bytes[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uper::decoder::UperDecoder;
    use crate::uper::types::ChoiceAlternative;

    #[test]
    fn test_encode_boolean() {
        let mut encoder = UperEncoder::new();
        encoder.encode_boolean(true).unwrap();
        assert_eq!(encoder.to_bit_string(), "1");
        assert_eq!(encoder.into_bytes(), vec![0x80]);
    }

    #[test]
    fn test_encode_constrained_int() {
        let mut encoder = UperEncoder::new();
        encoder.encode_constrained_int_in(5, 0, 7, false).unwrap();
        assert_eq!(encoder.to_bit_string(), "101");
    }

    #[test]
    fn test_degenerate_range_writes_nothing() {
        let mut encoder = UperEncoder::new();
        encoder.encode_constrained_int_in(9, 9, 9, false).unwrap();
        assert_eq!(encoder.position(), 0);
        assert!(encoder.into_bytes().is_empty());
    }

    #[test]
    fn test_constrained_int_out_of_range() {
        let mut encoder = UperEncoder::new();
        let err = encoder.encode_constrained_int_in(8, 0, 7, false).unwrap_err();
        assert!(matches!(err, RailcodeError::ConstraintViolation(_)));
        assert!(encoder.encode_constrained_int_in(1, 5, 0, false).is_err());
        assert_eq!(encoder.position(), 0);
    }

    #[test]
    fn test_extensible_int_writes_marker() {
        let mut encoder = UperEncoder::new();
        encoder.encode_constrained_int(5, &IntegerConstraint::extensible(0, 7)).unwrap();
        assert_eq!(encoder.to_bit_string(), "0101");
    }

    #[test]
    fn test_encode_length_determinant() {
        let mut encoder = UperEncoder::new();
        encoder.encode_length_determinant(100).unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x64]);

        let mut encoder = UperEncoder::new();
        encoder.encode_length_determinant(127).unwrap();
        assert_eq!(encoder.into_bytes(), vec![0b0111_1111]);

        let mut encoder = UperEncoder::new();
        encoder.encode_length_determinant(128).unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x80, 0x80]);

        let mut encoder = UperEncoder::new();
        encoder.encode_length_determinant(200).unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x80, 0xC8]);

        let mut encoder = UperEncoder::new();
        encoder.encode_length_determinant(16383).unwrap();
        assert_eq!(encoder.into_bytes(), vec![0xBF, 0xFF]);
    }

    #[test]
    fn test_length_determinant_limit() {
        let mut encoder = UperEncoder::new();
        let err = encoder.encode_length_determinant(16384).unwrap_err();
        assert!(matches!(err, RailcodeError::UnsupportedExtension(_)));
    }

    #[test]
    fn test_twos_complement_boundaries() {
        assert_eq!(twos_complement_octets(0), vec![0x00]);
        assert_eq!(twos_complement_octets(127), vec![0x7F]);
        assert_eq!(twos_complement_octets(128), vec![0x00, 0x80]);
        assert_eq!(twos_complement_octets(255), vec![0x00, 0xFF]);
        assert_eq!(twos_complement_octets(256), vec![0x01, 0x00]);
        assert_eq!(twos_complement_octets(-1), vec![0xFF]);
        assert_eq!(twos_complement_octets(-128), vec![0x80]);
        assert_eq!(twos_complement_octets(-129), vec![0xFF, 0x7F]);
        assert_eq!(twos_complement_octets(-32768), vec![0x80, 0x00]);
        assert_eq!(twos_complement_octets(-32769), vec![0xFF, 0x7F, 0xFF]);
        assert_eq!(twos_complement_octets(i64::MAX).len(), 8);
        assert_eq!(twos_complement_octets(i64::MIN), vec![0x80, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_unconstrained_integer_round_trip_at_boundaries() {
        for value in [0, 1, -1, 127, 128, -128, -129, 255, 256, 32767, 32768, -32768, -32769, i64::MAX, i64::MIN] {
            let mut encoder = UperEncoder::new();
            encoder.encode_boolean(true).unwrap();
            encoder.encode_unconstrained_integer(value).unwrap();
            let bytes = encoder.into_bytes();

            let mut decoder = UperDecoder::new(&bytes);
            assert!(decoder.decode_boolean().unwrap());
            assert_eq!(decoder.decode_unconstrained_integer().unwrap(), value);
        }
    }

    #[test]
    fn test_encode_semi_constrained_integer() {
        let mut encoder = UperEncoder::new();
        encoder.encode_semi_constrained_integer(250, -5).unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x01, 0xFF]);

        let mut encoder = UperEncoder::new();
        assert!(encoder.encode_semi_constrained_integer(-6, -5).is_err());
    }

    #[test]
    fn test_encode_enumerated() {
        let mut encoder = UperEncoder::new();
        encoder.encode_enumerated(2, &EnumDescriptor::new(3)).unwrap();
        assert_eq!(encoder.to_bit_string(), "10");

        let mut encoder = UperEncoder::new();
        encoder.encode_enumerated(4, &EnumDescriptor::extensible(3)).unwrap();
        assert_eq!(encoder.to_bit_string(), "10000001");

        let mut encoder = UperEncoder::new();
        assert!(encoder.encode_enumerated(3, &EnumDescriptor::new(3)).is_err());
    }

    #[test]
    fn test_encode_small_non_negative_integer() {
        let mut encoder = UperEncoder::new();
        encoder.encode_small_non_negative_integer(63).unwrap();
        assert_eq!(encoder.to_bit_string(), "0111111");

        let mut encoder = UperEncoder::new();
        encoder.encode_small_non_negative_integer(100).unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x80, 0xB2, 0x00]);
    }

    #[test]
    fn test_encode_ia5_string() {
        let mut encoder = UperEncoder::new();
        encoder.encode_ia5_string("HI!", &SizeConstraint::fixed(3)).unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x91, 0x25, 0x08]);
    }

    #[test]
    fn test_string_constraint_violations() {
        let mut encoder = UperEncoder::new();
        let err = encoder.encode_ia5_string("HI", &SizeConstraint::fixed(3)).unwrap_err();
        assert!(matches!(err, RailcodeError::ConstraintViolation(_)));

        let err = encoder.encode_ia5_string("é", &SizeConstraint::unbounded()).unwrap_err();
        assert!(matches!(err, RailcodeError::ConstraintViolation(_)));

        let err = encoder.encode_visible_string("a\tb", &SizeConstraint::unbounded()).unwrap_err();
        assert!(matches!(err, RailcodeError::ConstraintViolation(_)));

        let alphabet = StringConstraint::ia5().with_alphabet("ABC");
        assert!(encoder.encode_string("ABD", &alphabet).is_err());
    }

    #[test]
    fn test_string_round_trips() {
        let constraints = [
            (StringConstraint::visible().with_size(SizeConstraint::range(1, 20)), "Zurich HB"),
            (StringConstraint::numeric().with_size(SizeConstraint::fixed(5)), "12 45"),
            (StringConstraint::ia5().with_alphabet("0123456789ABCDEF"), "CAFE42"),
            (StringConstraint::utf8(), "Genève → Zürich"),
        ];
        for (constraint, text) in constraints {
            let mut encoder = UperEncoder::new();
            encoder.encode_string(text, &constraint).unwrap();
            let bytes = encoder.into_bytes();
            let mut decoder = UperDecoder::new(&bytes);
            assert_eq!(decoder.decode_string(&constraint).unwrap(), text);
        }
    }

    #[test]
    fn test_encode_octet_string() {
        let mut encoder = UperEncoder::new();
        encoder.encode_octet_string(&[0xAB, 0xCD], &SizeConstraint::range(1, 4)).unwrap();
        assert_eq!(encoder.into_bytes(), vec![0b0110_1010, 0b1111_0011, 0b0100_0000]);

        let mut encoder = UperEncoder::new();
        assert!(encoder.encode_octet_string(&[0x01], &SizeConstraint::fixed(2)).is_err());
    }

    #[test]
    fn test_encode_bit_string() {
        let bits = BitString::from_bits(&[true, false, true, true, false, false, false, false, true, true]);
        let mut encoder = UperEncoder::new();
        encoder.encode_bit_string(&bits, &SizeConstraint::unbounded()).unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x0A, 0b1011_0000, 0b1100_0000]);
    }

    #[test]
    fn test_encode_sequence_of_with() {
        let mut encoder = UperEncoder::new();
        encoder
            .encode_sequence_of_with(&[3i64, 15], &SizeConstraint::range(0, 3), |e, v| {
                e.encode_constrained_int_in(*v, 0, 15, false)
            })
            .unwrap();
        assert_eq!(encoder.to_bit_string(), "1000111111");

        let mut encoder = UperEncoder::new();
        let err = encoder
            .encode_sequence_of(&[true, false, true, true], &SizeConstraint::range(0, 3))
            .unwrap_err();
        assert!(matches!(err, RailcodeError::ConstraintViolation(_)));
    }

    #[test]
    fn test_encode_choice_index() {
        const ALTERNATIVES: &[ChoiceAlternative] = &[
            ChoiceAlternative::root(0, "a"),
            ChoiceAlternative::root(1, "b"),
            ChoiceAlternative::root(2, "c"),
        ];
        let extensible = ChoiceDescriptor::new(ALTERNATIVES, true);
        let closed = ChoiceDescriptor::new(ALTERNATIVES, false);

        let mut encoder = UperEncoder::new();
        encoder.encode_choice_index(2, &extensible).unwrap();
        assert_eq!(encoder.to_bit_string(), "010");

        let mut encoder = UperEncoder::new();
        encoder.encode_choice_index(3, &extensible).unwrap();
        assert_eq!(encoder.to_bit_string(), "10000000");

        let mut encoder = UperEncoder::new();
        assert!(encoder.encode_choice_index(3, &closed).is_err());

        const SINGLE: &[ChoiceAlternative] = &[ChoiceAlternative::root(0, "only")];
        let mut encoder = UperEncoder::new();
        encoder.encode_choice_index(0, &ChoiceDescriptor::new(SINGLE, false)).unwrap();
        assert_eq!(encoder.position(), 0);
    }

    #[test]
    fn test_encode_open_type() {
        let mut encoder = UperEncoder::new();
        encoder
            .encode_open_type_with(|inner| inner.encode_constrained_int_in(5, 0, 7, false))
            .unwrap();
        encoder.encode_boolean(true).unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x01, 0b1010_0000, 0x80]);
    }

    #[test]
    fn test_empty_open_type_is_one_octet() {
        let mut encoder = UperEncoder::new();
        encoder.encode_open_type_with(|_| Ok(())).unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x01, 0x00]);
    }

    #[test]
    fn test_sequence_header_is_root_only() {
        let mut encoder = UperEncoder::new();
        encoder.encode_sequence_header(true, &[true, false, true]).unwrap();
        assert_eq!(encoder.to_bit_string(), "0101");
    }

    #[test]
    fn test_with_config_limit() {
        let config = CodecConfig::new()
            .with_initial_capacity(1)
            .with_max_buffer_bytes(2);
        let mut encoder = UperEncoder::with_config(&config).unwrap();
        let err = encoder
            .encode_octet_string(&[1, 2, 3], &SizeConstraint::fixed(3))
            .unwrap_err();
        assert!(matches!(err, RailcodeError::BufferLimit { .. }));

        assert!(UperEncoder::with_config(&CodecConfig::new().with_max_buffer_bytes(0)).is_err());
    }

    #[test]
    fn test_encode_max_only_size() {
        let at_most = SizeConstraint {
            min: None,
            max: Some(3),
            has_extension_marker: false,
        };
        let mut encoder = UperEncoder::new();
        encoder.encode_octet_string(&[0x01, 0x02], &at_most).unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x80, 0x40, 0x80]);

        let mut encoder = UperEncoder::new();
        let err = encoder.encode_octet_string(&[1, 2, 3, 4, 5], &at_most).unwrap_err();
        assert!(matches!(err, RailcodeError::ConstraintViolation(_)));
    }

    #[test]
    fn test_encode_extensible_sizes() {
        let mut encoder = UperEncoder::new();
        encoder
            .encode_octet_string(&[0xAB, 0xCD], &SizeConstraint::fixed(2).extensible())
            .unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x55, 0xE6, 0x80]);

        let mut encoder = UperEncoder::new();
        encoder
            .encode_octet_string(&[0xAB, 0xCD], &SizeConstraint::range(1, 4).extensible())
            .unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x35, 0x79, 0xA0]);

        let mut encoder = UperEncoder::new();
        let err = encoder
            .encode_sequence_of(&[true; 5], &SizeConstraint::range(1, 4).extensible())
            .unwrap_err();
        assert!(matches!(err, RailcodeError::ConstraintViolation(_)));
        assert_eq!(encoder.position(), 0);
    }

    #[test]
    fn test_extensible_size_round_trip() {
        let size = SizeConstraint::range(0, 6).extensible();
        let text = "8500";
        let constraint = StringConstraint::numeric().with_size(size);
        let mut encoder = UperEncoder::new();
        encoder.encode_string(text, &constraint).unwrap();
        // ext 0, count 100, then '8' '5' '0' '0' as alphabet indexes
        assert_eq!(encoder.to_bit_string(), "01001001011000010001");
        let bytes = encoder.into_bytes();
        assert_eq!(UperDecoder::new(&bytes).decode_string(&constraint).unwrap(), text);
    }

    #[test]
    fn test_unconstrained_integer_content_round_trip() {
        for (value, octets) in [(-129, 2), (-128, 1), (127, 1), (128, 2)] {
            let mut encoder = UperEncoder::new();
            let mut written = 0;
            encoder
                .encode_open_type_with(|inner| {
                    written = inner.encode_unconstrained_integer_content(value)?;
                    Ok(())
                })
                .unwrap();
            assert_eq!(written, octets);
            let bytes = encoder.into_bytes();
            assert_eq!(bytes[0] as usize, octets);

            let mut decoder = UperDecoder::new(&bytes);
            let decoded = decoder
                .decode_open_type_with(|inner| {
                    let length = inner.remaining() / 8;
                    inner.decode_unconstrained_integer_with_length(length)
                })
                .unwrap();
            assert_eq!(decoded, value);
        }
    }
}
