//! Schema type traits and top-level entry points
//!
//! Ticket record types implement [`Decodable`] and [`Encodable`] by calling
//! the decoder and encoder primitives field by field, in declaration order.

use crate::uper::config::CodecConfig;
use crate::uper::decoder::UperDecoder;
use crate::uper::encoder::UperEncoder;
use railcode_core::RailcodeResult;

/// A type that can be read from a UPER bit stream
pub trait Decodable: Sized {
    /// Decode a value, advancing the decoder past it
    fn decode_from(decoder: &mut UperDecoder<'_>) -> RailcodeResult<Self>;
}

/// A type that can be written to a UPER bit stream
pub trait Encodable {
    /// Encode this value at the current encoder position
    fn encode_to(&self, encoder: &mut UperEncoder) -> RailcodeResult<()>;
}

/// Decode a complete payload into `T`
///
/// Trailing padding bits after the value are ignored.
pub fn decode<T: Decodable>(bytes: &[u8]) -> RailcodeResult<T> {
    let mut decoder = UperDecoder::new(bytes);
    T::decode_from(&mut decoder)
}

/// Encode `value` into a byte payload, zero padded to a whole byte
pub fn encode<T: Encodable + ?Sized>(value: &T) -> RailcodeResult<Vec<u8>> {
    encode_with_config(value, &CodecConfig::default())
}

/// Encode `value` with a custom buffer configuration
pub fn encode_with_config<T: Encodable + ?Sized>(value: &T, config: &CodecConfig) -> RailcodeResult<Vec<u8>> {
    let mut encoder = UperEncoder::with_config(config)?;
    value.encode_to(&mut encoder)?;
    Ok(encoder.into_bytes())
}

/// Presence bit of an OPTIONAL field
pub fn presence_of<T>(value: &Option<T>) -> bool {
    value.is_some()
}

/// Presence bit of a DEFAULT field: set only when the value differs from
/// its default
pub fn is_non_default<T: PartialEq>(value: &T, default: &T) -> bool {
    value != default
}

impl Decodable for bool {
    fn decode_from(decoder: &mut UperDecoder<'_>) -> RailcodeResult<Self> {
        decoder.decode_boolean()
    }
}

impl Encodable for bool {
    fn encode_to(&self, encoder: &mut UperEncoder) -> RailcodeResult<()> {
        encoder.encode_boolean(*self)
    }
}

impl<T: Encodable + ?Sized> Encodable for &T {
    fn encode_to(&self, encoder: &mut UperEncoder) -> RailcodeResult<()> {
        (**self).encode_to(encoder)
    }
}

impl<T: Encodable> Encodable for Box<T> {
    fn encode_to(&self, encoder: &mut UperEncoder) -> RailcodeResult<()> {
        (**self).encode_to(encoder)
    }
}

impl<T: Decodable> Decodable for Box<T> {
    fn decode_from(decoder: &mut UperDecoder<'_>) -> RailcodeResult<Self> {
        T::decode_from(decoder).map(Box::new)
    }
}
