//! ASN.1 processing module for rail-ticket barcodes
//!
//! This crate provides the Unaligned Packed Encoding Rules (UPER) codec
//! engine used by the ticket schema types: a bit-addressable buffer, the
//! decoder/encoder primitives, the constraint descriptors that parameterize
//! them, and the `Decodable`/`Encodable` traits schema types implement.

pub mod uper;

pub use railcode_core::{RailcodeError, RailcodeResult};
pub use uper::{
    BitBuffer, ChoiceAlternative, ChoiceDescriptor, CodecConfig, Decodable, Encodable,
    EnumDescriptor, ExtensionAdditions, IntegerConstraint, SequenceHeader, SizeConstraint,
    StringConstraint, StringKind, UperDecoder, UperEncoder, bits_needed, decode, encode,
    encode_with_config,
};
