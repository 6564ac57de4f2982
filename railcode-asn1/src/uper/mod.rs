//! UPER (Unaligned Packed Encoding Rules) encoder and decoder for ASN.1
//!
//! This module provides the UPER codec engine used by rail-ticket barcode
//! payloads, as specified in ITU-T X.691 (unaligned variant).
//!
//! # ASN.1 UPER Encoding Overview
//!
//! UPER has no byte alignment between fields. Every value consumes the
//! minimum number of bits implied by its declared constraints, MSB first:
//!
//! ```text
//! [ext bit] [presence bitmap] [field] [field] ... [extension additions]
//! ```
//!
//! ## Constrained Integers
//!
//! A value constrained to `min..=max` is written as the offset `value - min`
//! in `bits_needed(max - min)` bits. A range holding a single value takes
//! zero bits.
//!
//! ## Length Determinants
//!
//! - **Short form** (8 bits): lengths 0-127, `0LLLLLLL`
//! - **Long form** (16 bits): lengths 128-16383, `10LLLLLL LLLLLLLL`
//! - **Fragmented form** (`11......`): not supported
//!
//! ## Sequences
//!
//! An extensible SEQUENCE starts with one extension bit, followed by one
//! presence bit per OPTIONAL/DEFAULT field, followed by the root fields.
//! When the extension bit is set, the root fields are followed by a
//! normally-small bitmask length, a second presence bitmap and one
//! length-prefixed open type per present addition. Unknown additions are
//! skipped as opaque byte spans.
//!
//! # Implementation Notes
//!
//! 1. **Root-only output**: schema types always emit the extension bit as 0.
//!    Extension additions are read but never authored.
//! 2. **Bounded sizes**: lengths of 16384 and above are rejected.
//! 3. **Error Handling**: all primitives return `RailcodeResult`; the first
//!    failure aborts the whole decode or encode.

pub mod bit_buffer;
pub mod codec;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod types;

pub use bit_buffer::BitBuffer;
pub use codec::{Decodable, Encodable, decode, encode, encode_with_config, is_non_default, presence_of};
pub use config::CodecConfig;
pub use decoder::UperDecoder;
pub use encoder::UperEncoder;
pub use types::{
    CharacterSet, ChoiceAlternative, ChoiceDescriptor, EnumDescriptor, ExtensionAdditions,
    IntegerConstraint, LengthForm, SequenceHeader, SizeConstraint, StringConstraint, StringKind,
    bits_needed,
};

/// Largest length a length determinant can carry without fragmentation
pub const MAX_LENGTH_DETERMINANT: usize = 16383;
