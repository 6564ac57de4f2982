//! railcode - UPER codec engine for rail-ticket barcodes
//!
//! This library decodes and encodes the ASN.1 Unaligned PER payloads carried
//! in rail-ticket barcodes. Ticket record types live outside the engine and
//! implement [`Decodable`] / [`Encodable`] on top of its primitives.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `railcode-core`: Error handling and the `BitString` datatype
//! - `railcode-asn1`: The UPER bit buffer, constraint descriptors, decoder and encoder
//!
//! # Usage
//!
//! ```
//! use railcode::prelude::*;
//!
//! struct Coach(i64);
//!
//! const COACH: IntegerConstraint = IntegerConstraint::new(1, 99);
//!
//! impl Decodable for Coach {
//!     fn decode_from(decoder: &mut UperDecoder<'_>) -> RailcodeResult<Self> {
//!         decoder.decode_constrained_int(&COACH).map(Coach)
//!     }
//! }
//!
//! impl Encodable for Coach {
//!     fn encode_to(&self, encoder: &mut UperEncoder) -> RailcodeResult<()> {
//!         encoder.encode_constrained_int(self.0, &COACH)
//!     }
//! }
//!
//! let bytes = railcode::encode(&Coach(12)).unwrap();
//! assert_eq!(railcode::decode::<Coach>(&bytes).unwrap().0, 12);
//! ```

// Re-export core types
pub use railcode_core::{BitString, RailcodeError, RailcodeResult};

// Re-export the codec engine
pub use railcode_asn1::uper::{
    BitBuffer, CodecConfig, Decodable, Encodable, UperDecoder, UperEncoder, decode, encode,
    encode_with_config,
};

pub mod uper {
    pub use railcode_asn1::uper::*;
}

/// Everything a schema type needs to implement the codec traits
pub mod prelude {
    pub use railcode_asn1::uper::{
        ChoiceAlternative, ChoiceDescriptor, Decodable, Encodable, EnumDescriptor,
        ExtensionAdditions, IntegerConstraint, SequenceHeader, SizeConstraint, StringConstraint,
        UperDecoder, UperEncoder, is_non_default, presence_of,
    };
    pub use railcode_core::{BitString, RailcodeError, RailcodeResult};
}
