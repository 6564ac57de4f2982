//! Data types exchanged with the UPER codec

pub mod bit_string;

pub use bit_string::BitString;
