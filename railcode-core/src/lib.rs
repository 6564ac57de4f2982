//! Core types and utilities for the railcode barcode codec
//!
//! This crate provides the error type shared by every layer of the codec
//! and the small set of datatypes that cross the bit-level API boundary.

pub mod error;
pub mod datatypes;

pub use error::{RailcodeError, RailcodeResult};
pub use datatypes::BitString;
