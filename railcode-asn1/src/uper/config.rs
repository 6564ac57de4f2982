//! Encoder buffer configuration

use railcode_core::{RailcodeError, RailcodeResult};
use serde::{Deserialize, Serialize};

/// Default number of bytes pre-allocated for an encoder buffer
pub const DEFAULT_INITIAL_CAPACITY: usize = 256;

/// Default upper bound on an encoder buffer (1 MiB)
pub const DEFAULT_MAX_BUFFER_BYTES: usize = 1024 * 1024;

/// Configuration for encoder buffers
///
/// Barcode payloads are a few hundred bytes, so the defaults rarely need
/// changing. `max_buffer_bytes` turns a runaway write into a
/// `BufferLimit` error instead of an unbounded allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Bytes allocated up front when an encoder is created
    pub initial_capacity: usize,
    /// Largest size the buffer may grow to
    pub max_buffer_bytes: usize,
}

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn with_max_buffer_bytes(mut self, max_buffer_bytes: usize) -> Self {
        self.max_buffer_bytes = max_buffer_bytes;
        self
    }

    /// Check that the configuration describes a usable buffer
    ///
    /// # Error Handling
    /// Returns error if the maximum is zero or smaller than the initial capacity.
    pub fn validate(&self) -> RailcodeResult<()> {
        if self.max_buffer_bytes == 0 {
            return Err(RailcodeError::InvalidData(
                "max_buffer_bytes must be greater than zero".to_string(),
            ));
        }
        if self.initial_capacity > self.max_buffer_bytes {
            return Err(RailcodeError::InvalidData(format!(
                "initial_capacity {} exceeds max_buffer_bytes {}",
                self.initial_capacity, self.max_buffer_bytes
            )));
        }
        Ok(())
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
        }
    }
}
