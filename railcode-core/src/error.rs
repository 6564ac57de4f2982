use std::string::FromUtf8Error;
use thiserror::Error;

/// Main error type for railcode operations
///
/// Every variant is terminal: a decode or encode call that hits one of these
/// aborts as a whole and no partial value is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RailcodeError {
    /// Fewer bits remain in the buffer than a primitive requested
    #[error("Buffer exhausted: need {needed} bits, have {available}")]
    BufferExhausted { needed: usize, available: usize },

    /// A decoded or to-be-encoded value lies outside its declared constraint
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// An extension bit or length form was set that this codec cannot follow
    #[error("Unsupported extension: {0}")]
    UnsupportedExtension(String),

    #[error("Malformed content: {0}")]
    MalformedContent(String),

    #[error("Malformed UTF-8 content: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    /// A write would grow the buffer beyond its configured maximum
    #[error("Buffer limit exceeded: {requested} bytes requested, limit is {limit}")]
    BufferLimit { requested: usize, limit: usize },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for railcode operations
pub type RailcodeResult<T> = Result<T, RailcodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_exhausted_message() {
        let err = RailcodeError::BufferExhausted {
            needed: 7,
            available: 3,
        };
        assert_eq!(err.to_string(), "Buffer exhausted: need 7 bits, have 3");
    }

    #[test]
    fn test_utf8_conversion() {
        let err: RailcodeError = String::from_utf8(vec![0xC3, 0x28]).unwrap_err().into();
        assert!(matches!(err, RailcodeError::InvalidUtf8(_)));
    }
}
