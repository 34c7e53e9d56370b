//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// The destination buffer is too small for the encoded output.
    #[error("destination buffer too small")]
    BufferTooSmall,

    /// The next data item does not have the expected type.
    #[error("type mismatch: expected {expected}")]
    TypeMismatch {
        /// Description of the expected item.
        expected: &'static str,
    },

    /// Invalid UTF-8 in a text string.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// Structurally invalid CBOR.
    #[error("invalid CBOR structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },

    /// A CBOR construct outside the supported subset.
    #[error("unsupported CBOR item: {item}")]
    Unsupported {
        /// Description of the unsupported item.
        item: String,
    },
}

impl CodecError {
    /// Create a type mismatch error.
    pub fn type_mismatch(expected: &'static str) -> Self {
        Self::TypeMismatch { expected }
    }

    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Create an unsupported item error.
    pub fn unsupported(item: impl Into<String>) -> Self {
        Self::Unsupported { item: item.into() }
    }
}
