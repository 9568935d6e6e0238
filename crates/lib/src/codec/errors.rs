//! Error types for the encoded block format.
//!
//! Verification errors are raised once, when a block is opened. Encoder errors
//! describe misuse of the streaming writer (unbalanced containers, keys in the
//! wrong place) or values the format cannot represent.

use thiserror::Error;

/// Structured error types for reading and writing encoded blocks.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Block does not start with the format magic
    #[error("invalid magic: expected PLMP")]
    InvalidMagic,

    /// A value extends past the end of its enclosing range
    #[error("truncated value at offset {offset}")]
    Truncated { offset: usize },

    /// A tag byte has bits set that its kind does not allow
    #[error("invalid tag {tag:#04x} at offset {offset}")]
    InvalidTag { tag: u8, offset: usize },

    /// String or map key is not valid UTF-8
    #[error("invalid UTF-8 at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// Map keys are not strictly increasing
    #[error("unsorted or duplicate map key at offset {offset}")]
    UnsortedKeys { offset: usize },

    /// A container's offsets do not lay its children out back to back
    #[error("invalid child offset at {offset}")]
    InvalidOffset { offset: usize },

    /// Nesting is deeper than the verifier accepts
    #[error("maximum nesting depth {max} exceeded")]
    MaxDepthExceeded { max: usize },

    /// Bytes remain after the root value
    #[error("{count} trailing bytes after root value")]
    TrailingBytes { count: usize },

    /// A map value was written without a preceding key
    #[error("map value written without a key")]
    MissingKey,

    /// A key was written outside a map, or twice in a row
    #[error("unexpected key {key:?}")]
    UnexpectedKey { key: String },

    /// The same key was written twice into one map
    #[error("duplicate map key {key:?}")]
    DuplicateKey { key: String },

    /// `end_map`/`end_seq` did not match the open container
    #[error("unbalanced container: expected to close {expected}")]
    Unbalanced { expected: &'static str },

    /// `finish` was called with containers still open
    #[error("{open} container(s) left open")]
    UnclosedContainer { open: usize },

    /// `finish` was called before any value was written
    #[error("no value was written")]
    NoValue,

    /// More than one top-level value was written
    #[error("more than one root value written")]
    MultipleRoots,

    /// A value or container does not fit the 32-bit length fields
    #[error("encoded size {size} exceeds the 32-bit limit")]
    TooLarge { size: usize },
}

impl CodecError {
    /// Check if this error was raised while verifying an encoded block
    pub fn is_corrupt_data(&self) -> bool {
        matches!(
            self,
            CodecError::InvalidMagic
                | CodecError::Truncated { .. }
                | CodecError::InvalidTag { .. }
                | CodecError::InvalidUtf8 { .. }
                | CodecError::UnsortedKeys { .. }
                | CodecError::InvalidOffset { .. }
                | CodecError::MaxDepthExceeded { .. }
                | CodecError::TrailingBytes { .. }
        )
    }

    /// Check if this error reports misuse of the encoder
    pub fn is_encoder_misuse(&self) -> bool {
        matches!(
            self,
            CodecError::MissingKey
                | CodecError::UnexpectedKey { .. }
                | CodecError::DuplicateKey { .. }
                | CodecError::Unbalanced { .. }
                | CodecError::UnclosedContainer { .. }
                | CodecError::NoValue
                | CodecError::MultipleRoots
        )
    }

    /// Byte offset of the problem, for verification errors that carry one
    pub fn offset(&self) -> Option<usize> {
        match self {
            CodecError::Truncated { offset }
            | CodecError::InvalidTag { offset, .. }
            | CodecError::InvalidUtf8 { offset }
            | CodecError::UnsortedKeys { offset }
            | CodecError::InvalidOffset { offset } => Some(*offset),
            _ => None,
        }
    }
}

// Conversion from CodecError to the main Error type
impl From<CodecError> for crate::Error {
    fn from(err: CodecError) -> Self {
        crate::Error::Codec(err)
    }
}
