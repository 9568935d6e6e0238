//!
//! Palimpsest: lazy, copy-on-write editing of immutable encoded documents.
//!
//! ## Core Concepts
//!
//! * **Blocks (`codec::Block`)**: Verified, immutable byte buffers holding one encoded document. Reading them is zero-copy.
//! * **Encoder (`codec::Encoder`)**: Streams values into a new block and can copy existing encoded values byte for byte.
//! * **Slots (`overlay::Slot`)**: One position in a document. A slot refers to encoded bytes, holds a native value, or is empty.
//! * **Collections (`overlay::OverlayMap`, `overlay::OverlaySeq`)**: Maps and sequences that record edits on top of their backing bytes.
//! * **Roots (`overlay::Root`)**: The top of a document, and the place to re-encode it from.
//! * **Delegates (`overlay::Delegate`)**: Decide what native object each encoded value becomes.

pub mod codec;
pub mod overlay;

pub use codec::{Block, EncodedValue, Encoder};
pub use overlay::{
    Delegate, OverlayMap, OverlaySeq, Root, RootOptions, Slot, StandardDelegate, Value,
};

/// Result type used throughout the Palimpsest library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Palimpsest library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured errors from the codec module
    #[error(transparent)]
    Codec(codec::CodecError),

    /// Structured errors from the overlay module
    #[error(transparent)]
    Overlay(overlay::OverlayError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Codec(_) => "codec",
            Error::Overlay(_) => "overlay",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error comes from malformed encoded data.
    pub fn is_corrupt_data(&self) -> bool {
        match self {
            Error::Codec(codec_err) => codec_err.is_corrupt_data(),
            _ => false,
        }
    }

    /// Check if this error is codec-related.
    pub fn is_codec_error(&self) -> bool {
        matches!(self, Error::Codec(_))
    }

    /// Check if this error rejected a write on an immutable collection.
    pub fn is_illegal_mutation(&self) -> bool {
        match self {
            Error::Overlay(overlay_err) => overlay_err.is_illegal_mutation(),
            _ => false,
        }
    }

    /// Check if this error is an out-of-range sequence index.
    pub fn is_out_of_range(&self) -> bool {
        match self {
            Error::Overlay(overlay_err) => overlay_err.is_out_of_range(),
            _ => false,
        }
    }

    /// Check if this error came from reading or storing an empty slot.
    pub fn is_empty_slot(&self) -> bool {
        match self {
            Error::Overlay(overlay_err) => overlay_err.is_empty_slot(),
            _ => false,
        }
    }

    /// Check if this error is type-related.
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::Overlay(overlay_err) => overlay_err.is_type_error(),
            _ => false,
        }
    }
}
