//! Error types for overlay operations.
//!
//! Every variant describes a programming error on the caller's side. They are
//! reported synchronously and leave the collection that raised them unchanged.

use thiserror::Error;

/// Structured error types for overlay maps, sequences, slots and roots.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverlayError {
    /// A write was attempted on an immutable collection
    #[error("cannot {operation} on an immutable collection")]
    IllegalMutation { operation: &'static str },

    /// Index outside the valid range of a sequence
    #[error("index {index} out of range (count={count})")]
    IndexOutOfRange { index: usize, count: usize },

    /// A tombstone was read, encoded, or stored where a value is required
    #[error("slot is empty")]
    EmptySlot,

    /// `Slot::mutate` was called before the slot held a native value
    #[error("slot has no materialized value to mutate")]
    Unmaterialized,

    /// A value did not have the expected kind
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A collection was stored inside itself or one of its descendants
    #[error("cannot store a collection inside itself")]
    Cycle,
}

impl OverlayError {
    /// Check if this error rejected a write on an immutable collection
    pub fn is_illegal_mutation(&self) -> bool {
        matches!(self, OverlayError::IllegalMutation { .. })
    }

    /// Check if this error is an out-of-range index
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, OverlayError::IndexOutOfRange { .. })
    }

    /// Check if this error came from a tombstone
    pub fn is_empty_slot(&self) -> bool {
        matches!(self, OverlayError::EmptySlot)
    }

    /// Check if this error is related to type mismatches
    pub fn is_type_error(&self) -> bool {
        matches!(self, OverlayError::TypeMismatch { .. })
    }
}

// Conversion from OverlayError to the main Error type
impl From<OverlayError> for crate::Error {
    fn from(err: OverlayError) -> Self {
        crate::Error::Overlay(err)
    }
}
