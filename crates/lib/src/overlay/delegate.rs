//! Materialization policy.
//!
//! A [`Delegate`] decides what native object an encoded value becomes, which
//! of those objects are remembered by their slot, and how native objects are
//! written back. Every [`Root`](super::Root) and collection carries one; child
//! collections inherit their parent's.

use super::{Collection, OverlayError, OverlayMap, OverlaySeq, Parent, Slot, Value};
use crate::codec::{Encoder, ValueKind};

/// Conversion between encoded values and native objects.
pub trait Delegate {
    /// Convert the encoded value in `slot` into a native value.
    ///
    /// `parent` is the collection (or root) that owns the slot. Set `cache`
    /// to have the slot keep the result; collections must be cached so that
    /// repeated reads return the same instance.
    fn to_native(&self, slot: &Slot, parent: Parent<'_>, cache: &mut bool)
    -> crate::Result<Value>;

    /// The overlay collection behind a native value, if any.
    ///
    /// Used to re-link a collection to its new slot and parent when it is
    /// stored somewhere.
    fn collection_from_native(&self, value: &Value) -> Option<Collection> {
        value.as_collection()
    }

    /// Write a native value. `None` is written as null.
    fn encode_native(&self, encoder: &mut Encoder, value: Option<&Value>) -> crate::Result<()> {
        match value {
            Some(value) => value.encode_to(encoder),
            None => Ok(encoder.write_null()?),
        }
    }
}

/// Default policy: maps and sequences become cached overlay collections,
/// scalars are copied out on every read.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardDelegate;

impl Delegate for StandardDelegate {
    fn to_native(
        &self,
        slot: &Slot,
        parent: Parent<'_>,
        cache: &mut bool,
    ) -> crate::Result<Value> {
        let raw = slot.encoded().ok_or(OverlayError::EmptySlot)?;
        match raw.kind() {
            ValueKind::Map => {
                *cache = true;
                Ok(Value::Map(OverlayMap::in_slot(slot, parent)?))
            }
            ValueKind::Seq => {
                *cache = true;
                Ok(Value::Seq(OverlaySeq::in_slot(slot, parent)?))
            }
            _ => Ok(Value::from_scalar(&raw).unwrap_or(Value::Null)),
        }
    }
}
