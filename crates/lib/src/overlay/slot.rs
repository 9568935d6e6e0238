//! Slots: the unit of the overlay.
//!
//! A [`Slot`] is a shared handle to one position in a collection (a map key or
//! a sequence index) and is always in one of these states:
//!
//! - **empty**: a tombstone that hides a backing-store entry;
//! - **encoded**: a reference into the backing block, optionally with the
//!   native value it was materialized into;
//! - **native**: only a native value; there is no backing bytes to fall back
//!   to any more.
//!
//! The only ways into the native state are constructing the slot from a value
//! or calling [`Slot::mutate`] once a native value has been cached. The step
//! is one-way: the backing reference is dropped for good.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use super::{Delegate, OverlayError, Parent, Value};
use crate::codec::{EncodedValue, Encoder};

#[derive(Clone)]
pub(crate) enum SlotState {
    Empty,
    Encoded {
        raw: EncodedValue,
        native: Option<Value>,
    },
    Native(Value),
}

/// Shared handle to one overlay position.
///
/// Handles returned from `get` on a collection are the same slot the
/// collection stores, so a value cached through one handle is visible
/// through every other.
#[derive(Clone)]
pub struct Slot(Rc<RefCell<SlotState>>);

impl Slot {
    fn with_state(state: SlotState) -> Self {
        Slot(Rc::new(RefCell::new(state)))
    }

    /// A tombstone.
    pub fn empty() -> Self {
        Self::with_state(SlotState::Empty)
    }

    /// An unconverted slot over an encoded value.
    pub fn from_encoded(raw: EncodedValue) -> Self {
        Self::with_state(SlotState::Encoded { raw, native: None })
    }

    /// A slot holding only a native value.
    pub fn from_native(value: impl Into<Value>) -> Self {
        Self::with_state(SlotState::Native(value.into()))
    }

    pub fn is_empty(&self) -> bool {
        matches!(*self.0.borrow(), SlotState::Empty)
    }

    /// True when there is no backing reference to pass through.
    pub fn is_mutated(&self) -> bool {
        !matches!(*self.0.borrow(), SlotState::Encoded { .. })
    }

    /// The backing reference, if the slot still has one.
    pub fn encoded(&self) -> Option<EncodedValue> {
        match &*self.0.borrow() {
            SlotState::Encoded { raw, .. } => Some(raw.clone()),
            _ => None,
        }
    }

    /// The native value, if one has been cached or assigned.
    pub fn cached(&self) -> Option<Value> {
        match &*self.0.borrow() {
            SlotState::Encoded { native, .. } => native.clone(),
            SlotState::Native(value) => Some(value.clone()),
            SlotState::Empty => None,
        }
    }

    /// Read the slot as a native value, materializing it on first use.
    ///
    /// The delegate of `parent` performs the conversion and decides whether
    /// the result is cached in the slot.
    ///
    /// # Errors
    ///
    /// [`OverlayError::EmptySlot`] for tombstones, or whatever the delegate
    /// reports.
    pub fn as_native(&self, parent: Parent<'_>) -> crate::Result<Value> {
        let kind = match &*self.0.borrow() {
            SlotState::Empty => return Err(OverlayError::EmptySlot.into()),
            SlotState::Native(value) | SlotState::Encoded {
                native: Some(value),
                ..
            } => return Ok(value.clone()),
            SlotState::Encoded { raw, native: None } => raw.kind(),
        };

        let mut cache = false;
        let value = parent.delegate().to_native(self, parent, &mut cache)?;
        tracing::trace!(kind = kind.name(), cache, "Materialized slot");
        if cache {
            if let SlotState::Encoded { native, .. } = &mut *self.0.borrow_mut() {
                *native = Some(value.clone());
            }
        }
        Ok(value)
    }

    /// Drop the backing reference, keeping the cached native value.
    ///
    /// # Errors
    ///
    /// [`OverlayError::Unmaterialized`] if no native value has been cached yet,
    /// [`OverlayError::EmptySlot`] for tombstones.
    pub fn mutate(&self) -> crate::Result<()> {
        let mut state = self.0.borrow_mut();
        let next = match &*state {
            SlotState::Empty => return Err(OverlayError::EmptySlot.into()),
            SlotState::Native(_) => return Ok(()),
            SlotState::Encoded { native: None, .. } => {
                return Err(OverlayError::Unmaterialized.into());
            }
            SlotState::Encoded {
                native: Some(value),
                ..
            } => SlotState::Native(value.clone()),
        };
        *state = next;
        Ok(())
    }

    /// Replace an encoded slot's content with `value`, dropping the backing
    /// reference. Used by collections that have diverged from their bytes.
    pub(crate) fn promote(&self, value: Value) {
        let mut state = self.0.borrow_mut();
        if matches!(*state, SlotState::Encoded { .. }) {
            *state = SlotState::Native(value);
        }
    }

    /// Write the slot: passthrough when it has a backing reference, otherwise
    /// through the delegate.
    pub fn encode_to(&self, encoder: &mut Encoder, delegate: &dyn Delegate) -> crate::Result<()> {
        let native = match &*self.0.borrow() {
            SlotState::Empty => return Err(OverlayError::EmptySlot.into()),
            SlotState::Encoded { raw, .. } => {
                encoder.write_raw(raw)?;
                return Ok(());
            }
            SlotState::Native(value) => value.clone(),
        };
        delegate.encode_native(encoder, Some(&native))
    }

    /// A slot with the same state that is not shared with anyone.
    pub(crate) fn detached(self) -> Slot {
        if Rc::strong_count(&self.0) == 1 && Rc::weak_count(&self.0) == 0 {
            return self;
        }
        let state = self.0.borrow().clone();
        Self::with_state(state)
    }

    /// An unshared copy for a copied collection. Cached natives are dropped so
    /// the copy materializes its own children, and assigned collections are
    /// copied in turn with the given mutability.
    pub(crate) fn copy_for_collection(&self, mutable: bool) -> Slot {
        let state = match &*self.0.borrow() {
            SlotState::Encoded { raw, .. } => SlotState::Encoded {
                raw: raw.clone(),
                native: None,
            },
            SlotState::Native(value) => SlotState::Native(match value.as_collection() {
                Some(collection) => collection.copy(mutable).into_value(),
                None => value.clone(),
            }),
            SlotState::Empty => SlotState::Empty,
        };
        Self::with_state(state)
    }

    /// True when both handles refer to the same slot.
    pub fn ptr_eq(&self, other: &Slot) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<SlotState>> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn upgrade(weak: &Weak<RefCell<SlotState>>) -> Option<Slot> {
        weak.upgrade().map(Slot)
    }
}

impl Default for Slot {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for Slot {
    fn from(value: Value) -> Self {
        Slot::from_native(value)
    }
}

impl From<EncodedValue> for Slot {
    fn from(raw: EncodedValue) -> Self {
        Slot::from_encoded(raw)
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0.borrow() {
            SlotState::Empty => f.write_str("Slot::Empty"),
            SlotState::Encoded { raw, native } => f
                .debug_struct("Slot::Encoded")
                .field("kind", &raw.kind())
                .field("cached", &native.is_some())
                .finish(),
            SlotState::Native(value) => f.debug_tuple("Slot::Native").field(value).finish(),
        }
    }
}
