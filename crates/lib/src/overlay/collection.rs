//! State shared by overlay maps and sequences.
//!
//! A collection owns its slots, and every collection is held by at most one
//! slot at a time. The reverse direction, from a child collection back to the
//! slot that holds it and to the collection that holds that slot, is made of
//! `Weak` handles: they only carry the "mutated" signal upwards and never keep
//! anything alive.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use super::{
    Delegate, OverlayError, OverlayMap, OverlaySeq, Root, Slot, Value,
    map::MapInner,
    seq::SeqInner,
    slot::SlotState,
};
use crate::codec::Encoder;

/// Fields common to every overlay collection.
pub(crate) struct Base {
    pub(crate) delegate: Rc<dyn Delegate>,
    pub(crate) mutable: bool,
    pub(crate) mutated: bool,
    /// Slot holding this collection, if any.
    pub(crate) slot: Weak<RefCell<SlotState>>,
    /// Collection holding that slot, if any.
    pub(crate) parent: Option<ParentLink>,
}

impl Base {
    /// A detached collection: no slot, no parent, nothing mutated yet.
    pub(crate) fn detached(delegate: Rc<dyn Delegate>, mutable: bool) -> Self {
        Self {
            delegate,
            mutable,
            mutated: false,
            slot: Weak::new(),
            parent: None,
        }
    }

    /// A collection materialized from `slot` underneath `parent`.
    pub(crate) fn in_slot(slot: &Slot, parent: Parent<'_>) -> Self {
        Self {
            delegate: parent.delegate(),
            mutable: parent.has_mutable_children(),
            mutated: false,
            slot: slot.downgrade(),
            parent: parent.link(),
        }
    }

    pub(crate) fn relink(&mut self, slot: &Slot, parent: Option<ParentLink>) {
        self.slot = slot.downgrade();
        self.parent = parent;
    }

    /// Flip the mutated flag. Returns the links to notify when it was not set.
    pub(crate) fn begin_mutation(&mut self) -> Option<(Option<Slot>, Option<ParentLink>)> {
        if self.mutated {
            return None;
        }
        self.mutated = true;
        Some((Slot::upgrade(&self.slot), self.parent.clone()))
    }
}

/// Non-owning link from a child collection to its parent.
#[derive(Clone)]
pub(crate) enum ParentLink {
    Map(Weak<RefCell<MapInner>>),
    Seq(Weak<RefCell<SeqInner>>),
}

impl ParentLink {
    pub(crate) fn upgrade(&self) -> Option<Collection> {
        match self {
            ParentLink::Map(weak) => weak.upgrade().map(|inner| Collection::Map(OverlayMap(inner))),
            ParentLink::Seq(weak) => weak.upgrade().map(|inner| Collection::Seq(OverlaySeq(inner))),
        }
    }
}

/// Propagate a mutation from a collection to the slot holding it and upwards.
///
/// `this` is the collection that just became mutated; its slot is promoted to
/// a pure native value so that encoding walks the overlay instead of passing
/// the stale bytes through.
pub(crate) fn propagate_mutation(this: Collection, slot: Option<Slot>, parent: Option<ParentLink>) {
    if let Some(slot) = slot {
        slot.promote(this.into_value());
    }
    if let Some(parent) = parent.and_then(|link| link.upgrade()) {
        parent.mark_mutated();
    }
}

/// Prepare a slot for storage in `owner`.
///
/// Storing `owner` or one of its ancestors is rejected; otherwise see
/// [`take_slot`].
pub(crate) fn claim_slot(
    slot: Slot,
    owner: &Collection,
    delegate: &dyn Delegate,
) -> crate::Result<(Slot, Option<Collection>)> {
    let held = slot
        .cached()
        .and_then(|value| delegate.collection_from_native(&value));
    if held.is_some_and(|held| held.is_ancestor_or_self_of(owner)) {
        return Err(OverlayError::Cycle.into());
    }
    Ok(take_slot(slot, delegate))
}

/// Make `slot` ready to be stored in a new position.
///
/// Shared slots are copied so that every slot has exactly one owner, and the
/// same holds for collections: one that a live slot elsewhere still holds is
/// stored as an independent copy. When the resulting slot holds a collection,
/// that collection is returned so the caller can link it once the slot is
/// stored.
pub(crate) fn take_slot(slot: Slot, delegate: &dyn Delegate) -> (Slot, Option<Collection>) {
    let slot = slot.detached();
    let Some(child) = slot
        .cached()
        .and_then(|value| delegate.collection_from_native(&value))
    else {
        return (slot, None);
    };
    if !child.is_held_elsewhere(&slot) {
        return (slot, Some(child));
    }
    match slot.encoded() {
        // The new owner rematerializes it from the bytes.
        Some(raw) => (Slot::from_encoded(raw), None),
        None => {
            let copy = child.copy(child.is_mutable());
            (Slot::from_native(copy.clone().into_value()), Some(copy))
        }
    }
}

/// Link every collection held by `slots` to `parent`.
pub(crate) fn adopt_children<'a>(slots: impl IntoIterator<Item = &'a Slot>, parent: &ParentLink) {
    for slot in slots {
        if let Some(child) = slot.cached().and_then(|value| value.as_collection()) {
            child.adopt(slot, Some(parent.clone()));
        }
    }
}

/// The owner of a slot being materialized.
///
/// Passed to [`Slot::as_native`] and on to the [`Delegate`], which uses it to
/// pick the delegate and mutability for new child collections and to link
/// them back to their parent.
#[derive(Clone, Copy)]
pub enum Parent<'a> {
    Root(&'a Root),
    Map(&'a OverlayMap),
    Seq(&'a OverlaySeq),
}

impl Parent<'_> {
    pub fn delegate(&self) -> Rc<dyn Delegate> {
        match self {
            Parent::Root(root) => root.delegate(),
            Parent::Map(map) => map.delegate(),
            Parent::Seq(seq) => seq.delegate(),
        }
    }

    /// Whether collections materialized under this parent accept writes.
    pub fn has_mutable_children(&self) -> bool {
        match self {
            Parent::Root(root) => root.is_mutable(),
            Parent::Map(map) => map.is_mutable(),
            Parent::Seq(seq) => seq.is_mutable(),
        }
    }

    pub(crate) fn link(&self) -> Option<ParentLink> {
        match self {
            Parent::Root(_) => None,
            Parent::Map(map) => Some(ParentLink::Map(Rc::downgrade(&map.0))),
            Parent::Seq(seq) => Some(ParentLink::Seq(Rc::downgrade(&seq.0))),
        }
    }
}

/// Either kind of overlay collection.
#[derive(Clone, PartialEq)]
pub enum Collection {
    Map(OverlayMap),
    Seq(OverlaySeq),
}

impl Collection {
    pub fn count(&self) -> usize {
        match self {
            Collection::Map(map) => map.count(),
            Collection::Seq(seq) => seq.count(),
        }
    }

    pub fn is_mutable(&self) -> bool {
        match self {
            Collection::Map(map) => map.is_mutable(),
            Collection::Seq(seq) => seq.is_mutable(),
        }
    }

    pub fn is_mutated(&self) -> bool {
        match self {
            Collection::Map(map) => map.is_mutated(),
            Collection::Seq(seq) => seq.is_mutated(),
        }
    }

    pub fn encode_to(&self, encoder: &mut Encoder) -> crate::Result<()> {
        match self {
            Collection::Map(map) => map.encode_to(encoder),
            Collection::Seq(seq) => seq.encode_to(encoder),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Collection::Map(map) => Value::Map(map),
            Collection::Seq(seq) => Value::Seq(seq),
        }
    }

    pub(crate) fn mark_mutated(&self) {
        match self {
            Collection::Map(map) => map.mark_mutated(),
            Collection::Seq(seq) => seq.mark_mutated(),
        }
    }

    /// Point this collection at a new owning slot and parent.
    pub(crate) fn adopt(&self, slot: &Slot, parent: Option<ParentLink>) {
        match self {
            Collection::Map(map) => map.0.borrow_mut().base.relink(slot, parent),
            Collection::Seq(seq) => seq.0.borrow_mut().base.relink(slot, parent),
        }
    }

    /// A detached copy that shares no collection with `self`.
    pub(crate) fn copy(&self, mutable: bool) -> Collection {
        match self {
            Collection::Map(map) => Collection::Map(map.copy(mutable)),
            Collection::Seq(seq) => Collection::Seq(seq.copy(mutable)),
        }
    }

    /// True when a live slot other than `slot` still holds this collection.
    fn is_held_elsewhere(&self, slot: &Slot) -> bool {
        let held_by = match self {
            Collection::Map(map) => Slot::upgrade(&map.0.borrow().base.slot),
            Collection::Seq(seq) => Slot::upgrade(&seq.0.borrow().base.slot),
        };
        held_by.is_some_and(|held_by| {
            !held_by.ptr_eq(slot)
                && held_by
                    .cached()
                    .and_then(|value| value.as_collection())
                    .is_some_and(|held| held == *self)
        })
    }

    fn parent_link(&self) -> Option<ParentLink> {
        match self {
            Collection::Map(map) => map.0.borrow().base.parent.clone(),
            Collection::Seq(seq) => seq.0.borrow().base.parent.clone(),
        }
    }

    /// True if `self` is `other` or one of its ancestors.
    pub(crate) fn is_ancestor_or_self_of(&self, other: &Collection) -> bool {
        let mut current = Some(other.clone());
        while let Some(collection) = current {
            if collection == *self {
                return true;
            }
            current = collection.parent_link().and_then(|link| link.upgrade());
        }
        false
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Map(map) => fmt::Debug::fmt(map, f),
            Collection::Seq(seq) => fmt::Debug::fmt(seq, f),
        }
    }
}
