//! Copy-on-write overlay over an encoded map.
//!
//! Reads consult the overlay first and fall back to the backing map. Writes
//! only ever touch the overlay; removing a key that exists in the backing map
//! stores an empty slot that hides it.

use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

use serde::ser::{Error as _, Serialize, SerializeMap, Serializer};

use super::{
    Collection, Delegate, OverlayError, Parent, Slot, StandardDelegate, Value,
    collection::{Base, ParentLink, adopt_children, claim_slot, propagate_mutation},
};
use crate::codec::{Block, EncodedValue, Encoder, ValueKind};

pub(crate) struct MapInner {
    pub(crate) base: Base,
    backing: Option<EncodedValue>,
    overlay: HashMap<String, Slot>,
    /// Number of non-empty entries as seen by readers.
    live: usize,
}

/// A map whose entries are read lazily from an encoded block and written
/// copy-on-write.
///
/// `OverlayMap` is a handle: clones share the same map.
#[derive(Clone)]
pub struct OverlayMap(pub(crate) Rc<RefCell<MapInner>>);

impl OverlayMap {
    /// A new empty, mutable map with no backing.
    pub fn new(delegate: Rc<dyn Delegate>) -> Self {
        Self::with_inner(MapInner {
            base: Base::detached(delegate, true),
            backing: None,
            overlay: HashMap::new(),
            live: 0,
        })
    }

    fn with_inner(inner: MapInner) -> Self {
        OverlayMap(Rc::new(RefCell::new(inner)))
    }

    /// Wrap the encoded map held by `slot`. Used by delegates when
    /// materializing.
    ///
    /// # Errors
    ///
    /// [`OverlayError::TypeMismatch`] if the slot does not hold a map, and
    /// [`OverlayError::EmptySlot`] if it holds nothing encoded.
    pub fn in_slot(slot: &Slot, parent: Parent<'_>) -> crate::Result<Self> {
        let raw = slot.encoded().ok_or(OverlayError::EmptySlot)?;
        if raw.kind() != ValueKind::Map {
            return Err(OverlayError::TypeMismatch {
                expected: "map",
                actual: raw.kind().name(),
            }
            .into());
        }
        let live = raw.count();
        Ok(Self::with_inner(MapInner {
            base: Base::in_slot(slot, parent),
            backing: Some(raw),
            overlay: HashMap::new(),
            live,
        }))
    }

    /// A detached copy with its own mutability.
    ///
    /// The copy shares the backing block and scalar values already assigned.
    /// Assigned collections are copied, so the copy holds none of ours.
    pub fn copy(&self, mutable: bool) -> Self {
        let copy = {
            let inner = self.0.borrow();
            let mut base = Base::detached(inner.base.delegate.clone(), mutable);
            base.mutated = inner.base.mutated;
            Self::with_inner(MapInner {
                base,
                backing: inner.backing.clone(),
                overlay: inner
                    .overlay
                    .iter()
                    .map(|(key, slot)| (key.clone(), slot.copy_for_collection(mutable)))
                    .collect(),
                live: inner.live,
            })
        };
        let slots: Vec<Slot> = copy.0.borrow().overlay.values().cloned().collect();
        adopt_children(&slots, &ParentLink::Map(Rc::downgrade(&copy.0)));
        copy
    }

    pub fn delegate(&self) -> Rc<dyn Delegate> {
        self.0.borrow().base.delegate.clone()
    }

    pub fn is_mutable(&self) -> bool {
        self.0.borrow().base.mutable
    }

    /// True once this map (or anything below it) has diverged from its
    /// backing bytes.
    pub fn is_mutated(&self) -> bool {
        self.0.borrow().base.mutated
    }

    pub fn count(&self) -> usize {
        self.0.borrow().live
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// The slot for `key`.
    ///
    /// A key found only in the backing map is brought into the overlay, so
    /// later calls return the same slot. A missing key yields a fresh empty
    /// slot that is not stored.
    pub fn get(&self, key: &str) -> Slot {
        let mut inner = self.0.borrow_mut();
        if let Some(slot) = inner.overlay.get(key) {
            return slot.clone();
        }
        let Some(raw) = inner.backing.as_ref().and_then(|backing| backing.get(key)) else {
            return Slot::empty();
        };
        let slot = Slot::from_encoded(raw);
        inner.overlay.insert(key.to_string(), slot.clone());
        slot
    }

    /// Materialized value for `key`, or `None` when the key is absent.
    pub fn value(&self, key: &str) -> crate::Result<Option<Value>> {
        let slot = self.get(key);
        if slot.is_empty() {
            return Ok(None);
        }
        slot.as_native(Parent::Map(self)).map(Some)
    }

    pub fn contains(&self, key: &str) -> bool {
        let inner = self.0.borrow();
        match inner.overlay.get(key) {
            Some(slot) => !slot.is_empty(),
            None => inner
                .backing
                .as_ref()
                .is_some_and(|backing| backing.contains_key(key)),
        }
    }

    /// Live keys. Overlay keys come first, in no particular order, followed by
    /// untouched backing keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let inner = self.0.borrow();
        let mut keys: Vec<String> = inner
            .overlay
            .iter()
            .filter(|(_, slot)| !slot.is_empty())
            .map(|(key, _)| key.clone())
            .collect();
        if let Some(backing) = &inner.backing {
            keys.extend(
                backing
                    .keys()
                    .filter(|key| !inner.overlay.contains_key(*key))
                    .map(String::from),
            );
        }
        keys
    }

    /// Live entries with their slots.
    pub fn entries(&self) -> Vec<(String, Slot)> {
        self.keys()
            .into_iter()
            .map(|key| {
                let slot = self.get(&key);
                (key, slot)
            })
            .collect()
    }

    /// Store a native value under `key`.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> crate::Result<()> {
        self.set_slot(key, Slot::from_native(value))
    }

    /// Store `slot` under `key`. An empty slot removes the key.
    ///
    /// # Errors
    ///
    /// [`OverlayError::IllegalMutation`] on an immutable map and
    /// [`OverlayError::Cycle`] when the slot holds this map or an ancestor.
    ///
    /// A collection that another live slot still holds is stored as a copy.
    pub fn set_slot(&self, key: &str, slot: Slot) -> crate::Result<()> {
        self.store("set", key, slot)
    }

    /// Remove `key`. Removing an absent key is a no-op.
    pub fn remove(&self, key: &str) -> crate::Result<()> {
        self.store("remove", key, Slot::empty())
    }

    /// Remove every key.
    pub fn clear(&self) -> crate::Result<()> {
        self.check_mutable("clear")?;
        if self.is_empty() {
            return Ok(());
        }
        self.mark_mutated();
        let mut inner = self.0.borrow_mut();
        inner.overlay.clear();
        if let Some(backing) = inner.backing.clone() {
            for key in backing.keys() {
                inner.overlay.insert(key.to_string(), Slot::empty());
            }
        }
        inner.live = 0;
        tracing::trace!("Cleared overlay map");
        Ok(())
    }

    /// Write the map. An unmutated map is copied straight from its backing
    /// bytes.
    pub fn encode_to(&self, encoder: &mut Encoder) -> crate::Result<()> {
        let inner = self.0.borrow();
        if !inner.base.mutated {
            match &inner.backing {
                Some(backing) => encoder.write_raw(backing)?,
                None => {
                    encoder.begin_map(0)?;
                    encoder.end_map()?;
                }
            }
            return Ok(());
        }

        encoder.begin_map(inner.live)?;
        for (key, slot) in &inner.overlay {
            if slot.is_empty() {
                continue;
            }
            encoder.write_key(key)?;
            slot.encode_to(encoder, inner.base.delegate.as_ref())?;
        }
        if let Some(backing) = &inner.backing {
            for (key, raw) in backing.entries() {
                if !inner.overlay.contains_key(key) {
                    encoder.write_key(key)?;
                    encoder.write_raw(&raw)?;
                }
            }
        }
        encoder.end_map()?;
        Ok(())
    }

    /// Encode this map on its own as a new block.
    pub fn encode(&self) -> crate::Result<Block> {
        let mut encoder = Encoder::new();
        self.encode_to(&mut encoder)?;
        Ok(encoder.finish()?)
    }

    pub fn to_json(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// True when both handles refer to the same map.
    pub fn ptr_eq(&self, other: &OverlayMap) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn mark_mutated(&self) {
        let links = self.0.borrow_mut().base.begin_mutation();
        if let Some((slot, parent)) = links {
            propagate_mutation(Collection::Map(self.clone()), slot, parent);
        }
    }

    /// Shared body of `set_slot` and `remove`.
    fn store(&self, operation: &'static str, key: &str, slot: Slot) -> crate::Result<()> {
        self.check_mutable(operation)?;
        let delegate = self.delegate();
        let owner = Collection::Map(self.clone());
        let (slot, child) = claim_slot(slot, &owner, delegate.as_ref())?;
        let adding = !slot.is_empty();
        {
            let mut inner = self.0.borrow_mut();
            let had = match inner.overlay.get(key) {
                Some(existing) => {
                    if existing.is_empty() && !adding {
                        return Ok(());
                    }
                    !existing.is_empty()
                }
                None => {
                    let in_backing = inner
                        .backing
                        .as_ref()
                        .is_some_and(|backing| backing.contains_key(key));
                    if !in_backing && !adding {
                        return Ok(());
                    }
                    in_backing
                }
            };
            match (had, adding) {
                (false, true) => inner.live += 1,
                (true, false) => inner.live -= 1,
                _ => {}
            }
            inner.overlay.insert(key.to_string(), slot.clone());
        }
        if let Some(child) = child {
            child.adopt(&slot, Some(ParentLink::Map(Rc::downgrade(&self.0))));
        }
        self.mark_mutated();
        Ok(())
    }

    fn check_mutable(&self, operation: &'static str) -> crate::Result<()> {
        if self.is_mutable() {
            Ok(())
        } else {
            Err(OverlayError::IllegalMutation { operation }.into())
        }
    }
}

impl Default for OverlayMap {
    fn default() -> Self {
        Self::new(Rc::new(StandardDelegate))
    }
}

impl PartialEq for OverlayMap {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for OverlayMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(inner) = self.0.try_borrow() else {
            return f.write_str("OverlayMap { <borrowed> }");
        };
        f.debug_struct("OverlayMap")
            .field("count", &inner.live)
            .field("overlay", &inner.overlay.len())
            .field("backed", &inner.backing.is_some())
            .field("mutable", &inner.base.mutable)
            .field("mutated", &inner.base.mutated)
            .finish()
    }
}

impl Serialize for OverlayMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let keys = self.keys();
        let mut map = serializer.serialize_map(Some(keys.len()))?;
        for key in &keys {
            let value = self.value(key).map_err(S::Error::custom)?;
            map.serialize_entry(key, &value)?;
        }
        map.end()
    }
}

impl TryFrom<Value> for OverlayMap {
    type Error = crate::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Map(map) => Ok(map),
            other => Err(OverlayError::TypeMismatch {
                expected: "map",
                actual: other.type_name(),
            }
            .into()),
        }
    }
}
