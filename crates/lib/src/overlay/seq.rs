//! Copy-on-write overlay over an encoded sequence.
//!
//! Each position holds either a slot or nothing; nothing means "the backing
//! element at this index". Operations that shift positions first turn every
//! such gap into a real slot, so indices never drift away from the bytes they
//! refer to. Appending does not shift anything and stays cheap.

use std::{cell::RefCell, fmt, rc::Rc};

use serde::ser::{Error as _, Serialize, SerializeSeq, Serializer};

use super::{
    Collection, Delegate, OverlayError, Parent, Slot, StandardDelegate, Value,
    collection::{Base, ParentLink, adopt_children, claim_slot, propagate_mutation},
};
use crate::codec::{Block, EncodedValue, Encoder, ValueKind};

pub(crate) struct SeqInner {
    pub(crate) base: Base,
    backing: Option<EncodedValue>,
    slots: Vec<Option<Slot>>,
}

impl SeqInner {
    fn backing_slot(&self, index: usize) -> Slot {
        self.backing
            .as_ref()
            .and_then(|backing| backing.index(index))
            .map(Slot::from_encoded)
            .unwrap_or_default()
    }

    /// Give every position a real slot.
    fn populate(&mut self) {
        for index in 0..self.slots.len() {
            if self.slots[index].is_none() {
                let slot = self.backing_slot(index);
                self.slots[index] = Some(slot);
            }
        }
    }
}

/// A sequence whose elements are read lazily from an encoded block and
/// written copy-on-write.
///
/// `OverlaySeq` is a handle: clones share the same sequence.
#[derive(Clone)]
pub struct OverlaySeq(pub(crate) Rc<RefCell<SeqInner>>);

impl OverlaySeq {
    /// A new empty, mutable sequence with no backing.
    pub fn new(delegate: Rc<dyn Delegate>) -> Self {
        Self::with_inner(SeqInner {
            base: Base::detached(delegate, true),
            backing: None,
            slots: Vec::new(),
        })
    }

    fn with_inner(inner: SeqInner) -> Self {
        OverlaySeq(Rc::new(RefCell::new(inner)))
    }

    /// Wrap the encoded sequence held by `slot`.
    ///
    /// # Errors
    ///
    /// [`OverlayError::TypeMismatch`] if the slot does not hold a sequence, and
    /// [`OverlayError::EmptySlot`] if it holds nothing encoded.
    pub fn in_slot(slot: &Slot, parent: Parent<'_>) -> crate::Result<Self> {
        let raw = slot.encoded().ok_or(OverlayError::EmptySlot)?;
        if raw.kind() != ValueKind::Seq {
            return Err(OverlayError::TypeMismatch {
                expected: "sequence",
                actual: raw.kind().name(),
            }
            .into());
        }
        let count = raw.count();
        Ok(Self::with_inner(SeqInner {
            base: Base::in_slot(slot, parent),
            backing: Some(raw),
            slots: vec![None; count],
        }))
    }

    /// A detached copy with its own mutability. Assigned collections are
    /// copied as well.
    pub fn copy(&self, mutable: bool) -> Self {
        let copy = {
            let inner = self.0.borrow();
            let mut base = Base::detached(inner.base.delegate.clone(), mutable);
            base.mutated = inner.base.mutated;
            Self::with_inner(SeqInner {
                base,
                backing: inner.backing.clone(),
                slots: inner
                    .slots
                    .iter()
                    .map(|slot| slot.as_ref().map(|slot| slot.copy_for_collection(mutable)))
                    .collect(),
            })
        };
        let slots: Vec<Slot> = copy.0.borrow().slots.iter().flatten().cloned().collect();
        adopt_children(&slots, &ParentLink::Seq(Rc::downgrade(&copy.0)));
        copy
    }

    pub fn delegate(&self) -> Rc<dyn Delegate> {
        self.0.borrow().base.delegate.clone()
    }

    pub fn is_mutable(&self) -> bool {
        self.0.borrow().base.mutable
    }

    pub fn is_mutated(&self) -> bool {
        self.0.borrow().base.mutated
    }

    pub fn count(&self) -> usize {
        self.0.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// The slot at `index`. Repeated calls return the same slot, and the slot
    /// follows its element when earlier elements are inserted or removed.
    pub fn get(&self, index: usize) -> crate::Result<Slot> {
        let mut inner = self.0.borrow_mut();
        let count = inner.slots.len();
        if index >= count {
            return Err(OverlayError::IndexOutOfRange { index, count }.into());
        }
        if let Some(slot) = &inner.slots[index] {
            return Ok(slot.clone());
        }
        let slot = inner.backing_slot(index);
        inner.slots[index] = Some(slot.clone());
        Ok(slot)
    }

    /// Materialized value at `index`.
    pub fn value(&self, index: usize) -> crate::Result<Value> {
        self.get(index)?.as_native(Parent::Seq(self))
    }

    /// Materialize every element.
    pub fn values(&self) -> crate::Result<Vec<Value>> {
        (0..self.count()).map(|index| self.value(index)).collect()
    }

    /// Iterate over the slots in order.
    pub fn iter(&self) -> SeqIter<'_> {
        SeqIter {
            seq: self,
            index: 0,
        }
    }

    pub fn set(&self, index: usize, value: impl Into<Value>) -> crate::Result<()> {
        self.set_slot(index, Slot::from_native(value))
    }

    /// Replace the slot at `index`.
    ///
    /// # Errors
    ///
    /// [`OverlayError::IndexOutOfRange`] unless `index < count`, and
    /// [`OverlayError::EmptySlot`] for tombstones: sequences have no holes.
    pub fn set_slot(&self, index: usize, slot: Slot) -> crate::Result<()> {
        self.check_mutable("set")?;
        let count = self.count();
        if index >= count {
            return Err(OverlayError::IndexOutOfRange { index, count }.into());
        }
        let (slot, child) = self.claim(slot)?;
        self.0.borrow_mut().slots[index] = Some(slot.clone());
        self.finish_store(&slot, child);
        Ok(())
    }

    pub fn insert(&self, index: usize, value: impl Into<Value>) -> crate::Result<()> {
        self.insert_slot(index, Slot::from_native(value))
    }

    /// Insert a slot before `index`; `index == count` appends.
    pub fn insert_slot(&self, index: usize, slot: Slot) -> crate::Result<()> {
        self.check_mutable("insert")?;
        let count = self.count();
        if index > count {
            return Err(OverlayError::IndexOutOfRange { index, count }.into());
        }
        let (slot, child) = self.claim(slot)?;
        {
            let mut inner = self.0.borrow_mut();
            if index < count {
                inner.populate();
            }
            inner.slots.insert(index, Some(slot.clone()));
        }
        self.finish_store(&slot, child);
        Ok(())
    }

    pub fn append(&self, value: impl Into<Value>) -> crate::Result<()> {
        self.append_slot(Slot::from_native(value))
    }

    pub fn append_slot(&self, slot: Slot) -> crate::Result<()> {
        self.insert_slot(self.count(), slot)
    }

    pub fn remove(&self, index: usize) -> crate::Result<()> {
        self.remove_range(index, 1)
    }

    /// Remove `len` elements starting at `start`.
    ///
    /// # Errors
    ///
    /// [`OverlayError::IndexOutOfRange`] if the range does not fit. Nothing is
    /// removed in that case.
    pub fn remove_range(&self, start: usize, len: usize) -> crate::Result<()> {
        self.check_mutable("remove")?;
        let count = self.count();
        let end = start.saturating_add(len);
        if end > count {
            let index = if start >= count { start } else { end - 1 };
            return Err(OverlayError::IndexOutOfRange { index, count }.into());
        }
        if len == 0 {
            return Ok(());
        }
        {
            let mut inner = self.0.borrow_mut();
            if end < count {
                inner.populate();
            }
            inner.slots.drain(start..end);
        }
        self.mark_mutated();
        Ok(())
    }

    pub fn clear(&self) -> crate::Result<()> {
        self.check_mutable("clear")?;
        if self.is_empty() {
            return Ok(());
        }
        self.mark_mutated();
        self.0.borrow_mut().slots.clear();
        tracing::trace!("Cleared overlay sequence");
        Ok(())
    }

    /// Write the sequence. An unmutated sequence is copied straight from its
    /// backing bytes.
    pub fn encode_to(&self, encoder: &mut Encoder) -> crate::Result<()> {
        let inner = self.0.borrow();
        if !inner.base.mutated {
            match &inner.backing {
                Some(backing) => encoder.write_raw(backing)?,
                None => {
                    encoder.begin_seq(0)?;
                    encoder.end_seq()?;
                }
            }
            return Ok(());
        }

        encoder.begin_seq(inner.slots.len())?;
        for (index, slot) in inner.slots.iter().enumerate() {
            match slot {
                Some(slot) => slot.encode_to(encoder, inner.base.delegate.as_ref())?,
                None => match inner.backing.as_ref().and_then(|b| b.index(index)) {
                    Some(raw) => encoder.write_raw(&raw)?,
                    None => encoder.write_null()?,
                },
            }
        }
        encoder.end_seq()?;
        Ok(())
    }

    /// Encode this sequence on its own as a new block.
    pub fn encode(&self) -> crate::Result<Block> {
        let mut encoder = Encoder::new();
        self.encode_to(&mut encoder)?;
        Ok(encoder.finish()?)
    }

    pub fn to_json(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn ptr_eq(&self, other: &OverlaySeq) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn mark_mutated(&self) {
        let links = self.0.borrow_mut().base.begin_mutation();
        if let Some((slot, parent)) = links {
            propagate_mutation(Collection::Seq(self.clone()), slot, parent);
        }
    }

    fn claim(&self, slot: Slot) -> crate::Result<(Slot, Option<Collection>)> {
        if slot.is_empty() {
            return Err(OverlayError::EmptySlot.into());
        }
        let delegate = self.delegate();
        claim_slot(slot, &Collection::Seq(self.clone()), delegate.as_ref())
    }

    fn finish_store(&self, slot: &Slot, child: Option<Collection>) {
        if let Some(child) = child {
            child.adopt(slot, Some(ParentLink::Seq(Rc::downgrade(&self.0))));
        }
        self.mark_mutated();
    }

    fn check_mutable(&self, operation: &'static str) -> crate::Result<()> {
        if self.is_mutable() {
            Ok(())
        } else {
            Err(OverlayError::IllegalMutation { operation }.into())
        }
    }
}

/// Iterator over the slots of an [`OverlaySeq`].
pub struct SeqIter<'a> {
    seq: &'a OverlaySeq,
    index: usize,
}

impl Iterator for SeqIter<'_> {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        let slot = self.seq.get(self.index).ok()?;
        self.index += 1;
        Some(slot)
    }
}

impl<'a> IntoIterator for &'a OverlaySeq {
    type Item = Slot;
    type IntoIter = SeqIter<'a>;

    fn into_iter(self) -> SeqIter<'a> {
        self.iter()
    }
}

impl Default for OverlaySeq {
    fn default() -> Self {
        Self::new(Rc::new(StandardDelegate))
    }
}

impl PartialEq for OverlaySeq {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for OverlaySeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(inner) = self.0.try_borrow() else {
            return f.write_str("OverlaySeq { <borrowed> }");
        };
        f.debug_struct("OverlaySeq")
            .field("count", &inner.slots.len())
            .field("backed", &inner.backing.is_some())
            .field("mutable", &inner.base.mutable)
            .field("mutated", &inner.base.mutated)
            .finish()
    }
}

impl Serialize for OverlaySeq {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let count = self.count();
        let mut seq = serializer.serialize_seq(Some(count))?;
        for index in 0..count {
            let value = self.value(index).map_err(S::Error::custom)?;
            seq.serialize_element(&value)?;
        }
        seq.end()
    }
}

impl TryFrom<Value> for OverlaySeq {
    type Error = crate::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Seq(seq) => Ok(seq),
            other => Err(OverlayError::TypeMismatch {
                expected: "sequence",
                actual: other.type_name(),
            }
            .into()),
        }
    }
}
