//! Document roots.
//!
//! A [`Root`] anchors one slot as the top of a document. It is the usual entry
//! point: open a block, read through [`Root::as_native`], edit the collections
//! it returns, then [`Root::encode`] a new block.

use std::{fmt, rc::Rc};

use tracing::debug;

use super::{
    Delegate, OverlayMap, OverlaySeq, Parent, Slot, StandardDelegate, Value, collection::take_slot,
};
use crate::codec::{Block, Encoder};

/// Settings applied when a root is created.
#[derive(Clone)]
pub struct RootOptions {
    /// Whether collections read from the root accept writes.
    pub mutable: bool,
    pub delegate: Rc<dyn Delegate>,
}

impl RootOptions {
    pub fn with_mutable(mut self, mutable: bool) -> Self {
        self.mutable = mutable;
        self
    }

    pub fn with_delegate(mut self, delegate: impl Delegate + 'static) -> Self {
        self.delegate = Rc::new(delegate);
        self
    }
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            mutable: true,
            delegate: Rc::new(StandardDelegate),
        }
    }
}

impl fmt::Debug for RootOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootOptions")
            .field("mutable", &self.mutable)
            .finish_non_exhaustive()
    }
}

/// The top of a document.
pub struct Root {
    slot: Slot,
    delegate: Rc<dyn Delegate>,
    mutable: bool,
    block: Option<Block>,
}

impl Root {
    /// Open a verified block with default options.
    pub fn open(block: Block) -> Self {
        Self::open_with(block, RootOptions::default())
    }

    pub fn open_with(block: Block, options: RootOptions) -> Self {
        debug!(
            size = block.len(),
            kind = block.root().kind().name(),
            mutable = options.mutable,
            "Opened root"
        );
        Self {
            slot: Slot::from_encoded(block.root()),
            delegate: options.delegate,
            mutable: options.mutable,
            block: Some(block),
        }
    }

    /// Verify `bytes` and open them.
    pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        Ok(Self::open(Block::from_bytes(bytes)?))
    }

    /// A root holding a native value and no backing block.
    pub fn from_value(value: impl Into<Value>) -> Self {
        Self::from_value_with(value, RootOptions::default())
    }

    /// A collection that is already held elsewhere is copied first.
    pub fn from_value_with(value: impl Into<Value>, options: RootOptions) -> Self {
        let (slot, collection) = take_slot(Slot::from_native(value), options.delegate.as_ref());
        if let Some(collection) = collection {
            collection.adopt(&slot, None);
        }
        Self {
            slot,
            delegate: options.delegate,
            mutable: options.mutable,
            block: None,
        }
    }

    /// The root value, materialized on first use.
    pub fn as_native(&self) -> crate::Result<Value> {
        self.slot.as_native(Parent::Root(self))
    }

    /// True once the root no longer matches its backing bytes.
    pub fn is_mutated(&self) -> bool {
        self.slot.is_mutated()
    }

    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    /// The block this root was opened from.
    pub fn block(&self) -> Option<&Block> {
        self.block.as_ref()
    }

    pub fn delegate(&self) -> Rc<dyn Delegate> {
        self.delegate.clone()
    }

    /// A detached, mutable map using this root's delegate.
    pub fn new_map(&self) -> OverlayMap {
        OverlayMap::new(self.delegate())
    }

    /// A detached, mutable sequence using this root's delegate.
    pub fn new_seq(&self) -> OverlaySeq {
        OverlaySeq::new(self.delegate())
    }

    /// Encode the current state into a new block.
    ///
    /// Each call produces an independent snapshot; untouched subtrees are
    /// copied from the backing block byte for byte.
    pub fn encode(&self) -> crate::Result<Block> {
        let mut encoder = Encoder::new();
        self.slot.encode_to(&mut encoder, self.delegate.as_ref())?;
        let block = encoder.finish()?;
        debug!(
            size = block.len(),
            mutated = self.is_mutated(),
            "Encoded root"
        );
        Ok(block)
    }

    /// Materialize the whole document as JSON.
    pub fn to_json(&self) -> crate::Result<serde_json::Value> {
        self.as_native()?.to_json()
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("slot", &self.slot)
            .field("mutable", &self.mutable)
            .field("block", &self.block.as_ref().map(Block::len))
            .finish()
    }
}
