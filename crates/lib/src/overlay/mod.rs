//! Lazy copy-on-write overlay over encoded blocks.
//!
//! Opening a [`Root`] over a [`Block`](crate::codec::Block) costs nothing: the
//! bytes are only decoded when something is read, and only the parts that are
//! read. Maps and sequences come back as [`OverlayMap`] and [`OverlaySeq`],
//! which record edits in an overlay on top of the backing bytes. Encoding
//! writes the overlay and copies every untouched subtree straight from the
//! original block.
//!
//! ```
//! use palimpsest::{Block, Root};
//! use serde_json::json;
//!
//! let block = Block::from_json(&json!({"name": "ada", "tags": ["a", "b"]}))?;
//! let root = Root::open(block);
//!
//! let doc = root.as_native()?;
//! let tags = doc.as_map().unwrap().value("tags")?.unwrap();
//! tags.as_seq().unwrap().append("c")?;
//!
//! assert!(root.is_mutated());
//! let updated = root.encode()?;
//! assert_eq!(updated.to_json()?, json!({"name": "ada", "tags": ["a", "b", "c"]}));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Everything here is single-threaded: handles are reference counted with
//! `Rc` and are neither `Send` nor `Sync`. Blocks themselves can be shared
//! across threads.

pub mod collection;
pub mod delegate;
pub mod errors;
pub mod map;
pub mod root;
pub mod seq;
pub mod slot;
pub mod value;

pub use collection::{Collection, Parent};
pub use delegate::{Delegate, StandardDelegate};
pub use errors::OverlayError;
pub use map::OverlayMap;
pub use root::{Root, RootOptions};
pub use seq::{OverlaySeq, SeqIter};
pub use slot::Slot;
pub use value::{Encodable, Value};
