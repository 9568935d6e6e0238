//! The encoded block format underneath the overlay.
//!
//! This module provides the two capabilities the overlay consumes:
//!
//! - a reader, [`EncodedValue`], giving zero-copy access to a verified
//!   [`Block`]: value kind, map lookup, key iteration in storage order,
//!   sequence indexing and counts;
//! - a writer, [`Encoder`], with begin/end map and sequence, keys, typed
//!   scalars and raw passthrough of existing encoded values.
//!
//! # Format
//!
//! A block is the magic `PLMP` followed by a single root value. Every value
//! starts with a tag byte whose low 3 bits give the [`ValueKind`]:
//!
//! | kind     | layout                                                   |
//! |----------|----------------------------------------------------------|
//! | null     | tag                                                      |
//! | bool     | tag (bit 3 holds the value)                              |
//! | int      | tag, i64 LE                                              |
//! | float    | tag, f64 LE                                              |
//! | string   | tag, u32 length, UTF-8 bytes                             |
//! | blob     | tag, u32 length, bytes                                   |
//! | sequence | tag, u32 span, u32 count, count × u32 offsets, elements  |
//! | map      | tag, u32 span, u32 count, count × u32 offsets, entries   |
//!
//! Offsets are relative to the start of their container. Map entries are
//! `u32 key length, key, value`, sorted by key bytes with no duplicates.

pub mod block;
pub mod encoder;
pub mod errors;
pub mod tag;

pub use block::{Block, EncodedValue, MAGIC, MAX_DEPTH};
pub use encoder::Encoder;
pub use errors::CodecError;
pub use tag::ValueKind;
