//! Streaming encoder producing [`Block`]s.
//!
//! Containers are opened and closed explicitly. Each open container buffers
//! its children until it is closed, at which point its header and offset table
//! are known and the finished bytes are handed to the enclosing container.
//! Nesting, including that of raw values copied in, is held to [`MAX_DEPTH`]
//! so that every finished block verifies.
//!
//! ```
//! use palimpsest::codec::Encoder;
//!
//! let mut enc = Encoder::new();
//! enc.begin_map(2)?;
//! enc.write_key("name")?;
//! enc.write_str("Alice")?;
//! enc.write_key("tags")?;
//! enc.begin_seq(1)?;
//! enc.write_int(7)?;
//! enc.end_seq()?;
//! enc.end_map()?;
//! let block = enc.finish()?;
//! assert_eq!(block.root().count(), 2);
//! # Ok::<(), palimpsest::codec::CodecError>(())
//! ```

use super::{
    CodecError,
    block::{Block, EncodedValue, MAGIC, MAX_DEPTH},
    tag::{CONTAINER_HEADER, FIXED_SIZE, LEN_SIZE, ValueKind, bool_tag, tag_for},
};

enum Frame {
    Seq(Vec<Vec<u8>>),
    Map {
        entries: Vec<(String, Vec<u8>)>,
        key: Option<String>,
    },
}

/// Writer for one encoded document.
#[derive(Default)]
pub struct Encoder {
    stack: Vec<Frame>,
    root: Option<Vec<u8>>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a map. `capacity` is a hint for the number of entries.
    ///
    /// # Errors
    ///
    /// [`CodecError::MaxDepthExceeded`] when [`MAX_DEPTH`] containers are
    /// already open.
    pub fn begin_map(&mut self, capacity: usize) -> Result<(), CodecError> {
        self.check_depth(1)?;
        self.stack.push(Frame::Map {
            entries: Vec::with_capacity(capacity),
            key: None,
        });
        Ok(())
    }

    /// Open a sequence. `capacity` is a hint for the number of elements.
    pub fn begin_seq(&mut self, capacity: usize) -> Result<(), CodecError> {
        self.check_depth(1)?;
        self.stack.push(Frame::Seq(Vec::with_capacity(capacity)));
        Ok(())
    }

    /// Set the key for the next value written into the open map.
    pub fn write_key(&mut self, key: &str) -> Result<(), CodecError> {
        match self.stack.last_mut() {
            Some(Frame::Map { key: slot @ None, .. }) => {
                *slot = Some(key.to_string());
                Ok(())
            }
            _ => Err(CodecError::UnexpectedKey {
                key: key.to_string(),
            }),
        }
    }

    pub fn end_map(&mut self) -> Result<(), CodecError> {
        match self.stack.pop() {
            Some(Frame::Map { entries, key: None }) => {
                let bytes = encode_map(entries)?;
                self.emit(bytes)
            }
            Some(Frame::Map {
                key: Some(key),
                entries,
            }) => {
                // A dangling key is left unwritten; restore the frame.
                self.stack.push(Frame::Map {
                    entries,
                    key: Some(key.clone()),
                });
                Err(CodecError::UnexpectedKey { key })
            }
            Some(frame) => {
                self.stack.push(frame);
                Err(CodecError::Unbalanced { expected: "map" })
            }
            None => Err(CodecError::Unbalanced { expected: "map" }),
        }
    }

    pub fn end_seq(&mut self) -> Result<(), CodecError> {
        match self.stack.pop() {
            Some(Frame::Seq(items)) => {
                let bytes = encode_seq(items)?;
                self.emit(bytes)
            }
            Some(frame) => {
                self.stack.push(frame);
                Err(CodecError::Unbalanced {
                    expected: "sequence",
                })
            }
            None => Err(CodecError::Unbalanced {
                expected: "sequence",
            }),
        }
    }

    pub fn write_null(&mut self) -> Result<(), CodecError> {
        self.emit(vec![tag_for(ValueKind::Null)])
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), CodecError> {
        self.emit(vec![bool_tag(value)])
    }

    pub fn write_int(&mut self, value: i64) -> Result<(), CodecError> {
        let mut bytes = Vec::with_capacity(FIXED_SIZE);
        bytes.push(tag_for(ValueKind::Int));
        bytes.extend_from_slice(&value.to_le_bytes());
        self.emit(bytes)
    }

    pub fn write_float(&mut self, value: f64) -> Result<(), CodecError> {
        let mut bytes = Vec::with_capacity(FIXED_SIZE);
        bytes.push(tag_for(ValueKind::Float));
        bytes.extend_from_slice(&value.to_bits().to_le_bytes());
        self.emit(bytes)
    }

    pub fn write_str(&mut self, value: &str) -> Result<(), CodecError> {
        let bytes = encode_payload(ValueKind::Str, value.as_bytes())?;
        self.emit(bytes)
    }

    pub fn write_blob(&mut self, value: &[u8]) -> Result<(), CodecError> {
        let bytes = encode_payload(ValueKind::Blob, value)?;
        self.emit(bytes)
    }

    /// Copy an already encoded value verbatim.
    pub fn write_raw(&mut self, value: &EncodedValue) -> Result<(), CodecError> {
        // Every container level needs at least a header, which bounds the
        // nesting without walking the value.
        if self.stack.len() + value.span() / CONTAINER_HEADER > MAX_DEPTH {
            self.check_depth(value.depth())?;
        }
        self.emit(value.raw().to_vec())
    }

    /// Write a JSON value. Integers that fit `i64` become ints, other numbers
    /// become floats.
    pub fn write_json(&mut self, value: &serde_json::Value) -> Result<(), CodecError> {
        use serde_json::Value as Json;
        match value {
            Json::Null => self.write_null(),
            Json::Bool(b) => self.write_bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => self.write_int(i),
                None => self.write_float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => self.write_str(s),
            Json::Array(items) => {
                self.begin_seq(items.len())?;
                for item in items {
                    self.write_json(item)?;
                }
                self.end_seq()
            }
            Json::Object(entries) => {
                self.begin_map(entries.len())?;
                for (key, item) in entries {
                    self.write_key(key)?;
                    self.write_json(item)?;
                }
                self.end_map()
            }
        }
    }

    /// Number of containers currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Close the document and return the encoded block.
    pub fn finish(self) -> Result<Block, CodecError> {
        if !self.stack.is_empty() {
            return Err(CodecError::UnclosedContainer {
                open: self.stack.len(),
            });
        }
        let root = self.root.ok_or(CodecError::NoValue)?;
        let mut bytes = Vec::with_capacity(MAGIC.len() + root.len());
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&root);
        Ok(Block::from_trusted(bytes))
    }

    /// Fail if `levels` more containers would nest deeper than [`MAX_DEPTH`].
    fn check_depth(&self, levels: usize) -> Result<(), CodecError> {
        if self.stack.len() + levels > MAX_DEPTH {
            return Err(CodecError::MaxDepthExceeded { max: MAX_DEPTH });
        }
        Ok(())
    }

    /// Hand a finished value to the innermost open container, or make it the root.
    fn emit(&mut self, bytes: Vec<u8>) -> Result<(), CodecError> {
        match self.stack.last_mut() {
            Some(Frame::Seq(items)) => {
                items.push(bytes);
                Ok(())
            }
            Some(Frame::Map { entries, key }) => {
                let key = key.take().ok_or(CodecError::MissingKey)?;
                entries.push((key, bytes));
                Ok(())
            }
            None if self.root.is_some() => Err(CodecError::MultipleRoots),
            None => {
                self.root = Some(bytes);
                Ok(())
            }
        }
    }
}

fn checked_u32(size: usize) -> Result<u32, CodecError> {
    u32::try_from(size).map_err(|_| CodecError::TooLarge { size })
}

fn encode_payload(kind: ValueKind, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    let len = checked_u32(payload.len())?;
    let mut bytes = Vec::with_capacity(1 + LEN_SIZE + payload.len());
    bytes.push(tag_for(kind));
    bytes.extend_from_slice(&len.to_le_bytes());
    bytes.extend_from_slice(payload);
    Ok(bytes)
}

/// Lay out a container: header, offset table, then the children back to back.
fn encode_container(kind: ValueKind, children: Vec<Vec<u8>>) -> Result<Vec<u8>, CodecError> {
    let header = CONTAINER_HEADER + children.len() * 4;
    let total = header + children.iter().map(Vec::len).sum::<usize>();
    let mut bytes = Vec::with_capacity(total);
    bytes.push(tag_for(kind));
    bytes.extend_from_slice(&checked_u32(total)?.to_le_bytes());
    bytes.extend_from_slice(&checked_u32(children.len())?.to_le_bytes());
    let mut offset = header;
    for child in &children {
        bytes.extend_from_slice(&checked_u32(offset)?.to_le_bytes());
        offset += child.len();
    }
    for child in children {
        bytes.extend_from_slice(&child);
    }
    Ok(bytes)
}

fn encode_seq(items: Vec<Vec<u8>>) -> Result<Vec<u8>, CodecError> {
    encode_container(ValueKind::Seq, items)
}

fn encode_map(mut entries: Vec<(String, Vec<u8>)>) -> Result<Vec<u8>, CodecError> {
    entries.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));
    if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(CodecError::DuplicateKey {
            key: pair[0].0.clone(),
        });
    }
    let children = entries
        .into_iter()
        .map(|(key, value)| {
            let mut entry = Vec::with_capacity(LEN_SIZE + key.len() + value.len());
            entry.extend_from_slice(&checked_u32(key.len())?.to_le_bytes());
            entry.extend_from_slice(key.as_bytes());
            entry.extend_from_slice(&value);
            Ok(entry)
        })
        .collect::<Result<Vec<_>, CodecError>>()?;
    encode_container(ValueKind::Map, children)
}
