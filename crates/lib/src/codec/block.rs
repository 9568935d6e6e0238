//! Immutable encoded blocks and zero-copy views into them.
//!
//! A [`Block`] owns the bytes of one encoded document behind an `Arc`, so it
//! can be cloned cheaply and shared read-only between any number of overlay
//! roots. The whole structure is verified once in [`Block::from_bytes`]; after
//! that every [`EncodedValue`] accessor is infallible.
//!
//! Containers store the offsets of their children relative to their own
//! start, which makes every value's byte span relocatable: writing a value
//! into another block is a plain copy of [`EncodedValue::raw`].

use std::{cmp::Ordering, fmt, sync::Arc};

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use super::{
    CodecError,
    encoder::Encoder,
    tag::{
        CONTAINER_HEADER, FIXED_SIZE, LEN_SIZE, ValueKind, bool_value, is_well_formed, read_u32,
        read_u64,
    },
};

/// Leading bytes of every block.
pub const MAGIC: [u8; 4] = *b"PLMP";

/// Deepest container nesting accepted by the verifier.
pub const MAX_DEPTH: usize = 128;

/// An immutable, verified encoded document.
#[derive(Clone)]
pub struct Block {
    bytes: Arc<[u8]>,
}

impl Block {
    /// Verify `bytes` and wrap them as a block.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] describing the first structural problem found.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self, CodecError> {
        let bytes = bytes.into();
        if bytes.len() < MAGIC.len() || bytes[..MAGIC.len()] != MAGIC {
            return Err(CodecError::InvalidMagic);
        }
        let span = verify_value(&bytes, MAGIC.len(), bytes.len(), 0)?;
        let end = MAGIC.len() + span;
        if end != bytes.len() {
            return Err(CodecError::TrailingBytes {
                count: bytes.len() - end,
            });
        }
        Ok(Self { bytes })
    }

    /// Encode a JSON value into a new block.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, CodecError> {
        let mut encoder = Encoder::new();
        encoder.write_json(json)?;
        encoder.finish()
    }

    /// Wrap bytes produced by the encoder, which are valid by construction.
    pub(crate) fn from_trusted(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// The top-level value.
    pub fn root(&self) -> EncodedValue {
        EncodedValue {
            block: self.clone(),
            offset: MAGIC.len(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the whole block into JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self.root())
    }

    /// True when both handles share the same allocation.
    pub fn ptr_eq(&self, other: &Block) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("len", &self.bytes.len())
            .field("root", &self.root().kind())
            .finish()
    }
}

impl AsRef<[u8]> for Block {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// A view of one value inside a [`Block`].
///
/// Holds a handle to the block and the absolute offset of the value's tag
/// byte. Cloning is an `Arc` increment.
#[derive(Clone)]
pub struct EncodedValue {
    block: Block,
    offset: usize,
}

impl EncodedValue {
    #[inline]
    fn buf(&self) -> &[u8] {
        &self.block.bytes
    }

    #[inline]
    fn tag(&self) -> u8 {
        self.buf()[self.offset]
    }

    fn at(&self, offset: usize) -> EncodedValue {
        EncodedValue {
            block: self.block.clone(),
            offset,
        }
    }

    /// The block this value lives in.
    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn kind(&self) -> ValueKind {
        ValueKind::from_tag(self.tag())
    }

    /// Total encoded size of this value, children included.
    pub fn span(&self) -> usize {
        let buf = self.buf();
        match self.kind() {
            ValueKind::Null | ValueKind::Bool => 1,
            ValueKind::Int | ValueKind::Float => FIXED_SIZE,
            ValueKind::Str | ValueKind::Blob => {
                1 + LEN_SIZE + read_u32(buf, self.offset + 1) as usize
            }
            ValueKind::Seq | ValueKind::Map => read_u32(buf, self.offset + 1) as usize,
        }
    }

    /// The encoded bytes of this value, suitable for zero-copy passthrough.
    pub fn raw(&self) -> &[u8] {
        &self.buf()[self.offset..self.offset + self.span()]
    }

    pub fn is_null(&self) -> bool {
        self.kind() == ValueKind::Null
    }

    pub fn as_bool(&self) -> Option<bool> {
        (self.kind() == ValueKind::Bool).then(|| bool_value(self.tag()))
    }

    pub fn as_int(&self) -> Option<i64> {
        (self.kind() == ValueKind::Int).then(|| read_u64(self.buf(), self.offset + 1) as i64)
    }

    pub fn as_float(&self) -> Option<f64> {
        (self.kind() == ValueKind::Float)
            .then(|| f64::from_bits(read_u64(self.buf(), self.offset + 1)))
    }

    pub fn as_str(&self) -> Option<&str> {
        if self.kind() != ValueKind::Str {
            return None;
        }
        // Verified as UTF-8 when the block was opened.
        std::str::from_utf8(self.payload()).ok()
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        (self.kind() == ValueKind::Blob).then(|| self.payload())
    }

    fn payload(&self) -> &[u8] {
        let start = self.offset + 1 + LEN_SIZE;
        let len = read_u32(self.buf(), self.offset + 1) as usize;
        &self.buf()[start..start + len]
    }

    /// Number of children of a container; zero for scalars.
    pub fn count(&self) -> usize {
        if self.kind().is_container() {
            read_u32(self.buf(), self.offset + 5) as usize
        } else {
            0
        }
    }

    /// Absolute offset of the `i`th entry of a container's offset table.
    fn child_offset(&self, i: usize) -> usize {
        let table = self.offset + CONTAINER_HEADER;
        self.offset + read_u32(self.buf(), table + i * 4) as usize
    }

    /// Element `index` of a sequence.
    pub fn index(&self, index: usize) -> Option<EncodedValue> {
        if self.kind() != ValueKind::Seq || index >= self.count() {
            return None;
        }
        Some(self.at(self.child_offset(index)))
    }

    /// Key and value of map entry `i`, in storage order.
    fn entry(&self, i: usize) -> (&str, EncodedValue) {
        let entry = self.child_offset(i);
        let key_len = read_u32(self.buf(), entry) as usize;
        let key_start = entry + LEN_SIZE;
        let key = std::str::from_utf8(&self.buf()[key_start..key_start + key_len]).unwrap_or("");
        (key, self.at(key_start + key_len))
    }

    /// Look up `key` in a map by binary search.
    pub fn get(&self, key: &str) -> Option<EncodedValue> {
        if self.kind() != ValueKind::Map {
            return None;
        }
        let (mut low, mut high) = (0, self.count());
        while low < high {
            let mid = low + (high - low) / 2;
            let (probe, value) = self.entry(mid);
            match probe.as_bytes().cmp(key.as_bytes()) {
                Ordering::Equal => return Some(value),
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
            }
        }
        None
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Map keys in storage order. Empty for non-maps.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries().map(|(key, _)| key)
    }

    /// Map entries in storage order. Empty for non-maps.
    pub fn entries(&self) -> impl Iterator<Item = (&str, EncodedValue)> + '_ {
        let count = if self.kind() == ValueKind::Map {
            self.count()
        } else {
            0
        };
        (0..count).map(move |i| self.entry(i))
    }

    /// Sequence elements in order. Empty for non-sequences.
    pub fn elements(&self) -> impl Iterator<Item = EncodedValue> + '_ {
        let count = if self.kind() == ValueKind::Seq {
            self.count()
        } else {
            0
        };
        (0..count).map(move |i| self.at(self.child_offset(i)))
    }

    /// Levels of container nesting: zero for scalars, one for a container of
    /// scalars.
    pub fn depth(&self) -> usize {
        let below = match self.kind() {
            ValueKind::Seq => self.elements().map(|value| value.depth()).max(),
            ValueKind::Map => self.entries().map(|(_, value)| value.depth()).max(),
            _ => return 0,
        };
        1 + below.unwrap_or(0)
    }

    /// Decode this value and everything below it into JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl PartialEq for EncodedValue {
    /// Encoding is canonical (sorted keys, fixed-width scalars), so byte
    /// equality is value equality.
    fn eq(&self, other: &Self) -> bool {
        self.raw() == other.raw()
    }
}

impl fmt::Debug for EncodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedValue")
            .field("kind", &self.kind())
            .field("offset", &self.offset)
            .field("span", &self.span())
            .finish()
    }
}

impl Serialize for EncodedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.kind() {
            ValueKind::Null => serializer.serialize_unit(),
            ValueKind::Bool => serializer.serialize_bool(bool_value(self.tag())),
            ValueKind::Int => serializer.serialize_i64(self.as_int().unwrap_or_default()),
            ValueKind::Float => serializer.serialize_f64(self.as_float().unwrap_or_default()),
            ValueKind::Str => serializer.serialize_str(self.as_str().unwrap_or_default()),
            ValueKind::Blob => serde_bytes::Bytes::new(self.payload()).serialize(serializer),
            ValueKind::Seq => {
                let mut seq = serializer.serialize_seq(Some(self.count()))?;
                for element in self.elements() {
                    seq.serialize_element(&element)?;
                }
                seq.end()
            }
            ValueKind::Map => {
                let mut map = serializer.serialize_map(Some(self.count()))?;
                for (key, value) in self.entries() {
                    map.serialize_entry(key, &value)?;
                }
                map.end()
            }
        }
    }
}

/// Verify the value starting at `at`, which must end by `end`. Returns its span.
fn verify_value(buf: &[u8], at: usize, end: usize, depth: usize) -> Result<usize, CodecError> {
    if at >= end {
        return Err(CodecError::Truncated { offset: at });
    }
    let tag = buf[at];
    if !is_well_formed(tag) {
        return Err(CodecError::InvalidTag { tag, offset: at });
    }
    let fits = |len: usize| {
        at.checked_add(len)
            .filter(|stop| *stop <= end)
            .map(|_| len)
            .ok_or(CodecError::Truncated { offset: at })
    };

    match ValueKind::from_tag(tag) {
        ValueKind::Null | ValueKind::Bool => fits(1),
        ValueKind::Int | ValueKind::Float => fits(FIXED_SIZE),
        kind @ (ValueKind::Str | ValueKind::Blob) => {
            fits(1 + LEN_SIZE)?;
            let len = read_u32(buf, at + 1) as usize;
            let span = fits(1 + LEN_SIZE + len)?;
            if kind == ValueKind::Str {
                let start = at + 1 + LEN_SIZE;
                std::str::from_utf8(&buf[start..start + len])
                    .map_err(|_| CodecError::InvalidUtf8 { offset: start })?;
            }
            Ok(span)
        }
        kind @ (ValueKind::Seq | ValueKind::Map) => {
            if depth >= MAX_DEPTH {
                return Err(CodecError::MaxDepthExceeded { max: MAX_DEPTH });
            }
            fits(CONTAINER_HEADER)?;
            let span = read_u32(buf, at + 1) as usize;
            let count = read_u32(buf, at + 5) as usize;
            let header = count
                .checked_mul(4)
                .and_then(|table| table.checked_add(CONTAINER_HEADER))
                .ok_or(CodecError::Truncated { offset: at })?;
            if header > span {
                return Err(CodecError::Truncated { offset: at });
            }
            fits(span)?;
            let stop = at + span;
            // Children sit back to back in table order, from the end of the
            // header to the end of the span.
            let mut next = header;
            let mut previous_key: Option<&[u8]> = None;
            for i in 0..count {
                let table_at = at + CONTAINER_HEADER + i * 4;
                let rel = read_u32(buf, table_at) as usize;
                if rel != next {
                    return Err(CodecError::InvalidOffset { offset: table_at });
                }
                let child = at + rel;
                if kind == ValueKind::Seq {
                    next = rel + verify_value(buf, child, stop, depth + 1)?;
                    continue;
                }
                if child + LEN_SIZE > stop {
                    return Err(CodecError::Truncated { offset: child });
                }
                let key_len = read_u32(buf, child) as usize;
                let key_start = child + LEN_SIZE;
                let key_end = key_start
                    .checked_add(key_len)
                    .filter(|key_end| *key_end <= stop)
                    .ok_or(CodecError::Truncated { offset: child })?;
                let key = &buf[key_start..key_end];
                std::str::from_utf8(key)
                    .map_err(|_| CodecError::InvalidUtf8 { offset: key_start })?;
                if previous_key.is_some_and(|previous| previous >= key) {
                    return Err(CodecError::UnsortedKeys { offset: child });
                }
                previous_key = Some(key);
                next = key_end - at + verify_value(buf, key_end, stop, depth + 1)?;
            }
            if next != span {
                return Err(CodecError::InvalidOffset { offset: at });
            }
            Ok(span)
        }
    }
}
