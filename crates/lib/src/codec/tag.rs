//! Tag byte layout for encoded values.
//!
//! Every encoded value starts with a one byte tag. The bottom 3 bits select the
//! kind; the upper 5 bits are zero except for booleans, which keep their value
//! in bit 3.

/// Kind of an encoded value, taken from the bottom 3 bits of its tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueKind {
    Null = 0,
    Bool = 1,
    Int = 2,
    Float = 3,
    Str = 4,
    Blob = 5,
    Seq = 6,
    Map = 7,
}

impl ValueKind {
    /// Parse the kind from a tag byte.
    #[inline]
    #[must_use]
    pub fn from_tag(tag: u8) -> Self {
        match tag & KIND_MASK {
            0 => ValueKind::Null,
            1 => ValueKind::Bool,
            2 => ValueKind::Int,
            3 => ValueKind::Float,
            4 => ValueKind::Str,
            5 => ValueKind::Blob,
            6 => ValueKind::Seq,
            _ => ValueKind::Map,
        }
    }

    /// Name used in error messages and debug output.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "string",
            ValueKind::Blob => "blob",
            ValueKind::Seq => "sequence",
            ValueKind::Map => "map",
        }
    }

    /// True for maps and sequences.
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, ValueKind::Seq | ValueKind::Map)
    }
}

const KIND_MASK: u8 = 0b111;
const BOOL_BIT: u8 = 1 << 3;

/// Size of the `u32` length prefix used by strings, blobs and map keys.
pub(crate) const LEN_SIZE: usize = 4;
/// Tag + total span + count.
pub(crate) const CONTAINER_HEADER: usize = 1 + 4 + 4;
/// Tag + 8 byte payload.
pub(crate) const FIXED_SIZE: usize = 9;

/// Encode the tag byte for a kind. Booleans should use [`bool_tag`].
#[inline]
pub(crate) fn tag_for(kind: ValueKind) -> u8 {
    kind as u8
}

#[inline]
pub(crate) fn bool_tag(value: bool) -> u8 {
    if value {
        ValueKind::Bool as u8 | BOOL_BIT
    } else {
        ValueKind::Bool as u8
    }
}

#[inline]
pub(crate) fn bool_value(tag: u8) -> bool {
    tag & BOOL_BIT != 0
}

/// Whether the non-kind bits of a tag are valid for its kind.
pub(crate) fn is_well_formed(tag: u8) -> bool {
    let extra = tag & !KIND_MASK;
    match ValueKind::from_tag(tag) {
        ValueKind::Bool => extra & !BOOL_BIT == 0,
        _ => extra == 0,
    }
}

#[inline]
pub(crate) fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

#[inline]
pub(crate) fn read_u64(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(bytes)
}
