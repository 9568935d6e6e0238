//! Native values produced by materialization.
//!
//! [`Value`] is the closed set of things a [`Slot`](super::Slot) can hold once
//! it has been converted: scalars copied out of the backing block, overlay
//! collections, or a caller-defined [`Encodable`] object.
//!
//! Containers are handles. Cloning a `Value::Map` clones the handle, not the
//! map, so two clones observe the same edits.

use std::{any::Any, fmt, rc::Rc};

use serde::ser::{Error as _, Serialize, Serializer};

use super::{Collection, OverlayMap, OverlaySeq};
use crate::codec::{EncodedValue, Encoder, ValueKind};

/// A caller-defined object that can be stored in a slot.
///
/// Delegates create these for encoded values that deserve a richer native
/// representation than a plain map. The object writes itself back with
/// [`Encodable::encode_to`].
pub trait Encodable: fmt::Debug {
    /// Write this object as exactly one encoded value.
    fn encode_to(&self, encoder: &mut Encoder) -> crate::Result<()>;

    /// Short name used in type mismatch errors.
    fn type_name(&self) -> &'static str {
        "custom"
    }

    fn as_any(&self) -> &dyn Any;
}

/// Native representation of a slot's content.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Blob(Vec<u8>),
    Map(OverlayMap),
    Seq(OverlaySeq),
    Custom(Rc<dyn Encodable>),
}

impl Value {
    /// Copy an encoded scalar into a native value. Returns `None` for maps and
    /// sequences, which need a parent to be wrapped in an overlay.
    pub fn from_scalar(raw: &EncodedValue) -> Option<Value> {
        Some(match raw.kind() {
            ValueKind::Null => Value::Null,
            ValueKind::Bool => Value::Bool(raw.as_bool()?),
            ValueKind::Int => Value::Int(raw.as_int()?),
            ValueKind::Float => Value::Float(raw.as_float()?),
            ValueKind::Str => Value::Str(raw.as_str()?.to_string()),
            ValueKind::Blob => Value::Blob(raw.as_blob()?.to_vec()),
            ValueKind::Seq | ValueKind::Map => return None,
        })
    }

    /// Wrap a caller-defined object.
    pub fn custom(object: impl Encodable + 'static) -> Self {
        Value::Custom(Rc::new(object))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Blob(_) => "blob",
            Value::Map(_) => "map",
            Value::Seq(_) => "sequence",
            Value::Custom(object) => object.type_name(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Floats, and ints widened to `f64`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&OverlayMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&OverlaySeq> {
        match self {
            Value::Seq(seq) => Some(seq),
            _ => None,
        }
    }

    /// Downcast a custom object to its concrete type.
    pub fn as_custom<T: 'static>(&self) -> Option<&T> {
        match self {
            Value::Custom(object) => object.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// The overlay collection behind this value, if it is one.
    pub fn as_collection(&self) -> Option<Collection> {
        match self {
            Value::Map(map) => Some(Collection::Map(map.clone())),
            Value::Seq(seq) => Some(Collection::Seq(seq.clone())),
            _ => None,
        }
    }

    /// Write this value into `encoder`. Collections encode through their own
    /// overlay, so untouched parts are still passed through.
    pub fn encode_to(&self, encoder: &mut Encoder) -> crate::Result<()> {
        match self {
            Value::Null => encoder.write_null()?,
            Value::Bool(b) => encoder.write_bool(*b)?,
            Value::Int(n) => encoder.write_int(*n)?,
            Value::Float(n) => encoder.write_float(*n)?,
            Value::Str(s) => encoder.write_str(s)?,
            Value::Blob(b) => encoder.write_blob(b)?,
            Value::Map(map) => map.encode_to(encoder)?,
            Value::Seq(seq) => seq.encode_to(encoder)?,
            Value::Custom(object) => object.encode_to(encoder)?,
        }
        Ok(())
    }

    /// Materialize this value and everything below it as JSON.
    pub fn to_json(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl PartialEq for Value {
    /// Scalars compare by value; collections and custom objects by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Blob(a), Value::Blob(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            (Value::Seq(a), Value::Seq(b)) => a.ptr_eq(b),
            (Value::Custom(a), Value::Custom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Blob(b) => serde_bytes::Bytes::new(b).serialize(serializer),
            Value::Map(map) => map.serialize(serializer),
            Value::Seq(seq) => seq.serialize(serializer),
            Value::Custom(object) => {
                let mut encoder = Encoder::new();
                object.encode_to(&mut encoder).map_err(S::Error::custom)?;
                let block = encoder.finish().map_err(S::Error::custom)?;
                block.root().serialize(serializer)
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Blob(value.to_vec())
    }
}

impl From<OverlayMap> for Value {
    fn from(value: OverlayMap) -> Self {
        Value::Map(value)
    }
}

impl From<OverlaySeq> for Value {
    fn from(value: OverlaySeq) -> Self {
        Value::Seq(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_int() == Some(*other)
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}
