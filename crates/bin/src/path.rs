//! Dotted paths into a document.
//!
//! A path such as `items.0.name` is split on `.`. Each segment is a key when
//! the value it is applied to is a map, and an index when it is a sequence.

use palimpsest::{OverlayMap, OverlaySeq, Root, Value};

use crate::commands::CliResult;

/// The collection that owns the last segment of a path.
pub enum Target {
    Map(OverlayMap, String),
    Seq(OverlaySeq, usize),
}

pub fn split(path: &str) -> Vec<&str> {
    path.split('.').filter(|segment| !segment.is_empty()).collect()
}

/// Read the value at `segments`, materializing everything along the way.
pub fn resolve(root: &Root, segments: &[&str]) -> CliResult<Value> {
    let mut current = root.as_native()?;
    for segment in segments {
        current = child(&current, segment)?;
    }
    Ok(current)
}

/// Find the collection and position a write to `path` applies to.
pub fn target(root: &Root, path: &str) -> CliResult<Target> {
    let segments = split(path);
    let Some((last, parents)) = segments.split_last() else {
        return Err("path must not be empty".into());
    };
    match resolve(root, parents)? {
        Value::Map(map) => Ok(Target::Map(map, last.to_string())),
        Value::Seq(seq) => Ok(Target::Seq(seq, parse_index(last)?)),
        other => Err(format!("cannot edit inside a {} value", other.type_name()).into()),
    }
}

fn child(value: &Value, segment: &str) -> CliResult<Value> {
    match value {
        Value::Map(map) => map
            .value(segment)?
            .ok_or_else(|| format!("no key {segment:?}").into()),
        Value::Seq(seq) => Ok(seq.value(parse_index(segment)?)?),
        other => Err(format!("cannot descend into a {} value at {segment:?}", other.type_name()).into()),
    }
}

fn parse_index(segment: &str) -> CliResult<usize> {
    segment
        .parse()
        .map_err(|_| format!("expected a sequence index, found {segment:?}").into())
}
