//! Overlay map behavior: the four write transitions, tombstones and clears.

use palimpsest::{OverlayMap, Slot, Value};
use serde_json::json;

use crate::helpers::{open, reencode, root_map, sorted};

#[test]
fn test_set_new_key() {
    let root = open(json!({"a": 1}));
    let map = root_map(&root);
    map.set("b", "new").unwrap();
    assert_eq!(map.count(), 2);
    assert_eq!(map.value("b").unwrap(), Some(Value::from("new")));
    assert!(map.is_mutated());
}

#[test]
fn test_overwrite_backing_key() {
    let root = open(json!({"a": 1}));
    let map = root_map(&root);
    map.set("a", 2).unwrap();
    assert_eq!(map.count(), 1);
    assert_eq!(map.value("a").unwrap(), Some(Value::Int(2)));
    assert_eq!(reencode(&root), json!({"a": 2}));
}

#[test]
fn test_overwrite_overlay_key() {
    let map = OverlayMap::default();
    map.set("a", 1).unwrap();
    map.set("a", 2).unwrap();
    assert_eq!(map.count(), 1);
    assert_eq!(map.get("a").cached(), Some(Value::Int(2)));
}

#[test]
fn test_remove_backing_then_restore() {
    let root = open(json!({"a": 1, "b": 2}));
    let map = root_map(&root);
    map.remove("a").unwrap();
    assert_eq!(map.count(), 1);
    assert!(map.get("a").is_empty());
    map.set("a", 3).unwrap();
    assert_eq!(map.count(), 2);
    assert_eq!(reencode(&root), json!({"a": 3, "b": 2}));
}

#[test]
fn test_tombstone_over_missing_key_is_noop() {
    let root = open(json!({"a": 1}));
    let map = root_map(&root);
    map.set_slot("ghost", Slot::empty()).unwrap();
    assert_eq!(map.count(), 1);
    assert!(!map.is_mutated());
    assert!(!root.is_mutated());
}

#[test]
fn test_tombstone_suppression() {
    let root = open(json!({"a": 1, "b": 2, "c": 3}));
    let map = root_map(&root);
    map.remove("b").unwrap();
    assert_eq!(map.count(), 2);
    assert!(!map.contains("b"));
    assert_eq!(sorted(map.keys()), vec!["a", "c"]);
    assert_eq!(reencode(&root), json!({"a": 1, "c": 3}));
}

#[test]
fn test_clear_then_reopen() {
    let root = open(json!({"a": 1, "b": 2, "c": 3, "d": 4, "e": 5}));
    let map = root_map(&root);
    map.clear().unwrap();
    assert_eq!(map.count(), 0);
    assert!(map.keys().is_empty());
    assert_eq!(root.block().unwrap().root().count(), 5);
    assert_eq!(reencode(&root), json!({}));

    map.set("f", 6).unwrap();
    assert_eq!(map.keys(), vec!["f"]);
}

#[test]
fn test_entries_and_serialize() {
    let root = open(json!({"x": [1], "y": {"z": null}}));
    let map = root_map(&root);
    map.set("w", 0.5).unwrap();
    let mut keys: Vec<String> = map.entries().into_iter().map(|(k, _)| k).collect();
    keys.sort();
    assert_eq!(keys, vec!["w", "x", "y"]);
    assert_eq!(
        map.to_json().unwrap(),
        json!({"w": 0.5, "x": [1], "y": {"z": null}})
    );
}

#[test]
fn test_storing_slot_from_another_map() {
    let source = open(json!({"shared": {"n": 1}}));
    let target = open(json!({}));
    let from = root_map(&source);
    let to = root_map(&target);

    to.set_slot("copy", from.get("shared")).unwrap();
    assert_eq!(reencode(&target), json!({"copy": {"n": 1}}));
    // The source slot is untouched.
    assert!(!from.get("shared").is_mutated());
    assert!(!source.is_mutated());
}

#[test]
fn test_immutable_map_rejects_every_write() {
    let map = root_map(&open(json!({"a": 1}))).copy(false);
    for err in [
        map.set("b", 1).unwrap_err(),
        map.set_slot("a", Slot::empty()).unwrap_err(),
        map.remove("a").unwrap_err(),
        map.clear().unwrap_err(),
    ] {
        assert!(err.is_illegal_mutation());
    }
    assert_eq!(map.count(), 1);
}

#[test]
fn test_illegal_mutation_names_the_operation() {
    let map = root_map(&open(json!({"a": 1}))).copy(false);
    let err = map.remove("a").unwrap_err();
    assert!(err.to_string().contains("remove"), "{err}");
    let err = map.set("a", 2).unwrap_err();
    assert!(err.to_string().contains("set"), "{err}");
}
