//! Overlay sequence behavior: bounds, reindexing and passthrough.

use palimpsest::{OverlayMap, OverlaySeq, Slot, Value};
use serde_json::json;

use crate::helpers::{open, reencode, root_seq};

#[test]
fn test_sequence_reindexing() {
    let root = open(json!(["x", "y", "z"]));
    let seq = root_seq(&root);
    seq.insert(1, "w").unwrap();
    assert_eq!(seq.to_json().unwrap(), json!(["x", "w", "y", "z"]));
    seq.remove(0).unwrap();
    assert_eq!(seq.to_json().unwrap(), json!(["w", "y", "z"]));
    assert_eq!(reencode(&root), json!(["w", "y", "z"]));
}

#[test]
fn test_insert_at_ends() {
    let root = open(json!([2]));
    let seq = root_seq(&root);
    seq.insert(0, 1).unwrap();
    seq.insert(2, 3).unwrap();
    seq.append(4).unwrap();
    assert_eq!(seq.count(), 4);
    assert_eq!(reencode(&root), json!([1, 2, 3, 4]));
}

#[test]
fn test_bounds() {
    let seq = OverlaySeq::default();
    assert!(seq.get(0).unwrap_err().is_out_of_range());
    assert!(seq.remove(0).unwrap_err().is_out_of_range());
    seq.insert(0, "only").unwrap();
    assert!(seq.set(1, "nope").unwrap_err().is_out_of_range());
    assert!(seq.insert(2, "nope").unwrap_err().is_out_of_range());
    assert_eq!(seq.values().unwrap(), vec![Value::from("only")]);
}

#[test]
fn test_untouched_elements_are_passed_through() {
    let root = open(json!([{"big": [1, 2, 3]}, "b", "c"]));
    let seq = root_seq(&root);
    let original = root.block().unwrap().root().index(0).unwrap();
    seq.set(2, "C").unwrap();

    let encoded = root.encode().unwrap();
    let first = encoded.root().index(0).unwrap();
    assert_eq!(first.raw(), original.raw());
    assert_eq!(encoded.to_json().unwrap(), json!([{"big": [1, 2, 3]}, "b", "C"]));
}

#[test]
fn test_remove_range() {
    let root = open(json!([0, 1, 2, 3, 4, 5]));
    let seq = root_seq(&root);
    seq.remove_range(1, 3).unwrap();
    assert_eq!(seq.to_json().unwrap(), json!([0, 4, 5]));
    seq.remove_range(1, 2).unwrap();
    assert_eq!(reencode(&root), json!([0]));
}

#[test]
fn test_clear_and_refill() {
    let root = open(json!([1, 2, 3]));
    let seq = root_seq(&root);
    seq.clear().unwrap();
    assert_eq!(reencode(&root), json!([]));
    seq.append("again").unwrap();
    assert_eq!(reencode(&root), json!(["again"]));
}

#[test]
fn test_sequences_have_no_holes() {
    let root = open(json!([1, 2]));
    let seq = root_seq(&root);
    assert!(seq.insert_slot(0, Slot::empty()).unwrap_err().is_empty_slot());
    assert!(seq.set_slot(1, Slot::empty()).unwrap_err().is_empty_slot());
    assert_eq!(seq.count(), 2);
    assert!(!seq.is_mutated());
}

#[test]
fn test_nested_collections_in_sequences() {
    let root = open(json!([{"n": 1}]));
    let seq = root_seq(&root);
    let child = seq.value(0).unwrap();
    seq.insert(0, OverlayMap::default()).unwrap();

    // The materialized map moved with its slot.
    assert_eq!(seq.value(1).unwrap(), child);
    child.as_map().unwrap().set("n", 2).unwrap();
    assert_eq!(reencode(&root), json!([{}, {"n": 2}]));
}

#[test]
fn test_iter_yields_stable_slots() {
    let root = open(json!(["a", "b"]));
    let seq = root_seq(&root);
    let slots: Vec<Slot> = seq.iter().collect();
    assert_eq!(slots.len(), 2);
    for (index, slot) in (&seq).into_iter().enumerate() {
        assert!(slot.ptr_eq(&slots[index]));
    }
}
