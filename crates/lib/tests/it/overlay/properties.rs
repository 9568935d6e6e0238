//! End-to-end guarantees: passthrough, identity, propagation, round trips.

use palimpsest::{OverlayMap, OverlaySeq, Root, Value};
use serde_json::json;

use crate::helpers::{block, open, reencode, root_map};

fn document() -> serde_json::Value {
    json!({
        "title": "inventory",
        "items": [
            {"sku": "a-1", "qty": 3, "tags": ["red", "small"]},
            {"sku": "b-2", "qty": 0, "tags": []},
        ],
        "meta": {"version": 1, "owner": {"name": "ops"}},
    })
}

#[test]
fn test_passthrough_idempotence() {
    let original = block(document());
    let root = Root::open(original.clone());
    let map = root_map(&root);
    // Reads alone never mutate.
    let _ = map.value("items").unwrap();
    let _ = map.keys();
    assert!(!root.is_mutated());

    let encoded = root.encode().unwrap();
    assert_eq!(encoded.as_bytes(), original.as_bytes());
    assert_eq!(encoded.to_json().unwrap(), document());
    // Encoding is repeatable.
    assert_eq!(root.encode().unwrap().as_bytes(), encoded.as_bytes());
}

#[test]
fn test_slot_identity_stability() {
    let root = open(document());
    let map = root_map(&root);
    let first = map.get("meta").as_native(palimpsest::overlay::Parent::Map(&map)).unwrap();
    let second = map.value("meta").unwrap().unwrap();
    assert_eq!(first, second);

    first.as_map().unwrap().set("version", 2).unwrap();
    let third = OverlayMap::try_from(map.value("meta").unwrap().unwrap()).unwrap();
    assert_eq!(third.value("version").unwrap(), Some(Value::Int(2)));
}

#[test]
fn test_mutation_propagates_to_root() {
    let root = open(document());
    let map = root_map(&root);
    let owner = OverlayMap::try_from(
        OverlayMap::try_from(map.value("meta").unwrap().unwrap())
            .unwrap()
            .value("owner")
            .unwrap()
            .unwrap(),
    )
    .unwrap();
    assert!(!root.is_mutated());

    owner.set("name", "platform").unwrap();
    assert!(owner.is_mutated());
    assert!(map.is_mutated());
    assert!(root.is_mutated());
    assert!(map.get("meta").is_mutated());
    // Siblings keep their backing reference.
    assert!(!map.get("items").is_mutated());
}

#[test]
fn test_round_trip_after_nested_edits() {
    let root = open(document());
    let map = root_map(&root);
    let items = OverlaySeq::try_from(map.value("items").unwrap().unwrap()).unwrap();

    let first = OverlayMap::try_from(items.value(0).unwrap()).unwrap();
    first.set("qty", 2).unwrap();
    let tags = OverlaySeq::try_from(first.value("tags").unwrap().unwrap()).unwrap();
    tags.remove(1).unwrap();
    tags.append("sale").unwrap();

    let fresh = root.new_map();
    fresh.set("sku", "c-3").unwrap();
    fresh.set("qty", 7).unwrap();
    items.insert(1, fresh).unwrap();
    items.remove(2).unwrap();

    map.remove("title").unwrap();
    map.set("updated", true).unwrap();

    let expected = json!({
        "items": [
            {"sku": "a-1", "qty": 2, "tags": ["red", "sale"]},
            {"sku": "c-3", "qty": 7},
        ],
        "meta": {"version": 1, "owner": {"name": "ops"}},
        "updated": true,
    });
    assert_eq!(reencode(&root), expected);

    // Editing the reopened block again starts from the new bytes.
    let reopened = Root::from_bytes(root.encode().unwrap().as_bytes()).unwrap();
    root_map(&reopened).set("updated", false).unwrap();
    let mut expected = expected;
    expected["updated"] = json!(false);
    assert_eq!(reencode(&reopened), expected);
}

#[test]
fn test_moving_a_collection_relinks_it() {
    let root = open(json!({"from": {"n": 1}, "to": {}}));
    let map = root_map(&root);
    let child = map.value("from").unwrap().unwrap();
    let to = OverlayMap::try_from(map.value("to").unwrap().unwrap()).unwrap();

    // Once nothing holds it any more, storing it moves the collection itself.
    map.remove("from").unwrap();
    to.set("moved", child.clone()).unwrap();
    child.as_map().unwrap().set("n", 2).unwrap();

    assert_eq!(to.value("moved").unwrap().unwrap(), child);
    assert_eq!(reencode(&root), json!({"to": {"moved": {"n": 2}}}));
}

#[test]
fn test_storing_a_held_collection_stores_a_copy() {
    let root = open(json!({"from": {"n": 1}, "to": {}}));
    let map = root_map(&root);
    let child = map.value("from").unwrap().unwrap();
    let to = OverlayMap::try_from(map.value("to").unwrap().unwrap()).unwrap();

    to.set("moved", child.clone()).unwrap();
    child.as_map().unwrap().set("n", 2).unwrap();

    let expected = json!({"from": {"n": 2}, "to": {"moved": {"n": 1}}});
    assert_eq!(root.to_json().unwrap(), expected);
    assert_eq!(reencode(&root), expected);
    assert_ne!(to.value("moved").unwrap().unwrap(), child);
}

#[test]
fn test_copies_of_edited_collections_are_independent() {
    let root = open(json!({"from": {"n": 1}, "to": []}));
    let map = root_map(&root);
    let child = OverlayMap::try_from(map.value("from").unwrap().unwrap()).unwrap();
    let inner = OverlaySeq::default();
    child.set("inner", inner.clone()).unwrap();
    let to = OverlaySeq::try_from(map.value("to").unwrap().unwrap()).unwrap();

    to.append(child.clone()).unwrap();
    let copy = OverlayMap::try_from(to.value(0).unwrap()).unwrap();
    let copied_inner = OverlaySeq::try_from(copy.value("inner").unwrap().unwrap()).unwrap();
    assert!(!copied_inner.ptr_eq(&inner));

    inner.append("original").unwrap();
    copied_inner.append("copy").unwrap();
    copy.set("n", 3).unwrap();

    let expected = json!({
        "from": {"n": 1, "inner": ["original"]},
        "to": [{"n": 3, "inner": ["copy"]}],
    });
    assert_eq!(root.to_json().unwrap(), expected);
    assert_eq!(reencode(&root), expected);
}

#[test]
fn test_cycles_are_rejected() {
    let root = open(json!({"a": {"b": {}}}));
    let map = root_map(&root);
    let a = OverlayMap::try_from(map.value("a").unwrap().unwrap()).unwrap();
    let b = OverlayMap::try_from(a.value("b").unwrap().unwrap()).unwrap();

    let err = b.set("loop", a.clone()).unwrap_err();
    assert_eq!(err.module(), "overlay");
    assert!(b.is_empty());
    assert!(!root.is_mutated());
}

#[test]
fn test_storing_twice_keeps_cycle_checks_sound() {
    let m = OverlayMap::default();
    let b = OverlayMap::default();
    let c = OverlayMap::default();
    m.set("c", c.clone()).unwrap();
    b.set("c", c.clone()).unwrap();

    let err = c.set("m", m.clone()).unwrap_err();
    assert!(err.to_string().contains("inside itself"));

    // The second store holds a copy, which may take `m` without a cycle.
    let held = OverlayMap::try_from(b.value("c").unwrap().unwrap()).unwrap();
    assert!(!held.ptr_eq(&c));
    held.set("m", m.clone()).unwrap();

    assert_eq!(m.encode().unwrap().to_json().unwrap(), json!({"c": {}}));
    assert_eq!(
        b.encode().unwrap().to_json().unwrap(),
        json!({"c": {"m": {"c": {}}}})
    );
}
