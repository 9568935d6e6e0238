//! Custom materialization through a delegate.

use palimpsest::{OverlayMap, OverlaySeq, Root, RootOptions, Value};
use serde_json::json;

use super::helpers::{Point, PointDelegate};
use crate::helpers::{block, reencode, root_map};

fn open_points() -> Root {
    Root::open_with(
        block(json!({
            "origin": {"@type": "point", "x": 0, "y": 0},
            "path": [
                {"@type": "point", "x": 1, "y": 2},
                {"@type": "other", "x": 9},
            ],
        })),
        RootOptions::default().with_delegate(PointDelegate),
    )
}

#[test]
fn test_tagged_maps_become_custom_values() {
    let root = open_points();
    let map = root_map(&root);
    let origin = map.value("origin").unwrap().unwrap();
    assert_eq!(origin.as_custom::<Point>(), Some(&Point { x: 0, y: 0 }));
    assert_eq!(origin.type_name(), "point");
    // Cached, so the same object comes back.
    assert_eq!(map.value("origin").unwrap().unwrap(), origin);
}

#[test]
fn test_delegate_is_inherited_by_children() {
    let root = open_points();
    let map = root_map(&root);
    let path = OverlaySeq::try_from(map.value("path").unwrap().unwrap()).unwrap();
    assert_eq!(
        path.value(0).unwrap().as_custom::<Point>(),
        Some(&Point { x: 1, y: 2 })
    );
    let other = OverlayMap::try_from(path.value(1).unwrap()).unwrap();
    assert_eq!(other.value("x").unwrap(), Some(Value::Int(9)));
    assert!(root.new_seq().is_empty());
}

#[test]
fn test_custom_values_encode_themselves() {
    let root = open_points();
    let map = root_map(&root);
    map.set("end", Value::custom(Point { x: 5, y: 6 })).unwrap();
    assert_eq!(
        reencode(&root)["end"],
        json!({"@type": "point", "x": 5, "y": 6})
    );
    assert_eq!(
        root.to_json().unwrap()["origin"],
        json!({"@type": "point", "x": 0, "y": 0})
    );
}

#[test]
fn test_custom_value_is_not_a_map() {
    let root = open_points();
    let map = root_map(&root);
    let origin = map.value("origin").unwrap().unwrap();
    let err = OverlayMap::try_from(origin).unwrap_err();
    assert!(err.is_type_error());
}
