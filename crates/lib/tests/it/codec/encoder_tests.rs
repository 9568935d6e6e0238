//! Encoder behavior visible to overlay users.

use palimpsest::{Block, Encoder};
use serde_json::json;

use crate::helpers::block;

#[test]
fn test_build_document_by_hand() {
    let mut encoder = Encoder::new();
    encoder.begin_map(3).unwrap();
    encoder.write_key("name").unwrap();
    encoder.write_str("sensor").unwrap();
    encoder.write_key("readings").unwrap();
    encoder.begin_seq(2).unwrap();
    encoder.write_float(1.25).unwrap();
    encoder.write_int(-4).unwrap();
    encoder.end_seq().unwrap();
    encoder.write_key("raw").unwrap();
    encoder.write_blob(&[0xde, 0xad]).unwrap();
    encoder.end_map().unwrap();
    assert_eq!(encoder.depth(), 0);

    let block = encoder.finish().unwrap();
    let root = block.root();
    assert_eq!(root.get("raw").unwrap().as_blob(), Some(&[0xde, 0xad][..]));
    assert_eq!(
        block.to_json().unwrap(),
        json!({"name": "sensor", "readings": [1.25, -4], "raw": [222, 173]})
    );
}

#[test]
fn test_raw_passthrough_between_blocks() {
    let source = block(json!({"nested": {"deep": [1, {"x": "y"}]}}));
    let nested = source.root().get("nested").unwrap();

    let mut encoder = Encoder::new();
    encoder.begin_seq(2).unwrap();
    encoder.write_raw(&nested).unwrap();
    encoder.write_raw(&nested).unwrap();
    encoder.end_seq().unwrap();
    let copy = encoder.finish().unwrap();

    let first = copy.root().index(0).unwrap();
    assert_eq!(first.raw(), nested.raw());
    assert_eq!(first, nested);
    assert_eq!(
        copy.to_json().unwrap(),
        json!([{"deep": [1, {"x": "y"}]}, {"deep": [1, {"x": "y"}]}])
    );
}

#[test]
fn test_encoded_blocks_reverify() {
    let original = block(json!({"b": [1, 2.5, "s", null, true], "a": {}}));
    let reopened = Block::from_bytes(original.as_bytes().to_vec()).unwrap();
    assert_eq!(reopened.as_bytes(), original.as_bytes());
}

#[test]
fn test_misuse_classification() {
    let mut encoder = Encoder::new();
    encoder.begin_seq(0).unwrap();
    let err = encoder.end_map().unwrap_err();
    assert!(err.is_encoder_misuse());
    assert!(!err.is_corrupt_data());
}
