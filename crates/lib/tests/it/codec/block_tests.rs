//! Block verification and zero-copy reads.

use std::thread;

use palimpsest::{
    Block, Root,
    codec::{CodecError, MAGIC, ValueKind},
};
use serde_json::json;

use crate::helpers::block;

#[test]
fn test_blocks_are_shared_across_threads() {
    let block = block(json!({"list": [1, 2, 3], "name": "shared"}));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let block = block.clone();
            thread::spawn(move || {
                let root = block.root();
                let list = root.get("list").unwrap();
                list.elements().filter_map(|v| v.as_int()).sum::<i64>()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 6);
    }
}

#[test]
fn test_many_roots_over_one_block() {
    let block = block(json!({"k": 1}));
    let first = Root::open(block.clone());
    let second = Root::open(block.clone());
    crate::helpers::root_map(&first).set("k", 2).unwrap();
    assert_eq!(second.to_json().unwrap(), json!({"k": 1}));
    assert_eq!(first.to_json().unwrap(), json!({"k": 2}));
    assert!(first.block().unwrap().ptr_eq(&block));
}

#[test]
fn test_value_views() {
    let block = block(json!({"a": {"b": [null, false, 2.5, "x"]}}));
    let root = block.root();
    assert_eq!(root.kind(), ValueKind::Map);
    assert!(root.kind().is_container());

    let seq = root.get("a").unwrap().get("b").unwrap();
    assert_eq!(seq.count(), 4);
    assert!(seq.index(0).unwrap().is_null());
    assert_eq!(seq.index(1).unwrap().as_bool(), Some(false));
    assert_eq!(seq.index(2).unwrap().as_float(), Some(2.5));
    assert_eq!(seq.index(3).unwrap().as_str(), Some("x"));
    assert!(seq.index(4).is_none());
    assert!(root.get("missing").is_none());
}

#[test]
fn test_serialize_encoded_value() {
    let block = block(json!({"z": [true], "a": "first"}));
    let json = serde_json::to_value(block.root()).unwrap();
    assert_eq!(json, json!({"a": "first", "z": [true]}));
}

#[test]
fn test_verification_errors_surface_through_roots() {
    let mut bytes = block(json!([1, 2])).as_bytes().to_vec();
    bytes.truncate(bytes.len() - 2);
    let err = Root::from_bytes(&bytes).unwrap_err();
    assert!(err.is_codec_error());
    assert!(err.is_corrupt_data());

    let err = Root::from_bytes(b"JUNK").unwrap_err();
    assert_eq!(err.module(), "codec");
    assert!(matches!(
        err,
        palimpsest::Error::Codec(CodecError::InvalidMagic)
    ));
}

#[test]
fn test_null_document_layout() {
    let block = block(json!(null));
    assert_eq!(&block.as_bytes()[..4], &MAGIC);
    assert_eq!(block.len(), MAGIC.len() + 1);
    assert!(Block::from_bytes(block.as_bytes()).is_ok());
}
