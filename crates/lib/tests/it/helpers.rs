use palimpsest::{Block, OverlayMap, OverlaySeq, Root};

/// Encode a JSON document into a verified block.
pub fn block(json: serde_json::Value) -> Block {
    Block::from_json(&json).expect("Failed to encode test document")
}

/// Open a mutable root over a JSON document.
pub fn open(json: serde_json::Value) -> Root {
    Root::open(block(json))
}

/// The root map of a document.
pub fn root_map(root: &Root) -> OverlayMap {
    OverlayMap::try_from(root.as_native().expect("Failed to read root"))
        .expect("Root is not a map")
}

/// The root sequence of a document.
pub fn root_seq(root: &Root) -> OverlaySeq {
    OverlaySeq::try_from(root.as_native().expect("Failed to read root"))
        .expect("Root is not a sequence")
}

/// Encode a root, reopen the result and return it as JSON.
pub fn reencode(root: &Root) -> serde_json::Value {
    let encoded = root.encode().expect("Failed to encode root");
    let reopened = Root::from_bytes(encoded.as_bytes()).expect("Encoded block did not verify");
    reopened.to_json().expect("Failed to materialize reopened root")
}

/// Sorted copy of a key list, for order-insensitive comparisons.
pub fn sorted(mut keys: Vec<String>) -> Vec<String> {
    keys.sort();
    keys
}
