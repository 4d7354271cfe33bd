//! Shared helpers for the integration tests

#![allow(dead_code)]

use netslim_optimizer::format::{load_from, write_model};
use netslim_optimizer::Graph;

/// Parse a model from in-memory topology text and weight bytes.
pub fn load(param: &str, bin: &[u8]) -> Graph {
    load_from(param.as_bytes(), bin).expect("model should load")
}

/// Serialize a model to in-memory topology text and weight bytes.
pub fn save(graph: &Graph) -> (String, Vec<u8>) {
    let mut pp = Vec::new();
    let mut bp = Vec::new();
    write_model(graph, &mut pp, &mut bp).expect("model should save");
    (String::from_utf8(pp).expect("topology is ASCII"), bp)
}

/// Append raw little-endian float32 values to a weights buffer.
pub fn push_f32s(buf: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

/// Append the float32 precision tag.
pub fn push_tag(buf: &mut Vec<u8>) {
    buf.extend_from_slice(&0i32.to_le_bytes());
}

/// Check the producer/consumer invariants every pass must preserve: each live
/// layer's top points back at it in the blob table, and every bottom of a
/// live layer is produced by some live layer.
pub fn assert_graph_consistent(graph: &Graph) {
    for (index, layer) in graph.layers.iter().enumerate() {
        if layer.is_fused() {
            continue;
        }
        for &t in &layer.tops {
            assert_eq!(
                graph.blobs[t].producer,
                Some(index),
                "blob '{}' does not point back at its producer '{}'",
                graph.blobs[t].name,
                layer.name
            );
        }
        for &b in &layer.bottoms {
            let producer = graph.blobs[b].producer.unwrap_or_else(|| {
                panic!("blob '{}' read by '{}' has no producer", graph.blobs[b].name, layer.name)
            });
            assert!(
                !graph.layers[producer].is_fused(),
                "blob '{}' read by '{}' is produced by a tombstone",
                graph.blobs[b].name,
                layer.name
            );
        }
    }
}
