// Graph model for the optimizer
//
// Arena-style computation graph: layers and blobs live in flat vectors and
// refer to each other by index, so a fusion is a couple of one-word writes
// and tombstoned layers keep every other index stable.

pub mod ir;

pub use ir::{Blob, Graph, Layer, FUSED_KIND};
