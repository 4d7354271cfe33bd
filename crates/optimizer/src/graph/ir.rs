//! Layers, blobs and the arena graph
//!
//! A blob is a named edge with one producing layer and any number of
//! consuming layers. A layer is a node with ordered bottom (input) and top
//! (output) blob indices plus its catalog parameters. Fusion never removes
//! entries from either arena: the fused layer's kind flips to the reserved
//! tombstone sentinel and the serializer and later passes skip it.

use crate::layers::LayerParams;

/// Reserved kind string marking a layer that has been fused away.
pub const FUSED_KIND: &str = "fused";

/// A named edge in the graph.
#[derive(Debug, Clone)]
pub struct Blob {
    /// Unique blob name from the topology file.
    pub name: String,
    /// Index of the producing layer; `None` for graph inputs.
    pub producer: Option<usize>,
    /// Indices of layers that list this blob among their bottoms.
    pub consumers: Vec<usize>,
}

/// A node in the graph.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Kind string as it appears in the topology file.
    pub kind: String,
    /// Unique instance name.
    pub name: String,
    /// Input blob indices.
    pub bottoms: Vec<usize>,
    /// Output blob indices.
    pub tops: Vec<usize>,
    /// Typed catalog parameters and weights.
    pub params: LayerParams,
}

impl Layer {
    pub fn is_fused(&self) -> bool {
        matches!(self.params, LayerParams::Fused)
    }
}

/// Ordered layer sequence plus the blob table.
#[derive(Debug, Default)]
pub struct Graph {
    pub layers: Vec<Layer>,
    pub blobs: Vec<Blob>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a blob with no producer and no consumers yet.
    pub fn add_blob(&mut self, name: impl Into<String>) -> usize {
        self.blobs.push(Blob {
            name: name.into(),
            producer: None,
            consumers: Vec::new(),
        });
        self.blobs.len() - 1
    }

    /// Append a layer and wire its tops' producer and bottoms' consumer links.
    pub fn push_layer(&mut self, layer: Layer) -> usize {
        let index = self.layers.len();
        for &t in &layer.tops {
            self.blobs[t].producer = Some(index);
        }
        for &b in &layer.bottoms {
            self.blobs[b].consumers.push(index);
        }
        self.layers.push(layer);
        index
    }

    /// Flip a layer to the tombstone kind. A layer is tombstoned at most once.
    pub fn mark_tombstone(&mut self, index: usize) {
        let layer = &mut self.layers[index];
        assert!(
            !layer.is_fused(),
            "layer '{}' tombstoned twice",
            layer.name
        );
        layer.kind = FUSED_KIND.to_string();
        layer.params = LayerParams::Fused;
    }

    /// Replace `old_top` with `new_top` in the producer's top list and point
    /// the blob table at the producer, as one operation.
    ///
    /// Panics if the producer does not currently list `old_top`: that means a
    /// pass lost track of who produces what, which is a programmer error.
    pub fn reroute_top(&mut self, producer: usize, old_top: usize, new_top: usize) {
        let layer = &mut self.layers[producer];
        let slot = layer
            .tops
            .iter()
            .position(|&t| t == old_top)
            .unwrap_or_else(|| {
                panic!(
                    "graph invariant violated: layer '{}' does not produce blob index {}",
                    layer.name, old_top
                )
            });
        layer.tops[slot] = new_top;
        self.blobs[new_top].producer = Some(producer);
    }

    pub fn live_layer_count(&self) -> usize {
        self.layers.iter().filter(|l| !l.is_fused()).count()
    }
}
