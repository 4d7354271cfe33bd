//! Dropout elimination
//!
//! At inference a Dropout with `scale == 1` is the identity. The pass walks
//! backwards from the Dropout to the nearest live single-top producer of its
//! bottom, hands that producer the Dropout's top and tombstones the Dropout.
//! A Dropout with any other scale rescales activations and is kept.

use tracing::info;

use super::is_sole_live_consumer;
use crate::graph::Graph;
use crate::layers::LayerParams;

pub fn eliminate_dropout(graph: &mut Graph) -> usize {
    let mut eliminated = 0;
    for i in 0..graph.layers.len() {
        let LayerParams::Dropout(dropout) = &graph.layers[i].params else {
            continue;
        };
        if dropout.scale != 1.0 {
            continue;
        }
        if graph.layers[i].bottoms.len() != 1 || graph.layers[i].tops.len() != 1 {
            continue;
        }
        let bottom = graph.layers[i].bottoms[0];

        let producer = (0..i).rev().find(|&j| {
            let layer = &graph.layers[j];
            !layer.is_fused() && layer.tops.len() == 1 && layer.tops[0] == bottom
        });
        let Some(j) = producer else {
            continue;
        };
        if !is_sole_live_consumer(graph, bottom, i) {
            continue;
        }

        info!(
            "eliminate_dropout {} {}",
            graph.layers[j].name, graph.layers[i].name
        );

        let final_top = graph.layers[i].tops[0];
        graph.reroute_top(j, bottom, final_top);
        graph.mark_tombstone(i);
        eliminated += 1;
    }
    eliminated
}
