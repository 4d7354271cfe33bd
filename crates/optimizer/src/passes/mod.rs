//! Fusion and elimination passes
//!
//! Every pass is a free function taking the graph by exclusive reference and
//! returning the number of rewrites it performed, so each is testable in
//! isolation. [`optimize`] runs the fixed pipeline; order matters because the
//! activation absorption rewrites the same producer top that the
//! batch-normalization folds already rerouted.
//!
//! A pass never fails: a candidate that does not match its pattern is
//! silently skipped. Each performed rewrite logs one diagnostic line.

mod activation;
mod batchnorm;
mod dropout;

pub use activation::{
    fuse_convolution_activation, fuse_convolutiondepthwise_activation,
    fuse_deconvolution_activation, fuse_deconvolutiondepthwise_activation,
    fuse_innerproduct_activation,
};
pub use batchnorm::{
    fuse_batchnorm_scale, fuse_convolution_batchnorm, fuse_convolutiondepthwise_batchnorm,
    fuse_deconvolution_batchnorm, fuse_deconvolutiondepthwise_batchnorm,
    fuse_innerproduct_batchnorm,
};
pub use dropout::eliminate_dropout;

use tracing::debug;

use crate::graph::{Graph, Layer};

type Pass = fn(&mut Graph) -> usize;

const PIPELINE: &[(&str, Pass)] = &[
    ("fuse_batchnorm_scale", fuse_batchnorm_scale),
    ("fuse_convolution_batchnorm", fuse_convolution_batchnorm),
    (
        "fuse_convolutiondepthwise_batchnorm",
        fuse_convolutiondepthwise_batchnorm,
    ),
    ("fuse_deconvolution_batchnorm", fuse_deconvolution_batchnorm),
    (
        "fuse_deconvolutiondepthwise_batchnorm",
        fuse_deconvolutiondepthwise_batchnorm,
    ),
    ("fuse_innerproduct_batchnorm", fuse_innerproduct_batchnorm),
    ("fuse_convolution_activation", fuse_convolution_activation),
    (
        "fuse_convolutiondepthwise_activation",
        fuse_convolutiondepthwise_activation,
    ),
    ("fuse_deconvolution_activation", fuse_deconvolution_activation),
    (
        "fuse_deconvolutiondepthwise_activation",
        fuse_deconvolutiondepthwise_activation,
    ),
    ("fuse_innerproduct_activation", fuse_innerproduct_activation),
    ("eliminate_dropout", eliminate_dropout),
];

/// Run the whole pipeline once and return the total rewrite count.
///
/// A single sweep per pass suffices: each candidate pair is considered
/// exactly once and the rewrites are not reentrant.
pub fn optimize(graph: &mut Graph) -> usize {
    let mut total = 0;
    for (name, pass) in PIPELINE {
        let rewrites = pass(graph);
        if rewrites > 0 {
            debug!("{}: {} rewrites", name, rewrites);
        }
        total += rewrites;
    }
    total
}

/// First layer after `start`, in load order, of the wanted kind whose single
/// bottom is `top`. Tombstones never match because their kind matches nothing.
pub(crate) fn first_consumer_after<F>(
    graph: &Graph,
    start: usize,
    top: usize,
    mut wanted: F,
) -> Option<usize>
where
    F: FnMut(&Layer) -> bool,
{
    (start + 1..graph.layers.len()).find(|&j| {
        let layer = &graph.layers[j];
        wanted(layer) && layer.bottoms.len() == 1 && layer.bottoms[0] == top
    })
}

/// True when no live layer other than `consumer` reads `blob`. Fusing a pair
/// whose intermediate blob has another reader would leave that reader with a
/// producerless input, so the passes refuse such candidates.
pub(crate) fn is_sole_live_consumer(graph: &Graph, blob: usize, consumer: usize) -> bool {
    graph.blobs[blob]
        .consumers
        .iter()
        .all(|&j| j == consumer || graph.layers[j].is_fused())
}
