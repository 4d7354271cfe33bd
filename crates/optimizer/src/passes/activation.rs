//! Activation absorption
//!
//! A ReLU or Clip that immediately follows an affine layer disappears into
//! that layer's activation slot:
//!
//! | follower          | activation_type | activation_params |
//! |-------------------|-----------------|-------------------|
//! | ReLU, slope = 0   | 1               | none              |
//! | ReLU, slope ≠ 0   | 2               | `[slope]`         |
//! | Clip              | 3               | `[min, max]`      |
//!
//! Sigmoid, Tanh and the other pointwise kinds stay as real layers.

use tracing::info;

use super::{first_consumer_after, is_sole_live_consumer};
use crate::graph::{Graph, Layer};
use crate::layers::LayerParams;

fn is_absorbable(layer: &Layer) -> bool {
    matches!(
        layer.params,
        LayerParams::ReLU(_) | LayerParams::Clip(_)
    )
}

fn fuse_affine_activation(
    graph: &mut Graph,
    pass: &str,
    wanted: fn(&LayerParams) -> bool,
) -> usize {
    let mut fused = 0;
    for i in 0..graph.layers.len() {
        if !wanted(&graph.layers[i].params) {
            continue;
        }
        if graph.layers[i].tops.len() != 1 {
            continue;
        }
        let top = graph.layers[i].tops[0];

        let Some(j) = first_consumer_after(graph, i, top, is_absorbable) else {
            continue;
        };
        if !is_sole_live_consumer(graph, top, j) {
            continue;
        }

        let (activation_type, activation_params) = match &graph.layers[j].params {
            LayerParams::ReLU(relu) if relu.slope == 0.0 => (1, Vec::new()),
            LayerParams::ReLU(relu) => (2, vec![relu.slope]),
            LayerParams::Clip(clip) => (3, vec![clip.min, clip.max]),
            _ => continue,
        };

        {
            let Some((ty, params)) = graph.layers[i].params.activation_slot_mut() else {
                continue;
            };
            *ty = activation_type;
            *params = activation_params;
        }

        info!("{} {} {}", pass, graph.layers[i].name, graph.layers[j].name);

        let final_top = graph.layers[j].tops[0];
        graph.reroute_top(i, top, final_top);
        graph.mark_tombstone(j);
        fused += 1;
    }
    fused
}

pub fn fuse_convolution_activation(graph: &mut Graph) -> usize {
    fuse_affine_activation(graph, "fuse_convolution_activation", |p| {
        matches!(p, LayerParams::Convolution(_))
    })
}

pub fn fuse_convolutiondepthwise_activation(graph: &mut Graph) -> usize {
    fuse_affine_activation(graph, "fuse_convolutiondepthwise_activation", |p| {
        matches!(p, LayerParams::ConvolutionDepthWise(_))
    })
}

pub fn fuse_deconvolution_activation(graph: &mut Graph) -> usize {
    fuse_affine_activation(graph, "fuse_deconvolution_activation", |p| {
        matches!(p, LayerParams::Deconvolution(_))
    })
}

pub fn fuse_deconvolutiondepthwise_activation(graph: &mut Graph) -> usize {
    fuse_affine_activation(graph, "fuse_deconvolutiondepthwise_activation", |p| {
        matches!(p, LayerParams::DeconvolutionDepthWise(_))
    })
}

pub fn fuse_innerproduct_activation(graph: &mut Graph) -> usize {
    fuse_affine_activation(graph, "fuse_innerproduct_activation", |p| {
        matches!(p, LayerParams::InnerProduct(_))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{Clip, Convolution, ReLU};

    fn conv_then(follower_kind: &str, follower: LayerParams) -> Graph {
        let mut g = Graph::new();
        let data = g.add_blob("data");
        let conv_out = g.add_blob("conv_out");
        let act_out = g.add_blob("act_out");
        g.push_layer(Layer {
            kind: "Convolution".to_string(),
            name: "conv1".to_string(),
            bottoms: vec![data],
            tops: vec![conv_out],
            params: LayerParams::Convolution(Convolution::default()),
        });
        g.push_layer(Layer {
            kind: follower_kind.to_string(),
            name: "act1".to_string(),
            bottoms: vec![conv_out],
            tops: vec![act_out],
            params: follower,
        });
        g
    }

    fn conv_activation(g: &Graph) -> (i32, Vec<f32>) {
        let LayerParams::Convolution(conv) = &g.layers[0].params else {
            panic!("conv expected");
        };
        (conv.activation_type, conv.activation_params.clone())
    }

    #[test]
    fn plain_relu_uses_type_1_without_params() {
        let mut g = conv_then("ReLU", LayerParams::ReLU(ReLU { slope: 0.0 }));
        assert_eq!(fuse_convolution_activation(&mut g), 1);
        assert_eq!(conv_activation(&g), (1, vec![]));
    }

    #[test]
    fn leaky_relu_carries_its_slope() {
        let mut g = conv_then("ReLU", LayerParams::ReLU(ReLU { slope: 0.1 }));
        assert_eq!(fuse_convolution_activation(&mut g), 1);
        assert_eq!(conv_activation(&g), (2, vec![0.1]));
    }

    #[test]
    fn clip_carries_min_and_max() {
        let mut g = conv_then("Clip", LayerParams::Clip(Clip { min: 0.0, max: 6.0 }));
        assert_eq!(fuse_convolution_activation(&mut g), 1);
        assert_eq!(conv_activation(&g), (3, vec![0.0, 6.0]));
        assert!(g.layers[1].is_fused());
    }

    #[test]
    fn sigmoid_is_not_absorbed() {
        // an unsupported pointwise kind must survive
        let mut g = conv_then("Sigmoid", LayerParams::Unsupported);
        assert_eq!(fuse_convolution_activation(&mut g), 0);
        assert_eq!(g.live_layer_count(), 2);
    }
}
