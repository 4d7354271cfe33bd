//! Batch-normalization folds
//!
//! BatchNorm computes `bn(x) = slope·(x − mean)/√(var + eps) + bias` per
//! channel, which is the affine `b·x + a` with
//!
//! ```text
//! b = slope / sqrt(var + eps)
//! a = bias - slope * mean / sqrt(var + eps)
//! ```
//!
//! Scaling output channel `q` of the preceding affine layer's weights by
//! `b[q]` and adding `a[q]` to its bias reproduces the BatchNorm exactly, so
//! the BatchNorm layer can be tombstoned. The weight tensor partitions into
//! `channels` equal output-channel slices for all five affine kinds.

use tracing::info;

use super::{first_consumer_after, is_sole_live_consumer};
use crate::graph::Graph;
use crate::layers::LayerParams;
use crate::tensor::Tensor;

fn fuse_affine_batchnorm(
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

        let Some(j) = first_consumer_after(graph, i, top, |l| {
            matches!(l.params, LayerParams::BatchNorm(_))
        }) else {
            continue;
        };
        if !is_sole_live_consumer(graph, top, j) {
            continue;
        }

        let (channels, a, b) = {
            let LayerParams::BatchNorm(bn) = &graph.layers[j].params else {
                continue;
            };
            let channels = bn.channels as usize;
            if channels == 0 || bn.slope_data.len() < channels {
                continue;
            }
            let slope = bn.slope_data.as_slice();
            let mean = bn.mean_data.as_slice();
            let var = bn.var_data.as_slice();
            let bias = bn.bias_data.as_slice();
            let mut a = vec![0.0f32; channels];
            let mut b = vec![0.0f32; channels];
            for q in 0..channels {
                let sqrt_var = (var[q] + bn.eps).sqrt();
                a[q] = bias[q] - slope[q] * mean[q] / sqrt_var;
                b[q] = slope[q] / sqrt_var;
            }
            (channels, a, b)
        };

        {
            let Some(w) = graph.layers[i].params.affine_weights_mut() else {
                continue;
            };
            let weight_per_outch = w.weight_data_size as usize / channels;
            if weight_per_outch == 0 || w.weight_data.len() < weight_per_outch * channels {
                continue;
            }
            if *w.bias_term == 0 {
                *w.bias_term = 1;
                *w.bias_data = Tensor::filled(channels, 0.0);
            } else if w.bias_data.len() < channels {
                continue;
            }

            let weight = w.weight_data.as_mut_slice();
            for (outch, &bq) in weight.chunks_exact_mut(weight_per_outch).zip(&b) {
                for v in outch {
                    *v *= bq;
                }
            }
            for (bias, &aq) in w.bias_data.as_mut_slice().iter_mut().zip(&a) {
                *bias += aq;
            }
        }

        info!("{} {} {}", pass, graph.layers[i].name, graph.layers[j].name);

        let final_top = graph.layers[j].tops[0];
        graph.reroute_top(i, top, final_top);
        graph.mark_tombstone(j);
        fused += 1;
    }
    fused
}

pub fn fuse_convolution_batchnorm(graph: &mut Graph) -> usize {
    fuse_affine_batchnorm(graph, "fuse_convolution_batchnorm", |p| {
        matches!(p, LayerParams::Convolution(_))
    })
}

pub fn fuse_convolutiondepthwise_batchnorm(graph: &mut Graph) -> usize {
    fuse_affine_batchnorm(graph, "fuse_convolutiondepthwise_batchnorm", |p| {
        matches!(p, LayerParams::ConvolutionDepthWise(_))
    })
}

pub fn fuse_deconvolution_batchnorm(graph: &mut Graph) -> usize {
    fuse_affine_batchnorm(graph, "fuse_deconvolution_batchnorm", |p| {
        matches!(p, LayerParams::Deconvolution(_))
    })
}

pub fn fuse_deconvolutiondepthwise_batchnorm(graph: &mut Graph) -> usize {
    fuse_affine_batchnorm(graph, "fuse_deconvolutiondepthwise_batchnorm", |p| {
        matches!(p, LayerParams::DeconvolutionDepthWise(_))
    })
}

pub fn fuse_innerproduct_batchnorm(graph: &mut Graph) -> usize {
    fuse_affine_batchnorm(graph, "fuse_innerproduct_batchnorm", |p| {
        matches!(p, LayerParams::InnerProduct(_))
    })
}

/// Merge a single-bottom Scale into the BatchNorm it follows:
/// `(x·slope + bias)·s + b  =  x·(slope·s) + (bias·s + b)`.
pub fn fuse_batchnorm_scale(graph: &mut Graph) -> usize {
    let mut fused = 0;
    for i in 0..graph.layers.len() {
        if !matches!(graph.layers[i].params, LayerParams::BatchNorm(_)) {
            continue;
        }
        if graph.layers[i].tops.len() != 1 {
            continue;
        }
        let top = graph.layers[i].tops[0];

        let Some(j) = first_consumer_after(graph, i, top, |l| {
            matches!(l.params, LayerParams::Scale(_))
        }) else {
            continue;
        };
        if !is_sole_live_consumer(graph, top, j) {
            continue;
        }

        let (scale_data, scale_bias) = {
            let LayerParams::Scale(s) = &graph.layers[j].params else {
                continue;
            };
            let bias = (s.bias_term != 0).then(|| s.bias_data.clone());
            (s.scale_data.clone(), bias)
        };

        {
            let LayerParams::BatchNorm(bn) = &mut graph.layers[i].params else {
                continue;
            };
            let channels = bn.channels as usize;
            if scale_data.len() < channels || bn.slope_data.len() < channels {
                continue;
            }
            let s = scale_data.as_slice();
            for (slope, &sq) in bn.slope_data.as_mut_slice().iter_mut().zip(s) {
                *slope *= sq;
            }
            for (bias, &sq) in bn.bias_data.as_mut_slice().iter_mut().zip(s) {
                *bias *= sq;
            }
            if let Some(sb) = &scale_bias {
                for (bias, &bq) in bn.bias_data.as_mut_slice().iter_mut().zip(sb.as_slice()) {
                    *bias += bq;
                }
            }
        }

        info!(
            "fuse_batchnorm_scale {} {}",
            graph.layers[i].name, graph.layers[j].name
        );

        let final_top = graph.layers[j].tops[0];
        graph.reroute_top(i, top, final_top);
        graph.mark_tombstone(j);
        fused += 1;
    }
    fused
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Layer;
    use crate::layers::{BatchNorm, Convolution, Scale};

    fn conv_bn_graph(bias_term: i32) -> Graph {
        let mut g = Graph::new();
        let data = g.add_blob("data");
        let conv_out = g.add_blob("conv_out");
        let bn_out = g.add_blob("bn_out");
        g.push_layer(Layer {
            kind: "Convolution".to_string(),
            name: "conv1".to_string(),
            bottoms: vec![data],
            tops: vec![conv_out],
            params: LayerParams::Convolution(Convolution {
                num_output: 1,
                kernel_w: 1,
                kernel_h: 1,
                weight_data_size: 1,
                bias_term,
                weight_data: Tensor::from_vec(vec![2.0]),
                bias_data: if bias_term != 0 {
                    Tensor::from_vec(vec![0.0])
                } else {
                    Tensor::default()
                },
                ..Default::default()
            }),
        });
        g.push_layer(Layer {
            kind: "BatchNorm".to_string(),
            name: "bn1".to_string(),
            bottoms: vec![conv_out],
            tops: vec![bn_out],
            params: LayerParams::BatchNorm(BatchNorm {
                channels: 1,
                eps: 1.0,
                slope_data: Tensor::from_vec(vec![3.0]),
                mean_data: Tensor::from_vec(vec![1.0]),
                var_data: Tensor::from_vec(vec![3.0]),
                bias_data: Tensor::from_vec(vec![0.5]),
            }),
        });
        g
    }

    #[test]
    fn conv_batchnorm_fold_is_numerically_exact() {
        // weight' = 2 * 3/sqrt(4) = 3, bias' = 0.5 - 3*1/sqrt(4) = -1
        let mut g = conv_bn_graph(0);
        assert_eq!(fuse_convolution_batchnorm(&mut g), 1);
        assert_eq!(g.live_layer_count(), 1);

        let LayerParams::Convolution(conv) = &g.layers[0].params else {
            panic!("conv expected");
        };
        assert_eq!(conv.bias_term, 1);
        assert_eq!(conv.weight_data.as_slice(), &[3.0]);
        assert_eq!(conv.bias_data.as_slice(), &[-1.0]);

        // conv now owns the BatchNorm's top
        assert_eq!(g.layers[0].tops, vec![2]);
        assert_eq!(g.blobs[2].producer, Some(0));
        assert!(g.layers[1].is_fused());
    }

    #[test]
    fn shared_top_refuses_the_fold() {
        let mut g = conv_bn_graph(0);
        // second reader of conv_out
        let sink = g.add_blob("sink");
        g.push_layer(Layer {
            kind: "ReLU".to_string(),
            name: "branch".to_string(),
            bottoms: vec![1],
            tops: vec![sink],
            params: LayerParams::ReLU(crate::layers::ReLU::default()),
        });
        assert_eq!(fuse_convolution_batchnorm(&mut g), 0);
        assert_eq!(g.live_layer_count(), 3);
    }

    #[test]
    fn batchnorm_scale_merge_handles_both_bias_terms() {
        for bias_term in [0, 1] {
            let mut g = Graph::new();
            let data = g.add_blob("data");
            let bn_out = g.add_blob("bn_out");
            let scale_out = g.add_blob("scale_out");
            g.push_layer(Layer {
                kind: "BatchNorm".to_string(),
                name: "bn1".to_string(),
                bottoms: vec![data],
                tops: vec![bn_out],
                params: LayerParams::BatchNorm(BatchNorm {
                    channels: 1,
                    eps: 0.0,
                    slope_data: Tensor::from_vec(vec![1.0]),
                    mean_data: Tensor::from_vec(vec![0.0]),
                    var_data: Tensor::from_vec(vec![0.0]),
                    bias_data: Tensor::from_vec(vec![0.0]),
                }),
            });
            g.push_layer(Layer {
                kind: "Scale".to_string(),
                name: "scale1".to_string(),
                bottoms: vec![bn_out],
                tops: vec![scale_out],
                params: LayerParams::Scale(Scale {
                    scale_data_size: 1,
                    bias_term,
                    scale_data: Tensor::from_vec(vec![2.0]),
                    bias_data: if bias_term != 0 {
                        Tensor::from_vec(vec![3.0])
                    } else {
                        Tensor::default()
                    },
                }),
            });

            assert_eq!(fuse_batchnorm_scale(&mut g), 1);
            let LayerParams::BatchNorm(bn) = &g.layers[0].params else {
                panic!("bn expected");
            };
            assert_eq!(bn.slope_data.as_slice(), &[2.0]);
            let expected_bias = if bias_term != 0 { 3.0 } else { 0.0 };
            assert_eq!(bn.bias_data.as_slice(), &[expected_bias]);
        }
    }
}
