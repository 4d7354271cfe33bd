//! End-to-end pipeline scenarios: load, run the fixed pass sequence, save,
//! and check both the rewritten graph and the emitted bytes.

mod common;

use common::{assert_graph_consistent, load, push_f32s, push_tag, save};
use netslim_optimizer::layers::LayerParams;
use netslim_optimizer::{optimize, passes};

#[test]
fn conv_batchnorm_folds_into_one_layer() {
    let param = "\
7767517
3 3
Input                    data                     0 1 data
Convolution              conv1                    1 1 data conv_out 0=1 1=1 6=1
BatchNorm                bn1                      1 1 conv_out bn_out 0=1 1=1.000000
";
    let mut bin = Vec::new();
    push_tag(&mut bin);
    push_f32s(&mut bin, &[2.0]); // conv weight, no bias
    push_f32s(&mut bin, &[3.0, 1.0, 3.0, 0.5]); // bn slope, mean, var, bias

    let mut graph = load(param, &bin);
    let before = graph.live_layer_count();
    let rewrites = optimize(&mut graph);

    assert_eq!(rewrites, 1);
    assert_eq!(graph.live_layer_count(), before - rewrites);
    assert_graph_consistent(&graph);

    // weight' = 2 * 3/sqrt(3+1) = 3, bias' = 0.5 - 3*1/sqrt(3+1) = -1
    let (text, weights) = save(&graph);
    let conv_line = text
        .lines()
        .find(|l| l.starts_with("Convolution"))
        .expect("conv line");
    assert_eq!(
        conv_line,
        "Convolution              conv1                    1 1 data bn_out 0=1 1=1 5=1 6=1"
    );
    assert!(!text.contains("BatchNorm"));

    let mut expected = Vec::new();
    push_tag(&mut expected);
    push_f32s(&mut expected, &[3.0, -1.0]);
    assert_eq!(weights, expected);
}

#[test]
fn conv_relu_becomes_builtin_activation() {
    let param = "\
7767517
3 3
Input                    data                     0 1 data
Convolution              conv1                    1 1 data conv_out 0=1 1=1 6=1
ReLU                     relu1                    1 1 conv_out relu_out
";
    let mut bin = Vec::new();
    push_tag(&mut bin);
    push_f32s(&mut bin, &[2.0]);

    let mut graph = load(param, &bin);
    optimize(&mut graph);
    assert_eq!(graph.live_layer_count(), 2);
    assert_graph_consistent(&graph);

    let LayerParams::Convolution(conv) = &graph.layers[1].params else {
        panic!("conv expected");
    };
    assert_eq!(conv.activation_type, 1);
    assert!(conv.activation_params.is_empty());

    let (text, _) = save(&graph);
    assert!(text.contains(" 9=1"));
    assert!(!text.contains("ReLU"));
}

#[test]
fn innerproduct_identity_dropout_is_elided() {
    let param = "\
7767517
3 3
Input                    data                     0 1 data
InnerProduct             fc1                      1 1 data fc_out 0=1 2=1
Dropout                  drop1                    1 1 fc_out drop_out
";
    let mut bin = Vec::new();
    push_tag(&mut bin);
    push_f32s(&mut bin, &[1.0]);

    let mut graph = load(param, &bin);
    let rewrites = optimize(&mut graph);
    assert_eq!(rewrites, 1);
    assert_eq!(graph.live_layer_count(), 2);
    assert_graph_consistent(&graph);

    let (text, _) = save(&graph);
    assert!(!text.contains("Dropout"));
    // the fully-connected layer inherits the dropout's top name
    assert!(text.contains("InnerProduct             fc1                      1 1 data drop_out"));
}

#[test]
fn rescaling_dropout_survives_and_serializes_its_scale() {
    let param = "\
7767517
3 3
Input                    data                     0 1 data
Convolution              conv1                    1 1 data conv_out 0=1 1=1 6=1
Dropout                  drop1                    1 1 conv_out drop_out 0=0.500000
";
    let mut bin = Vec::new();
    push_tag(&mut bin);
    push_f32s(&mut bin, &[2.0]);

    let mut graph = load(param, &bin);
    let rewrites = optimize(&mut graph);
    assert_eq!(rewrites, 0);
    assert_eq!(graph.live_layer_count(), 3);

    let (text, _) = save(&graph);
    assert!(text.contains("Dropout"));
    assert!(text.contains(" 0=0.500000"));
}

#[test]
fn batchnorm_scale_merge_combines_both_affines() {
    let param = "\
7767517
3 3
Input                    data                     0 1 data
BatchNorm                bn1                      1 1 data bn_out 0=1
Scale                    scale1                   1 1 bn_out scale_out 0=1 1=1
";
    let mut bin = Vec::new();
    push_f32s(&mut bin, &[1.0, 0.0, 0.0, 0.5]); // bn slope, mean, var, bias
    push_f32s(&mut bin, &[2.0, 3.0]); // scale factors, scale bias

    let mut graph = load(param, &bin);
    let rewrites = optimize(&mut graph);
    assert_eq!(rewrites, 1);
    assert_eq!(graph.live_layer_count(), 2);
    assert_graph_consistent(&graph);

    // slope' = 1*2, bias' = 0.5*2 + 3
    let LayerParams::BatchNorm(bn) = &graph.layers[1].params else {
        panic!("bn expected");
    };
    assert_eq!(bn.slope_data.as_slice(), &[2.0]);
    assert_eq!(bn.bias_data.as_slice(), &[4.0]);
    assert_eq!(graph.layers[1].tops, vec![2]);
}

#[test]
fn chained_folds_land_in_a_single_convolution() {
    // Conv -> BN -> ReLU collapses to one conv with bias and activation
    let param = "\
7767517
4 4
Input                    data                     0 1 data
Convolution              conv1                    1 1 data conv_out 0=1 1=1 6=1
BatchNorm                bn1                      1 1 conv_out bn_out 0=1 1=1.000000
ReLU                     relu1                    1 1 bn_out relu_out
";
    let mut bin = Vec::new();
    push_tag(&mut bin);
    push_f32s(&mut bin, &[2.0]);
    push_f32s(&mut bin, &[3.0, 1.0, 3.0, 0.5]);

    let mut graph = load(param, &bin);
    let rewrites = optimize(&mut graph);
    assert_eq!(rewrites, 2);
    assert_eq!(graph.live_layer_count(), 2);
    assert_graph_consistent(&graph);

    let LayerParams::Convolution(conv) = &graph.layers[1].params else {
        panic!("conv expected");
    };
    assert_eq!(conv.activation_type, 1);
    assert_eq!(conv.bias_term, 1);
    assert_eq!(graph.layers[1].tops, vec![3]); // relu_out
}

#[test]
fn every_pass_preserves_graph_consistency() {
    let param = "\
7767517
6 6
Input                    data                     0 1 data
Convolution              conv1                    1 1 data conv_out 0=1 1=1 6=1
BatchNorm                bn1                      1 1 conv_out bn_out 0=1 1=1.000000
Scale                    scale1                   1 1 bn_out scale_out 0=1 1=1
ReLU                     relu1                    1 1 scale_out relu_out
Dropout                  drop1                    1 1 relu_out drop_out
";
    let mut bin = Vec::new();
    push_tag(&mut bin);
    push_f32s(&mut bin, &[2.0]);
    push_f32s(&mut bin, &[3.0, 1.0, 3.0, 0.5]);
    push_f32s(&mut bin, &[2.0, 3.0]);

    let mut graph = load(param, &bin);
    let passes: &[fn(&mut netslim_optimizer::Graph) -> usize] = &[
        passes::fuse_batchnorm_scale,
        passes::fuse_convolution_batchnorm,
        passes::fuse_convolutiondepthwise_batchnorm,
        passes::fuse_deconvolution_batchnorm,
        passes::fuse_deconvolutiondepthwise_batchnorm,
        passes::fuse_innerproduct_batchnorm,
        passes::fuse_convolution_activation,
        passes::fuse_convolutiondepthwise_activation,
        passes::fuse_deconvolution_activation,
        passes::fuse_deconvolutiondepthwise_activation,
        passes::fuse_innerproduct_activation,
        passes::eliminate_dropout,
    ];
    let mut live = graph.live_layer_count();
    for pass in passes {
        let rewrites = pass(&mut graph);
        assert_graph_consistent(&graph);
        let now = graph.live_layer_count();
        assert_eq!(now, live - rewrites, "live count must drop by the rewrite count");
        live = now;
    }
    // BN+Scale merged, then BN folded into conv, then ReLU absorbed, then
    // dropout elided: only Input and the conv remain
    assert_eq!(live, 2);
}
