//! Round-trip property: loading an emitted model and re-serializing it
//! without running any pass reproduces both files byte for byte.

mod common;

use common::{load, push_f32s, push_tag, save};
use netslim_optimizer::{load_model, save_model};

/// A model touching most emission shapes: asymmetric conv kernel, four-sided
/// pooling pads, nonzero softmax axis with its compat flag, a retained
/// dropout, weights with and without precision tags, and an unknown kind.
fn mixed_model() -> (String, Vec<u8>) {
    let param = "\
7767517
8 8
Input                    data                     0 1 data 0=224 1=224 2=3
Convolution              conv1                    1 1 data conv1_out 0=2 1=3 11=1 3=2 6=18 5=1
Pooling                  pool1                    1 1 conv1_out pool1_out 0=0 1=2 2=2 3=1 15=0
PReLU                    prelu1                   1 1 pool1_out prelu1_out 0=2
Dropout                  drop1                    1 1 prelu1_out drop1_out 0=0.500000
CustomPlugin             magic1                   1 1 drop1_out magic1_out
InnerProduct             fc1                      1 1 magic1_out fc1_out 0=1 1=1 2=4
Softmax                  prob                     1 1 fc1_out prob 0=1 1=1
";
    let mut bin = Vec::new();
    push_tag(&mut bin);
    push_f32s(&mut bin, &[0.5; 18]); // conv weight
    push_f32s(&mut bin, &[0.25, -0.25]); // conv bias
    push_f32s(&mut bin, &[0.1, 0.2]); // prelu slopes
    push_tag(&mut bin);
    push_f32s(&mut bin, &[1.0, 2.0, 3.0, 4.0]); // fc weight
    push_f32s(&mut bin, &[-1.0]); // fc bias
    (param.to_string(), bin)
}

#[test]
fn reserialization_is_byte_identical() {
    let (param, bin) = mixed_model();
    let graph = load(&param, &bin);
    let (text1, weights1) = save(&graph);

    let graph2 = load(&text1, &weights1);
    let (text2, weights2) = save(&graph2);

    assert_eq!(text1, text2);
    assert_eq!(weights1, weights2);
}

#[test]
fn output_starts_with_the_magic_line() {
    let (param, bin) = mixed_model();
    let graph = load(&param, &bin);
    let (text, _) = save(&graph);
    assert_eq!(text.lines().next(), Some("7767517"));
}

#[test]
fn unknown_kind_keeps_topology_but_drops_params() {
    let param = "\
7767517
2 2
Input                    data                     0 1 data
CustomPlugin             magic1                   1 1 data out 0=7 1=0.125000
";
    let graph = load(param, &[]);
    let (text, weights) = save(&graph);
    let line = text
        .lines()
        .find(|l| l.starts_with("CustomPlugin"))
        .expect("unknown kind survives");
    assert_eq!(
        line,
        "CustomPlugin             magic1                   1 1 data out"
    );
    assert!(weights.is_empty());
}

#[test]
fn save_and_reload_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let param_path = dir.path().join("model.param");
    let bin_path = dir.path().join("model.bin");

    let (param, bin) = mixed_model();
    let graph = load(&param, &bin);
    save_model(&graph, &param_path, &bin_path).unwrap();

    let reloaded = load_model(&param_path, &bin_path).unwrap();
    assert_eq!(reloaded.layers.len(), graph.layers.len());
    assert_eq!(reloaded.blobs.len(), graph.blobs.len());

    let (text1, weights1) = save(&graph);
    let (text2, weights2) = save(&reloaded);
    assert_eq!(text1, text2);
    assert_eq!(weights1, weights2);
}
