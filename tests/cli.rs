//! Integration tests for the netslim CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn write_small_model(dir: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let param_path = dir.path().join("model.param");
    let bin_path = dir.path().join("model.bin");

    let param = "\
7767517
3 3
Input                    data                     0 1 data
Convolution              conv1                    1 1 data conv_out 0=1 1=1 6=1
ReLU                     relu1                    1 1 conv_out relu_out
";
    let mut bin: Vec<u8> = Vec::new();
    bin.extend_from_slice(&0i32.to_le_bytes());
    bin.extend_from_slice(&2.0f32.to_le_bytes());

    fs::write(&param_path, param).unwrap();
    fs::write(&bin_path, bin).unwrap();
    (param_path, bin_path)
}

#[test]
fn help_shows_usage() {
    let mut cmd = Command::cargo_bin("netslim").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Optimize a serialized inference model"))
        .stdout(predicate::str::contains("--help"));
}

#[test]
fn optimizes_a_model_pair() {
    let dir = TempDir::new().unwrap();
    let (param_path, bin_path) = write_small_model(&dir);
    let out_param = dir.path().join("opt.param");
    let out_bin = dir.path().join("opt.bin");

    let mut cmd = Command::cargo_bin("netslim").unwrap();
    cmd.arg(&param_path)
        .arg(&bin_path)
        .arg(&out_param)
        .arg(&out_bin)
        .arg("0");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("layers: 3 -> 2 (1 rewrites)"));

    let text = fs::read_to_string(&out_param).unwrap();
    assert!(text.starts_with("7767517\n"));
    assert!(!text.contains("ReLU"));
    assert!(fs::metadata(&out_bin).unwrap().len() > 0);
}

#[test]
fn missing_input_fails_with_diagnostic() {
    let dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("netslim").unwrap();
    cmd.arg(dir.path().join("absent.param"))
        .arg(dir.path().join("absent.bin"))
        .arg(dir.path().join("out.param"))
        .arg(dir.path().join("out.bin"))
        .arg("0");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("Failed to load model"));
}

#[test]
fn malformed_magic_is_rejected() {
    let dir = TempDir::new().unwrap();
    let param_path = dir.path().join("bad.param");
    let bin_path = dir.path().join("bad.bin");
    fs::write(&param_path, "12345\n0 0\n").unwrap();
    fs::write(&bin_path, b"").unwrap();

    let mut cmd = Command::cargo_bin("netslim").unwrap();
    cmd.arg(&param_path)
        .arg(&bin_path)
        .arg(dir.path().join("out.param"))
        .arg(dir.path().join("out.bin"))
        .arg("0");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported topology magic"));
}

#[test]
fn too_few_arguments_fail() {
    let mut cmd = Command::cargo_bin("netslim").unwrap();
    cmd.arg("only.param");

    cmd.assert().failure();
}
