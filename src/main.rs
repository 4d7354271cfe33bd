//! netslim CLI
//!
//! Command-line front end for the graph optimizer: load, run the fixed
//! rewrite pipeline, save.

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;

/// Offline graph optimizer for serialized inference models
///
/// Folds batch normalization into the preceding affine layers, absorbs
/// ReLU/Clip into their built-in activation slot and drops identity Dropout,
/// then re-emits the model pair in the same on-disk format.
#[derive(Parser, Debug)]
#[command(name = "netslim")]
#[command(version)]
#[command(about = "Optimize a serialized inference model", long_about = None)]
struct Cli {
    /// Input topology file
    input_param: PathBuf,

    /// Input weights file
    input_bin: PathBuf,

    /// Output topology file
    output_param: PathBuf,

    /// Output weights file
    output_bin: PathBuf,

    /// Reserved conversion flag; accepted for compatibility, currently unused
    flag: i64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let _ = cli.flag;

    let mut graph = netslim::load_model(&cli.input_param, &cli.input_bin)
        .with_context(|| format!("Failed to load model from {}", cli.input_param.display()))?;

    let layers_before = graph.live_layer_count();
    let rewrites = netslim::optimize(&mut graph);
    let layers_after = graph.live_layer_count();

    netslim::save_model(&graph, &cli.output_param, &cli.output_bin)
        .with_context(|| format!("Failed to save model to {}", cli.output_param.display()))?;

    println!(
        "layers: {} -> {} ({} rewrites)",
        layers_before, layers_after, rewrites
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_takes_five_positional_arguments() {
        let cli = Cli::parse_from([
            "netslim",
            "in.param",
            "in.bin",
            "out.param",
            "out.bin",
            "65535",
        ]);
        assert_eq!(cli.input_param, PathBuf::from("in.param"));
        assert_eq!(cli.output_bin, PathBuf::from("out.bin"));
        assert_eq!(cli.flag, 65535);
    }

    #[test]
    fn missing_arguments_are_an_error() {
        assert!(Cli::try_parse_from(["netslim", "in.param"]).is_err());
    }
}
