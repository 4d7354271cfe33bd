//! Model serializer
//!
//! Walks the graph once to count live layers and the distinct blob names
//! they reference, then emits one topology line per live layer and its weight
//! tensors into the binary stream. Tombstones are skipped entirely; layer
//! parameters equal to the catalog default are omitted.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::format::weights::WeightWriter;
use crate::format::MAGIC;
use crate::graph::Graph;

/// Serialize the graph to a topology/weights path pair.
///
/// Both files are created up front and flushed before returning, so a failed
/// run never leaves a silently truncated pair behind an early success exit.
pub fn save_model(
    graph: &Graph,
    param_path: impl AsRef<Path>,
    bin_path: impl AsRef<Path>,
) -> Result<()> {
    let mut pp = BufWriter::new(File::create(param_path)?);
    let mut bp = BufWriter::new(File::create(bin_path)?);
    write_model(graph, &mut pp, &mut bp)?;
    pp.flush()?;
    bp.flush()?;
    Ok(())
}

/// Serialize the graph into already-open streams.
pub fn write_model<P: Write, B: Write>(graph: &Graph, pp: &mut P, bp: &mut B) -> Result<()> {
    writeln!(pp, "{}", MAGIC)?;

    let mut live_layers = 0;
    let mut blob_names: FxHashSet<&str> = FxHashSet::default();
    for layer in graph.layers.iter().filter(|l| !l.is_fused()) {
        live_layers += 1;
        for &b in layer.bottoms.iter().chain(&layer.tops) {
            blob_names.insert(graph.blobs[b].name.as_str());
        }
    }
    writeln!(pp, "{} {}", live_layers, blob_names.len())?;

    let mut bw = WeightWriter::new(bp);
    for layer in graph.layers.iter().filter(|l| !l.is_fused()) {
        write!(
            pp,
            "{:<24} {:<24} {} {}",
            layer.kind,
            layer.name,
            layer.bottoms.len(),
            layer.tops.len()
        )?;
        for &b in &layer.bottoms {
            write!(pp, " {}", graph.blobs[b].name)?;
        }
        for &t in &layer.tops {
            write!(pp, " {}", graph.blobs[t].name)?;
        }
        layer.params.write_params(pp)?;
        writeln!(pp)?;

        layer.params.write_weights(&mut bw)?;
    }

    Ok(())
}
