//! Model loader
//!
//! Parses the topology text and weights binary into the in-memory graph.
//! Bottom names must resolve to an already-produced blob; each top creates a
//! new blob. Catalog defaults fill every parameter the file omits, so a
//! loaded graph re-serializes to the same bytes.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::error::{OptimizeError, Result};
use crate::format::weights::WeightReader;
use crate::format::{ParamDict, ARRAY_ID_BASE, MAGIC};
use crate::graph::{Graph, Layer};
use crate::layers::LayerParams;

/// Load a model from its topology/weights path pair.
pub fn load_model(
    param_path: impl AsRef<Path>,
    bin_path: impl AsRef<Path>,
) -> Result<Graph> {
    let param = BufReader::new(File::open(param_path)?);
    let bin = BufReader::new(File::open(bin_path)?);
    load_from(param, bin)
}

/// Load a model from already-open streams.
pub fn load_from<P: BufRead, B: Read>(param: P, bin: B) -> Result<Graph> {
    let mut lines = param.lines().enumerate();

    let (line_no, magic_line) = next_line(&mut lines)?;
    let magic: i64 = parse_token(magic_line.trim(), line_no, "magic")?;
    if magic != MAGIC {
        return Err(OptimizeError::BadMagic(magic));
    }

    let (line_no, count_line) = next_line(&mut lines)?;
    let mut counts = count_line.split_whitespace();
    let layer_count: usize = parse_token(counts.next().unwrap_or(""), line_no, "layer count")?;
    let _blob_count: usize = parse_token(counts.next().unwrap_or(""), line_no, "blob count")?;

    let mut graph = Graph::new();
    let mut blob_index: FxHashMap<String, usize> = FxHashMap::default();

    for _ in 0..layer_count {
        let (line_no, line) = next_line(&mut lines)?;
        let mut tokens = line.split_whitespace();

        let kind = required(tokens.next(), line_no, "layer kind")?;
        let name = required(tokens.next(), line_no, "layer name")?;
        let bottom_count: usize =
            parse_token(required(tokens.next(), line_no, "bottom count")?, line_no, "bottom count")?;
        let top_count: usize =
            parse_token(required(tokens.next(), line_no, "top count")?, line_no, "top count")?;

        let mut bottoms = Vec::with_capacity(bottom_count);
        for _ in 0..bottom_count {
            let blob_name = required(tokens.next(), line_no, "bottom name")?;
            let index = *blob_index.get(blob_name).ok_or_else(|| {
                OptimizeError::UnknownBlob {
                    layer: name.to_string(),
                    blob: blob_name.to_string(),
                }
            })?;
            bottoms.push(index);
        }

        let mut tops = Vec::with_capacity(top_count);
        for _ in 0..top_count {
            let blob_name = required(tokens.next(), line_no, "top name")?;
            let index = graph.add_blob(blob_name);
            blob_index.insert(blob_name.to_string(), index);
            tops.push(index);
        }

        let mut pd = ParamDict::new();
        for token in tokens {
            let (key, value) = token.split_once('=').ok_or_else(|| malformed(
                line_no,
                format!("parameter token '{token}' lacks '='"),
            ))?;
            let id: i32 = parse_token(key, line_no, "parameter id")?;
            let inserted = if id < 0 {
                pd.insert_array(-id - ARRAY_ID_BASE, value)
            } else {
                pd.insert_scalar(id, value)
            };
            inserted.map_err(|message| malformed(line_no, message))?;
        }

        let params = LayerParams::from_param_dict(kind, &pd);
        graph.push_layer(Layer {
            kind: kind.to_string(),
            name: name.to_string(),
            bottoms,
            tops,
            params,
        });
    }

    let mut br = WeightReader::new(bin);
    for i in 0..graph.layers.len() {
        let name = graph.layers[i].name.clone();
        graph.layers[i].params.read_weights(&mut br, &name)?;
    }

    Ok(graph)
}

fn next_line(
    lines: &mut impl Iterator<Item = (usize, std::io::Result<String>)>,
) -> Result<(usize, String)> {
    for (index, line) in lines {
        let line = line?;
        if !line.trim().is_empty() {
            return Ok((index + 1, line));
        }
    }
    Err(malformed(0, "unexpected end of topology".to_string()))
}

fn required<'a>(token: Option<&'a str>, line: usize, what: &str) -> Result<&'a str> {
    token.ok_or_else(|| malformed(line, format!("missing {what}")))
}

fn parse_token<T: std::str::FromStr>(token: &str, line: usize, what: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| malformed(line, format!("invalid {what} '{token}'")))
}

fn malformed(line: usize, message: String) -> OptimizeError {
    OptimizeError::MalformedParam { line, message }
}
