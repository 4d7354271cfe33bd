//! Error types for the model optimizer

use std::io;
use thiserror::Error;

/// Result type for optimizer operations
pub type Result<T> = std::result::Result<T, OptimizeError>;

/// Errors that can occur while loading, rewriting or saving a model
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("Unsupported topology magic {0} (expected 7767517)")]
    BadMagic(i64),

    #[error("Malformed topology at line {line}: {message}")]
    MalformedParam { line: usize, message: String },

    #[error("Layer '{layer}' reads blob '{blob}' that no earlier layer produces")]
    UnknownBlob { layer: String, blob: String },

    #[error("Layer '{layer}' carries unsupported weight tag {tag}")]
    UnsupportedWeightTag { layer: String, tag: i32 },

    #[error("Weights stream ended early while reading {expected} values for layer '{layer}'")]
    TruncatedWeights { layer: String, expected: usize },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
