//! Graph rewriter core for netslim
//!
//! Rewrites a serialized inference model into a numerically equivalent one
//! with fewer layers and fewer passes over activations:
//!
//! ```text
//! topology + weights files
//!     ↓
//! 1. Load → Graph (arena of layers and named blobs)
//!     ↓
//! 2. Optimize → fold BatchNorm into affine layers, absorb ReLU/Clip,
//!               elide identity Dropout (fused layers become tombstones)
//!     ↓
//! 3. Save → same on-disk format, defaults omitted, tombstones skipped
//! ```
//!
//! # Example
//!
//! ```no_run
//! use netslim_optimizer as optimizer;
//!
//! let mut graph = optimizer::load_model("model.param", "model.bin")?;
//! let rewrites = optimizer::optimize(&mut graph);
//! println!("{} rewrites", rewrites);
//! optimizer::save_model(&graph, "model-opt.param", "model-opt.bin")?;
//! # Ok::<(), optimizer::OptimizeError>(())
//! ```

pub mod error;
pub mod format;
pub mod graph;
pub mod layers;
pub mod passes;
pub mod tensor;

pub use error::{OptimizeError, Result};
pub use format::{load_model, save_model};
pub use graph::{Blob, Graph, Layer};
pub use passes::optimize;
pub use tensor::Tensor;
