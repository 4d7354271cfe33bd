//! # netslim
//!
//! Offline graph optimizer for serialized inference models. Reads a
//! topology/weights file pair, folds batch normalization into the preceding
//! affine layers, absorbs ReLU/Clip activations into those layers' built-in
//! activation slot, drops inference-time no-op Dropout layers, and writes the
//! pair back in the same format.
//!
//! ## CLI usage
//!
//! ```bash
//! netslim model.param model.bin model-opt.param model-opt.bin 0
//! ```
//!
//! ## Library usage
//!
//! ```no_run
//! let mut graph = netslim::load_model("model.param", "model.bin")?;
//! netslim::optimize(&mut graph);
//! netslim::save_model(&graph, "model-opt.param", "model-opt.bin")?;
//! # Ok::<(), netslim::OptimizeError>(())
//! ```

pub use netslim_optimizer::*;
