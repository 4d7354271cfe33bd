//! On-disk model format
//!
//! A model is a pair of files:
//!
//! ```text
//! topology (text)                      weights (binary)
//! ┌──────────────────────────────┐     ┌──────────────────────────────┐
//! │ 7767517                      │     │ [tag? tensor] [tag? tensor] …│
//! │ layer_count blob_count       │     │  4-byte precision tag only   │
//! │ kind name #bot #top names… p…│     │  where the catalog says so;  │
//! │ …one line per layer…         │     │  tag 0 = raw float32         │
//! └──────────────────────────────┘     └──────────────────────────────┘
//! ```
//!
//! Parameters are `id=value` tokens; array parameters use the id `23300 + n`
//! with a leading `-` and a `count,v0,v1,…` payload. Values equal to the
//! catalog default are omitted entirely.

pub mod loader;
pub mod param_dict;
pub mod saver;
pub mod weights;

pub use loader::{load_from, load_model};
pub use param_dict::ParamDict;
pub use saver::{save_model, write_model};
pub use weights::{WeightReader, WeightWriter};

/// Magic integer on the first topology line.
pub const MAGIC: i64 = 7767517;

/// Wire id offset for array parameters.
pub const ARRAY_ID_BASE: i32 = 23300;

/// Format a float the way the C `%f` conversion does (six fractional digits).
pub(crate) fn fmt_float(v: f32) -> String {
    format!("{:.6}", v)
}
