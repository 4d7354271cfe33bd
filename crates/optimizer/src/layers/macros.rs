//! Macros for the defaults-omitting parameter emission
//!
//! Every catalog kind writes its parameters by comparing each field against
//! the kind's `Default` instance and emitting only the differing ones. These
//! macros keep the per-kind tables close to a literal transcription of the
//! wire format: one line per parameter id.

/// Emit ` id=value` when an int field differs from its default.
macro_rules! emit_int {
    ($pp:expr, $id:expr, $val:expr, $def:expr) => {
        if $val != $def {
            write!($pp, " {}={}", $id, $val)?;
        }
    };
}

/// Emit ` id=value` when a float field differs from its default (`%f` form).
macro_rules! emit_float {
    ($pp:expr, $id:expr, $val:expr, $def:expr) => {
        if $val != $def {
            write!($pp, " {}={}", $id, $crate::format::fmt_float($val))?;
        }
    };
}

/// Emit ` -{23300+id}=count,v0,v1,…` for a non-empty int array.
macro_rules! emit_int_array {
    ($pp:expr, $id:expr, $arr:expr) => {
        if !$arr.is_empty() {
            write!($pp, " -{}={}", $crate::format::ARRAY_ID_BASE + $id, $arr.len())?;
            for v in $arr.iter() {
                write!($pp, ",{}", v)?;
            }
        }
    };
}

/// Emit ` -{23300+id}=count,v0,v1,…` for a non-empty float array.
macro_rules! emit_float_array {
    ($pp:expr, $id:expr, $arr:expr) => {
        if !$arr.is_empty() {
            write!($pp, " -{}={}", $crate::format::ARRAY_ID_BASE + $id, $arr.len())?;
            for v in $arr.iter() {
                write!($pp, ",{}", $crate::format::fmt_float(*v))?;
            }
        }
    };
}

pub(crate) use emit_float;
pub(crate) use emit_float_array;
pub(crate) use emit_int;
pub(crate) use emit_int_array;
