//! Pointwise activation kinds and Dropout
//!
//! ReLU and Clip are the two kinds the absorption pass can move into an
//! affine layer's activation slot. Dropout stays a real layer unless its
//! inference-time scale is exactly 1.

use std::io::{self, Read, Write};

use super::macros::{emit_float, emit_int};
use crate::error::Result;
use crate::format::{ParamDict, WeightReader, WeightWriter};
use crate::tensor::Tensor;

/// Rectifier; `slope != 0` selects the leaky variant.
#[derive(Debug, Clone, Default)]
pub struct ReLU {
    pub slope: f32,
}

impl ReLU {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            slope: pd.get_float(0, d.slope),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_float!(pp, 0, self.slope, d.slope);
        Ok(())
    }
}

/// Clamp to `[min, max]`.
#[derive(Debug, Clone)]
pub struct Clip {
    pub min: f32,
    pub max: f32,
}

impl Default for Clip {
    fn default() -> Self {
        Self {
            min: f32::MIN,
            max: f32::MAX,
        }
    }
}

impl Clip {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            min: pd.get_float(0, d.min),
            max: pd.get_float(1, d.max),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_float!(pp, 0, self.min, d.min);
        emit_float!(pp, 1, self.max, d.max);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Elu {
    pub alpha: f32,
}

impl Default for Elu {
    fn default() -> Self {
        Self { alpha: 0.1 }
    }
}

impl Elu {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            alpha: pd.get_float(0, d.alpha),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_float!(pp, 0, self.alpha, d.alpha);
        Ok(())
    }
}

/// Parametric ReLU with a learned slope per channel.
#[derive(Debug, Clone, Default)]
pub struct PReLU {
    pub num_slope: i32,
    pub slope_data: Tensor,
}

impl PReLU {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            num_slope: pd.get_int(0, d.num_slope),
            ..d
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.num_slope, d.num_slope);
        Ok(())
    }

    pub(crate) fn read_weights<R: Read>(
        &mut self,
        br: &mut WeightReader<R>,
        layer: &str,
    ) -> Result<()> {
        self.slope_data = br.read_tensor(self.num_slope as usize, layer)?;
        Ok(())
    }

    pub(crate) fn write_weights<W: Write>(&self, bw: &mut WeightWriter<W>) -> io::Result<()> {
        bw.write_tensor(&self.slope_data)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Threshold {
    pub threshold: f32,
}

impl Threshold {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            threshold: pd.get_float(0, d.threshold),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_float!(pp, 0, self.threshold, d.threshold);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Softmax {
    pub axis: i32,
}

impl Softmax {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            axis: pd.get_int(0, d.axis),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.axis, d.axis);
        // runtime quirk: a nonzero axis needs this flag to load correctly
        if self.axis != 0 {
            write!(pp, " 1=1")?;
        }
        Ok(())
    }
}

/// Inference-time dropout: a plain rescale by `scale`.
#[derive(Debug, Clone)]
pub struct Dropout {
    pub scale: f32,
}

impl Default for Dropout {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl Dropout {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            scale: pd.get_float(0, d.scale),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_float!(pp, 0, self.scale, d.scale);
        Ok(())
    }
}
