//! Elementwise and scalar math kinds

use std::io::{self, Read, Write};

use super::macros::{emit_float, emit_float_array, emit_int};
use crate::error::Result;
use crate::format::{ParamDict, WeightReader, WeightWriter};
use crate::tensor::Tensor;

#[derive(Debug, Clone, Default)]
pub struct BinaryOp {
    pub op_type: i32,
    pub with_scalar: i32,
    pub b: f32,
}

impl BinaryOp {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            op_type: pd.get_int(0, d.op_type),
            with_scalar: pd.get_int(1, d.with_scalar),
            b: pd.get_float(2, d.b),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.op_type, d.op_type);
        emit_int!(pp, 1, self.with_scalar, d.with_scalar);
        emit_float!(pp, 2, self.b, d.b);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct UnaryOp {
    pub op_type: i32,
}

impl UnaryOp {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            op_type: pd.get_int(0, d.op_type),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.op_type, d.op_type);
        Ok(())
    }
}

/// N-ary elementwise combine, optionally with per-input coefficients.
#[derive(Debug, Clone, Default)]
pub struct Eltwise {
    pub op_type: i32,
    pub coeffs: Vec<f32>,
}

impl Eltwise {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            op_type: pd.get_int(0, d.op_type),
            coeffs: pd.get_float_array(1),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.op_type, d.op_type);
        emit_float_array!(pp, 1, self.coeffs);
        Ok(())
    }
}

/// `y = base^(shift + x * scale)`; base -1 selects e.
#[derive(Debug, Clone)]
pub struct Exp {
    pub base: f32,
    pub scale: f32,
    pub shift: f32,
}

impl Default for Exp {
    fn default() -> Self {
        Self {
            base: -1.0,
            scale: 1.0,
            shift: 0.0,
        }
    }
}

impl Exp {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            base: pd.get_float(0, d.base),
            scale: pd.get_float(1, d.scale),
            shift: pd.get_float(2, d.shift),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_float!(pp, 0, self.base, d.base);
        emit_float!(pp, 1, self.scale, d.scale);
        emit_float!(pp, 2, self.shift, d.shift);
        Ok(())
    }
}

/// `y = log_base(shift + x * scale)`; base -1 selects e.
#[derive(Debug, Clone)]
pub struct Log {
    pub base: f32,
    pub scale: f32,
    pub shift: f32,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            base: -1.0,
            scale: 1.0,
            shift: 0.0,
        }
    }
}

impl Log {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            base: pd.get_float(0, d.base),
            scale: pd.get_float(1, d.scale),
            shift: pd.get_float(2, d.shift),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_float!(pp, 0, self.base, d.base);
        emit_float!(pp, 1, self.scale, d.scale);
        emit_float!(pp, 2, self.shift, d.shift);
        Ok(())
    }
}

/// `y = (shift + x * scale)^power`.
#[derive(Debug, Clone)]
pub struct Power {
    pub power: f32,
    pub scale: f32,
    pub shift: f32,
}

impl Default for Power {
    fn default() -> Self {
        Self {
            power: 1.0,
            scale: 1.0,
            shift: 0.0,
        }
    }
}

impl Power {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            power: pd.get_float(0, d.power),
            scale: pd.get_float(1, d.scale),
            shift: pd.get_float(2, d.shift),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_float!(pp, 0, self.power, d.power);
        emit_float!(pp, 1, self.scale, d.scale);
        emit_float!(pp, 2, self.shift, d.shift);
        Ok(())
    }
}

/// Standalone per-channel bias addition.
#[derive(Debug, Clone, Default)]
pub struct Bias {
    pub bias_data_size: i32,
    pub bias_data: Tensor,
}

impl Bias {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            bias_data_size: pd.get_int(0, d.bias_data_size),
            ..d
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.bias_data_size, d.bias_data_size);
        Ok(())
    }

    pub(crate) fn read_weights<R: Read>(
        &mut self,
        br: &mut WeightReader<R>,
        layer: &str,
    ) -> Result<()> {
        self.bias_data = br.read_tensor(self.bias_data_size as usize, layer)?;
        Ok(())
    }

    pub(crate) fn write_weights<W: Write>(&self, bw: &mut WeightWriter<W>) -> io::Result<()> {
        bw.write_tensor(&self.bias_data)
    }
}

#[derive(Debug, Clone)]
pub struct Quantize {
    pub scale: f32,
}

impl Default for Quantize {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl Quantize {
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

#[derive(Debug, Clone)]
pub struct Requantize {
    pub scale_in: f32,
    pub scale_out: f32,
    pub bias_term: i32,
    pub bias_data_size: i32,
    pub fusion_relu: i32,
}

impl Default for Requantize {
    fn default() -> Self {
        Self {
            scale_in: 1.0,
            scale_out: 1.0,
            bias_term: 0,
            bias_data_size: 0,
            fusion_relu: 0,
        }
    }
}

impl Requantize {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            scale_in: pd.get_float(0, d.scale_in),
            scale_out: pd.get_float(1, d.scale_out),
            bias_term: pd.get_int(2, d.bias_term),
            bias_data_size: pd.get_int(3, d.bias_data_size),
            fusion_relu: pd.get_int(4, d.fusion_relu),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_float!(pp, 0, self.scale_in, d.scale_in);
        emit_float!(pp, 1, self.scale_out, d.scale_out);
        emit_int!(pp, 2, self.bias_term, d.bias_term);
        emit_int!(pp, 3, self.bias_data_size, d.bias_data_size);
        emit_int!(pp, 4, self.fusion_relu, d.fusion_relu);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Reduction {
    pub operation: i32,
    pub dim: i32,
    pub coeff: f32,
}

impl Default for Reduction {
    fn default() -> Self {
        Self {
            operation: 0,
            dim: 0,
            coeff: 1.0,
        }
    }
}

impl Reduction {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            operation: pd.get_int(0, d.operation),
            dim: pd.get_int(1, d.dim),
            coeff: pd.get_float(2, d.coeff),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.operation, d.operation);
        emit_int!(pp, 1, self.dim, d.dim);
        emit_float!(pp, 2, self.coeff, d.coeff);
        Ok(())
    }
}
