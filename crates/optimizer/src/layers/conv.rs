//! Affine layer kinds: the convolution family and InnerProduct
//!
//! These five kinds share three traits the passes rely on: their weight
//! tensor is laid out output-channel-major, they carry an optional per-output
//! bias gated by `bias_term`, and they own the built-in activation slot
//! (`activation_type` / `activation_params`). Their weight tensor is the only
//! one in the format preceded by a precision tag.
//!
//! Paired spatial parameters (kernel, dilation, stride, pad) default the
//! height variant to the width value, and the height variant is emitted under
//! `id + 10` only when the two differ.

use std::io::{self, Read, Write};

use super::macros::{emit_float_array, emit_int};
use crate::error::Result;
use crate::format::weights::TAG_FLOAT32;
use crate::format::{ParamDict, WeightReader, WeightWriter};
use crate::tensor::Tensor;

/// 2-D convolution.
#[derive(Debug, Clone)]
pub struct Convolution {
    pub num_output: i32,
    pub kernel_w: i32,
    pub kernel_h: i32,
    pub dilation_w: i32,
    pub dilation_h: i32,
    pub stride_w: i32,
    pub stride_h: i32,
    pub pad_w: i32,
    pub pad_h: i32,
    pub bias_term: i32,
    pub weight_data_size: i32,
    pub int8_scale_term: i32,
    pub activation_type: i32,
    pub activation_params: Vec<f32>,
    pub weight_data: Tensor,
    pub bias_data: Tensor,
}

impl Default for Convolution {
    fn default() -> Self {
        Self {
            num_output: 0,
            kernel_w: 0,
            kernel_h: 0,
            dilation_w: 1,
            dilation_h: 1,
            stride_w: 1,
            stride_h: 1,
            pad_w: 0,
            pad_h: 0,
            bias_term: 0,
            weight_data_size: 0,
            int8_scale_term: 0,
            activation_type: 0,
            activation_params: Vec::new(),
            weight_data: Tensor::default(),
            bias_data: Tensor::default(),
        }
    }
}

impl Convolution {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        let kernel_w = pd.get_int(1, d.kernel_w);
        let dilation_w = pd.get_int(2, d.dilation_w);
        let stride_w = pd.get_int(3, d.stride_w);
        let pad_w = pd.get_int(4, d.pad_w);
        Self {
            num_output: pd.get_int(0, d.num_output),
            kernel_w,
            kernel_h: pd.get_int(11, kernel_w),
            dilation_w,
            dilation_h: pd.get_int(12, dilation_w),
            stride_w,
            stride_h: pd.get_int(13, stride_w),
            pad_w,
            pad_h: pd.get_int(14, pad_w),
            bias_term: pd.get_int(5, d.bias_term),
            weight_data_size: pd.get_int(6, d.weight_data_size),
            int8_scale_term: pd.get_int(8, d.int8_scale_term),
            activation_type: pd.get_int(9, d.activation_type),
            activation_params: pd.get_float_array(10),
            ..d
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.num_output, d.num_output);
        emit_int!(pp, 1, self.kernel_w, d.kernel_w);
        emit_int!(pp, 11, self.kernel_h, self.kernel_w);
        emit_int!(pp, 2, self.dilation_w, d.dilation_w);
        emit_int!(pp, 12, self.dilation_h, self.dilation_w);
        emit_int!(pp, 3, self.stride_w, d.stride_w);
        emit_int!(pp, 13, self.stride_h, self.stride_w);
        emit_int!(pp, 4, self.pad_w, d.pad_w);
        emit_int!(pp, 14, self.pad_h, self.pad_w);
        emit_int!(pp, 5, self.bias_term, d.bias_term);
        emit_int!(pp, 6, self.weight_data_size, d.weight_data_size);
        emit_int!(pp, 8, self.int8_scale_term, d.int8_scale_term);
        emit_int!(pp, 9, self.activation_type, d.activation_type);
        emit_float_array!(pp, 10, self.activation_params);
        Ok(())
    }

    pub(crate) fn read_weights<R: Read>(
        &mut self,
        br: &mut WeightReader<R>,
        layer: &str,
    ) -> Result<()> {
        self.weight_data = br.read_tagged_tensor(self.weight_data_size as usize, layer)?;
        if self.bias_term != 0 {
            self.bias_data = br.read_tensor(self.num_output as usize, layer)?;
        }
        Ok(())
    }

    pub(crate) fn write_weights<W: Write>(&self, bw: &mut WeightWriter<W>) -> io::Result<()> {
        bw.write_tag(TAG_FLOAT32)?;
        bw.write_tensor(&self.weight_data)?;
        bw.write_tensor(&self.bias_data)
    }
}

/// Grouped (depthwise when `group == channels`) convolution.
#[derive(Debug, Clone)]
pub struct ConvolutionDepthWise {
    pub num_output: i32,
    pub kernel_w: i32,
    pub kernel_h: i32,
    pub dilation_w: i32,
    pub dilation_h: i32,
    pub stride_w: i32,
    pub stride_h: i32,
    pub pad_w: i32,
    pub pad_h: i32,
    pub bias_term: i32,
    pub weight_data_size: i32,
    pub group: i32,
    pub int8_scale_term: i32,
    pub activation_type: i32,
    pub activation_params: Vec<f32>,
    pub weight_data: Tensor,
    pub bias_data: Tensor,
}

impl Default for ConvolutionDepthWise {
    fn default() -> Self {
        Self {
            num_output: 0,
            kernel_w: 0,
            kernel_h: 0,
            dilation_w: 1,
            dilation_h: 1,
            stride_w: 1,
            stride_h: 1,
            pad_w: 0,
            pad_h: 0,
            bias_term: 0,
            weight_data_size: 0,
            group: 1,
            int8_scale_term: 0,
            activation_type: 0,
            activation_params: Vec::new(),
            weight_data: Tensor::default(),
            bias_data: Tensor::default(),
        }
    }
}

impl ConvolutionDepthWise {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        let kernel_w = pd.get_int(1, d.kernel_w);
        let dilation_w = pd.get_int(2, d.dilation_w);
        let stride_w = pd.get_int(3, d.stride_w);
        let pad_w = pd.get_int(4, d.pad_w);
        Self {
            num_output: pd.get_int(0, d.num_output),
            kernel_w,
            kernel_h: pd.get_int(11, kernel_w),
            dilation_w,
            dilation_h: pd.get_int(12, dilation_w),
            stride_w,
            stride_h: pd.get_int(13, stride_w),
            pad_w,
            pad_h: pd.get_int(14, pad_w),
            bias_term: pd.get_int(5, d.bias_term),
            weight_data_size: pd.get_int(6, d.weight_data_size),
            group: pd.get_int(7, d.group),
            int8_scale_term: pd.get_int(8, d.int8_scale_term),
            activation_type: pd.get_int(9, d.activation_type),
            activation_params: pd.get_float_array(10),
            ..d
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.num_output, d.num_output);
        emit_int!(pp, 1, self.kernel_w, d.kernel_w);
        emit_int!(pp, 11, self.kernel_h, self.kernel_w);
        emit_int!(pp, 2, self.dilation_w, d.dilation_w);
        emit_int!(pp, 12, self.dilation_h, self.dilation_w);
        emit_int!(pp, 3, self.stride_w, d.stride_w);
        emit_int!(pp, 13, self.stride_h, self.stride_w);
        emit_int!(pp, 4, self.pad_w, d.pad_w);
        emit_int!(pp, 14, self.pad_h, self.pad_w);
        emit_int!(pp, 5, self.bias_term, d.bias_term);
        emit_int!(pp, 6, self.weight_data_size, d.weight_data_size);
        emit_int!(pp, 7, self.group, d.group);
        emit_int!(pp, 8, self.int8_scale_term, d.int8_scale_term);
        emit_int!(pp, 9, self.activation_type, d.activation_type);
        emit_float_array!(pp, 10, self.activation_params);
        Ok(())
    }

    pub(crate) fn read_weights<R: Read>(
        &mut self,
        br: &mut WeightReader<R>,
        layer: &str,
    ) -> Result<()> {
        self.weight_data = br.read_tagged_tensor(self.weight_data_size as usize, layer)?;
        if self.bias_term != 0 {
            self.bias_data = br.read_tensor(self.num_output as usize, layer)?;
        }
        Ok(())
    }

    pub(crate) fn write_weights<W: Write>(&self, bw: &mut WeightWriter<W>) -> io::Result<()> {
        bw.write_tag(TAG_FLOAT32)?;
        bw.write_tensor(&self.weight_data)?;
        bw.write_tensor(&self.bias_data)
    }
}

/// Transposed convolution.
#[derive(Debug, Clone)]
pub struct Deconvolution {
    pub num_output: i32,
    pub kernel_w: i32,
    pub kernel_h: i32,
    pub dilation_w: i32,
    pub dilation_h: i32,
    pub stride_w: i32,
    pub stride_h: i32,
    pub pad_w: i32,
    pub pad_h: i32,
    pub bias_term: i32,
    pub weight_data_size: i32,
    pub activation_type: i32,
    pub activation_params: Vec<f32>,
    pub weight_data: Tensor,
    pub bias_data: Tensor,
}

impl Default for Deconvolution {
    fn default() -> Self {
        Self {
            num_output: 0,
            kernel_w: 0,
            kernel_h: 0,
            dilation_w: 1,
            dilation_h: 1,
            stride_w: 1,
            stride_h: 1,
            pad_w: 0,
            pad_h: 0,
            bias_term: 0,
            weight_data_size: 0,
            activation_type: 0,
            activation_params: Vec::new(),
            weight_data: Tensor::default(),
            bias_data: Tensor::default(),
        }
    }
}

impl Deconvolution {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        let kernel_w = pd.get_int(1, d.kernel_w);
        let dilation_w = pd.get_int(2, d.dilation_w);
        let stride_w = pd.get_int(3, d.stride_w);
        let pad_w = pd.get_int(4, d.pad_w);
        Self {
            num_output: pd.get_int(0, d.num_output),
            kernel_w,
            kernel_h: pd.get_int(11, kernel_w),
            dilation_w,
            dilation_h: pd.get_int(12, dilation_w),
            stride_w,
            stride_h: pd.get_int(13, stride_w),
            pad_w,
            pad_h: pd.get_int(14, pad_w),
            bias_term: pd.get_int(5, d.bias_term),
            weight_data_size: pd.get_int(6, d.weight_data_size),
            activation_type: pd.get_int(9, d.activation_type),
            activation_params: pd.get_float_array(10),
            ..d
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.num_output, d.num_output);
        emit_int!(pp, 1, self.kernel_w, d.kernel_w);
        emit_int!(pp, 11, self.kernel_h, self.kernel_w);
        emit_int!(pp, 2, self.dilation_w, d.dilation_w);
        emit_int!(pp, 12, self.dilation_h, self.dilation_w);
        emit_int!(pp, 3, self.stride_w, d.stride_w);
        emit_int!(pp, 13, self.stride_h, self.stride_w);
        emit_int!(pp, 4, self.pad_w, d.pad_w);
        emit_int!(pp, 14, self.pad_h, self.pad_w);
        emit_int!(pp, 5, self.bias_term, d.bias_term);
        emit_int!(pp, 6, self.weight_data_size, d.weight_data_size);
        emit_int!(pp, 9, self.activation_type, d.activation_type);
        emit_float_array!(pp, 10, self.activation_params);
        Ok(())
    }

    pub(crate) fn read_weights<R: Read>(
        &mut self,
        br: &mut WeightReader<R>,
        layer: &str,
    ) -> Result<()> {
        self.weight_data = br.read_tagged_tensor(self.weight_data_size as usize, layer)?;
        if self.bias_term != 0 {
            self.bias_data = br.read_tensor(self.num_output as usize, layer)?;
        }
        Ok(())
    }

    pub(crate) fn write_weights<W: Write>(&self, bw: &mut WeightWriter<W>) -> io::Result<()> {
        bw.write_tag(TAG_FLOAT32)?;
        bw.write_tensor(&self.weight_data)?;
        bw.write_tensor(&self.bias_data)
    }
}

/// Grouped transposed convolution.
#[derive(Debug, Clone)]
pub struct DeconvolutionDepthWise {
    pub num_output: i32,
    pub kernel_w: i32,
    pub kernel_h: i32,
    pub dilation_w: i32,
    pub dilation_h: i32,
    pub stride_w: i32,
    pub stride_h: i32,
    pub pad_w: i32,
    pub pad_h: i32,
    pub bias_term: i32,
    pub weight_data_size: i32,
    pub group: i32,
    pub activation_type: i32,
    pub activation_params: Vec<f32>,
    pub weight_data: Tensor,
    pub bias_data: Tensor,
}

impl Default for DeconvolutionDepthWise {
    fn default() -> Self {
        Self {
            num_output: 0,
            kernel_w: 0,
            kernel_h: 0,
            dilation_w: 1,
            dilation_h: 1,
            stride_w: 1,
            stride_h: 1,
            pad_w: 0,
            pad_h: 0,
            bias_term: 0,
            weight_data_size: 0,
            group: 1,
            activation_type: 0,
            activation_params: Vec::new(),
            weight_data: Tensor::default(),
            bias_data: Tensor::default(),
        }
    }
}

impl DeconvolutionDepthWise {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        let kernel_w = pd.get_int(1, d.kernel_w);
        let dilation_w = pd.get_int(2, d.dilation_w);
        let stride_w = pd.get_int(3, d.stride_w);
        let pad_w = pd.get_int(4, d.pad_w);
        Self {
            num_output: pd.get_int(0, d.num_output),
            kernel_w,
            kernel_h: pd.get_int(11, kernel_w),
            dilation_w,
            dilation_h: pd.get_int(12, dilation_w),
            stride_w,
            stride_h: pd.get_int(13, stride_w),
            pad_w,
            pad_h: pd.get_int(14, pad_w),
            bias_term: pd.get_int(5, d.bias_term),
            weight_data_size: pd.get_int(6, d.weight_data_size),
            group: pd.get_int(7, d.group),
            activation_type: pd.get_int(9, d.activation_type),
            activation_params: pd.get_float_array(10),
            ..d
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.num_output, d.num_output);
        emit_int!(pp, 1, self.kernel_w, d.kernel_w);
        emit_int!(pp, 11, self.kernel_h, self.kernel_w);
        emit_int!(pp, 2, self.dilation_w, d.dilation_w);
        emit_int!(pp, 12, self.dilation_h, self.dilation_w);
        emit_int!(pp, 3, self.stride_w, d.stride_w);
        emit_int!(pp, 13, self.stride_h, self.stride_w);
        emit_int!(pp, 4, self.pad_w, d.pad_w);
        emit_int!(pp, 14, self.pad_h, self.pad_w);
        emit_int!(pp, 5, self.bias_term, d.bias_term);
        emit_int!(pp, 6, self.weight_data_size, d.weight_data_size);
        emit_int!(pp, 7, self.group, d.group);
        emit_int!(pp, 9, self.activation_type, d.activation_type);
        emit_float_array!(pp, 10, self.activation_params);
        Ok(())
    }

    pub(crate) fn read_weights<R: Read>(
        &mut self,
        br: &mut WeightReader<R>,
        layer: &str,
    ) -> Result<()> {
        self.weight_data = br.read_tagged_tensor(self.weight_data_size as usize, layer)?;
        if self.bias_term != 0 {
            self.bias_data = br.read_tensor(self.num_output as usize, layer)?;
        }
        Ok(())
    }

    pub(crate) fn write_weights<W: Write>(&self, bw: &mut WeightWriter<W>) -> io::Result<()> {
        bw.write_tag(TAG_FLOAT32)?;
        bw.write_tensor(&self.weight_data)?;
        bw.write_tensor(&self.bias_data)
    }
}

/// Fully connected layer.
#[derive(Debug, Clone)]
pub struct InnerProduct {
    pub num_output: i32,
    pub bias_term: i32,
    pub weight_data_size: i32,
    pub int8_scale_term: i32,
    pub activation_type: i32,
    pub activation_params: Vec<f32>,
    pub weight_data: Tensor,
    pub bias_data: Tensor,
}

impl Default for InnerProduct {
    fn default() -> Self {
        Self {
            num_output: 0,
            bias_term: 0,
            weight_data_size: 0,
            int8_scale_term: 0,
            activation_type: 0,
            activation_params: Vec::new(),
            weight_data: Tensor::default(),
            bias_data: Tensor::default(),
        }
    }
}

impl InnerProduct {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            num_output: pd.get_int(0, d.num_output),
            bias_term: pd.get_int(1, d.bias_term),
            weight_data_size: pd.get_int(2, d.weight_data_size),
            int8_scale_term: pd.get_int(8, d.int8_scale_term),
            activation_type: pd.get_int(9, d.activation_type),
            activation_params: pd.get_float_array(10),
            ..d
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.num_output, d.num_output);
        emit_int!(pp, 1, self.bias_term, d.bias_term);
        emit_int!(pp, 2, self.weight_data_size, d.weight_data_size);
        emit_int!(pp, 8, self.int8_scale_term, d.int8_scale_term);
        emit_int!(pp, 9, self.activation_type, d.activation_type);
        emit_float_array!(pp, 10, self.activation_params);
        Ok(())
    }

    pub(crate) fn read_weights<R: Read>(
        &mut self,
        br: &mut WeightReader<R>,
        layer: &str,
    ) -> Result<()> {
        self.weight_data = br.read_tagged_tensor(self.weight_data_size as usize, layer)?;
        if self.bias_term != 0 {
            self.bias_data = br.read_tensor(self.num_output as usize, layer)?;
        }
        Ok(())
    }

    pub(crate) fn write_weights<W: Write>(&self, bw: &mut WeightWriter<W>) -> io::Result<()> {
        bw.write_tag(TAG_FLOAT32)?;
        bw.write_tensor(&self.weight_data)?;
        bw.write_tensor(&self.bias_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_variant_emitted_only_when_distinct() {
        let mut conv = Convolution {
            num_output: 8,
            kernel_w: 3,
            kernel_h: 3,
            weight_data_size: 72,
            ..Default::default()
        };
        let mut out = Vec::new();
        conv.write_params(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), " 0=8 1=3 6=72");

        conv.kernel_h = 1;
        let mut out = Vec::new();
        conv.write_params(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), " 0=8 1=3 11=1 6=72");
    }

    #[test]
    fn paired_defaults_follow_width() {
        let mut pd = ParamDict::new();
        pd.insert_scalar(1, "5").unwrap();
        pd.insert_scalar(3, "2").unwrap();
        let conv = Convolution::from_dict(&pd);
        assert_eq!(conv.kernel_h, 5);
        assert_eq!(conv.stride_h, 2);
        assert_eq!(conv.dilation_h, 1);
    }

    #[test]
    fn activation_params_round_trip_as_floats() {
        let conv = Convolution {
            activation_type: 2,
            activation_params: vec![0.1],
            ..Default::default()
        };
        let mut out = Vec::new();
        conv.write_params(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), " 9=2 -23310=1,0.100000");
    }
}
