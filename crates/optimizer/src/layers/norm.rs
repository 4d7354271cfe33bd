//! Normalization layer kinds
//!
//! BatchNorm is stored in its raw training form (slope/mean/var/bias plus
//! eps); the passes rely on the affine identity
//! `bn(x) = slope·(x − mean)/√(var + eps) + bias` to fold it away. Scale and
//! Normalize carry their per-channel factors as untagged weight tensors.

use std::io::{self, Read, Write};

use super::macros::{emit_float, emit_int};
use crate::error::Result;
use crate::format::{ParamDict, WeightReader, WeightWriter};
use crate::tensor::Tensor;

/// Per-channel batch normalization.
#[derive(Debug, Clone)]
pub struct BatchNorm {
    pub channels: i32,
    pub eps: f32,
    pub slope_data: Tensor,
    pub mean_data: Tensor,
    pub var_data: Tensor,
    pub bias_data: Tensor,
}

impl Default for BatchNorm {
    fn default() -> Self {
        Self {
            channels: 0,
            eps: 0.0,
            slope_data: Tensor::default(),
            mean_data: Tensor::default(),
            var_data: Tensor::default(),
            bias_data: Tensor::default(),
        }
    }
}

impl BatchNorm {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            channels: pd.get_int(0, d.channels),
            eps: pd.get_float(1, d.eps),
            ..d
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.channels, d.channels);
        emit_float!(pp, 1, self.eps, d.eps);
        Ok(())
    }

    pub(crate) fn read_weights<R: Read>(
        &mut self,
        br: &mut WeightReader<R>,
        layer: &str,
    ) -> Result<()> {
        let n = self.channels as usize;
        self.slope_data = br.read_tensor(n, layer)?;
        self.mean_data = br.read_tensor(n, layer)?;
        self.var_data = br.read_tensor(n, layer)?;
        self.bias_data = br.read_tensor(n, layer)?;
        Ok(())
    }

    pub(crate) fn write_weights<W: Write>(&self, bw: &mut WeightWriter<W>) -> io::Result<()> {
        bw.write_tensor(&self.slope_data)?;
        bw.write_tensor(&self.mean_data)?;
        bw.write_tensor(&self.var_data)?;
        bw.write_tensor(&self.bias_data)
    }
}

/// Per-channel affine scale, optionally with a bias term.
#[derive(Debug, Clone)]
pub struct Scale {
    pub scale_data_size: i32,
    pub bias_term: i32,
    pub scale_data: Tensor,
    pub bias_data: Tensor,
}

impl Default for Scale {
    fn default() -> Self {
        Self {
            scale_data_size: 0,
            bias_term: 0,
            scale_data: Tensor::default(),
            bias_data: Tensor::default(),
        }
    }
}

impl Scale {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            scale_data_size: pd.get_int(0, d.scale_data_size),
            bias_term: pd.get_int(1, d.bias_term),
            ..d
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.scale_data_size, d.scale_data_size);
        emit_int!(pp, 1, self.bias_term, d.bias_term);
        Ok(())
    }

    pub(crate) fn read_weights<R: Read>(
        &mut self,
        br: &mut WeightReader<R>,
        layer: &str,
    ) -> Result<()> {
        // scale_data_size == -233 means the factors arrive on a second bottom
        if self.scale_data_size != -233 {
            self.scale_data = br.read_tensor(self.scale_data_size as usize, layer)?;
            if self.bias_term != 0 {
                self.bias_data = br.read_tensor(self.scale_data_size as usize, layer)?;
            }
        }
        Ok(())
    }

    pub(crate) fn write_weights<W: Write>(&self, bw: &mut WeightWriter<W>) -> io::Result<()> {
        bw.write_tensor(&self.scale_data)?;
        bw.write_tensor(&self.bias_data)
    }
}

/// L2 normalization across channels and/or spatial extent.
#[derive(Debug, Clone)]
pub struct Normalize {
    pub across_spatial: i32,
    pub channel_shared: i32,
    pub eps: f32,
    pub scale_data_size: i32,
    pub across_channel: i32,
    pub scale_data: Tensor,
}

impl Default for Normalize {
    fn default() -> Self {
        Self {
            across_spatial: 0,
            channel_shared: 0,
            eps: 0.0001,
            scale_data_size: 0,
            across_channel: 0,
            scale_data: Tensor::default(),
        }
    }
}

impl Normalize {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            across_spatial: pd.get_int(0, d.across_spatial),
            channel_shared: pd.get_int(1, d.channel_shared),
            eps: pd.get_float(2, d.eps),
            scale_data_size: pd.get_int(3, d.scale_data_size),
            across_channel: pd.get_int(4, d.across_channel),
            ..d
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.across_spatial, d.across_spatial);
        emit_int!(pp, 1, self.channel_shared, d.channel_shared);
        emit_float!(pp, 2, self.eps, d.eps);
        emit_int!(pp, 3, self.scale_data_size, d.scale_data_size);
        emit_int!(pp, 4, self.across_channel, d.across_channel);
        Ok(())
    }

    pub(crate) fn read_weights<R: Read>(
        &mut self,
        br: &mut WeightReader<R>,
        layer: &str,
    ) -> Result<()> {
        self.scale_data = br.read_tensor(self.scale_data_size as usize, layer)?;
        Ok(())
    }

    pub(crate) fn write_weights<W: Write>(&self, bw: &mut WeightWriter<W>) -> io::Result<()> {
        bw.write_tensor(&self.scale_data)
    }
}

#[derive(Debug, Clone)]
pub struct InstanceNorm {
    pub channels: i32,
    pub eps: f32,
}

impl Default for InstanceNorm {
    fn default() -> Self {
        Self {
            channels: 0,
            eps: 0.001,
        }
    }
}

impl InstanceNorm {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            channels: pd.get_int(0, d.channels),
            eps: pd.get_float(1, d.eps),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.channels, d.channels);
        emit_float!(pp, 1, self.eps, d.eps);
        Ok(())
    }
}

/// Mean-variance normalization.
#[derive(Debug, Clone)]
pub struct Mvn {
    pub normalize_variance: i32,
    pub across_channels: i32,
    pub eps: f32,
}

impl Default for Mvn {
    fn default() -> Self {
        Self {
            normalize_variance: 0,
            across_channels: 0,
            eps: 0.0001,
        }
    }
}

impl Mvn {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            normalize_variance: pd.get_int(0, d.normalize_variance),
            across_channels: pd.get_int(1, d.across_channels),
            eps: pd.get_float(2, d.eps),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.normalize_variance, d.normalize_variance);
        emit_int!(pp, 1, self.across_channels, d.across_channels);
        emit_float!(pp, 2, self.eps, d.eps);
        Ok(())
    }
}

/// Local response normalization.
#[derive(Debug, Clone)]
pub struct Lrn {
    pub region_type: i32,
    pub local_size: i32,
    pub alpha: f32,
    pub beta: f32,
    pub bias: f32,
}

impl Default for Lrn {
    fn default() -> Self {
        Self {
            region_type: 0,
            local_size: 5,
            alpha: 1.0,
            beta: 0.75,
            bias: 1.0,
        }
    }
}

impl Lrn {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            region_type: pd.get_int(0, d.region_type),
            local_size: pd.get_int(1, d.local_size),
            alpha: pd.get_float(2, d.alpha),
            beta: pd.get_float(3, d.beta),
            bias: pd.get_float(4, d.bias),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.region_type, d.region_type);
        emit_int!(pp, 1, self.local_size, d.local_size);
        emit_float!(pp, 2, self.alpha, d.alpha);
        emit_float!(pp, 3, self.beta, d.beta);
        emit_float!(pp, 4, self.bias, d.bias);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::WeightReader;

    #[test]
    fn batchnorm_weight_order() {
        let mut bn = BatchNorm {
            channels: 1,
            eps: 1.0,
            ..Default::default()
        };
        let mut bytes = Vec::new();
        for v in [3.0f32, 1.0, 3.0, 0.5] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let mut br = WeightReader::new(bytes.as_slice());
        bn.read_weights(&mut br, "bn").unwrap();
        assert_eq!(bn.slope_data.as_slice(), &[3.0]);
        assert_eq!(bn.mean_data.as_slice(), &[1.0]);
        assert_eq!(bn.var_data.as_slice(), &[3.0]);
        assert_eq!(bn.bias_data.as_slice(), &[0.5]);
    }

    #[test]
    fn default_params_emit_nothing() {
        let mut out = Vec::new();
        Lrn::default().write_params(&mut out).unwrap();
        assert!(out.is_empty());

        let mut out = Vec::new();
        Normalize::default().write_params(&mut out).unwrap();
        assert!(out.is_empty());
    }
}
