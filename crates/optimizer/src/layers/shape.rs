//! Shape- and layout-manipulating kinds
//!
//! None of these carry weights; they are parsed and re-emitted so the
//! optimizer can pass them through untouched. Pooling shares the paired
//! width/height convention of the convolution family and additionally splits
//! its padding into left/top/right/bottom with chained defaults.

use std::io::{self, Write};

use super::macros::{emit_float, emit_int, emit_int_array};
use crate::format::ParamDict;

#[derive(Debug, Clone, Default)]
pub struct Input {
    pub w: i32,
    pub h: i32,
    pub c: i32,
}

impl Input {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            w: pd.get_int(0, d.w),
            h: pd.get_int(1, d.h),
            c: pd.get_int(2, d.c),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.w, d.w);
        emit_int!(pp, 1, self.h, d.h);
        emit_int!(pp, 2, self.c, d.c);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Concat {
    pub axis: i32,
}

impl Concat {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            axis: pd.get_int(0, d.axis),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.axis, d.axis);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Crop {
    pub woffset: i32,
    pub hoffset: i32,
    pub coffset: i32,
    pub outw: i32,
    pub outh: i32,
    pub outc: i32,
}

impl Crop {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            woffset: pd.get_int(0, d.woffset),
            hoffset: pd.get_int(1, d.hoffset),
            coffset: pd.get_int(2, d.coffset),
            outw: pd.get_int(3, d.outw),
            outh: pd.get_int(4, d.outh),
            outc: pd.get_int(5, d.outc),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.woffset, d.woffset);
        emit_int!(pp, 1, self.hoffset, d.hoffset);
        emit_int!(pp, 2, self.coffset, d.coffset);
        emit_int!(pp, 3, self.outw, d.outw);
        emit_int!(pp, 4, self.outh, d.outh);
        emit_int!(pp, 5, self.outc, d.outc);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Padding {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
    pub pad_type: i32,
    pub value: f32,
}

impl Padding {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            top: pd.get_int(0, d.top),
            bottom: pd.get_int(1, d.bottom),
            left: pd.get_int(2, d.left),
            right: pd.get_int(3, d.right),
            pad_type: pd.get_int(4, d.pad_type),
            value: pd.get_float(5, d.value),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.top, d.top);
        emit_int!(pp, 1, self.bottom, d.bottom);
        emit_int!(pp, 2, self.left, d.left);
        emit_int!(pp, 3, self.right, d.right);
        emit_int!(pp, 4, self.pad_type, d.pad_type);
        emit_float!(pp, 5, self.value, d.value);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Permute {
    pub order_type: i32,
}

impl Permute {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            order_type: pd.get_int(0, d.order_type),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.order_type, d.order_type);
        Ok(())
    }
}

/// Max/average pooling with four-sided padding.
#[derive(Debug, Clone)]
pub struct Pooling {
    pub pooling_type: i32,
    pub kernel_w: i32,
    pub kernel_h: i32,
    pub stride_w: i32,
    pub stride_h: i32,
    pub pad_left: i32,
    pub pad_right: i32,
    pub pad_top: i32,
    pub pad_bottom: i32,
    pub global_pooling: i32,
    pub pad_mode: i32,
}

impl Default for Pooling {
    fn default() -> Self {
        Self {
            pooling_type: 0,
            kernel_w: 0,
            kernel_h: 0,
            stride_w: 1,
            stride_h: 1,
            pad_left: 0,
            pad_right: 0,
            pad_top: 0,
            pad_bottom: 0,
            global_pooling: 0,
            pad_mode: 0,
        }
    }
}

impl Pooling {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        let kernel_w = pd.get_int(1, d.kernel_w);
        let stride_w = pd.get_int(2, d.stride_w);
        let pad_left = pd.get_int(3, d.pad_left);
        let pad_top = pd.get_int(13, pad_left);
        Self {
            pooling_type: pd.get_int(0, d.pooling_type),
            kernel_w,
            kernel_h: pd.get_int(11, kernel_w),
            stride_w,
            stride_h: pd.get_int(12, stride_w),
            pad_left,
            pad_right: pd.get_int(14, pad_left),
            pad_top,
            pad_bottom: pd.get_int(15, pad_top),
            global_pooling: pd.get_int(4, d.global_pooling),
            pad_mode: pd.get_int(5, d.pad_mode),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.pooling_type, d.pooling_type);
        emit_int!(pp, 1, self.kernel_w, d.kernel_w);
        emit_int!(pp, 11, self.kernel_h, self.kernel_w);
        emit_int!(pp, 2, self.stride_w, d.stride_w);
        emit_int!(pp, 12, self.stride_h, self.stride_w);
        emit_int!(pp, 3, self.pad_left, d.pad_left);
        emit_int!(pp, 13, self.pad_top, self.pad_left);
        emit_int!(pp, 14, self.pad_right, self.pad_left);
        emit_int!(pp, 15, self.pad_bottom, self.pad_top);
        emit_int!(pp, 4, self.global_pooling, d.global_pooling);
        emit_int!(pp, 5, self.pad_mode, d.pad_mode);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Reorg {
    pub stride: i32,
}

impl Default for Reorg {
    fn default() -> Self {
        Self { stride: 1 }
    }
}

impl Reorg {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            stride: pd.get_int(0, d.stride),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.stride, d.stride);
        Ok(())
    }
}

/// Reshape; -233 marks an unconstrained extent.
#[derive(Debug, Clone)]
pub struct Reshape {
    pub w: i32,
    pub h: i32,
    pub c: i32,
    pub permute: i32,
}

impl Default for Reshape {
    fn default() -> Self {
        Self {
            w: -233,
            h: -233,
            c: -233,
            permute: 0,
        }
    }
}

impl Reshape {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            w: pd.get_int(0, d.w),
            h: pd.get_int(1, d.h),
            c: pd.get_int(2, d.c),
            permute: pd.get_int(3, d.permute),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.w, d.w);
        emit_int!(pp, 1, self.h, d.h);
        emit_int!(pp, 2, self.c, d.c);
        emit_int!(pp, 3, self.permute, d.permute);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ShuffleChannel {
    pub group: i32,
}

impl Default for ShuffleChannel {
    fn default() -> Self {
        Self { group: 1 }
    }
}

impl ShuffleChannel {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            group: pd.get_int(0, d.group),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.group, d.group);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Slice {
    pub slices: Vec<i32>,
    pub axis: i32,
}

impl Slice {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        Self {
            slices: pd.get_int_array(0),
            axis: pd.get_int(1, 0),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int_array!(pp, 0, self.slices);
        emit_int!(pp, 1, self.axis, d.axis);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Interp {
    pub resize_type: i32,
    pub height_scale: f32,
    pub width_scale: f32,
    pub output_height: i32,
    pub output_width: i32,
}

impl Default for Interp {
    fn default() -> Self {
        Self {
            resize_type: 0,
            height_scale: 1.0,
            width_scale: 1.0,
            output_height: 0,
            output_width: 0,
        }
    }
}

impl Interp {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            resize_type: pd.get_int(0, d.resize_type),
            height_scale: pd.get_float(1, d.height_scale),
            width_scale: pd.get_float(2, d.width_scale),
            output_height: pd.get_int(3, d.output_height),
            output_width: pd.get_int(4, d.output_width),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.resize_type, d.resize_type);
        emit_float!(pp, 1, self.height_scale, d.height_scale);
        emit_float!(pp, 2, self.width_scale, d.width_scale);
        emit_int!(pp, 3, self.output_height, d.output_height);
        emit_int!(pp, 4, self.output_width, d.output_width);
        Ok(())
    }
}
