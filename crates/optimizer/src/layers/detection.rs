//! Detection-head kinds
//!
//! These close out the catalog so detection models round-trip through the
//! optimizer; no pass rewrites them.

use std::io::{self, Write};

use super::macros::{emit_float, emit_float_array, emit_int, emit_int_array};
use crate::format::ParamDict;

#[derive(Debug, Clone)]
pub struct DetectionOutput {
    pub num_class: i32,
    pub nms_threshold: f32,
    pub nms_top_k: i32,
    pub keep_top_k: i32,
    pub confidence_threshold: f32,
    pub variances: [f32; 4],
}

impl Default for DetectionOutput {
    fn default() -> Self {
        Self {
            num_class: 0,
            nms_threshold: 0.05,
            nms_top_k: 300,
            keep_top_k: 100,
            confidence_threshold: 0.5,
            variances: [0.1, 0.1, 0.2, 0.2],
        }
    }
}

impl DetectionOutput {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            num_class: pd.get_int(0, d.num_class),
            nms_threshold: pd.get_float(1, d.nms_threshold),
            nms_top_k: pd.get_int(2, d.nms_top_k),
            keep_top_k: pd.get_int(3, d.keep_top_k),
            confidence_threshold: pd.get_float(4, d.confidence_threshold),
            variances: [
                pd.get_float(5, d.variances[0]),
                pd.get_float(6, d.variances[1]),
                pd.get_float(7, d.variances[2]),
                pd.get_float(8, d.variances[3]),
            ],
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.num_class, d.num_class);
        emit_float!(pp, 1, self.nms_threshold, d.nms_threshold);
        emit_int!(pp, 2, self.nms_top_k, d.nms_top_k);
        emit_int!(pp, 3, self.keep_top_k, d.keep_top_k);
        emit_float!(pp, 4, self.confidence_threshold, d.confidence_threshold);
        emit_float!(pp, 5, self.variances[0], d.variances[0]);
        emit_float!(pp, 6, self.variances[1], d.variances[1]);
        emit_float!(pp, 7, self.variances[2], d.variances[2]);
        emit_float!(pp, 8, self.variances[3], d.variances[3]);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PriorBox {
    pub min_sizes: Vec<f32>,
    pub max_sizes: Vec<f32>,
    pub aspect_ratios: Vec<f32>,
    pub variances: [f32; 4],
    pub flip: i32,
    pub clip: i32,
    pub image_width: i32,
    pub image_height: i32,
    pub step_width: f32,
    pub step_height: f32,
    pub offset: f32,
}

impl Default for PriorBox {
    fn default() -> Self {
        Self {
            min_sizes: Vec::new(),
            max_sizes: Vec::new(),
            aspect_ratios: Vec::new(),
            variances: [0.1, 0.1, 0.2, 0.2],
            flip: 1,
            clip: 0,
            image_width: 0,
            image_height: 0,
            step_width: -233.0,
            step_height: -233.0,
            offset: 0.0,
        }
    }
}

impl PriorBox {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            min_sizes: pd.get_float_array(0),
            max_sizes: pd.get_float_array(1),
            aspect_ratios: pd.get_float_array(2),
            variances: [
                pd.get_float(3, d.variances[0]),
                pd.get_float(4, d.variances[1]),
                pd.get_float(5, d.variances[2]),
                pd.get_float(6, d.variances[3]),
            ],
            flip: pd.get_int(7, d.flip),
            clip: pd.get_int(8, d.clip),
            image_width: pd.get_int(9, d.image_width),
            image_height: pd.get_int(10, d.image_height),
            step_width: pd.get_float(11, d.step_width),
            step_height: pd.get_float(12, d.step_height),
            offset: pd.get_float(13, d.offset),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_float_array!(pp, 0, self.min_sizes);
        emit_float_array!(pp, 1, self.max_sizes);
        emit_float_array!(pp, 2, self.aspect_ratios);
        emit_float!(pp, 3, self.variances[0], d.variances[0]);
        emit_float!(pp, 4, self.variances[1], d.variances[1]);
        emit_float!(pp, 5, self.variances[2], d.variances[2]);
        emit_float!(pp, 6, self.variances[3], d.variances[3]);
        emit_int!(pp, 7, self.flip, d.flip);
        emit_int!(pp, 8, self.clip, d.clip);
        emit_int!(pp, 9, self.image_width, d.image_width);
        emit_int!(pp, 10, self.image_height, d.image_height);
        emit_float!(pp, 11, self.step_width, d.step_width);
        emit_float!(pp, 12, self.step_height, d.step_height);
        emit_float!(pp, 13, self.offset, d.offset);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Proposal {
    pub feat_stride: i32,
    pub base_size: i32,
    pub pre_nms_top_n: i32,
    pub after_nms_top_n: i32,
    pub nms_thresh: f32,
    pub min_size: i32,
}

impl Default for Proposal {
    fn default() -> Self {
        Self {
            feat_stride: 16,
            base_size: 16,
            pre_nms_top_n: 6000,
            after_nms_top_n: 300,
            nms_thresh: 0.7,
            min_size: 16,
        }
    }
}

impl Proposal {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            feat_stride: pd.get_int(0, d.feat_stride),
            base_size: pd.get_int(1, d.base_size),
            pre_nms_top_n: pd.get_int(2, d.pre_nms_top_n),
            after_nms_top_n: pd.get_int(3, d.after_nms_top_n),
            nms_thresh: pd.get_float(4, d.nms_thresh),
            min_size: pd.get_int(5, d.min_size),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.feat_stride, d.feat_stride);
        emit_int!(pp, 1, self.base_size, d.base_size);
        emit_int!(pp, 2, self.pre_nms_top_n, d.pre_nms_top_n);
        emit_int!(pp, 3, self.after_nms_top_n, d.after_nms_top_n);
        emit_float!(pp, 4, self.nms_thresh, d.nms_thresh);
        emit_int!(pp, 5, self.min_size, d.min_size);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PsRoiPooling {
    pub pooled_width: i32,
    pub pooled_height: i32,
    pub spatial_scale: f32,
    pub output_dim: i32,
}

impl Default for PsRoiPooling {
    fn default() -> Self {
        Self {
            pooled_width: 7,
            pooled_height: 7,
            spatial_scale: 0.0625,
            output_dim: 0,
        }
    }
}

impl PsRoiPooling {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            pooled_width: pd.get_int(0, d.pooled_width),
            pooled_height: pd.get_int(1, d.pooled_height),
            spatial_scale: pd.get_float(2, d.spatial_scale),
            output_dim: pd.get_int(3, d.output_dim),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.pooled_width, d.pooled_width);
        emit_int!(pp, 1, self.pooled_height, d.pooled_height);
        emit_float!(pp, 2, self.spatial_scale, d.spatial_scale);
        emit_int!(pp, 3, self.output_dim, d.output_dim);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RoiAlign {
    pub pooled_width: i32,
    pub pooled_height: i32,
    pub spatial_scale: f32,
}

impl Default for RoiAlign {
    fn default() -> Self {
        Self {
            pooled_width: 0,
            pooled_height: 0,
            spatial_scale: 1.0,
        }
    }
}

impl RoiAlign {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            pooled_width: pd.get_int(0, d.pooled_width),
            pooled_height: pd.get_int(1, d.pooled_height),
            spatial_scale: pd.get_float(2, d.spatial_scale),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.pooled_width, d.pooled_width);
        emit_int!(pp, 1, self.pooled_height, d.pooled_height);
        emit_float!(pp, 2, self.spatial_scale, d.spatial_scale);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RoiPooling {
    pub pooled_width: i32,
    pub pooled_height: i32,
    pub spatial_scale: f32,
}

impl Default for RoiPooling {
    fn default() -> Self {
        Self {
            pooled_width: 0,
            pooled_height: 0,
            spatial_scale: 1.0,
        }
    }
}

impl RoiPooling {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            pooled_width: pd.get_int(0, d.pooled_width),
            pooled_height: pd.get_int(1, d.pooled_height),
            spatial_scale: pd.get_float(2, d.spatial_scale),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.pooled_width, d.pooled_width);
        emit_int!(pp, 1, self.pooled_height, d.pooled_height);
        emit_float!(pp, 2, self.spatial_scale, d.spatial_scale);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct YoloDetectionOutput {
    pub num_class: i32,
    pub num_box: i32,
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
    pub biases: Vec<f32>,
}

impl Default for YoloDetectionOutput {
    fn default() -> Self {
        Self {
            num_class: 20,
            num_box: 5,
            confidence_threshold: 0.01,
            nms_threshold: 0.45,
            biases: Vec::new(),
        }
    }
}

impl YoloDetectionOutput {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            num_class: pd.get_int(0, d.num_class),
            num_box: pd.get_int(1, d.num_box),
            confidence_threshold: pd.get_float(2, d.confidence_threshold),
            nms_threshold: pd.get_float(3, d.nms_threshold),
            biases: pd.get_float_array(4),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.num_class, d.num_class);
        emit_int!(pp, 1, self.num_box, d.num_box);
        emit_float!(pp, 2, self.confidence_threshold, d.confidence_threshold);
        emit_float!(pp, 3, self.nms_threshold, d.nms_threshold);
        emit_float_array!(pp, 4, self.biases);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Yolov3DetectionOutput {
    pub num_class: i32,
    pub num_box: i32,
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
    pub biases: Vec<f32>,
    pub mask: Vec<i32>,
    pub anchors_scale: Vec<f32>,
}

impl Default for Yolov3DetectionOutput {
    fn default() -> Self {
        Self {
            num_class: 20,
            num_box: 5,
            confidence_threshold: 0.55,
            nms_threshold: 0.45,
            biases: Vec::new(),
            mask: Vec::new(),
            anchors_scale: Vec::new(),
        }
    }
}

impl Yolov3DetectionOutput {
    pub(crate) fn from_dict(pd: &ParamDict) -> Self {
        let d = Self::default();
        Self {
            num_class: pd.get_int(0, d.num_class),
            num_box: pd.get_int(1, d.num_box),
            confidence_threshold: pd.get_float(2, d.confidence_threshold),
            nms_threshold: pd.get_float(3, d.nms_threshold),
            biases: pd.get_float_array(4),
            mask: pd.get_int_array(5),
            anchors_scale: pd.get_float_array(6),
        }
    }

    pub(crate) fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
        let d = Self::default();
        emit_int!(pp, 0, self.num_class, d.num_class);
        emit_int!(pp, 1, self.num_box, d.num_box);
        emit_float!(pp, 2, self.confidence_threshold, d.confidence_threshold);
        emit_float!(pp, 3, self.nms_threshold, d.nms_threshold);
        emit_float_array!(pp, 4, self.biases);
        emit_int_array!(pp, 5, self.mask);
        emit_float_array!(pp, 6, self.anchors_scale);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variances_emit_only_when_changed() {
        let mut out = Vec::new();
        DetectionOutput::default().write_params(&mut out).unwrap();
        assert!(out.is_empty());

        let det = DetectionOutput {
            num_class: 21,
            variances: [0.1, 0.1, 0.2, 0.3],
            ..Default::default()
        };
        let mut out = Vec::new();
        det.write_params(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), " 0=21 8=0.300000");
    }

    #[test]
    fn yolov3_mask_is_an_int_array() {
        let y = Yolov3DetectionOutput {
            mask: vec![3, 4, 5],
            ..Default::default()
        };
        let mut out = Vec::new();
        y.write_params(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), " -23305=3,3,4,5");
    }
}
