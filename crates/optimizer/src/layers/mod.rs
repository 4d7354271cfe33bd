//! Layer catalog
//!
//! One typed parameter struct per layer kind, collected into the [`LayerParams`]
//! sum type. The catalog is the single source of truth for three things:
//!
//! - scalar/array parameter ids, element types and defaults (each struct's
//!   `Default` impl), shared by the loader (absent params) and the serializer
//!   (defaults-omitting emission);
//! - the per-kind weight tensor order in the binary stream;
//! - the activation slot the absorption pass mutates (convolution family and
//!   InnerProduct only).
//!
//! Kinds the catalog does not know load as [`LayerParams::Unsupported`]: their
//! kind/name/topology round-trip, their parameters are dropped. A fused layer
//! becomes [`LayerParams::Fused`] and is skipped everywhere.

mod activation;
mod conv;
mod detection;
mod macros;
mod math;
mod norm;
mod shape;

pub use activation::{Clip, Dropout, Elu, PReLU, ReLU, Softmax, Threshold};
pub use conv::{
    Convolution, ConvolutionDepthWise, Deconvolution, DeconvolutionDepthWise, InnerProduct,
};
pub use detection::{
    DetectionOutput, PriorBox, Proposal, PsRoiPooling, RoiAlign, RoiPooling, YoloDetectionOutput,
    Yolov3DetectionOutput,
};
pub use math::{
    Bias, BinaryOp, Eltwise, Exp, Log, Power, Quantize, Reduction, Requantize, UnaryOp,
};
pub use norm::{BatchNorm, InstanceNorm, Lrn, Mvn, Normalize, Scale};
pub use shape::{
    Concat, Crop, Input, Interp, Padding, Permute, Pooling, Reorg, Reshape, ShuffleChannel, Slice,
};

use std::io::{self, Read, Write};

use crate::error::Result;
use crate::format::{ParamDict, WeightReader, WeightWriter};
use crate::tensor::Tensor;

/// Generate the catalog sum type and its kind-string dispatch.
///
/// Each entry maps the on-disk kind string to a variant wrapping the typed
/// parameter struct; the match arms for parsing and emission are exhaustive
/// by construction.
macro_rules! define_layer_catalog {
    ( $( $kind:literal => $variant:ident($ty:ty) ),* $(,)? ) => {
        /// Typed parameters and weights for one layer.
        #[derive(Debug, Clone)]
        pub enum LayerParams {
            $( $variant($ty), )*
            /// Catalog-unrecognized kind; parameters are not preserved.
            Unsupported,
            /// Tombstone for a layer fused into its neighbor.
            Fused,
        }

        impl LayerParams {
            /// Build the typed parameters for `kind`, applying catalog
            /// defaults for every id absent from the dictionary.
            pub fn from_param_dict(kind: &str, pd: &ParamDict) -> Self {
                match kind {
                    $( $kind => LayerParams::$variant(<$ty>::from_dict(pd)), )*
                    _ => LayerParams::Unsupported,
                }
            }

            /// Emit the ` id=value` parameter tokens that differ from the
            /// catalog defaults.
            pub fn write_params<W: Write>(&self, pp: &mut W) -> io::Result<()> {
                match self {
                    $( LayerParams::$variant(p) => p.write_params(pp), )*
                    LayerParams::Unsupported | LayerParams::Fused => Ok(()),
                }
            }
        }
    };
}

define_layer_catalog! {
    "BatchNorm" => BatchNorm(BatchNorm),
    "Bias" => Bias(Bias),
    "BinaryOp" => BinaryOp(BinaryOp),
    "Clip" => Clip(Clip),
    "Concat" => Concat(Concat),
    "Convolution" => Convolution(Convolution),
    "ConvolutionDepthWise" => ConvolutionDepthWise(ConvolutionDepthWise),
    "Crop" => Crop(Crop),
    "Deconvolution" => Deconvolution(Deconvolution),
    "DeconvolutionDepthWise" => DeconvolutionDepthWise(DeconvolutionDepthWise),
    "DetectionOutput" => DetectionOutput(DetectionOutput),
    "Dropout" => Dropout(Dropout),
    "Eltwise" => Eltwise(Eltwise),
    "ELU" => Elu(Elu),
    "Exp" => Exp(Exp),
    "InnerProduct" => InnerProduct(InnerProduct),
    "Input" => Input(Input),
    "InstanceNorm" => InstanceNorm(InstanceNorm),
    "Interp" => Interp(Interp),
    "Log" => Log(Log),
    "LRN" => Lrn(Lrn),
    "MVN" => Mvn(Mvn),
    "Normalize" => Normalize(Normalize),
    "Padding" => Padding(Padding),
    "Permute" => Permute(Permute),
    "Pooling" => Pooling(Pooling),
    "Power" => Power(Power),
    "PReLU" => PReLU(PReLU),
    "PriorBox" => PriorBox(PriorBox),
    "Proposal" => Proposal(Proposal),
    "PSROIPooling" => PsRoiPooling(PsRoiPooling),
    "Quantize" => Quantize(Quantize),
    "Reduction" => Reduction(Reduction),
    "ReLU" => ReLU(ReLU),
    "Reorg" => Reorg(Reorg),
    "Requantize" => Requantize(Requantize),
    "Reshape" => Reshape(Reshape),
    "ROIAlign" => RoiAlign(RoiAlign),
    "ROIPooling" => RoiPooling(RoiPooling),
    "Scale" => Scale(Scale),
    "ShuffleChannel" => ShuffleChannel(ShuffleChannel),
    "Slice" => Slice(Slice),
    "Softmax" => Softmax(Softmax),
    "Threshold" => Threshold(Threshold),
    "UnaryOp" => UnaryOp(UnaryOp),
    "YoloDetectionOutput" => YoloDetectionOutput(YoloDetectionOutput),
    "Yolov3DetectionOutput" => Yolov3DetectionOutput(Yolov3DetectionOutput),
}

/// Mutable view of the fields the batch-normalization fold rewrites.
///
/// Valid for the five kinds whose weight tensor is output-channel-major with
/// an optional per-output bias.
pub struct AffineWeights<'a> {
    pub bias_term: &'a mut i32,
    pub weight_data_size: i32,
    pub weight_data: &'a mut Tensor,
    pub bias_data: &'a mut Tensor,
}

impl LayerParams {
    /// Read this layer's weight tensors from the binary stream, in the
    /// catalog's fixed per-kind order. Kinds without weights read nothing.
    pub fn read_weights<R: Read>(&mut self, br: &mut WeightReader<R>, layer: &str) -> Result<()> {
        match self {
            LayerParams::BatchNorm(p) => p.read_weights(br, layer),
            LayerParams::Bias(p) => p.read_weights(br, layer),
            LayerParams::Convolution(p) => p.read_weights(br, layer),
            LayerParams::ConvolutionDepthWise(p) => p.read_weights(br, layer),
            LayerParams::Deconvolution(p) => p.read_weights(br, layer),
            LayerParams::DeconvolutionDepthWise(p) => p.read_weights(br, layer),
            LayerParams::InnerProduct(p) => p.read_weights(br, layer),
            LayerParams::Normalize(p) => p.read_weights(br, layer),
            LayerParams::PReLU(p) => p.read_weights(br, layer),
            LayerParams::Scale(p) => p.read_weights(br, layer),
            _ => Ok(()),
        }
    }

    /// Write this layer's weight tensors to the binary stream.
    pub fn write_weights<W: Write>(&self, bw: &mut WeightWriter<W>) -> io::Result<()> {
        match self {
            LayerParams::BatchNorm(p) => p.write_weights(bw),
            LayerParams::Bias(p) => p.write_weights(bw),
            LayerParams::Convolution(p) => p.write_weights(bw),
            LayerParams::ConvolutionDepthWise(p) => p.write_weights(bw),
            LayerParams::Deconvolution(p) => p.write_weights(bw),
            LayerParams::DeconvolutionDepthWise(p) => p.write_weights(bw),
            LayerParams::InnerProduct(p) => p.write_weights(bw),
            LayerParams::Normalize(p) => p.write_weights(bw),
            LayerParams::PReLU(p) => p.write_weights(bw),
            LayerParams::Scale(p) => p.write_weights(bw),
            _ => Ok(()),
        }
    }

    /// Weight/bias view for the batch-normalization fold.
    pub fn affine_weights_mut(&mut self) -> Option<AffineWeights<'_>> {
        macro_rules! view {
            ($p:expr) => {
                Some(AffineWeights {
                    bias_term: &mut $p.bias_term,
                    weight_data_size: $p.weight_data_size,
                    weight_data: &mut $p.weight_data,
                    bias_data: &mut $p.bias_data,
                })
            };
        }
        match self {
            LayerParams::Convolution(p) => view!(p),
            LayerParams::ConvolutionDepthWise(p) => view!(p),
            LayerParams::Deconvolution(p) => view!(p),
            LayerParams::DeconvolutionDepthWise(p) => view!(p),
            LayerParams::InnerProduct(p) => view!(p),
            _ => None,
        }
    }

    /// Built-in activation slot, present on the same five kinds.
    pub fn activation_slot_mut(&mut self) -> Option<(&mut i32, &mut Vec<f32>)> {
        match self {
            LayerParams::Convolution(p) => Some((&mut p.activation_type, &mut p.activation_params)),
            LayerParams::ConvolutionDepthWise(p) => {
                Some((&mut p.activation_type, &mut p.activation_params))
            }
            LayerParams::Deconvolution(p) => {
                Some((&mut p.activation_type, &mut p.activation_params))
            }
            LayerParams::DeconvolutionDepthWise(p) => {
                Some((&mut p.activation_type, &mut p.activation_params))
            }
            LayerParams::InnerProduct(p) => {
                Some((&mut p.activation_type, &mut p.activation_params))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_maps_to_unsupported() {
        let pd = ParamDict::new();
        let params = LayerParams::from_param_dict("SomeCustomOp", &pd);
        assert!(matches!(params, LayerParams::Unsupported));

        let mut out = Vec::new();
        params.write_params(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn affine_view_covers_the_conv_family() {
        let mut conv = LayerParams::Convolution(Convolution::default());
        assert!(conv.affine_weights_mut().is_some());
        assert!(conv.activation_slot_mut().is_some());

        let mut ip = LayerParams::InnerProduct(InnerProduct::default());
        assert!(ip.affine_weights_mut().is_some());

        let mut bn = LayerParams::BatchNorm(BatchNorm::default());
        assert!(bn.affine_weights_mut().is_none());
        assert!(bn.activation_slot_mut().is_none());
    }

    #[test]
    fn catalog_defaults_survive_an_empty_dict() {
        let pd = ParamDict::new();
        let params = LayerParams::from_param_dict("Dropout", &pd);
        let LayerParams::Dropout(d) = params else {
            panic!("expected Dropout params");
        };
        assert_eq!(d.scale, 1.0);
    }
}
