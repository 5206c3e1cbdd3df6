//! Kernel variant descriptors
//!
//! A [`Variant`] is the input tuple of one generated kernel; a [`Descriptor`]
//! adds everything derived from it (function name, file name, header
//! description and, for convolutions, the names of the helper kernels they
//! call). Names are pure functions of the tuple, and the helper names are
//! built with the same functions used when the helpers themselves are
//! generated, so cross references always resolve.

use crate::domain::{Folding, Precision, Quantization, ARITHMETIC_PRECISION};
use serde::Serialize;
use std::fmt;

/// Extension of every generated kernel source.
pub const SOURCE_EXTENSION: &str = ".c";

/// Continuation prefix for multi-line descriptions inside a C block comment.
const DESCRIPTION_BREAK: &str = "\n *               ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    Convolve,
    Depthwise,
    MatMul,
    ConvertReorder,
}

impl VariantKind {
    /// Generation order.
    pub const ALL: [VariantKind; 4] = [
        VariantKind::Convolve,
        VariantKind::Depthwise,
        VariantKind::MatMul,
        VariantKind::ConvertReorder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VariantKind::Convolve => "convolve",
            VariantKind::Depthwise => "depthwise",
            VariantKind::MatMul => "mat_mul",
            VariantKind::ConvertReorder => "convert_reorder",
        }
    }

    /// Whether this kind is specialised over quantization and folding.
    pub fn is_quantized(&self) -> bool {
        !matches!(self, VariantKind::ConvertReorder)
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Precision tuple of a convolution-style kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ConvTuple {
    pub input: Precision,
    pub output: Precision,
    pub weights: Precision,
    pub quantization: Quantization,
    pub folding: Folding,
}

/// Matrix multiplication consumes reordered arithmetic-precision data, so it
/// has no input precision of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MatMulTuple {
    pub output: Precision,
    pub weights: Precision,
    pub quantization: Quantization,
    pub folding: Folding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Variant {
    Convolve(ConvTuple),
    Depthwise(ConvTuple),
    MatMul(MatMulTuple),
    ConvertReorder { input: Precision },
}

impl Variant {
    pub fn kind(&self) -> VariantKind {
        match self {
            Variant::Convolve(_) => VariantKind::Convolve,
            Variant::Depthwise(_) => VariantKind::Depthwise,
            Variant::MatMul(_) => VariantKind::MatMul,
            Variant::ConvertReorder { .. } => VariantKind::ConvertReorder,
        }
    }

    pub fn quantization(&self) -> Option<Quantization> {
        match self {
            Variant::Convolve(t) | Variant::Depthwise(t) => Some(t.quantization),
            Variant::MatMul(t) => Some(t.quantization),
            Variant::ConvertReorder { .. } => None,
        }
    }

    pub fn folding(&self) -> Option<Folding> {
        match self {
            Variant::Convolve(t) | Variant::Depthwise(t) => Some(t.folding),
            Variant::MatMul(t) => Some(t.folding),
            Variant::ConvertReorder { .. } => None,
        }
    }

    /// Canonical C function name.
    pub fn fn_name(&self) -> String {
        match self {
            Variant::Convolve(t) => {
                convolve_name(t.input, t.output, t.weights, t.quantization, t.folding)
            }
            Variant::Depthwise(t) => {
                depthwise_name(t.input, t.output, t.weights, t.quantization, t.folding)
            }
            Variant::MatMul(t) => mat_mult_name(t.output, t.weights, t.quantization, t.folding),
            Variant::ConvertReorder { input } => convert_reorder_name(*input),
        }
    }

    fn description(&self) -> String {
        match self {
            Variant::Convolve(t) => format!(
                "Mixed Precision Convolutional function that uses {}{}activations, {} weights and produce {}{}output activations. Outputs are quantized using {}{}folding technique.",
                t.input, DESCRIPTION_BREAK, t.weights, t.output, DESCRIPTION_BREAK, t.folding, DESCRIPTION_BREAK
            ),
            Variant::Depthwise(t) => format!(
                "Mixed Precision Depthwise Convolutional function that uses {}{}activations, {} weights and produce {}{}output activations. Outputs are quantized using {}{}folding technique.",
                t.input, DESCRIPTION_BREAK, t.weights, t.output, DESCRIPTION_BREAK, t.folding, DESCRIPTION_BREAK
            ),
            Variant::MatMul(t) => format!(
                "Matrix-Multiplication function for {} x {} convolution with{}reordered columns. Output is quantized to {} using {}{}folding technique.",
                t.weights, ARITHMETIC_PRECISION, DESCRIPTION_BREAK, t.output, t.folding, DESCRIPTION_BREAK
            ),
            Variant::ConvertReorder { input } => format!(
                "Converts the elements of {} vector to{}a reordered {} vector (without left-shift).",
                input, DESCRIPTION_BREAK, ARITHMETIC_PRECISION
            ),
        }
    }
}

/// `_<quantization>` unless default, then `_<folding>` unless default.
fn variant_suffix(quantization: Quantization, folding: Folding) -> String {
    let mut suffix = String::new();
    if quantization != Quantization::DEFAULT {
        suffix.push('_');
        suffix.push_str(quantization.as_str());
    }
    if folding != Folding::DEFAULT {
        suffix.push('_');
        suffix.push_str(folding.as_str());
    }
    suffix
}

pub fn convolve_name(
    input: Precision,
    output: Precision,
    weights: Precision,
    quantization: Quantization,
    folding: Folding,
) -> String {
    format!(
        "arm_convolve_HWC_{}_{}_{}{}",
        input,
        output,
        weights,
        variant_suffix(quantization, folding)
    )
}

pub fn depthwise_name(
    input: Precision,
    output: Precision,
    weights: Precision,
    quantization: Quantization,
    folding: Folding,
) -> String {
    format!(
        "arm_depthwise_separable_conv_HWC_{}_{}_{}{}",
        input,
        output,
        weights,
        variant_suffix(quantization, folding)
    )
}

pub fn mat_mult_name(
    output: Precision,
    weights: Precision,
    quantization: Quantization,
    folding: Folding,
) -> String {
    format!(
        "arm_nn_mat_mult_kernel_reordered_{}_{}_{}{}",
        weights,
        ARITHMETIC_PRECISION,
        output,
        variant_suffix(quantization, folding)
    )
}

pub fn convert_reorder_name(input: Precision) -> String {
    format!("arm_{}_to_{}_reordered", input, ARITHMETIC_PRECISION)
}

/// Helpers a convolution kernel calls, plus the channel-count multiples it
/// asserts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvolveLinks {
    pub reordered_no_shift_load_fn: String,
    pub nn_mat_mul_fn: String,
    pub ch_in_constrain: u32,
    pub ch_out_constrain: u32,
}

impl ConvolveLinks {
    fn new(t: &ConvTuple) -> Self {
        Self {
            reordered_no_shift_load_fn: convert_reorder_name(t.input),
            nn_mat_mul_fn: mat_mult_name(t.output, t.weights, t.quantization, t.folding),
            ch_in_constrain: t.input.channel_constrain(),
            ch_out_constrain: t.output.channel_constrain(),
        }
    }
}

/// A variant with all of its derived metadata populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub variant: Variant,
    pub fn_name: String,
    pub filename: String,
    pub description: String,
    /// Populated for [`Variant::Convolve`] only
    pub links: Option<ConvolveLinks>,
}

impl Descriptor {
    pub fn new(variant: Variant) -> Self {
        let fn_name = variant.fn_name();
        let filename = format!("{}{}", fn_name, SOURCE_EXTENSION);
        let links = match &variant {
            Variant::Convolve(t) => Some(ConvolveLinks::new(t)),
            _ => None,
        };

        Self {
            description: variant.description(),
            variant,
            fn_name,
            filename,
            links,
        }
    }

    pub fn kind(&self) -> VariantKind {
        self.variant.kind()
    }

    /// Attribute surface handed to templates. `header` is empty until the
    /// file header has been rendered.
    pub fn view<'a>(&'a self, header: &'a str) -> RenderView<'a> {
        let (input, output, weights) = match &self.variant {
            Variant::Convolve(t) | Variant::Depthwise(t) => {
                (t.input.as_str(), t.output.as_str(), t.weights.as_str())
            }
            Variant::MatMul(t) => ("", t.output.as_str(), t.weights.as_str()),
            Variant::ConvertReorder { input } => (input.as_str(), ARITHMETIC_PRECISION, ""),
        };

        RenderView {
            kind: self.kind(),
            in_data_t: input,
            out_data_t: output,
            wt_data_t: weights,
            arithmetic_t: ARITHMETIC_PRECISION,
            quantization: self.variant.quantization().map_or("", |q| q.as_str()),
            folding: self.variant.folding().map_or("", |f| f.as_str()),
            fn_name: &self.fn_name,
            filename: &self.filename,
            description: &self.description,
            header,
            links: self.links.as_ref(),
        }
    }
}

/// Flat view of a descriptor as templates see it under `config`.
#[derive(Debug, Serialize)]
pub struct RenderView<'a> {
    pub kind: VariantKind,
    pub in_data_t: &'a str,
    pub out_data_t: &'a str,
    pub wt_data_t: &'a str,
    pub arithmetic_t: &'a str,
    pub quantization: &'a str,
    pub folding: &'a str,
    pub fn_name: &'a str,
    pub filename: &'a str,
    pub description: &'a str,
    pub header: &'a str,
    #[serde(flatten)]
    pub links: Option<&'a ConvolveLinks>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(q: Quantization, f: Folding) -> ConvTuple {
        ConvTuple {
            input: Precision::U8,
            output: Precision::U8,
            weights: Precision::U8,
            quantization: q,
            folding: f,
        }
    }

    #[test]
    fn test_default_convolve_has_no_suffix() {
        let d = Descriptor::new(Variant::Convolve(conv(Quantization::Pact, Folding::Weights)));
        assert_eq!(d.fn_name, "arm_convolve_HWC_u8_u8_u8");
        assert_eq!(d.filename, "arm_convolve_HWC_u8_u8_u8.c");
    }

    #[test]
    fn test_per_channel_weights_adds_only_quantization_suffix() {
        let base = Descriptor::new(Variant::Convolve(conv(Quantization::Pact, Folding::Weights)));
        let d = Descriptor::new(Variant::Convolve(conv(Quantization::PactChannel, Folding::Weights)));
        assert_eq!(d.fn_name, format!("{}_PACT_CH", base.fn_name));
        assert!(!d.fn_name.ends_with("_weights"));
    }

    #[test]
    fn test_icn_folding_suffix() {
        let d = Descriptor::new(Variant::Depthwise(conv(Quantization::Pact, Folding::Icn)));
        assert_eq!(d.fn_name, "arm_depthwise_separable_conv_HWC_u8_u8_u8_icn");
    }

    #[test]
    fn test_mat_mult_orders_weights_before_output() {
        let d = Descriptor::new(Variant::MatMul(MatMulTuple {
            output: Precision::U2,
            weights: Precision::U4,
            quantization: Quantization::PactChannel,
            folding: Folding::Weights,
        }));
        assert_eq!(d.fn_name, "arm_nn_mat_mult_kernel_reordered_u4_int16_u2_PACT_CH");
        assert!(d.links.is_none());
    }

    #[test]
    fn test_convert_reorder_name() {
        let d = Descriptor::new(Variant::ConvertReorder { input: Precision::U4 });
        assert_eq!(d.fn_name, "arm_u4_to_int16_reordered");
        assert_eq!(d.filename, "arm_u4_to_int16_reordered.c");
        assert_eq!(d.variant.quantization(), None);
    }

    #[test]
    fn test_convolve_links_use_helper_names() {
        let t = ConvTuple {
            input: Precision::U4,
            output: Precision::U2,
            weights: Precision::U8,
            quantization: Quantization::Pact,
            folding: Folding::Icn,
        };
        let d = Descriptor::new(Variant::Convolve(t));
        let links = d.links.as_ref().unwrap();

        let reorder = Descriptor::new(Variant::ConvertReorder { input: Precision::U4 });
        let matmul = Descriptor::new(Variant::MatMul(MatMulTuple {
            output: Precision::U2,
            weights: Precision::U8,
            quantization: Quantization::Pact,
            folding: Folding::Icn,
        }));
        assert_eq!(links.reordered_no_shift_load_fn, reorder.fn_name);
        assert_eq!(links.nn_mat_mul_fn, matmul.fn_name);
        assert_eq!(links.ch_in_constrain, 8);
        assert_eq!(links.ch_out_constrain, 16);
    }

    #[test]
    fn test_naming_is_deterministic() {
        let t = conv(Quantization::PactChannel, Folding::Weights);
        assert_eq!(
            Descriptor::new(Variant::Convolve(t)),
            Descriptor::new(Variant::Convolve(t))
        );
    }

    #[test]
    fn test_view_blanks_fields_a_kind_lacks() {
        let d = Descriptor::new(Variant::ConvertReorder { input: Precision::U2 });
        let view = serde_json::to_value(d.view("")).unwrap();
        assert_eq!(view["kind"], "convert_reorder");
        assert_eq!(view["in_data_t"], "u2");
        assert_eq!(view["out_data_t"], "int16");
        assert_eq!(view["wt_data_t"], "");
        assert_eq!(view["quantization"], "");
        assert!(view.get("nn_mat_mul_fn").is_none());

        let d = Descriptor::new(Variant::Convolve(conv(Quantization::Pact, Folding::Weights)));
        let view = serde_json::to_value(d.view("/* hdr */")).unwrap();
        assert_eq!(view["nn_mat_mul_fn"], "arm_nn_mat_mult_kernel_reordered_u8_int16_u8");
        assert_eq!(view["reordered_no_shift_load_fn"], "arm_u8_to_int16_reordered");
        assert_eq!(view["ch_in_constrain"], 4);
        assert_eq!(view["header"], "/* hdr */");
    }

    #[test]
    fn test_description_spans_comment_lines() {
        let d = Descriptor::new(Variant::ConvertReorder { input: Precision::U8 });
        assert_eq!(
            d.description,
            "Converts the elements of u8 vector to\n *               a reordered int16 vector (without left-shift)."
        );
    }
}
