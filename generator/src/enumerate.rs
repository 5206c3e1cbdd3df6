//! Enumeration of the variant space
//!
//! Walks the cross-product of domain values for each kernel kind, outer to
//! inner: input, output, weights, quantization, folding. The order is the
//! order descriptors are built, files are written and declarations land in
//! the aggregated headers, so it must stay fixed. Nothing here touches the
//! filesystem.

use crate::domain::{is_valid, Folding, Precision, Quantization};
use crate::variant::{ConvTuple, Descriptor, MatMulTuple, Variant, VariantKind};

/// Accepted variants of one kind, in generation order.
#[derive(Debug, Clone)]
pub struct Enumeration {
    pub kind: VariantKind,
    pub variants: Vec<Variant>,
    /// Tuples rejected by the validity filter
    pub filtered: usize,
}

impl Enumeration {
    pub fn descriptors(&self) -> impl Iterator<Item = Descriptor> + '_ {
        self.variants.iter().copied().map(Descriptor::new)
    }
}

pub fn enumerate(kind: VariantKind) -> Enumeration {
    let mut variants = Vec::new();
    let mut filtered = 0;

    match kind {
        VariantKind::Convolve | VariantKind::Depthwise => {
            for input in Precision::ALL {
                for output in Precision::ALL {
                    for weights in Precision::ALL {
                        for quantization in Quantization::ALL {
                            for folding in Folding::ALL {
                                if !is_valid(quantization, folding) {
                                    filtered += 1;
                                    continue;
                                }
                                let tuple = ConvTuple {
                                    input,
                                    output,
                                    weights,
                                    quantization,
                                    folding,
                                };
                                variants.push(if kind == VariantKind::Convolve {
                                    Variant::Convolve(tuple)
                                } else {
                                    Variant::Depthwise(tuple)
                                });
                            }
                        }
                    }
                }
            }
        }
        VariantKind::MatMul => {
            for output in Precision::ALL {
                for weights in Precision::ALL {
                    for quantization in Quantization::ALL {
                        for folding in Folding::ALL {
                            if !is_valid(quantization, folding) {
                                filtered += 1;
                                continue;
                            }
                            variants.push(Variant::MatMul(MatMulTuple {
                                output,
                                weights,
                                quantization,
                                folding,
                            }));
                        }
                    }
                }
            }
        }
        VariantKind::ConvertReorder => {
            variants.extend(Precision::ALL.map(|input| Variant::ConvertReorder { input }));
        }
    }

    Enumeration {
        kind,
        variants,
        filtered,
    }
}

/// Every kind, in generation order.
pub fn plan() -> Vec<Enumeration> {
    VariantKind::ALL.into_iter().map(enumerate).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_kind() {
        // 3 valid (quantization, folding) pairs out of 4
        let convolve = enumerate(VariantKind::Convolve);
        assert_eq!(convolve.variants.len(), 27 * 3);
        assert_eq!(convolve.filtered, 27);

        let depthwise = enumerate(VariantKind::Depthwise);
        assert_eq!(depthwise.variants.len(), 81);

        let matmul = enumerate(VariantKind::MatMul);
        assert_eq!(matmul.variants.len(), 9 * 3);
        assert_eq!(matmul.filtered, 9);

        let reorder = enumerate(VariantKind::ConvertReorder);
        assert_eq!(reorder.variants.len(), Precision::ALL.len());
        assert_eq!(reorder.filtered, 0);
    }

    #[test]
    fn test_filtered_tuples_never_appear() {
        for e in plan() {
            for v in &e.variants {
                if let (Some(q), Some(f)) = (v.quantization(), v.folding()) {
                    assert!(is_valid(q, f), "{:?} should have been filtered", v);
                }
            }
        }
    }

    #[test]
    fn test_iteration_order() {
        let names: Vec<String> = enumerate(VariantKind::Convolve)
            .descriptors()
            .take(4)
            .map(|d| d.fn_name)
            .collect();
        assert_eq!(
            names,
            vec![
                "arm_convolve_HWC_u8_u8_u8",
                "arm_convolve_HWC_u8_u8_u8_icn",
                "arm_convolve_HWC_u8_u8_u8_PACT_CH",
                "arm_convolve_HWC_u8_u8_u4",
            ]
        );

        let first_matmuls: Vec<String> = enumerate(VariantKind::MatMul)
            .descriptors()
            .step_by(3)
            .take(2)
            .map(|d| d.fn_name)
            .collect();
        // output is the outer loop, weights the inner one
        assert_eq!(
            first_matmuls,
            vec![
                "arm_nn_mat_mult_kernel_reordered_u8_int16_u8",
                "arm_nn_mat_mult_kernel_reordered_u4_int16_u8",
            ]
        );
    }

    #[test]
    fn test_plan_follows_kind_order() {
        let kinds: Vec<VariantKind> = plan().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, VariantKind::ALL.to_vec());
    }

    #[test]
    fn test_names_unique_within_kind() {
        for e in plan() {
            let mut names: Vec<String> = e.descriptors().map(|d| d.fn_name).collect();
            let total = names.len();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), total, "duplicate names for {}", e.kind);
        }
    }
}
