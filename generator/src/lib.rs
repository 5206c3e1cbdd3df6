//! CMix-NN kernel source generator.
//!
//! Expands the hand-written kernel templates into every valid combination of
//! data precision, quantization method and weight folding, one C source per
//! variant, plus the two public headers declaring them.

pub mod config;
pub mod domain;
pub mod enumerate;
pub mod error;
pub mod generate;
pub mod logging;
pub mod output;
pub mod templates;
pub mod variant;

pub use config::GeneratorConfig;
pub use error::{GenError, Result};
pub use generate::{generate, GenerationReport, Generator};
pub use variant::{Descriptor, Variant, VariantKind};
