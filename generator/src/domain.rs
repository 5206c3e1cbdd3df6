//! Domain values for CMix-NN kernel variants
//!
//! The three axes a kernel is specialised over (data precision, quantization
//! method, weight-folding method) are closed sets with a fixed order. That
//! order drives enumeration, so it is part of the output contract: changing
//! it reorders the aggregated headers.

use crate::error::{GenError, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Internal accumulator width shared by every generated kernel.
pub const ARITHMETIC_PRECISION: &str = "int16";

/// Sub-byte unsigned data precision of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Precision {
    #[serde(rename = "u8")]
    U8,
    #[serde(rename = "u4")]
    U4,
    #[serde(rename = "u2")]
    U2,
}

impl Precision {
    /// Enumeration order, widest first.
    pub const ALL: [Precision; 3] = [Precision::U8, Precision::U4, Precision::U2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::U8 => "u8",
            Precision::U4 => "u4",
            Precision::U2 => "u2",
        }
    }

    /// Channel-count multiple a kernel requires for tensors of this precision.
    pub fn channel_constrain(&self) -> u32 {
        match self {
            Precision::U8 => 4,
            Precision::U4 => 8,
            Precision::U2 => 16,
        }
    }
}

/// How scale and zero-point are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Quantization {
    /// Per-layer parameters
    #[serde(rename = "PACT")]
    Pact,
    /// Per-output-channel parameters
    #[serde(rename = "PACT_CH")]
    PactChannel,
}

impl Quantization {
    pub const ALL: [Quantization; 2] = [Quantization::Pact, Quantization::PactChannel];
    pub const DEFAULT: Quantization = Quantization::Pact;

    pub fn as_str(&self) -> &'static str {
        match self {
            Quantization::Pact => "PACT",
            Quantization::PactChannel => "PACT_CH",
        }
    }
}

/// Where the weight-scaling step lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Folding {
    /// Folded into the stored weights
    #[serde(rename = "weights")]
    Weights,
    /// Applied per input channel at runtime
    #[serde(rename = "icn")]
    Icn,
}

impl Folding {
    pub const ALL: [Folding; 2] = [Folding::Weights, Folding::Icn];
    pub const DEFAULT: Folding = Folding::Weights;

    pub fn as_str(&self) -> &'static str {
        match self {
            Folding::Weights => "weights",
            Folding::Icn => "icn",
        }
    }
}

/// Whether a (quantization, folding) pair is generated at all.
///
/// Per-channel quantization only exists with weight folding.
pub fn is_valid(quantization: Quantization, folding: Folding) -> bool {
    match quantization {
        Quantization::Pact => true,
        Quantization::PactChannel => folding == Folding::Weights,
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Quantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Folding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Precision {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        Precision::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| GenError::Config(format!("unknown precision '{}'", s)))
    }
}

impl FromStr for Quantization {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        Quantization::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| GenError::Config(format!("unknown quantization method '{}'", s)))
    }
}

impl FromStr for Folding {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        Folding::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| GenError::Config(format!("unknown folding method '{}'", s)))
    }
}
