//! Run configuration.
//!
//! [`NetworkConfig`] is built once (by the CLI, or by hand in tests) and
//! passed by reference into every stage.

use std::fmt;
use std::str::FromStr;

use coexnet_core::{CoexnetError, Result};
use coexnet_omics::LengthPolicy;
use serde::{Deserialize, Serialize};

/// What to do with genes whose expression is identical in every sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZeroVariancePolicy {
    /// Keep them; their correlation with every other gene is 0.
    #[default]
    ZeroCorrelation,
    /// Remove them at the end of preprocessing.
    Exclude,
}

impl fmt::Display for ZeroVariancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ZeroVariancePolicy::ZeroCorrelation => "zero-correlation",
            ZeroVariancePolicy::Exclude => "exclude",
        })
    }
}

impl FromStr for ZeroVariancePolicy {
    type Err = CoexnetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "zero-correlation" => Ok(ZeroVariancePolicy::ZeroCorrelation),
            "exclude" => Ok(ZeroVariancePolicy::Exclude),
            other => Err(CoexnetError::InvalidInput(format!(
                "unknown zero-variance policy '{other}' (expected zero-correlation or exclude)"
            ))),
        }
    }
}

/// Parameters of a co-expression network run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Drop a gene when at least this fraction of samples is below
    /// `expression_floor` (default: 0.9).
    pub low_expression_threshold: f64,
    /// Fraction of lowest-variance genes to drop (default: 0.25).
    pub low_variance_percentile: f64,
    /// Soft-thresholding power β (default: 6.0).
    pub soft_power_beta: f64,
    /// log2(TPM+1) value below which a sample counts as not expressed
    /// (default: 1.0).
    pub expression_floor: f64,
    pub zero_variance: ZeroVariancePolicy,
    /// How annotation records are reduced to one gene length.
    pub length_policy: LengthPolicy,
    /// Smallest TOM denominator (default: 1e-12).
    pub tom_epsilon: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            low_expression_threshold: 0.9,
            low_variance_percentile: 0.25,
            soft_power_beta: 6.0,
            expression_floor: 1.0,
            zero_variance: ZeroVariancePolicy::default(),
            length_policy: LengthPolicy::default(),
            tom_epsilon: 1e-12,
        }
    }
}

impl NetworkConfig {
    /// Check every field, naming the first one out of range.
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, v: f64| -> Result<()> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(CoexnetError::InvalidInput(format!(
                    "{name} must be in [0, 1], got {v}"
                )))
            }
        };
        unit("low_expression_threshold", self.low_expression_threshold)?;
        unit("low_variance_percentile", self.low_variance_percentile)?;

        if !self.soft_power_beta.is_finite() || self.soft_power_beta < 0.0 {
            return Err(CoexnetError::InvalidInput(format!(
                "soft_power_beta must be finite and >= 0, got {}",
                self.soft_power_beta
            )));
        }
        if !self.expression_floor.is_finite() {
            return Err(CoexnetError::InvalidInput(format!(
                "expression_floor must be finite, got {}",
                self.expression_floor
            )));
        }
        if !(self.tom_epsilon.is_finite() && self.tom_epsilon > 0.0) {
            return Err(CoexnetError::InvalidInput(format!(
                "tom_epsilon must be positive, got {}",
                self.tom_epsilon
            )));
        }
        Ok(())
    }
}
