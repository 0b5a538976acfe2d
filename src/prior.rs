//! Prior distributions over the transition rate.
//!
//! A small closed set of families, selected either directly through the
//! constructors or by name through [`Prior::from_family`]. Evaluation happens
//! exclusively in log space; points outside a family's support evaluate to
//! negative infinity, which the sampler turns into automatic rejection.

use std::f64::consts::PI;

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PriorError {
    #[error("unsupported prior family \"{0}\"")]
    UnsupportedFamily(String),
    #[error("prior family {family} expects {expected} parameters, got {actual}")]
    WrongParameterCount {
        family: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid parameters for {family} prior: {reason}")]
    InvalidParameters {
        family: &'static str,
        reason: String,
    },
}

/// A prior density over the transition rate.
///
/// Construction validates the family parameters, so a `Prior` value always
/// describes a proper distribution. The same family and parameters always
/// produce the same log-density function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prior {
    Exponential { rate: f64 },
    Uniform { low: f64, high: f64 },
    Normal { mean: f64, std_dev: f64 },
}

impl Prior {
    pub fn exponential(rate: f64) -> Result<Self, PriorError> {
        if !rate.is_finite() || rate <= 0. {
            return Err(PriorError::InvalidParameters {
                family: "exponential",
                reason: format!("rate must be positive and finite, got {}", rate),
            });
        }
        Ok(Prior::Exponential { rate })
    }

    pub fn uniform(low: f64, high: f64) -> Result<Self, PriorError> {
        if !low.is_finite() || !high.is_finite() || high <= low {
            return Err(PriorError::InvalidParameters {
                family: "uniform",
                reason: format!("bounds must be finite with low < high, got ({}, {})", low, high),
            });
        }
        Ok(Prior::Uniform { low, high })
    }

    pub fn normal(mean: f64, std_dev: f64) -> Result<Self, PriorError> {
        if !mean.is_finite() || !std_dev.is_finite() || std_dev <= 0. {
            return Err(PriorError::InvalidParameters {
                family: "normal",
                reason: format!(
                    "mean must be finite and stdev positive, got ({}, {})",
                    mean, std_dev
                ),
            });
        }
        Ok(Prior::Normal { mean, std_dev })
    }

    /// Select a prior family by name.
    ///
    /// Known families are `"exponential"` (rate), `"uniform"` (low, high) and
    /// `"normal"` (mean, stdev). Any other name fails with
    /// [`PriorError::UnsupportedFamily`].
    pub fn from_family(family: &str, params: &[f64]) -> Result<Self, PriorError> {
        let expect = |expected: usize, name: &'static str| {
            if params.len() == expected {
                Ok(())
            } else {
                Err(PriorError::WrongParameterCount {
                    family: name,
                    expected,
                    actual: params.len(),
                })
            }
        };
        match family.to_ascii_lowercase().as_str() {
            "exponential" => {
                expect(1, "exponential")?;
                Self::exponential(params[0])
            }
            "uniform" => {
                expect(2, "uniform")?;
                Self::uniform(params[0], params[1])
            }
            "normal" => {
                expect(2, "normal")?;
                Self::normal(params[0], params[1])
            }
            _ => Err(PriorError::UnsupportedFamily(family.to_string())),
        }
    }

    /// Log-density at `x`. Outside the support this is negative infinity.
    pub fn log_density(&self, x: f64) -> f64 {
        match *self {
            Prior::Exponential { rate } => {
                if x > 0. {
                    rate.ln() - rate * x
                } else {
                    f64::NEG_INFINITY
                }
            }
            Prior::Uniform { low, high } => {
                if (low..=high).contains(&x) {
                    -(high - low).ln()
                } else {
                    f64::NEG_INFINITY
                }
            }
            Prior::Normal { mean, std_dev } => {
                let z = (x - mean) / std_dev;
                -0.5 * z * z - std_dev.ln() - 0.5 * (2. * PI).ln()
            }
        }
    }

    pub fn family(&self) -> &'static str {
        match self {
            Prior::Exponential { .. } => "exponential",
            Prior::Uniform { .. } => "uniform",
            Prior::Normal { .. } => "normal",
        }
    }
}
