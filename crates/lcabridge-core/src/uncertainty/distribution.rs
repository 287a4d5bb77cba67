//! Closed set of uncertainty distributions and their realize/combine rules
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use crate::error::NoteCode;
use crate::types::{DestinationUncertainty, DistributionKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Two-sided 95% quantile of the standard normal distribution
pub const Z_95: f64 = 1.959963984540054;

/// Distributions the destination schema cannot represent numerically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnconvertibleKind {
    Beta,
    Gamma,
    Binomial,
}

impl fmt::Display for UnconvertibleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnconvertibleKind::Beta => write!(f, "beta"),
            UnconvertibleKind::Gamma => write!(f, "gamma"),
            UnconvertibleKind::Binomial => write!(f, "binomial"),
        }
    }
}

/// Uncertainty of one amount, in the frame of its original unit
///
/// Variances and bounds are stored as read from the source; `realize`
/// applies the amount's scale factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UncertaintyDistribution {
    Lognormal {
        ln_variance: f64,
    },
    Normal {
        variance: f64,
    },
    Triangular {
        min: f64,
        most_likely: f64,
        max: f64,
    },
    Uniform {
        min: f64,
        max: f64,
    },
    Undefined {
        min: f64,
        max: f64,
        std95: f64,
    },
    Unconvertible {
        distribution: UnconvertibleKind,
        raw_params: BTreeMap<String, f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineOp {
    Multiply,
    Divide,
    /// Summing duplicate exchanges; operands must share one frame
    Add,
}

/// Outcome of combining two distributions
#[derive(Debug, Clone, PartialEq)]
pub enum Combination {
    Combined(UncertaintyDistribution),
    Dropped { reason: String },
}

/// Side-channel message produced while realizing a distribution
#[derive(Debug, Clone, PartialEq)]
pub struct RealizationNote {
    pub code: NoteCode,
    pub message: String,
}

/// Destination record and/or note for one realized distribution
#[derive(Debug, Clone, PartialEq)]
pub struct Realization {
    pub record: Option<DestinationUncertainty>,
    pub note: Option<RealizationNote>,
}

impl UncertaintyDistribution {
    /// Lower-case tag used in messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            UncertaintyDistribution::Lognormal { .. } => "lognormal",
            UncertaintyDistribution::Normal { .. } => "normal",
            UncertaintyDistribution::Triangular { .. } => "triangular",
            UncertaintyDistribution::Uniform { .. } => "uniform",
            UncertaintyDistribution::Undefined { .. } => "undefined",
            UncertaintyDistribution::Unconvertible { distribution, .. } => match distribution {
                UnconvertibleKind::Beta => "beta",
                UnconvertibleKind::Gamma => "gamma",
                UnconvertibleKind::Binomial => "binomial",
            },
        }
    }

    /// Compute destination bounds for `mean`, given in the canonical unit
    ///
    /// Log-normal bounds depend only on the ln-variance. A log-normal with a
    /// mean that is not positive mirrors its bounds through zero (`mean = 0`
    /// gives `min = max = 0`), omits `mu` and carries a note.
    pub fn realize(&self, mean: f64, scale_factor: f64) -> Realization {
        let scale = scale_factor.abs();
        match self {
            UncertaintyDistribution::Lognormal { ln_variance } => realize_lognormal(mean, *ln_variance),
            UncertaintyDistribution::Normal { variance } => {
                let std95 = 2.0 * variance.sqrt() * scale;
                let mut record = DestinationUncertainty::new(DistributionKind::Normal, mean);
                record.std95 = Some(std95);
                record.min = Some(mean - std95);
                record.max = Some(mean + std95);
                numeric(record)
            }
            UncertaintyDistribution::Triangular {
                min,
                most_likely,
                max,
            } => {
                let (low, high) = ordered(min * scale_factor, max * scale_factor);
                let mut record = DestinationUncertainty::new(DistributionKind::Triangular, mean);
                record.min = Some(low);
                record.most_likely = Some(most_likely * scale_factor);
                record.max = Some(high);
                numeric(record)
            }
            UncertaintyDistribution::Uniform { min, max } => {
                let (low, high) = ordered(min * scale_factor, max * scale_factor);
                let mut record = DestinationUncertainty::new(DistributionKind::Uniform, mean);
                record.min = Some(low);
                record.max = Some(high);
                numeric(record)
            }
            UncertaintyDistribution::Undefined { min, max, std95 } => {
                let midpoint = (min + max) * scale_factor / 2.0;
                let std95 = std95.abs() * scale;
                let mut record = DestinationUncertainty::new(DistributionKind::Undefined, mean);
                record.std95 = Some(std95);
                record.min = Some(midpoint - std95);
                record.max = Some(midpoint + std95);
                numeric(record)
            }
            UncertaintyDistribution::Unconvertible {
                distribution,
                raw_params,
            } => {
                let params = raw_params
                    .iter()
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect::<Vec<_>>()
                    .join(", ");
                Realization {
                    record: None,
                    note: Some(RealizationNote {
                        code: NoteCode::UnconvertibleDistribution,
                        message: format!("{} distribution parameters: {}", distribution, params),
                    }),
                }
            }
        }
    }

    /// Combine with `other` under `op`
    ///
    /// `self_mean` and `other_mean` are the operands' magnitudes in their
    /// original units. Log-normal ln-variances add under multiplication and
    /// division. Normal variances follow the relative-variance rule and are
    /// expressed in the frame of the left operand; under `Add` they sum.
    pub fn combine(
        &self,
        self_mean: f64,
        other: &UncertaintyDistribution,
        other_mean: f64,
        op: CombineOp,
    ) -> Combination {
        use UncertaintyDistribution::{Lognormal, Normal};

        match (self, other, op) {
            (Lognormal { ln_variance: a }, Lognormal { ln_variance: b }, CombineOp::Multiply | CombineOp::Divide) => {
                Combination::Combined(Lognormal { ln_variance: a + b })
            }
            (Lognormal { .. }, Lognormal { .. }, CombineOp::Add) => Combination::Dropped {
                reason: "a sum of log-normal values is not log-normal".to_string(),
            },
            (Normal { variance: a }, Normal { variance: b }, CombineOp::Multiply | CombineOp::Divide) => {
                if other_mean == 0.0 {
                    return Combination::Dropped {
                        reason: "relative variance of a zero operand is undefined".to_string(),
                    };
                }
                let variance = a + self_mean * self_mean * b / (other_mean * other_mean);
                Combination::Combined(Normal { variance })
            }
            (Normal { variance: a }, Normal { variance: b }, CombineOp::Add) => {
                Combination::Combined(Normal { variance: a + b })
            }
            _ => Combination::Dropped {
                reason: format!(
                    "{} and {} uncertainties cannot be combined",
                    self.kind_name(),
                    other.kind_name()
                ),
            },
        }
    }
}

fn realize_lognormal(mean: f64, ln_variance: f64) -> Realization {
    let ratio = (Z_95 * ln_variance.max(0.0).sqrt()).exp();
    let mut record = DestinationUncertainty::new(DistributionKind::LogNormal, mean);
    record.geometric_sd95 = Some(ratio);

    if mean > 0.0 {
        record.min = Some(mean / ratio);
        record.max = Some(mean * ratio);
        record.mu = Some(mean.ln());
        return numeric(record);
    }

    record.min = Some(mean * ratio);
    record.max = Some(mean / ratio);
    Realization {
        record: Some(record),
        note: Some(RealizationNote {
            code: NoteCode::LognormalNonPositiveMean,
            message: format!(
                "log-normal uncertainty on non-positive mean {}; bounds mirrored through zero",
                mean
            ),
        }),
    }
}

fn numeric(record: DestinationUncertainty) -> Realization {
    Realization {
        record: Some(record),
        note: None,
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lognormal_bounds_are_symmetric_in_ratio() {
        let dist = UncertaintyDistribution::Lognormal { ln_variance: 0.04 };
        let record = dist.realize(10.0, 3.6).record.unwrap();
        let (min, max) = (record.min.unwrap(), record.max.unwrap());
        assert!((max / 10.0 - 10.0 / min).abs() < 1e-12);
        let expected_ratio = (Z_95 * 0.2f64).exp();
        assert!((record.geometric_sd95.unwrap() - expected_ratio).abs() < 1e-12);
        assert_eq!(record.mu, Some(10.0f64.ln()));
    }

    #[test]
    fn test_lognormal_zero_mean_fallback() {
        let dist = UncertaintyDistribution::Lognormal { ln_variance: 0.04 };
        let realization = dist.realize(0.0, 1.0);
        let record = realization.record.unwrap();
        assert_eq!(record.min, Some(0.0));
        assert_eq!(record.max, Some(0.0));
        assert_eq!(record.mu, None);
        assert_eq!(realization.note.unwrap().code, NoteCode::LognormalNonPositiveMean);
    }

    #[test]
    fn test_lognormal_negative_mean_is_mirrored() {
        let dist = UncertaintyDistribution::Lognormal { ln_variance: 0.09 };
        let record = dist.realize(-5.0, 1.0).record.unwrap();
        let (min, max) = (record.min.unwrap(), record.max.unwrap());
        assert!(min < -5.0 && max > -5.0);
        assert!(!min.is_nan() && !max.is_nan());
    }

    #[test]
    fn test_normal_std95_scales() {
        let dist = UncertaintyDistribution::Normal { variance: 0.25 };
        let record = dist.realize(100.0, 1000.0).record.unwrap();
        assert_eq!(record.std95, Some(1000.0));
        assert_eq!(record.min, Some(-900.0));
        assert_eq!(record.max, Some(1100.0));
    }

    #[test]
    fn test_undefined_recentres_on_midpoint() {
        let dist = UncertaintyDistribution::Undefined {
            min: 1.0,
            max: 3.0,
            std95: 0.5,
        };
        let record = dist.realize(2.2, 10.0).record.unwrap();
        assert_eq!(record.min, Some(15.0));
        assert_eq!(record.max, Some(25.0));
        assert_eq!(record.std95, Some(5.0));
    }

    #[test]
    fn test_triangular_scales_raw_bounds() {
        let dist = UncertaintyDistribution::Triangular {
            min: 1.0,
            most_likely: 2.0,
            max: 4.0,
        };
        let record = dist.realize(2.0, 0.5).record.unwrap();
        assert_eq!(record.min, Some(0.5));
        assert_eq!(record.most_likely, Some(1.0));
        assert_eq!(record.max, Some(2.0));
        assert_eq!(record.std95, None);
    }

    #[test]
    fn test_unconvertible_is_note_only() {
        let mut raw_params = BTreeMap::new();
        raw_params.insert("shape".to_string(), 2.0);
        raw_params.insert("scale".to_string(), 0.5);
        let dist = UncertaintyDistribution::Unconvertible {
            distribution: UnconvertibleKind::Gamma,
            raw_params,
        };
        let realization = dist.realize(1.0, 1.0);
        assert!(realization.record.is_none());
        assert_eq!(
            realization.note.unwrap().message,
            "gamma distribution parameters: scale=0.5, shape=2"
        );
    }

    #[test]
    fn test_combine_rules() {
        let ln_a = UncertaintyDistribution::Lognormal { ln_variance: 0.01 };
        let ln_b = UncertaintyDistribution::Lognormal { ln_variance: 0.03 };
        assert_eq!(
            ln_a.combine(2.0, &ln_b, 5.0, CombineOp::Multiply),
            Combination::Combined(UncertaintyDistribution::Lognormal { ln_variance: 0.04 })
        );

        let n_a = UncertaintyDistribution::Normal { variance: 1.0 };
        let n_b = UncertaintyDistribution::Normal { variance: 4.0 };
        assert_eq!(
            n_a.combine(2.0, &n_b, 4.0, CombineOp::Divide),
            Combination::Combined(UncertaintyDistribution::Normal { variance: 2.0 })
        );
        assert_eq!(
            n_a.combine(2.0, &n_b, 4.0, CombineOp::Add),
            Combination::Combined(UncertaintyDistribution::Normal { variance: 5.0 })
        );

        assert!(matches!(
            ln_a.combine(2.0, &n_a, 2.0, CombineOp::Multiply),
            Combination::Dropped { .. }
        ));
        assert!(matches!(
            ln_a.combine(2.0, &ln_b, 2.0, CombineOp::Add),
            Combination::Dropped { .. }
        ));
    }
}
