//! Parsing source uncertainty records into distributions

use super::distribution::{UnconvertibleKind, UncertaintyDistribution};
use super::pedigree::PedigreeMatrix;
use super::Uncertainty;
use crate::error::{Error, Result};
use crate::types::UncertaintyRecord;

const VARIANCE: &[&str] = &["variance"];
const TOTAL_VARIANCE: &[&str] = &["varianceWithPedigreeUncertainty"];
const MIN: &[&str] = &["minValue", "min"];
const MOST_LIKELY: &[&str] = &["mostLikelyValue", "mostLikely", "mode"];
const MAX: &[&str] = &["maxValue", "max"];
const STD95: &[&str] = &["standardDeviation95", "std95"];

impl Uncertainty {
    /// Parse a tagged source record
    ///
    /// # Errors
    ///
    /// `UncertaintyShape` for an unknown kind, a missing or non-finite
    /// required parameter, a negative variance or an out-of-range pedigree
    /// score. The error carries the record as its raw value.
    pub fn from_record(record: &UncertaintyRecord) -> Result<Self> {
        parse(record).map_err(|err| match err {
            Error::UncertaintyShape {
                distribution,
                message,
                field,
                ..
            } => Error::UncertaintyShape {
                distribution,
                message,
                raw: serde_json::to_value(record).ok(),
                field,
            },
            other => other,
        })
    }
}

fn parse(record: &UncertaintyRecord) -> Result<Uncertainty> {
    let kind = record.kind.to_ascii_lowercase().replace(['-', '_', ' '], "");
    let pedigree = record.pedigree.map(PedigreeMatrix::new).transpose()?;

    let mut basic_variance = None;
    let distribution = match kind.as_str() {
        "lognormal" => {
            basic_variance = optional(record, VARIANCE, "lognormal")?;
            let total = optional(record, TOTAL_VARIANCE, "lognormal")?;
            let ln_variance = total.or(basic_variance).ok_or_else(|| {
                Error::uncertainty_shape("lognormal", "requires 'variance' or 'varianceWithPedigreeUncertainty'")
            })?;
            non_negative("lognormal", ln_variance)?;
            UncertaintyDistribution::Lognormal { ln_variance }
        }
        "normal" => {
            basic_variance = optional(record, VARIANCE, "normal")?;
            let total = optional(record, TOTAL_VARIANCE, "normal")?;
            let variance = match total.or(basic_variance) {
                Some(variance) => variance,
                None => {
                    let std95 = required(record, STD95, "normal")?;
                    (std95 / 2.0).powi(2)
                }
            };
            non_negative("normal", variance)?;
            UncertaintyDistribution::Normal { variance }
        }
        "triangular" => UncertaintyDistribution::Triangular {
            min: required(record, MIN, "triangular")?,
            most_likely: required(record, MOST_LIKELY, "triangular")?,
            max: required(record, MAX, "triangular")?,
        },
        "uniform" => UncertaintyDistribution::Uniform {
            min: required(record, MIN, "uniform")?,
            max: required(record, MAX, "uniform")?,
        },
        "undefined" => UncertaintyDistribution::Undefined {
            min: required(record, MIN, "undefined")?,
            max: required(record, MAX, "undefined")?,
            std95: required(record, STD95, "undefined")?,
        },
        "beta" => unconvertible(record, UnconvertibleKind::Beta),
        "gamma" => unconvertible(record, UnconvertibleKind::Gamma),
        "binomial" => unconvertible(record, UnconvertibleKind::Binomial),
        _ => {
            return Err(Error::uncertainty_shape(
                &record.kind,
                "unknown distribution kind",
            ))
        }
    };

    Ok(Uncertainty {
        distribution,
        pedigree,
        basic_variance,
        comment: record.comment.clone(),
    })
}

fn optional(record: &UncertaintyRecord, names: &[&str], distribution: &str) -> Result<Option<f64>> {
    match names.iter().find_map(|name| record.params.get(*name).map(|v| (*name, *v))) {
        Some((name, value)) if !value.is_finite() => Err(Error::uncertainty_shape(
            distribution,
            format!("parameter '{}' is not finite", name),
        )),
        Some((_, value)) => Ok(Some(value)),
        None => Ok(None),
    }
}

fn required(record: &UncertaintyRecord, names: &[&str], distribution: &str) -> Result<f64> {
    optional(record, names, distribution)?.ok_or_else(|| {
        Error::uncertainty_shape(
            distribution,
            format!("missing required parameter '{}'", names[0]),
        )
    })
}

fn non_negative(distribution: &str, variance: f64) -> Result<()> {
    if variance < 0.0 {
        return Err(Error::uncertainty_shape(
            distribution,
            format!("variance {} is negative", variance),
        ));
    }
    Ok(())
}

fn unconvertible(record: &UncertaintyRecord, distribution: UnconvertibleKind) -> UncertaintyDistribution {
    UncertaintyDistribution::Unconvertible {
        distribution,
        raw_params: record.params.clone(),
    }
}
