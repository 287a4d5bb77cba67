//! Reverse direction: destination-shaped records back to distributions
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use super::distribution::{UncertaintyDistribution, Z_95};
use super::pedigree::PedigreeMatrix;
use super::Uncertainty;
use crate::error::{Error, Result};
use crate::types::{DestinationUncertainty, DistributionKind};
use tracing::debug;

/// Rebuild a distribution from a destination record and its comment
///
/// A structured pedigree comment restores the scores and both variances;
/// its total variance wins over the one derived from the geometric standard
/// deviation. A comment without the template yields an uncertainty without
/// pedigree.
///
/// # Errors
///
/// `UncertaintyShape` when a parameter the distribution needs is absent.
pub fn recover_uncertainty(
    destination: &DestinationUncertainty,
    comment: Option<&str>,
) -> Result<Uncertainty> {
    let pedigree = comment.and_then(PedigreeMatrix::parse_comment);

    let distribution = match destination.distribution {
        DistributionKind::LogNormal => {
            let derived = match destination.geometric_sd95 {
                Some(gsd) if gsd >= 1.0 => Some((gsd.ln() / Z_95).powi(2)),
                Some(gsd) => {
                    return Err(Error::uncertainty_shape(
                        "lognormal",
                        format!("geometric standard deviation {} is below 1", gsd),
                    ))
                }
                None => None,
            };
            let ln_variance = pedigree
                .as_ref()
                .and_then(|p| p.total_variance)
                .or(derived)
                .ok_or_else(|| {
                    Error::uncertainty_shape("lognormal", "missing geometric standard deviation")
                })?;
            UncertaintyDistribution::Lognormal { ln_variance }
        }
        DistributionKind::Normal => {
            let std95 = require(destination.std95, "normal", "std95")?;
            UncertaintyDistribution::Normal {
                variance: (std95 / 2.0).powi(2),
            }
        }
        DistributionKind::Triangular => UncertaintyDistribution::Triangular {
            min: require(destination.min, "triangular", "min")?,
            most_likely: require(destination.most_likely, "triangular", "mostLikely")?,
            max: require(destination.max, "triangular", "max")?,
        },
        DistributionKind::Uniform => UncertaintyDistribution::Uniform {
            min: require(destination.min, "uniform", "min")?,
            max: require(destination.max, "uniform", "max")?,
        },
        DistributionKind::Undefined => UncertaintyDistribution::Undefined {
            min: require(destination.min, "undefined", "min")?,
            max: require(destination.max, "undefined", "max")?,
            std95: require(destination.std95, "undefined", "std95")?,
        },
    };

    debug!(
        distribution = distribution.kind_name(),
        pedigree = pedigree.is_some(),
        "recovered uncertainty"
    );

    Ok(Uncertainty {
        distribution,
        pedigree: pedigree.as_ref().map(|p| p.matrix),
        basic_variance: pedigree.as_ref().and_then(|p| p.basic_variance),
        comment: comment.map(str::to_string),
    })
}

fn require(value: Option<f64>, distribution: &str, name: &str) -> Result<f64> {
    value.ok_or_else(|| {
        Error::uncertainty_shape(distribution, format!("missing required parameter '{}'", name))
    })
}
