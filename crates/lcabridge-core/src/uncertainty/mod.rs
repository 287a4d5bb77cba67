//! Statistical uncertainty re-parameterization
//!
//! A source record is parsed once into an [`Uncertainty`]. Its
//! [`UncertaintyDistribution`] is realized into destination bounds once the
//! owning amount's scale factor is known, and can be combined with another
//! amount's distribution when the two are multiplied, divided or merged.
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

pub mod distribution;
pub mod pedigree;
pub mod record;
pub mod recover;

pub use distribution::{
    CombineOp, Combination, Realization, RealizationNote, UnconvertibleKind,
    UncertaintyDistribution, Z_95,
};
pub use pedigree::{PedigreeCheck, PedigreeComment, PedigreeMatrix};
pub use recover::recover_uncertainty;

use lcabridge_tables::PedigreeTable;
use serde::{Deserialize, Serialize};

/// A distribution plus the data-quality information that came with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Uncertainty {
    pub distribution: UncertaintyDistribution,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pedigree: Option<PedigreeMatrix>,

    /// Variance before pedigree contributions were added
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_variance: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Uncertainty {
    pub fn new(distribution: UncertaintyDistribution) -> Self {
        Self {
            distribution,
            pedigree: None,
            basic_variance: None,
            comment: None,
        }
    }

    /// Total variance as carried by the distribution, if it has one
    pub fn total_variance(&self) -> Option<f64> {
        match self.distribution {
            UncertaintyDistribution::Lognormal { ln_variance } => Some(ln_variance),
            UncertaintyDistribution::Normal { variance } => Some(variance),
            _ => None,
        }
    }

    /// Compare pedigree contributions with the total variance
    ///
    /// Returns `None` when there is no pedigree or no variance to check. A
    /// missing basic variance counts as zero.
    pub fn check_pedigree(&self, table: &PedigreeTable, tolerance: f64) -> Option<PedigreeCheck> {
        let matrix = self.pedigree?;
        let total = self.total_variance()?;
        Some(matrix.check(table, self.basic_variance.unwrap_or(0.0), total, tolerance))
    }

    /// Structured comment for the destination record, if pedigree is known
    pub fn pedigree_comment(&self) -> Option<String> {
        self.pedigree
            .map(|matrix| matrix.to_comment(self.basic_variance, self.total_variance()))
    }
}
