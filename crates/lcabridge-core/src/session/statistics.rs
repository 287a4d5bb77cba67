//! Per-document conversion counters

use serde::{Deserialize, Serialize};

/// Counters accumulated over one document conversion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStatistics {
    pub amounts_converted: usize,
    pub uncertainties_realized: usize,
    pub uncertainties_dropped: usize,
    pub formulas_rewritten: usize,
    pub formulas_dropped: usize,
    pub unit_conversions_emitted: usize,
    pub cross_references_resolved: usize,
    pub pedigree_mismatches: usize,
}

impl ConversionStatistics {
    /// Number of fields that lost uncertainty or formula
    pub fn lossy_fields(&self) -> usize {
        self.uncertainties_dropped + self.formulas_dropped
    }
}
