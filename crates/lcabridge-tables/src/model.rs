//! Serde models for the conversion tables
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unit definitions, prefixes and the text-repair tables used by unit normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitTable {
    /// Version tag of this data set
    pub version: String,

    /// Base unit symbol per base dimension (e.g. `mass -> kg`)
    pub base_units: BTreeMap<String, String>,

    /// Multiplicative prefixes (`k`, `M`, `kilo`, ...)
    #[serde(default)]
    pub prefixes: Vec<PrefixEntry>,

    /// Directly named units
    pub units: Vec<UnitEntry>,

    /// Spelling fixes applied to a single factor of a unit expression
    #[serde(default)]
    pub corrections: BTreeMap<String, String>,

    /// Deprecated names substituted for the whole unit text
    #[serde(default)]
    pub deprecated_aliases: BTreeMap<String, String>,

    /// Units defined on first use (`"4.184 * kJ"`, `"[guest_night]"`)
    #[serde(default)]
    pub definitions: BTreeMap<String, String>,

    /// Tokens that must never get exponent-shorthand expansion
    #[serde(default)]
    pub chemical_formulas: Vec<String>,
}

/// A unit prefix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixEntry {
    pub symbol: String,
    pub factor: f64,
}

/// A directly named unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitEntry {
    /// Primary symbol
    pub name: String,

    /// Factor relative to the base units of its dimensions
    pub factor: f64,

    /// Exponent per base dimension; empty for dimensionless units
    #[serde(default)]
    pub dimensions: BTreeMap<String, i32>,

    /// Whether prefixes may be applied (`km`, `MJ`)
    #[serde(default)]
    pub prefixable: bool,

    /// Alternative spellings resolving to the same unit
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Destination reference unit per dimensionality
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalTable {
    pub version: String,
    pub units: Vec<CanonicalEntry>,
}

/// One canonical unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEntry {
    /// Name written to the destination document
    pub unit: String,

    /// Unit expression the name stands for; its dimensionality is the lookup key
    pub expression: String,
}

/// Pedigree score to ln-variance contribution table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PedigreeTable {
    pub version: String,
    pub indicators: PedigreeIndicators,
}

/// Contribution per score 1..=5, indexed by `score - 1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PedigreeIndicators {
    pub reliability: [f64; 5],
    pub completeness: [f64; 5],
    pub temporal_correlation: [f64; 5],
    pub geographical_correlation: [f64; 5],
    pub further_technological_correlation: [f64; 5],
}

impl PedigreeIndicators {
    /// The five indicator rows in score order
    pub fn rows(&self) -> [(&'static str, &[f64; 5]); 5] {
        [
            ("reliability", &self.reliability),
            ("completeness", &self.completeness),
            ("temporal_correlation", &self.temporal_correlation),
            ("geographical_correlation", &self.geographical_correlation),
            (
                "further_technological_correlation",
                &self.further_technological_correlation,
            ),
        ]
    }
}
