//! Input and output records exchanged with the routing layer
//!
//! The routing layer reads one numeric field of the source document into a
//! [`FieldInput`], hands it to [`crate::convert_field`] and writes the
//! resulting [`FieldOutput`] through the destination schema sink.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use crate::error::{NoteCode, Severity, StrictMode};
pub use crate::variable::VariableParameter;

/// One numeric field of a source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInput {
    /// Identifier of the field, used in errors and notes
    pub field: String,

    /// Numeric value as read from the source
    pub literal: f64,

    /// Unit text as read from the source
    pub unit_text: String,

    /// Uncertainty attached to the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<UncertaintyRecord>,

    /// Variable name under which the value can be referenced by formulas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,

    /// Formula computing the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    /// Free-text comments carried onto the variable record
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,

    /// Entity (exchange or parameter) this value belongs to, for `Ref` markers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    /// Production volume recorded alongside the entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_volume: Option<ProductionVolumeInput>,
}

impl FieldInput {
    /// A plain value without uncertainty, formula or entity
    pub fn new(field: impl Into<String>, literal: f64, unit_text: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            literal,
            unit_text: unit_text.into(),
            uncertainty: None,
            variable_name: None,
            formula: None,
            comments: Vec::new(),
            entity_id: None,
            production_volume: None,
        }
    }

    pub fn with_uncertainty(mut self, record: UncertaintyRecord) -> Self {
        self.uncertainty = Some(record);
        self
    }

    pub fn with_variable(mut self, name: Option<&str>, formula: Option<&str>) -> Self {
        self.variable_name = name.map(str::to_string);
        self.formula = formula.map(str::to_string);
        self
    }

    pub fn with_entity(mut self, entity_id: &str) -> Self {
        self.entity_id = Some(entity_id.to_string());
        self
    }

    pub fn with_production_volume(mut self, literal: f64, unit_text: &str) -> Self {
        self.production_volume = Some(ProductionVolumeInput {
            literal,
            unit_text: unit_text.to_string(),
        });
        self
    }
}

/// Production volume of an exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionVolumeInput {
    pub literal: f64,
    pub unit_text: String,
}

/// Source-side uncertainty record, tagged by distribution kind
///
/// Parameter names follow the source schema: `variance`,
/// `varianceWithPedigreeUncertainty`, `minValue`, `mostLikelyValue`,
/// `maxValue`, `standardDeviation95`, and free parameters for the
/// distributions that have no destination counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UncertaintyRecord {
    pub kind: String,

    #[serde(default)]
    pub params: BTreeMap<String, f64>,

    /// Reliability, completeness, temporal, geographical, technological
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pedigree: Option<[u8; 5]>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl UncertaintyRecord {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: BTreeMap::new(),
            pedigree: None,
            comment: None,
        }
    }

    pub fn param(mut self, name: &str, value: f64) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    pub fn with_pedigree(mut self, scores: [u8; 5]) -> Self {
        self.pedigree = Some(scores);
        self
    }
}

/// Distribution tags of the destination schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistributionKind {
    LogNormal,
    Normal,
    Triangular,
    Uniform,
    Undefined,
}

/// Destination-shaped uncertainty record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationUncertainty {
    pub distribution: DistributionKind,
    pub mean: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_likely: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std95: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometric_sd95: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mu: Option<f64>,
}

impl DestinationUncertainty {
    pub(crate) fn new(distribution: DistributionKind, mean: f64) -> Self {
        Self {
            distribution,
            mean,
            min: None,
            max: None,
            most_likely: None,
            std95: None,
            geometric_sd95: None,
            mu: None,
        }
    }
}

/// Converted field, ready for the destination schema sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOutput {
    pub field: String,

    /// Magnitude in the canonical unit
    pub amount: f64,

    /// Canonical unit name
    pub unit: String,

    /// Name-based identifier of the canonical unit
    pub unit_id: String,

    /// Canonical magnitude of one source unit
    pub scale_factor: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<DestinationUncertainty>,

    /// Pedigree comment or preserved distribution parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty_comment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<VariableParameter>,

    /// Variables introduced while rewriting the formula
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<VariableParameter>,
}
