//! Named variables and their destination records

use crate::amount::Amount;
use serde::{Deserialize, Serialize};

/// Name, formula and comments attached to an amount by the source field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: Option<String>,
    pub formula: Option<String>,
    pub comments: Vec<String>,
}

/// A variable registered in a conversion session
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub formula: Option<String>,
    pub amount: Amount,
    pub comments: Vec<String>,
}

/// Destination-shaped variable record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableParameter {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    pub mean_value: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
}

impl Variable {
    /// Destination record, with bounds from the amount's uncertainty
    pub fn to_parameter(&self) -> VariableParameter {
        let bounds = self
            .amount
            .realize_uncertainty()
            .and_then(|realization| realization.record);
        VariableParameter {
            name: self.name.clone(),
            formula: self.formula.clone(),
            mean_value: self.amount.magnitude(),
            min: bounds.as_ref().and_then(|b| b.min),
            max: bounds.as_ref().and_then(|b| b.max),
            comments: self.comments.clone(),
        }
    }
}
