//! A resolved unit: display name, factor to the coherent base and dimensionality

use super::dimension::Dimensionality;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A unit resolved against the registry
///
/// `factor` is the magnitude of one of this unit expressed in the coherent
/// base units of its dimensionality (`g` has factor `0.001`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    name: String,
    factor: f64,
    dimensionality: Dimensionality,
}

impl Unit {
    pub fn new(name: impl Into<String>, factor: f64, dimensionality: Dimensionality) -> Self {
        Self {
            name: name.into(),
            factor,
            dimensionality,
        }
    }

    /// The dimensionless unit with factor 1, named `1`
    pub fn one() -> Self {
        Self::new("1", 1.0, Dimensionality::dimensionless())
    }

    /// A bare number appearing as a factor of a unit expression
    pub fn scalar(value: f64) -> Self {
        Self::new(value.to_string(), value, Dimensionality::dimensionless())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn dimensionality(&self) -> &Dimensionality {
        &self.dimensionality
    }

    /// True when magnitudes can be converted between the two units
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimensionality == other.dimensionality
    }

    /// The same unit under another display name
    pub fn renamed(&self, name: &str) -> Self {
        Self::new(name, self.factor, self.dimensionality.clone())
    }

    pub fn mul(&self, other: &Unit) -> Self {
        let name = if self.name == "1" {
            other.name.clone()
        } else {
            format!("{}*{}", self.name, other.name)
        };
        Self::new(
            name,
            self.factor * other.factor,
            self.dimensionality.mul(&other.dimensionality),
        )
    }

    pub fn div(&self, other: &Unit) -> Self {
        Self::new(
            format!("{}/{}", self.name, invert_operators(&other.name)),
            self.factor / other.factor,
            self.dimensionality.div(&other.dimensionality),
        )
    }

    pub fn powi(&self, power: i32) -> Self {
        if power == 1 {
            return self.clone();
        }
        Self::new(
            format!("{}**{}", self.name, power),
            self.factor.powi(power),
            self.dimensionality.powi(power),
        )
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Swap top-level `*` and `/` so a compound divisor can be appended after `/`
fn invert_operators(expression: &str) -> String {
    let chars: Vec<char> = expression.chars().collect();
    let mut out = String::with_capacity(expression.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                out.push_str("**");
                i += 1;
            }
            '*' => out.push('/'),
            '/' => out.push('*'),
            c => out.push(c),
        }
        i += 1;
    }
    out
}
