//! Quantity: a magnitude bound to a resolved unit
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use super::dimension::Dimensionality;
use super::registry::UnitRegistry;
use super::unit::Unit;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Div, Mul};

/// Magnitude, unit and (through the unit) dimensionality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    magnitude: f64,
    unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: f64, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    /// Normalize and resolve `unit_text`, then bind `magnitude` to it
    ///
    /// # Errors
    ///
    /// `InvalidValue` for a non-finite magnitude, `UnitResolution` when the
    /// text names no known or definable unit.
    pub fn from_literal(magnitude: f64, unit_text: &str, registry: &mut UnitRegistry) -> Result<Self> {
        if !magnitude.is_finite() {
            return Err(Error::invalid_value(magnitude, "magnitude must be finite"));
        }
        let unit = registry.resolve(unit_text)?;
        Ok(Self::new(magnitude, unit))
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn dimensionality(&self) -> &Dimensionality {
        self.unit.dimensionality()
    }

    /// Express this quantity in `target`
    ///
    /// # Errors
    ///
    /// `DimensionalityMismatch` when the two units measure different things.
    pub fn to(&self, target: &Unit) -> Result<Quantity> {
        if !self.unit.is_compatible(target) {
            return Err(Error::DimensionalityMismatch {
                from_unit: self.unit.name().to_string(),
                to_unit: target.name().to_string(),
                from_dimensionality: self.dimensionality().signature(),
                to_dimensionality: target.dimensionality().signature(),
                field: None,
            });
        }
        let magnitude = self.magnitude * self.unit.factor() / target.factor();
        Ok(Self::new(magnitude, target.clone()))
    }

    /// Same unit, magnitude multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Quantity {
        Self::new(self.magnitude * factor, self.unit.clone())
    }
}

impl Mul for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        Quantity::new(self.magnitude * rhs.magnitude, self.unit.mul(&rhs.unit))
    }
}

impl Div for Quantity {
    type Output = Quantity;

    fn div(self, rhs: Quantity) -> Quantity {
        Quantity::new(self.magnitude / rhs.magnitude, self.unit.div(&rhs.unit))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}
