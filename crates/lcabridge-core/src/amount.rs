//! Amount: a quantity in its canonical unit plus its source snapshot
//!
//! An [`Amount`] keeps the quantity as read (`original`) next to the
//! canonical-unit quantity (`current`). The scale factor is the canonical
//! magnitude of one source unit; multiplying or dividing by another amount
//! applies that amount's plain magnitude as a dimensionless correction and
//! folds it into the scale factor, so `current = original * scale_factor`
//! holds throughout.
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::session::NoteTracker;
use crate::types::UncertaintyRecord;
use crate::uncertainty::{CombineOp, Combination, Realization, Uncertainty, UncertaintyDistribution};
use crate::units::{Quantity, Unit, UnitRegistry};
use crate::variable::VariableSpec;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct Amount {
    original: Quantity,
    current: Quantity,
    scale_factor: f64,
    uncertainty: Option<Uncertainty>,
    variable: Option<VariableSpec>,
}

impl Amount {
    /// Canonicalize `quantity` and record the scale factor
    pub fn new(quantity: Quantity, registry: &UnitRegistry) -> Result<Self> {
        let canonical = registry.canonical_unit_for(quantity.dimensionality());
        let scale_factor = Quantity::new(1.0, quantity.unit().clone())
            .to(&canonical)?
            .magnitude();
        Ok(Self {
            current: Quantity::new(quantity.magnitude() * scale_factor, canonical),
            original: quantity,
            scale_factor,
            uncertainty: None,
            variable: None,
        })
    }

    /// Resolve `unit_text` and canonicalize in one step
    pub fn from_literal(literal: f64, unit_text: &str, registry: &mut UnitRegistry) -> Result<Self> {
        let quantity = Quantity::from_literal(literal, unit_text, registry)?;
        Self::new(quantity, registry)
    }

    pub fn with_uncertainty(mut self, uncertainty: Uncertainty) -> Self {
        self.uncertainty = Some(uncertainty);
        self
    }

    /// Parse and attach a source uncertainty record
    ///
    /// # Errors
    ///
    /// Any `UncertaintyShape` error from parsing, unchanged.
    pub fn with_uncertainty_record(self, record: &UncertaintyRecord) -> Result<Self> {
        let uncertainty = Uncertainty::from_record(record)?;
        Ok(self.with_uncertainty(uncertainty))
    }

    pub fn with_variable(mut self, variable: VariableSpec) -> Self {
        self.variable = Some(variable);
        self
    }

    pub fn original(&self) -> &Quantity {
        &self.original
    }

    pub fn current(&self) -> &Quantity {
        &self.current
    }

    /// Magnitude in the canonical unit
    pub fn magnitude(&self) -> f64 {
        self.current.magnitude()
    }

    pub fn original_magnitude(&self) -> f64 {
        self.original.magnitude()
    }

    /// Canonical unit
    pub fn unit(&self) -> &Unit {
        self.current.unit()
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn uncertainty(&self) -> Option<&Uncertainty> {
        self.uncertainty.as_ref()
    }

    pub fn variable(&self) -> Option<&VariableSpec> {
        self.variable.as_ref()
    }

    /// Destination bounds for the current magnitude and scale factor
    pub fn realize_uncertainty(&self) -> Option<Realization> {
        self.uncertainty
            .as_ref()
            .map(|u| u.distribution.realize(self.magnitude(), self.scale_factor))
    }

    /// Scale by the plain magnitude of `other`
    pub fn multiply(self, other: &Amount, notes: &mut NoteTracker) -> Amount {
        self.rescaled(other, other.magnitude(), CombineOp::Multiply, notes)
    }

    /// Scale by the reciprocal of the plain magnitude of `other`
    ///
    /// # Errors
    ///
    /// `InvalidValue` when `other` is zero.
    pub fn divide(self, other: &Amount, notes: &mut NoteTracker) -> Result<Amount> {
        if other.magnitude() == 0.0 {
            return Err(Error::invalid_value(other.magnitude(), "division by a zero amount"));
        }
        Ok(self.rescaled(other, 1.0 / other.magnitude(), CombineOp::Divide, notes))
    }

    fn rescaled(self, other: &Amount, factor: f64, op: CombineOp, notes: &mut NoteTracker) -> Amount {
        let uncertainty = match (self.uncertainty, other.uncertainty.as_ref()) {
            (None, None) => None,
            (Some(mine), None) => Some(mine),
            (None, Some(theirs)) => {
                drop_combination(
                    notes,
                    &format!(
                        "{} uncertainty of the other operand has no counterpart",
                        theirs.distribution.kind_name()
                    ),
                );
                None
            }
            (Some(mine), Some(theirs)) => match mine.distribution.combine(
                self.original.magnitude(),
                &theirs.distribution,
                other.original_magnitude(),
                op,
            ) {
                Combination::Combined(distribution) => Some(Uncertainty {
                    distribution,
                    pedigree: None,
                    basic_variance: None,
                    comment: mine.comment,
                }),
                Combination::Dropped { reason } => {
                    drop_combination(notes, &reason);
                    None
                }
            },
        };

        Amount {
            current: self.current.scaled(factor),
            original: self.original,
            scale_factor: self.scale_factor * factor,
            uncertainty,
            variable: self.variable,
        }
    }

    /// Sum with an amount of the same dimensionality
    ///
    /// The result is a fresh amount in the canonical unit with scale factor
    /// 1. Normal variances are brought into the canonical frame and added;
    /// any other pair of uncertainties is dropped with a note.
    ///
    /// # Errors
    ///
    /// `DimensionalityMismatch` when the two amounts measure different things.
    pub fn merged(&self, other: &Amount, notes: &mut NoteTracker) -> Result<Amount> {
        let other_current = other.current.to(self.unit())?;
        let total = Quantity::new(self.magnitude() + other_current.magnitude(), self.unit().clone());
        let ratio = other.unit().factor() / self.unit().factor();

        let uncertainty = match (&self.uncertainty, &other.uncertainty) {
            (None, None) => None,
            (Some(mine), Some(theirs)) => {
                let mine_canonical = in_canonical_frame(&mine.distribution, self.scale_factor);
                let theirs_canonical = in_canonical_frame(&theirs.distribution, other.scale_factor * ratio);
                match mine_canonical.combine(
                    self.magnitude(),
                    &theirs_canonical,
                    other_current.magnitude(),
                    CombineOp::Add,
                ) {
                    Combination::Combined(distribution) => Some(Uncertainty::new(distribution)),
                    Combination::Dropped { reason } => {
                        drop_combination(notes, &reason);
                        None
                    }
                }
            }
            (Some(only), None) | (None, Some(only)) => {
                drop_combination(
                    notes,
                    &format!(
                        "{} uncertainty of one merged amount has no counterpart",
                        only.distribution.kind_name()
                    ),
                );
                None
            }
        };

        Ok(Amount {
            original: total.clone(),
            current: total,
            scale_factor: 1.0,
            uncertainty,
            variable: None,
        })
    }
}

fn in_canonical_frame(distribution: &UncertaintyDistribution, scale_factor: f64) -> UncertaintyDistribution {
    match distribution {
        UncertaintyDistribution::Normal { variance } => UncertaintyDistribution::Normal {
            variance: variance * scale_factor * scale_factor,
        },
        other => other.clone(),
    }
}

fn drop_combination(notes: &mut NoteTracker, reason: &str) {
    info!(field = notes.current_field(), reason, "dropping uncertainty");
    notes.add_combination_unsupported(reason);
}
