//! Marker rewriting: unit conversions first, then cross-references
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use super::normalize::normalize_formula;
use super::scanner::{unquote, MarkerCall, MarkerScanner};
use crate::amount::Amount;
use crate::config::EngineConfig;
use crate::error::{Error, NoteCode, Result};
use crate::session::ConversionSession;
use crate::units::{Quantity, Unit};
use crate::variable::{VariableParameter, VariableSpec};
use serde_json::Value;
use tracing::debug;

/// Qualifier selecting an entity's production volume in a reference call
pub const PRODUCTION_VOLUME: &str = "ProductionVolume";

/// A rewritten formula and the variables it introduced
#[derive(Debug, Clone, PartialEq)]
pub struct RewrittenFormula {
    pub text: String,
    pub bindings: Vec<VariableParameter>,
}

/// Rewrites marker calls embedded in formula text
#[derive(Debug, Clone)]
pub struct FormulaRewriter {
    unit_conversion: MarkerScanner,
    reference: MarkerScanner,
    variable_prefix: String,
}

impl FormulaRewriter {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            unit_conversion: MarkerScanner::new(config.unit_conversion_marker.clone()),
            reference: MarkerScanner::new(config.reference_marker.clone()),
            variable_prefix: config.unit_conversion_variable_prefix.clone(),
        }
    }

    /// Normalize `formula` and rewrite every marker call in it
    ///
    /// # Errors
    ///
    /// `FormulaSyntaxAmbiguity` for unbalanced calls or wrong arity,
    /// `CrossReferenceNotFound` for an unknown entity, and unit errors from
    /// the arguments of a unit conversion call. All of them concern this
    /// formula only.
    pub fn rewrite(&self, formula: &str, session: &mut ConversionSession) -> Result<RewrittenFormula> {
        self.rewrite_in_frame(formula, session, None)
    }

    /// Rewrite a formula that belongs to the field holding `frame`
    ///
    /// Cross-references are substituted in the unit the field was written
    /// in, so the rewritten text can be rescaled together with its own
    /// literals.
    pub fn rewrite_in_frame(
        &self,
        formula: &str,
        session: &mut ConversionSession,
        frame: Option<&Amount>,
    ) -> Result<RewrittenFormula> {
        let normalized = normalize_formula(formula);
        let mut bindings = Vec::new();
        let text = self.rewrite_unit_conversions(&normalized, session, &mut bindings)?;
        let text = self.rewrite_references(&text, formula, session, frame)?;
        debug!(formula, rewritten = %text, bindings = bindings.len(), "rewrote formula");
        Ok(RewrittenFormula { text, bindings })
    }

    fn rewrite_unit_conversions(
        &self,
        text: &str,
        session: &mut ConversionSession,
        bindings: &mut Vec<VariableParameter>,
    ) -> Result<String> {
        let calls = self.unit_conversion.find_calls(text)?;
        let mut replacements = Vec::with_capacity(calls.len());
        for call in &calls {
            let [literal, from, to] = call.args.as_slice() else {
                return Err(arity_error(text, call, self.unit_conversion.marker(), "3"));
            };
            let literal = self.rewrite_unit_conversions(literal, session, bindings)?;
            let name = self.conversion_variable(unquote(from), unquote(to), session, bindings)?;
            replacements.push(format!("({} * {})", literal, name));
        }
        Ok(splice(text, &calls, replacements))
    }

    fn conversion_variable(
        &self,
        from: &str,
        to: &str,
        session: &mut ConversionSession,
        bindings: &mut Vec<VariableParameter>,
    ) -> Result<String> {
        let from_unit = session.resolve_unit(from)?;
        let to_unit = session.resolve_unit(to)?;
        let ratio = Quantity::new(1.0, from_unit).to(&to_unit)?.magnitude();

        let base = format!("{}_{}_{}", self.variable_prefix, sanitize(from), sanitize(to));
        let mut name = base.clone();
        let mut suffix = 1;
        while let Some(existing) = session.variable(&name) {
            if same_ratio(existing.amount.magnitude(), ratio) {
                return Ok(name);
            }
            suffix += 1;
            name = format!("{}_{}", base, suffix);
        }

        let comment = format!(
            "Unit conversion factor from '{}' to '{}' (1 {} = {} {})",
            from, to, from, ratio, to
        );

        let ratio_unit = Unit::one();
        let amount = Amount::new(Quantity::new(ratio, ratio_unit), session.units())?;
        let (variable, _) = session.declare_variable(
            VariableSpec {
                name: Some(name.clone()),
                formula: None,
                comments: vec![comment.clone()],
            },
            amount,
        );
        bindings.push(variable.to_parameter());
        session
            .notes_mut()
            .add(NoteCode::UnitConversionInserted, comment, None);
        session.statistics_mut().unit_conversions_emitted += 1;
        Ok(name)
    }

    fn rewrite_references(
        &self,
        text: &str,
        formula: &str,
        session: &mut ConversionSession,
        frame: Option<&Amount>,
    ) -> Result<String> {
        let calls = self.reference.find_calls(text)?;
        let mut replacements = Vec::with_capacity(calls.len());
        for call in &calls {
            let (entity_id, production_volume) = match call.args.as_slice() {
                [entity] => (unquote(entity), false),
                [entity, qualifier] if unquote(qualifier).eq_ignore_ascii_case(PRODUCTION_VOLUME) => {
                    (unquote(entity), true)
                }
                [_, qualifier] => {
                    return Err(Error::formula_syntax(
                        text,
                        call.start,
                        format!("unknown {} qualifier {}", self.reference.marker(), qualifier),
                    ))
                }
                _ => return Err(arity_error(text, call, self.reference.marker(), "1 or 2")),
            };

            let amount = session.reference(entity_id).and_then(|entry| {
                if production_volume {
                    entry.production_volume.as_ref()
                } else {
                    Some(&entry.amount)
                }
            });
            let value = amount
                .map(|amount| value_in_frame(amount, frame))
                .ok_or_else(|| Error::CrossReferenceNotFound {
                    entity_id: entity_id.to_string(),
                    formula: formula.to_string(),
                    field: None,
                })?;

            let literal = value.to_string();
            session.notes_mut().add(
                NoteCode::CrossReferenceResolved,
                format!("reference to '{}' replaced by {}", entity_id, literal),
                Some(Value::String(text[call.start..call.end].to_string())),
            );
            session.statistics_mut().cross_references_resolved += 1;
            replacements.push(literal);
        }
        Ok(splice(text, &calls, replacements))
    }
}

fn arity_error(text: &str, call: &MarkerCall, marker: &str, expected: &str) -> Error {
    Error::formula_syntax(
        text,
        call.start,
        format!(
            "{} expects {} arguments, got {}",
            marker,
            expected,
            call.args.len()
        ),
    )
}

fn splice(text: &str, calls: &[MarkerCall], replacements: Vec<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (call, replacement) in calls.iter().zip(replacements) {
        out.push_str(&text[last..call.start]);
        out.push_str(&replacement);
        last = call.end;
    }
    out.push_str(&text[last..]);
    out
}

/// Magnitude of a referenced amount in the unit the referencing field was
/// written in; canonical when there is no field
fn value_in_frame(referenced: &Amount, frame: Option<&Amount>) -> f64 {
    let Some(frame) = frame else {
        return referenced.magnitude();
    };
    match referenced.original().to(frame.original().unit()) {
        Ok(quantity) => quantity.magnitude(),
        Err(_) => referenced.magnitude() / frame.scale_factor(),
    }
}

fn same_ratio(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs())
}

/// Unit text to a formula-safe name fragment
///
/// Operators keep a marker so `kg*m` and `kg/m` stay distinct.
fn sanitize(unit: &str) -> String {
    let unit = unit.trim().replace("**", "^");
    let mut out = String::with_capacity(unit.len());
    for c in unit.chars() {
        match c {
            '*' => out.push_str("_x_"),
            '/' => out.push_str("_per_"),
            '^' => out.push_str("_pow_"),
            c if c.is_ascii_alphanumeric() => out.push(c),
            _ => out.push('_'),
        }
    }
    out
}
