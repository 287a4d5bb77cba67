//! Conversion of one routing-layer field
//!
//! Error scopes: unit and value errors abort the field (and so the
//! document), malformed uncertainty follows the configured strict mode, and
//! any failure while rewriting the formula drops only the formula.
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use crate::amount::Amount;
use crate::error::{Error, Result, StrictMode};
use crate::formula::rescale_formula;
use crate::identifier::name_hash;
use crate::session::ConversionSession;
use crate::types::{FieldInput, FieldOutput};
use crate::uncertainty::{PedigreeCheck, Uncertainty};
use crate::variable::{VariableParameter, VariableSpec};
use tracing::{debug, warn};

/// Convert one numeric field
///
/// # Errors
///
/// Any error that escapes carries `input.field`. `UnitResolution`,
/// `DimensionalityMismatch` and `InvalidValue` always escape;
/// `UncertaintyShape` escapes only in strict mode.
pub fn convert_field(session: &mut ConversionSession, input: &FieldInput) -> Result<FieldOutput> {
    session.notes_mut().enter_field(&input.field);
    let result = convert(session, input);
    session.notes_mut().leave_field();
    result.map_err(|err| err.with_field(&input.field))
}

fn convert(session: &mut ConversionSession, input: &FieldInput) -> Result<FieldOutput> {
    let mut amount = session.amount(input.literal, &input.unit_text)?;
    let production_volume = input
        .production_volume
        .as_ref()
        .map(|pv| session.amount(pv.literal, &pv.unit_text))
        .transpose()?;

    if let Some(uncertainty) = parse_uncertainty(session, input)? {
        check_pedigree(session, &uncertainty);
        amount = amount.with_uncertainty(uncertainty);
    }

    let (uncertainty, uncertainty_comment) = realize(session, &amount);

    let (formula, bindings) = match &input.formula {
        Some(formula) => match session.rewrite_field_formula(formula, &amount) {
            Ok(rewritten) => {
                session.statistics_mut().formulas_rewritten += 1;
                (
                    Some(rescale_formula(&rewritten.text, amount.scale_factor())),
                    rewritten.bindings,
                )
            }
            Err(err) => {
                warn!(field = %input.field, formula = %formula, error = %err, "dropping formula");
                session
                    .notes_mut()
                    .add_formula_dropped(formula, &err.to_string());
                session.statistics_mut().formulas_dropped += 1;
                (None, Vec::new())
            }
        },
        None => (None, Vec::new()),
    };

    let variable = declare_variable(session, input, formula, &amount);

    if let Some(entity_id) = &input.entity_id {
        session.record_reference(entity_id, amount.clone(), production_volume);
    }

    session.statistics_mut().amounts_converted += 1;
    debug!(
        field = %input.field,
        amount = amount.magnitude(),
        unit = amount.unit().name(),
        scale_factor = amount.scale_factor(),
        "converted field"
    );

    Ok(FieldOutput {
        field: input.field.clone(),
        amount: amount.magnitude(),
        unit: amount.unit().name().to_string(),
        unit_id: name_hash(amount.unit().name()).to_string(),
        scale_factor: amount.scale_factor(),
        uncertainty,
        uncertainty_comment,
        variable,
        bindings,
    })
}

fn parse_uncertainty(session: &mut ConversionSession, input: &FieldInput) -> Result<Option<Uncertainty>> {
    let Some(record) = &input.uncertainty else {
        return Ok(None);
    };
    match Uncertainty::from_record(record) {
        Ok(uncertainty) => Ok(Some(uncertainty)),
        Err(err @ Error::UncertaintyShape { .. }) if session.config().strict_mode == StrictMode::Warn => {
            warn!(field = %input.field, error = %err, "dropping malformed uncertainty");
            session
                .notes_mut()
                .add_uncertainty_dropped(&err.to_string(), serde_json::to_value(record).ok());
            session.statistics_mut().uncertainties_dropped += 1;
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn check_pedigree(session: &mut ConversionSession, uncertainty: &Uncertainty) {
    let tolerance = session.config().pedigree_tolerance;
    let check = uncertainty.check_pedigree(&session.tables().pedigree, tolerance);
    if let Some(PedigreeCheck::Mismatch { expected, supplied }) = check {
        warn!(
            field = session.notes().current_field(),
            expected, supplied, "pedigree matrix disagrees with supplied variance"
        );
        session.notes_mut().add_pedigree_mismatch(expected, supplied);
        session.statistics_mut().pedigree_mismatches += 1;
    }
}

fn realize(
    session: &mut ConversionSession,
    amount: &Amount,
) -> (Option<crate::types::DestinationUncertainty>, Option<String>) {
    let Some(realization) = amount.realize_uncertainty() else {
        return (None, None);
    };
    let mut comment = amount.uncertainty().and_then(Uncertainty::pedigree_comment);
    if let Some(note) = realization.note {
        session.notes_mut().add(note.code, note.message.clone(), None);
        if realization.record.is_none() {
            comment = Some(note.message);
        }
    }
    if realization.record.is_some() {
        session.statistics_mut().uncertainties_realized += 1;
    }
    (realization.record, comment)
}

fn declare_variable(
    session: &mut ConversionSession,
    input: &FieldInput,
    formula: Option<String>,
    amount: &Amount,
) -> Option<VariableParameter> {
    if input.variable_name.is_none() && formula.is_none() {
        return None;
    }
    let spec = VariableSpec {
        name: input.variable_name.clone(),
        formula,
        comments: input.comments.clone(),
    };
    let (variable, is_new) = session.declare_variable(spec, amount.clone());
    if !is_new {
        session.notes_mut().add(
            crate::error::NoteCode::VariableDeduplicated,
            format!("variable '{}' is already declared; keeping the first declaration", variable.name),
            None,
        );
        return None;
    }
    Some(variable.to_parameter())
}
