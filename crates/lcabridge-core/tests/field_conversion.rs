//! End-to-end tests for converting single fields
//!
//! These tests exercise unit canonicalization, uncertainty realization,
//! pedigree checks, formula rewriting and variable declaration through the
//! public `convert_field` entry point.


use lcabridge_core::{
    convert_field, name_hash, recover_uncertainty, DistributionKind, Error, FieldInput, NoteCode,
    Severity, StrictMode, UncertaintyDistribution, UncertaintyRecord,
};
use lcabridge_core::uncertainty::Z_95;
use test_support::{assert_close, assert_converts, lognormal, normal, session, session_with_mode};

#[test]
fn test_energy_is_canonicalized_to_megajoule() {
    let mut session = session();
    let output = assert_converts(&mut session, &FieldInput::new("exchange/1/amount", 2.5, "kWh"));

    assert_eq!(output.field, "exchange/1/amount");
    assert_eq!(output.unit, "MJ");
    assert_close(output.amount, 9.0);
    assert_close(output.scale_factor, 3.6);
    assert_eq!(output.unit_id, name_hash("MJ").to_string());
    assert!(output.uncertainty.is_none());
    assert_eq!(session.statistics().amounts_converted, 1);
}

#[test]
fn test_deprecated_transport_unit_keeps_canonical_name() {
    let mut session = session();
    let output = assert_converts(&mut session, &FieldInput::new("exchange/2/amount", 120.0, "tkm"));
    assert_eq!(output.unit, "t*km");
    assert_close(output.amount, 120.0);
    assert_close(output.scale_factor, 1.0);
}

#[test]
fn test_unresolvable_unit_aborts_with_field() {
    let mut session = session();
    let err = convert_field(&mut session, &FieldInput::new("exchange/3/amount", 1.0, "furlong"))
        .unwrap_err();
    assert!(matches!(err, Error::UnitResolution { .. }));
    assert_eq!(err.field(), Some("exchange/3/amount"));
    assert_eq!(session.statistics().amounts_converted, 0);
}

#[test]
fn test_non_finite_literal_is_rejected() {
    let mut session = session();
    let err = convert_field(&mut session, &FieldInput::new("exchange/4/amount", f64::NAN, "kg"))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidValue { .. }));
}

#[test]
fn test_lognormal_bounds_are_geometric() {
    let mut session = session();
    let input = FieldInput::new("exchange/5/amount", 5000.0, "g").with_uncertainty(lognormal(0.04));
    let output = assert_converts(&mut session, &input);

    let uncertainty = output.uncertainty.expect("log-normal is realized");
    let ratio = (Z_95 * 0.2f64).exp();
    assert_eq!(uncertainty.distribution, DistributionKind::LogNormal);
    assert_close(uncertainty.mean, 5.0);
    assert_close(uncertainty.geometric_sd95.unwrap(), ratio);
    assert_close(uncertainty.min.unwrap(), 5.0 / ratio);
    assert_close(uncertainty.max.unwrap(), 5.0 * ratio);
    assert_close(uncertainty.mu.unwrap(), 5.0f64.ln());
    assert_eq!(session.statistics().uncertainties_realized, 1);
}

#[test]
fn test_lognormal_on_negative_mean_mirrors_bounds() {
    let mut session = session();
    let input = FieldInput::new("exchange/6/amount", -2.0, "kg").with_uncertainty(lognormal(0.04));
    let output = assert_converts(&mut session, &input);

    let uncertainty = output.uncertainty.unwrap();
    assert!(uncertainty.min.unwrap() < -2.0);
    assert!(uncertainty.max.unwrap() > -2.0);
    assert!(uncertainty.mu.is_none());
    assert_eq!(session.notes().count(NoteCode::LognormalNonPositiveMean), 1);
}

#[test]
fn test_normal_std95_scales_with_unit() {
    let mut session = session();
    let input = FieldInput::new("exchange/7/amount", 2.0, "kWh").with_uncertainty(normal(0.25));
    let output = assert_converts(&mut session, &input);

    let uncertainty = output.uncertainty.unwrap();
    assert_eq!(uncertainty.distribution, DistributionKind::Normal);
    assert_close(uncertainty.std95.unwrap(), 2.0 * 0.5 * 3.6);
    assert_close(uncertainty.min.unwrap(), 7.2 - 3.6);
    assert_close(uncertainty.max.unwrap(), 7.2 + 3.6);
}

#[test]
fn test_triangular_bounds_are_scaled() {
    let mut session = session();
    let record = UncertaintyRecord::new("triangular")
        .param("minValue", 800.0)
        .param("mostLikelyValue", 1000.0)
        .param("maxValue", 1500.0);
    let input = FieldInput::new("exchange/8/amount", 1000.0, "g").with_uncertainty(record);
    let output = assert_converts(&mut session, &input);

    let uncertainty = output.uncertainty.unwrap();
    assert_close(uncertainty.min.unwrap(), 0.8);
    assert_close(uncertainty.most_likely.unwrap(), 1.0);
    assert_close(uncertainty.max.unwrap(), 1.5);
}

#[test]
fn test_unconvertible_distribution_is_kept_as_comment() {
    let mut session = session();
    let record = UncertaintyRecord::new("gamma")
        .param("shape", 2.0)
        .param("scale", 0.5);
    let input = FieldInput::new("exchange/9/amount", 1.0, "kg").with_uncertainty(record);
    let output = assert_converts(&mut session, &input);

    assert!(output.uncertainty.is_none());
    assert_eq!(
        output.uncertainty_comment.as_deref(),
        Some("gamma distribution parameters: scale=0.5, shape=2")
    );
    assert_eq!(session.notes().count(NoteCode::UnconvertibleDistribution), 1);
}

#[test]
fn test_malformed_uncertainty_dropped_in_warn_mode() {
    let mut session = session_with_mode(StrictMode::Warn);
    let input = FieldInput::new("exchange/10/amount", 1.0, "kg")
        .with_uncertainty(UncertaintyRecord::new("normal"));
    let output = assert_converts(&mut session, &input);

    assert!(output.uncertainty.is_none());
    assert_close(output.amount, 1.0);

    let notes = session.notes().items_for_field("exchange/10/amount");
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].code, NoteCode::UncertaintyDropped);
    assert_eq!(notes[0].severity, Severity::Warning);
    assert!(notes[0].before.is_some());
    assert_eq!(session.statistics().uncertainties_dropped, 1);
}

#[test]
fn test_malformed_uncertainty_fails_in_strict_mode() {
    let mut session = session_with_mode(StrictMode::Strict);
    let input = FieldInput::new("exchange/11/amount", 1.0, "kg")
        .with_uncertainty(UncertaintyRecord::new("weibull").param("k", 1.0));
    let err = convert_field(&mut session, &input).unwrap_err();

    match &err {
        Error::UncertaintyShape { distribution, raw, .. } => {
            assert_eq!(distribution, "weibull");
            assert!(raw.is_some());
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(err.field(), Some("exchange/11/amount"));
}

#[test]
fn test_pedigree_mismatch_warns_and_converts() {
    let mut session = session();
    let record = UncertaintyRecord::new("lognormal")
        .param("variance", 0.0006)
        .param("varianceWithPedigreeUncertainty", 0.5)
        .with_pedigree([4, 3, 1, 3, 4]);
    let input = FieldInput::new("exchange/12/amount", 3.0, "kg").with_uncertainty(record);
    let output = assert_converts(&mut session, &input);

    assert!(output.uncertainty.is_some());
    assert_eq!(session.notes().count(NoteCode::PedigreeMismatch), 1);
    assert_eq!(session.notes().max_severity(), Some(Severity::Warning));
    assert_eq!(session.statistics().pedigree_mismatches, 1);
}

#[test]
fn test_consistent_pedigree_round_trips_through_comment() {
    let mut session = session();
    let record = UncertaintyRecord::new("lognormal")
        .param("variance", 0.0006)
        .param("varianceWithPedigreeUncertainty", 0.0493)
        .with_pedigree([4, 3, 1, 3, 4]);
    let input = FieldInput::new("exchange/13/amount", 3.0, "kg").with_uncertainty(record);
    let output = assert_converts(&mut session, &input);

    assert_eq!(session.notes().count(NoteCode::PedigreeMismatch), 0);
    let comment = output.uncertainty_comment.expect("pedigree comment");
    assert!(comment.starts_with("Pedigree matrix: (4,3,1,3,4)"));

    let recovered = recover_uncertainty(&output.uncertainty.unwrap(), Some(&comment)).unwrap();
    assert_eq!(recovered.pedigree.map(|p| p.scores()), Some([4, 3, 1, 3, 4]));
    match recovered.distribution {
        UncertaintyDistribution::Lognormal { ln_variance } => assert_close(ln_variance, 0.0493),
        other => panic!("unexpected distribution {:?}", other),
    }
}

#[test]
fn test_formula_is_rewritten_and_rescaled() {
    let mut session = session();
    let input = FieldInput::new("parameter/1", 2.5, "kWh").with_variable(None, Some("a * 2"));
    let output = assert_converts(&mut session, &input);

    let variable = output.variable.expect("formula declares a variable");
    assert_eq!(variable.name, "var_1");
    assert_eq!(variable.formula.as_deref(), Some("(a * 2) * 3.6"));
    assert_close(variable.mean_value, 9.0);
    assert_eq!(session.statistics().formulas_rewritten, 1);
}

#[test]
fn test_unit_conversion_bindings_are_returned() {
    let mut session = session();
    let input = FieldInput::new("parameter/2", 20.4556, "MJ").with_variable(
        Some("heat"),
        Some("UnitConversion(4889, 'kilocalorie thermochemical', 'MJ')"),
    );
    let output = assert_converts(&mut session, &input);

    assert_eq!(output.bindings.len(), 1);
    assert_eq!(
        output.variable.unwrap().formula.as_deref(),
        Some("(4889 * unit_conversion_kilocalorie_thermochemical_MJ)")
    );
    assert!(session.variable("unit_conversion_kilocalorie_thermochemical_MJ").is_some());
}

#[test]
fn test_failing_formula_is_dropped_not_fatal() {
    let mut session = session();
    let input = FieldInput::new("parameter/3", 4.0, "kg")
        .with_variable(Some("mass"), Some("Ref('missing') * 2"));
    let output = assert_converts(&mut session, &input);

    let variable = output.variable.expect("named variable is still declared");
    assert!(variable.formula.is_none());
    assert_close(variable.mean_value, 4.0);

    let notes = session.notes().items_for_field("parameter/3");
    assert_eq!(notes[0].code, NoteCode::FormulaDropped);
    assert_eq!(notes[0].severity, Severity::Error);
    assert_eq!(session.statistics().formulas_dropped, 1);
}

#[test]
fn test_duplicate_variable_name_keeps_first() {
    let mut session = session();
    let first = assert_converts(
        &mut session,
        &FieldInput::new("parameter/4", 1.0, "kg").with_variable(Some("yield"), None),
    );
    let second = assert_converts(
        &mut session,
        &FieldInput::new("parameter/5", 2.0, "kg").with_variable(Some("yield"), None),
    );

    assert!(first.variable.is_some());
    assert!(second.variable.is_none());
    assert_eq!(session.notes().count(NoteCode::VariableDeduplicated), 1);
    assert_close(session.variable("yield").unwrap().amount.magnitude(), 1.0);
}

#[test]
fn test_variable_bounds_come_from_uncertainty() {
    let mut session = session();
    let input = FieldInput::new("parameter/6", 10.0, "kg")
        .with_variable(Some("load"), None)
        .with_uncertainty(normal(1.0));
    let output = assert_converts(&mut session, &input);

    let variable = output.variable.unwrap();
    assert_close(variable.min.unwrap(), 8.0);
    assert_close(variable.max.unwrap(), 12.0);
}

#[test]
fn test_failed_production_volume_leaves_no_variable() {
    let mut session = session();
    let input = FieldInput::new("exchange/14/amount", 3.0, "kg")
        .with_entity("X")
        .with_variable(Some("mass"), None)
        .with_production_volume(1.0, "furlong");
    let err = convert_field(&mut session, &input).unwrap_err();

    assert!(matches!(err, Error::UnitResolution { .. }));
    assert!(session.variable("mass").is_none());
    assert!(session.reference("X").is_none());

    let retry = assert_converts(
        &mut session,
        &FieldInput::new("exchange/15/amount", 4.0, "kg").with_variable(Some("mass"), None),
    );
    assert!(retry.variable.is_some());
    assert_eq!(session.notes().count(NoteCode::VariableDeduplicated), 0);
}

#[test]
fn test_percent_sign_unit_resolves() {
    let mut session = session();
    let output = assert_converts(&mut session, &FieldInput::new("parameter/7", 50.0, "%"));
    assert_eq!(output.unit, "dimensionless");
    assert_close(output.amount, 0.5);
    assert_close(output.scale_factor, 0.01);
}
