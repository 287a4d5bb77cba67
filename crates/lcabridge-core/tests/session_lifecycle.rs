//! Session lifecycle: document boundaries, reports and replacement tables


use lcabridge_core::config::EngineConfig;
use lcabridge_core::config::EngineConfigBuilder;
use lcabridge_core::{
    convert_field, Amount, ConversionSession, Direction, Error, FieldInput, NoteCode, Severity,
    TableLoader,
};
use lcabridge_tables::Format;
use std::fs;
use std::sync::Arc;
use test_support::{assert_close, assert_converts, normal, session};

const UNITS_YAML: &str = include_str!("../../lcabridge-tables/data/units.yaml");
const CANONICAL_YAML: &str = include_str!("../../lcabridge-tables/data/canonical_units.yaml");
const PEDIGREE_YAML: &str = include_str!("../../lcabridge-tables/data/pedigree.yaml");

#[test]
fn test_reset_forgets_references_and_variables() {
    let mut session = session();
    assert_converts(
        &mut session,
        &FieldInput::new("exchange/X/amount", 10.0, "kg")
            .with_entity("X")
            .with_variable(Some("mass"), None),
    );
    assert!(session.rewrite_formula("Ref('X')").is_ok());
    assert!(session.variable("mass").is_some());

    session.reset();

    assert!(session.variable("mass").is_none());
    assert!(session.notes().is_empty());
    assert_eq!(session.statistics().amounts_converted, 0);
    let err = session.rewrite_formula("Ref('X')").unwrap_err();
    assert!(matches!(err, Error::CrossReferenceNotFound { .. }));
}

#[test]
fn test_internal_ids_restart_per_document() {
    let mut session = session();
    assert_eq!(session.next_internal_id("exchange"), 1);
    assert_eq!(session.next_internal_id("exchange"), 2);
    session.reset();
    assert_eq!(session.next_internal_id("exchange"), 1);
}

#[test]
fn test_lazily_defined_unit_is_redefined_after_reset() {
    let mut session = session();
    let first = assert_converts(&mut session, &FieldInput::new("exchange/1/amount", 3.0, "USD2005"));
    assert_eq!(first.unit, "USD2005");
    assert_eq!(session.notes().count(NoteCode::UnitDefinedLazily), 1);

    // defined once per document
    assert_converts(&mut session, &FieldInput::new("exchange/2/amount", 4.0, "USD2005"));
    assert_eq!(session.notes().count(NoteCode::UnitDefinedLazily), 1);

    session.reset();
    assert_converts(&mut session, &FieldInput::new("exchange/3/amount", 5.0, "USD2005"));
    assert_eq!(session.notes().count(NoteCode::UnitDefinedLazily), 1);
}

#[test]
fn test_report_summarizes_notes() {
    let mut session = session();
    assert_converts(
        &mut session,
        &FieldInput::new("parameter/1", 1.0, "kg").with_variable(Some("a"), Some("Ref('gone')")),
    );
    assert_converts(
        &mut session,
        &FieldInput::new("parameter/2", 1.0, "kg").with_variable(Some("a"), None),
    );

    let report = session.build_report();
    assert_eq!(report.summary.total_items, 2);
    assert_eq!(report.max_severity, Some(Severity::Error));
    assert_eq!(report.summary.by_code.get("FormulaDropped"), Some(&1));
    assert_eq!(report.summary.by_code.get("VariableDeduplicated"), Some(&1));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["items"][0]["field"], "parameter/1");
}

#[test]
fn test_merged_exchanges_add_normal_variances() {
    let mut session = session();
    let a = session
        .amount(2.0, "kWh")
        .unwrap()
        .with_uncertainty_record(&normal(0.25))
        .unwrap();
    let b = session
        .amount(1.0, "MJ")
        .unwrap()
        .with_uncertainty_record(&normal(1.0))
        .unwrap();

    let merged = a.merged(&b, session.notes_mut()).unwrap();
    assert_close(merged.magnitude(), 8.2);
    assert_close(merged.scale_factor(), 1.0);

    let record = merged.realize_uncertainty().unwrap().record.unwrap();
    // 0.25 * 3.6^2 + 1.0 in MJ^2
    let variance: f64 = 0.25 * 3.6 * 3.6 + 1.0;
    assert_close(record.std95.unwrap(), 2.0 * variance.sqrt());
}

#[test]
fn test_merging_different_dimensions_fails() {
    let mut session = session();
    let mass = session.amount(1.0, "kg").unwrap();
    let energy = session.amount(1.0, "MJ").unwrap();
    let err = mass.merged(&energy, session.notes_mut()).unwrap_err();
    assert!(matches!(err, Error::DimensionalityMismatch { .. }));
}

#[test]
fn test_multiplying_lognormal_amounts_adds_ln_variances() {
    let mut session = session();
    let record = |v: f64| lcabridge_core::UncertaintyRecord::new("lognormal").param("variance", v);
    let a: Amount = session
        .amount(4.0, "kg")
        .unwrap()
        .with_uncertainty_record(&record(0.01))
        .unwrap();
    let b = session
        .amount(0.5, "dimensionless")
        .unwrap()
        .with_uncertainty_record(&record(0.03))
        .unwrap();

    let product = a.multiply(&b, session.notes_mut());
    assert_close(product.magnitude(), 2.0);
    match &product.uncertainty().unwrap().distribution {
        lcabridge_core::UncertaintyDistribution::Lognormal { ln_variance } => {
            assert_close(*ln_variance, 0.04)
        }
        other => panic!("unexpected distribution {:?}", other),
    }
}

#[test]
fn test_session_on_tables_loaded_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("units.yaml"), UNITS_YAML).unwrap();
    fs::write(dir.path().join("canonical_units.yaml"), CANONICAL_YAML).unwrap();
    fs::write(dir.path().join("pedigree.yaml"), PEDIGREE_YAML).unwrap();

    let tables = TableLoader::load_dir(dir.path()).unwrap();
    let mut session = ConversionSession::new(EngineConfig::default(), Arc::new(tables)).unwrap();
    let output = convert_field(&mut session, &FieldInput::new("exchange/1/amount", 1.0, "t")).unwrap();
    assert_eq!(output.unit, "kg");
    assert_close(output.amount, 1000.0);
}

#[test]
fn test_missing_table_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("units.yaml"), UNITS_YAML).unwrap();
    assert!(TableLoader::load_dir(dir.path()).is_err());
}

#[test]
fn test_session_uses_configuration_from_yaml() {
    let yaml = "strict_mode: Strict\nanonymous_variable_prefix: p_\n";
    let config = EngineConfig::from_content(yaml, Format::Yaml).unwrap();
    let mut session = ConversionSession::with_builtin_tables(config).unwrap();

    let output = assert_converts(
        &mut session,
        &FieldInput::new("parameter/1", 1.0, "kg").with_variable(None, Some("2 * 3")),
    );
    assert_eq!(output.variable.unwrap().name, "p_1");

    let bad = FieldInput::new("exchange/1/amount", 1.0, "kg")
        .with_uncertainty(lcabridge_core::UncertaintyRecord::new("normal"));
    assert!(convert_field(&mut session, &bad).is_err());
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let config = EngineConfig {
        pedigree_tolerance: -1.0,
        ..EngineConfig::default()
    };
    let err = ConversionSession::with_builtin_tables(config).unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}

#[test]
fn test_identifier_mapping_uses_configured_key() {
    let id = "0b8f2a54-5e3c-4c1d-9a7b-3f2e1d0c9b8a";
    let default_session = session();
    let config = EngineConfigBuilder::new()
        .identifier_key("project-key-2024")
        .build()
        .unwrap();
    let keyed_session = ConversionSession::with_builtin_tables(config).unwrap();

    let mapped = keyed_session.map_identifier(id, Direction::Forward).unwrap();
    assert_ne!(mapped, default_session.map_identifier(id, Direction::Forward).unwrap());
    assert_eq!(keyed_session.map_identifier(&mapped, Direction::Reverse).unwrap(), id);
}

#[test]
fn test_short_identifier_key_is_rejected() {
    let err = EngineConfigBuilder::new().identifier_key("short").build().unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}
