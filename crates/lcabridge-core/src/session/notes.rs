//! Structured notes for lossy or noteworthy conversion paths
//!
//! Every path that intentionally loses or rewrites information records a
//! [`Note`]. The routing layer turns the tracker into a [`NoteReport`] once
//! the document is converted.
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use crate::error::{NoteCode, Severity, StrictMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One recorded note
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub code: NoteCode,
    pub severity: Severity,
    pub field: String,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,

    pub timestamp: DateTime<Utc>,
}

/// Notes of one document plus summary counts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteReport {
    pub items: Vec<Note>,
    pub max_severity: Option<Severity>,
    pub summary: NoteSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NoteSummary {
    pub total_items: usize,
    pub by_severity: BTreeMap<String, usize>,
    pub by_code: BTreeMap<String, usize>,
}

/// Collects notes for the field currently being converted
#[derive(Debug, Clone)]
pub struct NoteTracker {
    items: Vec<Note>,
    strict_mode: StrictMode,
    current_field: Option<String>,
}

impl NoteTracker {
    pub fn new(strict_mode: StrictMode) -> Self {
        Self {
            items: Vec::new(),
            strict_mode,
            current_field: None,
        }
    }

    /// Attribute subsequent notes to `field`
    pub fn enter_field(&mut self, field: &str) {
        self.current_field = Some(field.to_string());
    }

    pub fn leave_field(&mut self) {
        self.current_field = None;
    }

    pub fn current_field(&self) -> &str {
        self.current_field.as_deref().unwrap_or("")
    }

    /// Record a note for the current field
    pub fn add(&mut self, code: NoteCode, message: impl Into<String>, before: Option<Value>) {
        self.items.push(Note {
            code,
            severity: self.determine_severity(code),
            field: self.current_field().to_string(),
            message: message.into(),
            before,
            timestamp: Utc::now(),
        });
    }

    pub fn add_uncertainty_dropped(&mut self, message: &str, record: Option<Value>) {
        self.add(NoteCode::UncertaintyDropped, message, record);
    }

    pub fn add_combination_unsupported(&mut self, reason: &str) {
        self.add(
            NoteCode::UncertaintyCombinationUnsupported,
            format!("uncertainty dropped: {}", reason),
            None,
        );
    }

    pub fn add_formula_dropped(&mut self, formula: &str, reason: &str) {
        self.add(
            NoteCode::FormulaDropped,
            format!("formula dropped: {}", reason),
            Some(Value::String(formula.to_string())),
        );
    }

    pub fn add_pedigree_mismatch(&mut self, expected: f64, supplied: f64) {
        self.add(
            NoteCode::PedigreeMismatch,
            format!(
                "pedigree contributions give total variance {} but {} was supplied",
                expected, supplied
            ),
            Some(Value::from(supplied)),
        );
    }

    pub fn add_unit_defined(&mut self, unit: &str) {
        self.add(
            NoteCode::UnitDefinedLazily,
            format!("unit '{}' defined from the definition table", unit),
            None,
        );
    }

    pub fn items(&self) -> &[Note] {
        &self.items
    }

    pub fn items_for_field(&self, field: &str) -> Vec<&Note> {
        self.items.iter().filter(|note| note.field == field).collect()
    }

    pub fn count(&self, code: NoteCode) -> usize {
        self.items.iter().filter(|note| note.code == code).count()
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.items.iter().map(|note| note.severity).max()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.current_field = None;
    }

    /// Snapshot of all notes with per-code and per-severity counts
    pub fn build_report(&self) -> NoteReport {
        let mut summary = NoteSummary {
            total_items: self.items.len(),
            ..NoteSummary::default()
        };
        for note in &self.items {
            *summary.by_code.entry(note.code.to_string()).or_insert(0) += 1;
            *summary.by_severity.entry(note.severity.to_string()).or_insert(0) += 1;
        }
        NoteReport {
            items: self.items.clone(),
            max_severity: self.max_severity(),
            summary,
        }
    }

    fn determine_severity(&self, code: NoteCode) -> Severity {
        match (code, self.strict_mode) {
            (NoteCode::UncertaintyDropped, StrictMode::Strict) => Severity::Error,
            (NoteCode::UncertaintyDropped, _) => Severity::Warning,
            (NoteCode::FormulaDropped, _) => Severity::Error,
            (NoteCode::PedigreeMismatch, _) => Severity::Warning,
            (NoteCode::LognormalNonPositiveMean, _) => Severity::Warning,
            (NoteCode::UncertaintyCombinationUnsupported, _) => Severity::Info,
            (NoteCode::UnconvertibleDistribution, _) => Severity::Info,
            (NoteCode::UnitConversionInserted, _) => Severity::Info,
            (NoteCode::CrossReferenceResolved, _) => Severity::Info,
            (NoteCode::UnitDefinedLazily, _) => Severity::Info,
            (NoteCode::VariableDeduplicated, _) => Severity::Info,
        }
    }
}

impl Default for NoteTracker {
    fn default() -> Self {
        Self::new(StrictMode::default())
    }
}
