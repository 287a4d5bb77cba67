//! Error types for the lcabridge conversion engine
//!
//! Every conversion error carries the raw offending text or value and, once
//! the routing layer has attached it, the identifier of the field being
//! converted. `Error::scope` says how far a failure reaches: the whole
//! document, one field's uncertainty, or one formula.

use lcabridge_tables::TablesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for conversion operations
#[derive(Error, Debug)]
pub enum Error {
    /// Unit text could not be resolved to a known or definable unit
    #[error("Unit resolution failed for '{raw}': {message}")]
    UnitResolution {
        raw: String,
        message: String,
        field: Option<String>,
    },

    /// Conversion between units of different dimensionality
    #[error("Cannot convert '{from_unit}' ({from_dimensionality}) to '{to_unit}' ({to_dimensionality})")]
    DimensionalityMismatch {
        from_unit: String,
        to_unit: String,
        from_dimensionality: String,
        to_dimensionality: String,
        field: Option<String>,
    },

    /// An uncertainty record lacks a parameter its distribution requires
    #[error("Malformed {distribution} uncertainty: {message}")]
    UncertaintyShape {
        distribution: String,
        message: String,
        raw: Option<serde_json::Value>,
        field: Option<String>,
    },

    /// A formula marker call cannot be bracket-matched or has the wrong arity
    #[error("Ambiguous formula syntax at position {position} in '{formula}': {message}")]
    FormulaSyntaxAmbiguity {
        formula: String,
        position: usize,
        message: String,
        field: Option<String>,
    },

    /// A cross-reference names an entity the session has not recorded
    #[error("Cross-reference to '{entity_id}' not found in formula '{formula}'")]
    CrossReferenceNotFound {
        entity_id: String,
        formula: String,
        field: Option<String>,
    },

    /// Identifier is not a 36-character canonical UUID token
    #[error("Invalid identifier '{id}': {message}")]
    InvalidIdentifier { id: String, message: String },

    /// A numeric value cannot be used (non-finite literal, zero divisor)
    #[error("Invalid value '{raw}': {message}")]
    InvalidValue {
        raw: String,
        message: String,
        field: Option<String>,
    },

    /// Engine configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Static table loading errors
    #[error("Table error: {source}")]
    Tables {
        #[from]
        source: TablesError,
    },

    /// JSON serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// How far an error reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorScope {
    /// Abort the enclosing document
    Document,
    /// Abort the uncertainty of the current field
    Field,
    /// Drop the current formula; the amount still converts
    Formula,
}

impl Error {
    /// Classify the error by how much of the conversion it invalidates
    pub fn scope(&self) -> ErrorScope {
        match self {
            Error::UncertaintyShape { .. } => ErrorScope::Field,
            Error::FormulaSyntaxAmbiguity { .. } | Error::CrossReferenceNotFound { .. } => {
                ErrorScope::Formula
            }
            _ => ErrorScope::Document,
        }
    }

    /// Attach the offending field identifier unless one is already set
    pub fn with_field(mut self, path: &str) -> Self {
        match &mut self {
            Error::UnitResolution { field, .. }
            | Error::DimensionalityMismatch { field, .. }
            | Error::UncertaintyShape { field, .. }
            | Error::FormulaSyntaxAmbiguity { field, .. }
            | Error::CrossReferenceNotFound { field, .. }
            | Error::InvalidValue { field, .. } => {
                if field.is_none() {
                    *field = Some(path.to_string());
                }
            }
            _ => {}
        }
        self
    }

    /// The field identifier attached to this error, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::UnitResolution { field, .. }
            | Error::DimensionalityMismatch { field, .. }
            | Error::UncertaintyShape { field, .. }
            | Error::FormulaSyntaxAmbiguity { field, .. }
            | Error::CrossReferenceNotFound { field, .. }
            | Error::InvalidValue { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// Create a configuration error without a source
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn unit_resolution(raw: &str, message: impl Into<String>) -> Self {
        Error::UnitResolution {
            raw: raw.to_string(),
            message: message.into(),
            field: None,
        }
    }

    pub(crate) fn uncertainty_shape(distribution: &str, message: impl Into<String>) -> Self {
        Error::UncertaintyShape {
            distribution: distribution.to_string(),
            message: message.into(),
            raw: None,
            field: None,
        }
    }

    pub(crate) fn formula_syntax(formula: &str, position: usize, message: impl Into<String>) -> Self {
        Error::FormulaSyntaxAmbiguity {
            formula: formula.to_string(),
            position,
            message: message.into(),
            field: None,
        }
    }

    pub(crate) fn invalid_value(raw: impl fmt::Display, message: impl Into<String>) -> Self {
        Error::InvalidValue {
            raw: raw.to_string(),
            message: message.into(),
            field: None,
        }
    }
}

/// Handling of malformed uncertainty records at the field boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StrictMode {
    /// Fail the field
    Strict,
    /// Drop the uncertainty, log and continue
    #[default]
    Warn,
}

/// Severity levels for notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// Warning, should be reviewed
    Warning,
    /// Error, part of the field was not converted
    Error,
}

/// Codes for intentionally lossy or noteworthy conversion paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoteCode {
    /// Uncertainty removed from a field
    UncertaintyDropped,
    /// Uncertainty lost because two distributions cannot be combined
    UncertaintyCombinationUnsupported,
    /// Beta, gamma or binomial parameters kept only as a note
    UnconvertibleDistribution,
    /// Pedigree contributions disagree with the supplied total variance
    PedigreeMismatch,
    /// Formula removed; the amount converted without it
    FormulaDropped,
    /// A unit conversion ratio variable was emitted
    UnitConversionInserted,
    /// A cross-reference marker was replaced by a literal
    CrossReferenceResolved,
    /// Log-normal bounds for a mean that is not positive
    LognormalNonPositiveMean,
    /// A unit was defined from the definition table on first use
    UnitDefinedLazily,
    /// A field declared a variable name that was already registered
    VariableDeduplicated,
}

impl fmt::Display for StrictMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrictMode::Strict => write!(f, "Strict"),
            StrictMode::Warn => write!(f, "Warn"),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for NoteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoteCode::UncertaintyDropped => "UncertaintyDropped",
            NoteCode::UncertaintyCombinationUnsupported => "UncertaintyCombinationUnsupported",
            NoteCode::UnconvertibleDistribution => "UnconvertibleDistribution",
            NoteCode::PedigreeMismatch => "PedigreeMismatch",
            NoteCode::FormulaDropped => "FormulaDropped",
            NoteCode::UnitConversionInserted => "UnitConversionInserted",
            NoteCode::CrossReferenceResolved => "CrossReferenceResolved",
            NoteCode::LognormalNonPositiveMean => "LognormalNonPositiveMean",
            NoteCode::UnitDefinedLazily => "UnitDefinedLazily",
            NoteCode::VariableDeduplicated => "VariableDeduplicated",
        };
        write!(f, "{}", name)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unit_resolution("kgg", "no such unit");
        assert_eq!(err.to_string(), "Unit resolution failed for 'kgg': no such unit");
    }

    #[test]
    fn test_scope_classification() {
        assert_eq!(Error::unit_resolution("x", "y").scope(), ErrorScope::Document);
        assert_eq!(Error::uncertainty_shape("normal", "no variance").scope(), ErrorScope::Field);
        assert_eq!(Error::formula_syntax("Ref(", 3, "unbalanced").scope(), ErrorScope::Formula);
        let missing = Error::CrossReferenceNotFound {
            entity_id: "X".to_string(),
            formula: "Ref('X')".to_string(),
            field: None,
        };
        assert_eq!(missing.scope(), ErrorScope::Formula);
    }

    #[test]
    fn test_with_field_keeps_inner_field() {
        let err = Error::unit_resolution("kgg", "no such unit").with_field("exchange/amount");
        assert_eq!(err.field(), Some("exchange/amount"));
        let err = err.with_field("outer");
        assert_eq!(err.field(), Some("exchange/amount"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_strict_mode_display() {
        assert_eq!(StrictMode::Strict.to_string(), "Strict");
        assert_eq!(StrictMode::default(), StrictMode::Warn);
    }
}
