//! Error types for table loading operations
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use std::path::PathBuf;
use thiserror::Error;

/// Result type for table operations
pub type TablesResult<T> = Result<T, TablesError>;

/// Errors raised while reading, parsing or validating conversion tables
#[derive(Error, Debug)]
pub enum TablesError {
    /// File I/O errors
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parsing errors
    #[error("Failed to parse YAML document '{path}': {source}")]
    YamlParseError {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// JSON parsing errors
    #[error("Failed to parse JSON document '{path}': {source}")]
    JsonParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Unsupported file format
    #[error("Unsupported file format for '{path}'. Expected .yaml, .yml, or .json")]
    UnsupportedFormat { path: PathBuf },

    /// A table file the loader needs is absent
    #[error("Table '{table}' not found in '{dir}'")]
    MissingTable { table: String, dir: PathBuf },

    /// Table content violates a structural rule
    #[error("Invalid {table} table: {reason}")]
    ValidationError { table: String, reason: String },
}

impl TablesError {
    /// Create an I/O error for the given path
    pub fn io_error(path: PathBuf, source: std::io::Error) -> Self {
        Self::IoError { path, source }
    }

    /// Create an unsupported format error
    pub fn unsupported_format(path: PathBuf) -> Self {
        Self::UnsupportedFormat { path }
    }

    /// Create a validation error for the named table
    pub fn validation(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ValidationError {
            table: table.into(),
            reason: reason.into(),
        }
    }
}
