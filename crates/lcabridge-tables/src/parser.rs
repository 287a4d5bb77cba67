//! Table file parsing
//!
//! Tables ship as YAML. Replacement tables may be YAML or JSON.
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use crate::error::{TablesError, TablesResult};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Formats a table document may be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

/// File extensions tried for a table, in lookup order
///
/// The shipped tables are YAML; JSON is accepted for generated replacements.
pub const TABLE_EXTENSIONS: &[(&str, Format)] =
    &[("yaml", Format::Yaml), ("yml", Format::Yaml), ("json", Format::Json)];

impl Format {
    /// Format of a table file, from its extension
    pub fn from_path(path: &Path) -> TablesResult<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| {
                TABLE_EXTENSIONS
                    .iter()
                    .find(|(known, _)| known.eq_ignore_ascii_case(ext))
                    .map(|(_, format)| *format)
            })
            .ok_or_else(|| TablesError::unsupported_format(path.to_path_buf()))
    }
}

/// Candidate file names for `table` inside `dir`, in lookup order
pub fn table_candidates<'a>(dir: &'a Path, table: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
    TABLE_EXTENSIONS
        .iter()
        .map(move |(ext, _)| dir.join(format!("{}.{}", table, ext)))
}

/// Read one table file, choosing the parser from its extension
pub fn parse_file<T: DeserializeOwned>(path: &Path) -> TablesResult<T> {
    let format = Format::from_path(path)?;
    let content = std::fs::read_to_string(path)
        .map_err(|e| TablesError::io_error(path.to_path_buf(), e))?;
    parse_content(&content, format, path)
}

/// Parse document content with an explicit format
///
/// `path` is only used for error reporting.
pub fn parse_content<T: DeserializeOwned>(
    content: &str,
    format: Format,
    path: &Path,
) -> TablesResult<T> {
    match format {
        Format::Yaml => serde_yaml::from_str(content).map_err(|source| {
            TablesError::YamlParseError {
                path: path.to_path_buf(),
                source,
            }
        }),
        Format::Json => serde_json::from_str(content).map_err(|source| {
            TablesError::JsonParseError {
                path: path.to_path_buf(),
                source,
            }
        }),
    }
}
