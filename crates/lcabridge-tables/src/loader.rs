//! Loading the table set from embedded data or from a directory
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use crate::error::{TablesError, TablesResult};
use crate::model::{CanonicalTable, PedigreeTable, UnitTable};
use crate::parser::{parse_content, parse_file, table_candidates, Format};
use crate::validation::{validate_canonical_table, validate_pedigree_table, validate_unit_table};
use std::path::{Path, PathBuf};

const BUILTIN_UNITS: &str = include_str!("../data/units.yaml");
const BUILTIN_CANONICAL_UNITS: &str = include_str!("../data/canonical_units.yaml");
const BUILTIN_PEDIGREE: &str = include_str!("../data/pedigree.yaml");

/// The full set of static data the conversion engine consumes
#[derive(Debug, Clone)]
pub struct ConversionTables {
    pub units: UnitTable,
    pub canonical: CanonicalTable,
    pub pedigree: PedigreeTable,
}

impl ConversionTables {
    /// Parse and validate the tables shipped with this crate
    pub fn builtin() -> TablesResult<Self> {
        let tables = Self {
            units: parse_content(BUILTIN_UNITS, Format::Yaml, Path::new("<builtin>/units.yaml"))?,
            canonical: parse_content(
                BUILTIN_CANONICAL_UNITS,
                Format::Yaml,
                Path::new("<builtin>/canonical_units.yaml"),
            )?,
            pedigree: parse_content(
                BUILTIN_PEDIGREE,
                Format::Yaml,
                Path::new("<builtin>/pedigree.yaml"),
            )?,
        };
        tables.validate()?;
        Ok(tables)
    }

    /// Run all structural checks
    pub fn validate(&self) -> TablesResult<()> {
        validate_unit_table(&self.units)?;
        validate_canonical_table(&self.canonical)?;
        validate_pedigree_table(&self.pedigree)
    }
}

/// Loads replacement tables from a directory
///
/// The directory must contain `units`, `canonical_units` and `pedigree`
/// documents, each as `.yaml`, `.yml` or `.json`.
#[derive(Debug, Clone)]
pub struct TableLoader {
    dir: PathBuf,
}

impl TableLoader {
    /// Create a loader rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load and validate all three tables
    pub fn load(&self) -> TablesResult<ConversionTables> {
        let tables = ConversionTables {
            units: parse_file(&self.locate("units")?)?,
            canonical: parse_file(&self.locate("canonical_units")?)?,
            pedigree: parse_file(&self.locate("pedigree")?)?,
        };
        tables.validate()?;
        Ok(tables)
    }

    /// Convenience wrapper for `TableLoader::new(dir).load()`
    pub fn load_dir(dir: impl Into<PathBuf>) -> TablesResult<ConversionTables> {
        Self::new(dir).load()
    }

    fn locate(&self, table: &str) -> TablesResult<PathBuf> {
        table_candidates(&self.dir, table)
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| TablesError::MissingTable {
                table: table.to_string(),
                dir: self.dir.clone(),
            })
    }
}
