//! lcabridge Tables - versioned static data for the conversion engine
//!
//! This crate owns the data the conversion engine consumes but does not
//! compute:
//! - **Unit table**: unit definitions, prefixes, spelling corrections,
//!   deprecated aliases, lazily defined units and chemical-formula exceptions
//! - **Canonical unit table**: the destination schema's reference unit per
//!   dimensionality
//! - **Pedigree table**: ln-variance contribution per pedigree score
//!
//! The built-in tables are embedded YAML documents. Replacement tables can be
//! loaded from a directory of YAML or JSON files.
//!
//! ```rust
//! use lcabridge_tables::ConversionTables;
//!
//! let tables = ConversionTables::builtin().unwrap();
//! assert!(tables.canonical.units.iter().any(|entry| entry.unit == "MJ"));
//! ```
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod loader;
pub mod model;
pub mod parser;
pub mod validation;

pub use error::{TablesError, TablesResult};
pub use loader::{ConversionTables, TableLoader};
pub use model::{
    CanonicalEntry, CanonicalTable, PedigreeIndicators, PedigreeTable, PrefixEntry, UnitEntry,
    UnitTable,
};
pub use parser::{parse_content, parse_file, table_candidates, Format, TABLE_EXTENSIONS};
