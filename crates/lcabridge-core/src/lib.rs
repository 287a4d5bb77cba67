//! lcabridge Core - Quantity, uncertainty, formula and identifier conversion
//!
//! This crate converts the numeric content of a life-cycle-inventory dataset
//! from a source schema into the destination schema's conventions. The
//! routing layer walks the source document and hands every numeric field to
//! [`convert_field`]; everything else is copied through untouched.
//!
//! # Main Components
//!
//! - **Units**: unit text normalization, dimensional analysis and
//!   canonicalization to one reference unit per dimensionality
//! - **Amounts**: a magnitude, its unit and its uncertainty, kept in both the
//!   source and the canonical unit
//! - **Uncertainty**: re-parameterization of log-normal, normal, triangular,
//!   uniform and undefined distributions, plus pedigree matrices
//! - **Formulas**: textual repair and rewriting of unit conversion and
//!   cross-reference pseudo-calls
//! - **Identifiers**: reversible keyed mapping of entity UUIDs
//! - **Session**: per-document state, notes for every lossy path, statistics
//!
//! # Example
//!
//! ```
//! use lcabridge_core::{convert_field, ConversionSession, EngineConfig, FieldInput, Result};
//!
//! fn example() -> Result<()> {
//!     let mut session = ConversionSession::with_builtin_tables(EngineConfig::default())?;
//!     let output = convert_field(&mut session, &FieldInput::new("exchange/1/amount", 2.5, "kWh"))?;
//!     assert_eq!(output.unit, "MJ");
//!     assert!((output.amount - 9.0).abs() < 1e-9);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

pub mod amount;
pub mod config;
pub mod error;
pub mod field;
pub mod formula;
pub mod identifier;
pub mod session;
pub mod types;
pub mod uncertainty;
pub mod units;
pub mod variable;


// Re-export main types for convenience
pub use amount::Amount;
pub use config::{EngineConfig, EngineConfigBuilder};
pub use error::{Error, ErrorScope, NoteCode, Result, Severity, StrictMode};
pub use field::convert_field;
pub use formula::{FormulaRewriter, RewrittenFormula};
pub use identifier::{map_identifier, name_hash, Direction, IdentifierKey};
pub use session::{ConversionSession, ConversionStatistics, Note, NoteReport, NoteTracker};
pub use types::{
    DestinationUncertainty, DistributionKind, FieldInput, FieldOutput, ProductionVolumeInput,
    UncertaintyRecord,
};
pub use uncertainty::{recover_uncertainty, PedigreeMatrix, Uncertainty, UncertaintyDistribution};
pub use units::{Dimensionality, Quantity, Unit, UnitRegistry};
pub use variable::{Variable, VariableParameter, VariableSpec};

// Tables are part of the public surface of a session
pub use lcabridge_tables::{ConversionTables, TableLoader, TablesError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
