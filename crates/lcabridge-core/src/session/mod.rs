//! Per-document conversion state
//!
//! A [`ConversionSession`] owns everything that is mutable while one
//! document is converted: the unit registry (lazy definitions), internal id
//! counters, the variable registry, the cross-reference registry, notes and
//! statistics. Nothing is shared between sessions; `reset` returns a session
//! to the state it had right after construction.
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

pub mod notes;
pub mod statistics;

pub use notes::{Note, NoteReport, NoteSummary, NoteTracker};
pub use statistics::ConversionStatistics;

use crate::amount::Amount;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::formula::{FormulaRewriter, RewrittenFormula};
use crate::identifier::{self, Direction};
use crate::units::{Unit, UnitRegistry};
use crate::variable::{Variable, VariableSpec};
use lcabridge_tables::ConversionTables;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Amounts recorded for one entity, for cross-reference resolution
#[derive(Debug, Clone)]
pub struct EntityAmounts {
    pub amount: Amount,
    pub production_volume: Option<Amount>,
}

#[derive(Debug, Clone)]
pub struct ConversionSession {
    config: EngineConfig,
    tables: Arc<ConversionTables>,
    pristine_units: UnitRegistry,
    units: UnitRegistry,
    counters: HashMap<String, u64>,
    variables: BTreeMap<String, Variable>,
    references: HashMap<String, EntityAmounts>,
    notes: NoteTracker,
    statistics: ConversionStatistics,
}

impl ConversionSession {
    /// Start a session for one document
    pub fn new(config: EngineConfig, tables: Arc<ConversionTables>) -> Result<Self> {
        config.validate()?;
        let units = UnitRegistry::new(Arc::clone(&tables))?;
        Ok(Self {
            notes: NoteTracker::new(config.strict_mode),
            pristine_units: units.clone(),
            units,
            config,
            tables,
            counters: HashMap::new(),
            variables: BTreeMap::new(),
            references: HashMap::new(),
            statistics: ConversionStatistics::default(),
        })
    }

    /// Start a session on the tables embedded in `lcabridge-tables`
    pub fn with_builtin_tables(config: EngineConfig) -> Result<Self> {
        Self::new(config, Arc::new(ConversionTables::builtin()?))
    }

    /// Drop all per-document state
    pub fn reset(&mut self) {
        debug!(
            variables = self.variables.len(),
            references = self.references.len(),
            notes = self.notes.items().len(),
            "resetting conversion session"
        );
        self.units = self.pristine_units.clone();
        self.counters.clear();
        self.variables.clear();
        self.references.clear();
        self.notes.clear();
        self.statistics = ConversionStatistics::default();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tables(&self) -> &ConversionTables {
        &self.tables
    }

    pub fn units(&self) -> &UnitRegistry {
        &self.units
    }

    pub fn notes(&self) -> &NoteTracker {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut NoteTracker {
        &mut self.notes
    }

    pub fn statistics(&self) -> &ConversionStatistics {
        &self.statistics
    }

    pub fn statistics_mut(&mut self) -> &mut ConversionStatistics {
        &mut self.statistics
    }

    /// Next value of the counter for `kind`, starting at 1
    pub fn next_internal_id(&mut self, kind: &str) -> u64 {
        let counter = self.counters.entry(kind.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Resolve unit text, noting units defined on first use
    pub fn resolve_unit(&mut self, text: &str) -> Result<Unit> {
        let unit = self.units.resolve(text)?;
        self.note_defined_units();
        Ok(unit)
    }

    /// Build a canonicalized amount from a source literal
    pub fn amount(&mut self, literal: f64, unit_text: &str) -> Result<Amount> {
        let amount = Amount::from_literal(literal, unit_text, &mut self.units);
        self.note_defined_units();
        amount
    }

    fn note_defined_units(&mut self) {
        for name in self.units.take_defined() {
            self.notes.add_unit_defined(&name);
        }
    }

    /// Register a variable under its name, or under a generated one
    ///
    /// Returns the registered variable and whether it is new. A name that is
    /// already registered keeps its first variable.
    pub fn declare_variable(&mut self, spec: VariableSpec, amount: Amount) -> (Variable, bool) {
        let name = match spec.name.clone() {
            Some(name) => name,
            None => self.anonymous_variable_name(),
        };
        if let Some(existing) = self.variables.get(&name) {
            return (existing.clone(), false);
        }
        let variable = Variable {
            name: name.clone(),
            formula: spec.formula.clone(),
            comments: spec.comments.clone(),
            amount: amount.with_variable(spec),
        };
        self.variables.insert(name, variable.clone());
        (variable, true)
    }

    fn anonymous_variable_name(&mut self) -> String {
        loop {
            let id = self.next_internal_id("variable");
            let name = format!("{}{}", self.config.anonymous_variable_prefix, id);
            if !self.variables.contains_key(&name) {
                return name;
            }
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    /// Record an entity's amounts for later `Ref` markers
    pub fn record_reference(&mut self, entity_id: &str, amount: Amount, production_volume: Option<Amount>) {
        self.references.insert(
            entity_id.to_string(),
            EntityAmounts {
                amount,
                production_volume,
            },
        );
    }

    pub fn reference(&self, entity_id: &str) -> Option<&EntityAmounts> {
        self.references.get(entity_id)
    }

    /// Rewrite marker calls in `formula` against this session
    pub fn rewrite_formula(&mut self, formula: &str) -> Result<RewrittenFormula> {
        let rewriter = FormulaRewriter::new(&self.config);
        rewriter.rewrite(formula, self)
    }

    /// Rewrite the formula of the field holding `amount`
    ///
    /// References are substituted in the field's own source unit, matching
    /// the other literals before the formula is rescaled.
    pub fn rewrite_field_formula(&mut self, formula: &str, amount: &Amount) -> Result<RewrittenFormula> {
        let rewriter = FormulaRewriter::new(&self.config);
        rewriter.rewrite_in_frame(formula, self, Some(amount))
    }

    /// Map an entity identifier under the configured key
    pub fn map_identifier(&self, id: &str, direction: Direction) -> Result<String> {
        let key = self.config.identifier_key()?;
        identifier::map_identifier(id, &key, direction)
    }

    /// Notes collected so far, with summary counts
    pub fn build_report(&self) -> NoteReport {
        self.notes.build_report()
    }
}
