//! Session-owned unit registry
//!
//! Resolution order for one factor of a unit expression: exact name or
//! alias, prefix decomposition (`km`, `MJ`, `kcal`), then the definition
//! table. Units from the definition table are registered on first use and
//! reported through `take_defined`.
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use super::dimension::Dimensionality;
use super::normalize::{split_factors, Operator};
use super::unit::Unit;
use crate::error::{Error, Result};
use lcabridge_tables::ConversionTables;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Definitions may refer to other definitions up to this depth
const MAX_DEFINITION_DEPTH: usize = 8;

/// Unit lookup, lazy definition and canonical-unit selection
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    tables: Arc<ConversionTables>,
    named: HashMap<String, Unit>,
    prefixable: HashSet<String>,
    prefixes: Vec<(String, f64)>,
    /// Canonical unit keyed by dimensionality signature
    canonical: BTreeMap<String, Unit>,
    /// Unit symbol per base dimension, for the SI fallback
    base_symbols: BTreeMap<String, String>,
    defined: Vec<String>,
}

impl UnitRegistry {
    /// Build the registry and register every canonical unit name
    pub fn new(tables: Arc<ConversionTables>) -> Result<Self> {
        let mut named = HashMap::new();
        let mut prefixable = HashSet::new();

        for entry in &tables.units.units {
            let unit = Unit::new(
                entry.name.clone(),
                entry.factor,
                Dimensionality::from(&entry.dimensions),
            );
            for name in std::iter::once(&entry.name).chain(entry.aliases.iter()) {
                named.insert(name.clone(), unit.clone());
                if entry.prefixable {
                    prefixable.insert(name.clone());
                }
            }
        }

        let mut prefixes: Vec<(String, f64)> = tables
            .units
            .prefixes
            .iter()
            .map(|prefix| (prefix.symbol.clone(), prefix.factor))
            .collect();
        prefixes.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));

        let mut registry = Self {
            base_symbols: tables.units.base_units.clone(),
            tables,
            named,
            prefixable,
            prefixes,
            canonical: BTreeMap::new(),
            defined: Vec::new(),
        };
        registry.register_canonical_units()?;
        registry.defined.clear();
        Ok(registry)
    }

    fn register_canonical_units(&mut self) -> Result<()> {
        let entries = self.tables.canonical.units.clone();
        for entry in entries {
            let unit = self
                .resolve_expression(&entry.expression, 0)
                .map_err(|err| {
                    Error::configuration(format!(
                        "canonical unit '{}' cannot be resolved: {}",
                        entry.unit, err
                    ))
                })?
                .renamed(&entry.unit);
            self.canonical
                .entry(unit.dimensionality().signature())
                .or_insert_with(|| unit.clone());
            self.named.entry(entry.unit.clone()).or_insert(unit);
        }
        Ok(())
    }

    pub(crate) fn tables(&self) -> &ConversionTables {
        &self.tables
    }

    /// True when `name` is registered as a whole unit name
    pub fn is_registered(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// True when `name` resolves without consulting the definition table
    pub fn is_known(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Resolve unit text to a unit named by its normalized text
    pub fn resolve(&mut self, text: &str) -> Result<Unit> {
        let normalized = self.normalize(text);
        if normalized.is_empty() {
            return Err(Error::unit_resolution(text, "empty unit text"));
        }
        if let Some(unit) = self.named.get(&normalized) {
            return Ok(unit.renamed(&normalized));
        }
        let unit = self
            .resolve_expression(&normalized, 0)
            .map_err(|err| match err {
                Error::UnitResolution { message, .. } => Error::unit_resolution(text, message),
                other => other,
            })?;
        debug!(raw = text, unit = %normalized, factor = unit.factor(), "resolved unit");
        Ok(unit.renamed(&normalized))
    }

    /// The destination schema's unit for `dimensionality`
    ///
    /// Dimensionalities missing from the canonical table fall back to a
    /// composition of base unit symbols, e.g. `kg*m**2/s**3`.
    pub fn canonical_unit_for(&self, dimensionality: &Dimensionality) -> Unit {
        if let Some(unit) = self.canonical.get(&dimensionality.signature()) {
            return unit.clone();
        }
        self.si_fallback(dimensionality)
    }

    /// Names of units defined lazily since the last call
    pub fn take_defined(&mut self) -> Vec<String> {
        std::mem::take(&mut self.defined)
    }

    fn lookup(&self, name: &str) -> Option<Unit> {
        if let Some(unit) = self.named.get(name) {
            return Some(unit.clone());
        }
        self.prefixes.iter().find_map(|(symbol, factor)| {
            let rest = name.strip_prefix(symbol.as_str())?;
            if rest.is_empty() || !self.prefixable.contains(rest) {
                return None;
            }
            let base = self.named.get(rest)?;
            Some(Unit::new(
                name,
                factor * base.factor(),
                base.dimensionality().clone(),
            ))
        })
    }

    fn resolve_expression(&mut self, expression: &str, depth: usize) -> Result<Unit> {
        let mut result = Unit::one();
        for factor in split_factors(expression)? {
            let unit = self.resolve_factor(&factor.base, depth)?.powi(factor.exponent);
            result = match factor.op {
                Operator::Mul => result.mul(&unit),
                Operator::Div => result.div(&unit),
            };
        }
        Ok(result)
    }

    fn resolve_factor(&mut self, base: &str, depth: usize) -> Result<Unit> {
        if base.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            if let Ok(value) = base.parse::<f64>() {
                return Ok(Unit::scalar(value));
            }
        }
        if let Some(unit) = self.lookup(base) {
            return Ok(unit);
        }
        if let Some(definition) = self.tables.units.definitions.get(base).cloned() {
            return self.define(base, &definition, depth);
        }
        Err(Error::unit_resolution(base, format!("unknown unit '{}'", base)))
    }

    fn define(&mut self, name: &str, definition: &str, depth: usize) -> Result<Unit> {
        if depth >= MAX_DEFINITION_DEPTH {
            return Err(Error::unit_resolution(
                name,
                "unit definitions nest too deeply",
            ));
        }

        let definition = definition.trim();
        let unit = match definition
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            Some(dimension) => {
                self.base_symbols
                    .entry(dimension.to_string())
                    .or_insert_with(|| name.to_string());
                Unit::new(name, 1.0, Dimensionality::base(dimension))
            }
            None => {
                let expression = self.normalize(definition);
                self.resolve_expression(&expression, depth + 1)?.renamed(name)
            }
        };

        debug!(unit = name, definition, "defined unit on first use");
        self.named.insert(name.to_string(), unit.clone());
        self.defined.push(name.to_string());
        Ok(unit)
    }

    fn si_fallback(&self, dimensionality: &Dimensionality) -> Unit {
        let mut numerator = Vec::new();
        let mut denominator = Vec::new();
        let mut factor = 1.0;

        for (dimension, exponent) in dimensionality.iter() {
            let symbol = self
                .base_symbols
                .get(dimension)
                .cloned()
                .unwrap_or_else(|| dimension.to_string());
            if let Some(unit) = self.lookup(&symbol) {
                factor *= unit.factor().powi(exponent);
            }
            let term = match exponent.abs() {
                1 => symbol,
                n => format!("{}**{}", symbol, n),
            };
            if exponent > 0 {
                numerator.push(term);
            } else {
                denominator.push(term);
            }
        }

        let name = match (numerator.is_empty(), denominator.is_empty()) {
            (true, true) => "dimensionless".to_string(),
            (false, true) => numerator.join("*"),
            (true, false) => format!("1/{}", denominator.join("/")),
            (false, false) => format!("{}/{}", numerator.join("*"), denominator.join("/")),
        };
        Unit::new(name, factor, dimensionality.clone())
    }
}
