//! Structural validation of loaded tables
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use crate::error::{TablesError, TablesResult};
use crate::model::{CanonicalTable, PedigreeTable, UnitTable};
use std::collections::HashSet;

/// Check unit names are unique and factors are usable
pub fn validate_unit_table(table: &UnitTable) -> TablesResult<()> {
    let mut seen = HashSet::new();

    for entry in &table.units {
        if !(entry.factor.is_finite() && entry.factor > 0.0) {
            return Err(TablesError::validation(
                "unit",
                format!("unit '{}' has non-positive factor {}", entry.name, entry.factor),
            ));
        }
        for name in std::iter::once(&entry.name).chain(entry.aliases.iter()) {
            if name.trim().is_empty() {
                return Err(TablesError::validation("unit", "empty unit name or alias"));
            }
            if !seen.insert(name.as_str()) {
                return Err(TablesError::validation(
                    "unit",
                    format!("'{}' is defined more than once", name),
                ));
            }
        }
    }

    for prefix in &table.prefixes {
        if !(prefix.factor.is_finite() && prefix.factor > 0.0) {
            return Err(TablesError::validation(
                "unit",
                format!("prefix '{}' has non-positive factor", prefix.symbol),
            ));
        }
    }

    for (dimension, symbol) in &table.base_units {
        if symbol.trim().is_empty() {
            return Err(TablesError::validation(
                "unit",
                format!("base dimension '{}' has no unit symbol", dimension),
            ));
        }
    }

    Ok(())
}

/// Check canonical unit names are unique
pub fn validate_canonical_table(table: &CanonicalTable) -> TablesResult<()> {
    let mut seen = HashSet::new();
    for entry in &table.units {
        if entry.expression.trim().is_empty() {
            return Err(TablesError::validation(
                "canonical unit",
                format!("'{}' has an empty expression", entry.unit),
            ));
        }
        if !seen.insert(entry.unit.as_str()) {
            return Err(TablesError::validation(
                "canonical unit",
                format!("'{}' is listed more than once", entry.unit),
            ));
        }
    }
    Ok(())
}

/// Check every pedigree row is non-negative and non-decreasing in score
pub fn validate_pedigree_table(table: &PedigreeTable) -> TablesResult<()> {
    for (name, row) in table.indicators.rows() {
        if row.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(TablesError::validation(
                "pedigree",
                format!("{} contains a negative or non-finite contribution", name),
            ));
        }
        if row.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(TablesError::validation(
                "pedigree",
                format!("{} contributions must not decrease with the score", name),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanonicalEntry, PedigreeIndicators, UnitEntry};
    use std::collections::BTreeMap;

    fn unit(name: &str, factor: f64, aliases: &[&str]) -> UnitEntry {
        UnitEntry {
            name: name.to_string(),
            factor,
            dimensions: BTreeMap::new(),
            prefixable: false,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn unit_table(units: Vec<UnitEntry>) -> UnitTable {
        UnitTable {
            version: "test".to_string(),
            base_units: BTreeMap::new(),
            prefixes: vec![],
            units,
            corrections: BTreeMap::new(),
            deprecated_aliases: BTreeMap::new(),
            definitions: BTreeMap::new(),
            chemical_formulas: vec![],
        }
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let table = unit_table(vec![unit("g", 0.001, &["gram"]), unit("gr", 1.0, &["gram"])]);
        let err = validate_unit_table(&table).unwrap_err();
        assert!(err.to_string().contains("gram"));
    }

    #[test]
    fn test_zero_factor_rejected() {
        let table = unit_table(vec![unit("nothing", 0.0, &[])]);
        assert!(validate_unit_table(&table).is_err());
    }

    #[test]
    fn test_duplicate_canonical_rejected() {
        let table = CanonicalTable {
            version: "test".to_string(),
            units: vec![
                CanonicalEntry { unit: "kg".to_string(), expression: "kg".to_string() },
                CanonicalEntry { unit: "kg".to_string(), expression: "g".to_string() },
            ],
        };
        assert!(validate_canonical_table(&table).is_err());
    }

    #[test]
    fn test_decreasing_pedigree_row_rejected() {
        let row = [0.0, 0.1, 0.2, 0.3, 0.4];
        let table = PedigreeTable {
            version: "test".to_string(),
            indicators: PedigreeIndicators {
                reliability: [0.0, 0.2, 0.1, 0.3, 0.4],
                completeness: row,
                temporal_correlation: row,
                geographical_correlation: row,
                further_technological_correlation: row,
            },
        };
        let err = validate_pedigree_table(&table).unwrap_err();
        assert!(err.to_string().contains("reliability"));
    }
}
