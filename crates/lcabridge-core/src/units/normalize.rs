//! Unit text normalization
//!
//! Repairs applied before a unit is resolved, in order: whole-text
//! deprecated aliases, per-factor spelling corrections, `^` to `**`, and
//! exponent shorthand (`m2` becomes `m**2`) unless the token is a chemical
//! formula such as `NH3`. Text that already names a registered unit is
//! returned unchanged.
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use super::registry::UnitRegistry;
use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operator {
    Mul,
    Div,
}

impl Operator {
    fn flipped(self) -> Self {
        match self {
            Operator::Mul => Operator::Div,
            Operator::Div => Operator::Mul,
        }
    }
}

/// One `base**exponent` term of a unit expression and the operator before it
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Factor {
    pub op: Operator,
    pub base: String,
    pub exponent: i32,
}

/// Split `kg*m**2/s**3` into factors
///
/// `^` is accepted as an exponent operator. Whitespace around operators is
/// dropped; whitespace inside a name (`metric ton`) is kept.
pub(crate) fn split_factors(expression: &str) -> Result<Vec<Factor>> {
    let expression = expression.replace('^', "**");
    let chars: Vec<char> = expression.chars().collect();
    let mut factors = Vec::new();
    let mut token = String::new();
    let mut op = Operator::Mul;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                token.push_str("**");
                i += 1;
            }
            '*' | '/' => {
                factors.push(parse_factor(&expression, op, &token)?);
                token.clear();
                op = if chars[i] == '*' { Operator::Mul } else { Operator::Div };
            }
            c => token.push(c),
        }
        i += 1;
    }
    factors.push(parse_factor(&expression, op, &token)?);
    Ok(factors)
}

fn parse_factor(expression: &str, op: Operator, token: &str) -> Result<Factor> {
    let (base, exponent) = match token.split_once("**") {
        Some((base, exponent)) => {
            let exponent = exponent.trim().parse::<i32>().map_err(|_| {
                Error::unit_resolution(expression, format!("invalid exponent in '{}'", token.trim()))
            })?;
            (base.trim(), exponent)
        }
        None => (token.trim(), 1),
    };
    if base.is_empty() {
        return Err(Error::unit_resolution(expression, "empty factor in unit expression"));
    }
    Ok(Factor {
        op,
        base: base.to_string(),
        exponent,
    })
}

/// Inverse of `split_factors`, without spaces around operators
pub(crate) fn join_factors(factors: &[Factor]) -> String {
    let mut out = String::new();
    for (i, factor) in factors.iter().enumerate() {
        match (i, factor.op) {
            (0, Operator::Div) => out.push_str("1/"),
            (0, Operator::Mul) => {}
            (_, Operator::Mul) => out.push('*'),
            (_, Operator::Div) => out.push('/'),
        }
        out.push_str(&factor.base);
        if factor.exponent != 1 {
            out.push_str(&format!("**{}", factor.exponent));
        }
    }
    out
}

fn shorthand_regex() -> &'static Regex {
    static SHORTHAND: OnceLock<Regex> = OnceLock::new();
    SHORTHAND.get_or_init(|| {
        Regex::new(r"^([A-Za-zµ]+)(-?\d+)$").expect("shorthand pattern is valid")
    })
}

impl UnitRegistry {
    /// Normalize unit text without resolving it
    pub fn normalize(&self, text: &str) -> String {
        let trimmed = text.trim();
        if trimmed.is_empty() || self.is_registered(trimmed) {
            return trimmed.to_string();
        }

        let mut expression = trimmed.replace('^', "**");
        if let Some(alias) = self.tables().units.deprecated_aliases.get(&expression) {
            expression = alias.clone();
            if self.is_registered(&expression) {
                return expression;
            }
        }

        let factors = match split_factors(&expression) {
            Ok(factors) => factors,
            Err(_) => return expression,
        };

        let mut repaired = Vec::with_capacity(factors.len());
        for factor in factors {
            for corrected in self.correct_factor(factor) {
                repaired.push(self.expand_shorthand(corrected));
            }
        }
        join_factors(&repaired)
    }

    fn correct_factor(&self, factor: Factor) -> Vec<Factor> {
        let Some(replacement) = self.tables().units.corrections.get(&factor.base) else {
            return vec![factor];
        };
        match split_factors(replacement) {
            Ok(parts) => parts
                .into_iter()
                .map(|part| Factor {
                    op: match factor.op {
                        Operator::Mul => part.op,
                        Operator::Div => part.op.flipped(),
                    },
                    base: part.base,
                    exponent: part.exponent * factor.exponent,
                })
                .collect(),
            Err(_) => vec![factor],
        }
    }

    fn expand_shorthand(&self, factor: Factor) -> Factor {
        if factor.exponent != 1
            || self.is_known(&factor.base)
            || self.tables().units.chemical_formulas.contains(&factor.base)
        {
            return factor;
        }
        let Some(captures) = shorthand_regex().captures(&factor.base) else {
            return factor;
        };
        let alpha = &captures[1];
        match captures[2].parse::<i32>() {
            Ok(exponent) if self.is_known(alpha) => Factor {
                op: factor.op,
                base: alpha.to_string(),
                exponent,
            },
            _ => factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcabridge_tables::ConversionTables;
    use std::sync::Arc;

    fn registry() -> UnitRegistry {
        UnitRegistry::new(Arc::new(ConversionTables::builtin().unwrap())).unwrap()
    }

    #[test]
    fn test_split_and_join() {
        let factors = split_factors("kg * m^2 / s**3").unwrap();
        assert_eq!(factors.len(), 3);
        assert_eq!(factors[1].exponent, 2);
        assert_eq!(factors[2].op, Operator::Div);
        assert_eq!(join_factors(&factors), "kg*m**2/s**3");
    }

    #[test]
    fn test_split_rejects_empty_factor() {
        assert!(split_factors("kg*").is_err());
        assert!(split_factors("m**x").is_err());
    }

    #[test]
    fn test_exponent_shorthand() {
        let registry = registry();
        assert_eq!(registry.normalize("N2"), "N**2");
        assert_eq!(registry.normalize("km3"), "km**3");
        assert_eq!(registry.normalize("s-1"), "s**-1");
    }

    #[test]
    fn test_chemical_formula_is_not_expanded() {
        let registry = registry();
        assert_eq!(registry.normalize("NH3"), "NH3");
        assert_eq!(registry.normalize("CO2"), "CO2");
    }

    #[test]
    fn test_corrections_and_aliases() {
        let registry = registry();
        assert_eq!(registry.normalize("metric ton"), "t");
        assert_eq!(registry.normalize("tkm"), "t*km");
        assert_eq!(registry.normalize("kg/kilometer"), "kg/km");
        assert_eq!(registry.normalize("kg/vehicle-km"), "kg/vehicle/km");
        assert_eq!(registry.normalize("m2a"), "m2*a");
    }

    #[test]
    fn test_canonical_names_are_unchanged() {
        let registry = registry();
        for name in ["kg", "MJ", "m2", "t*km", "m2*a", "Item(s)", "guest night"] {
            assert_eq!(registry.normalize(name), name);
        }
    }
}
