//! Dimensionality: exponents over named base dimensions
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Exponent per base dimension; zero exponents are never stored
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dimensionality(BTreeMap<String, i32>);

impl Dimensionality {
    /// The empty dimensionality of pure numbers
    pub fn dimensionless() -> Self {
        Self::default()
    }

    /// A single base dimension with exponent 1
    pub fn base(dimension: &str) -> Self {
        Self::from_exponents([(dimension.to_string(), 1)])
    }

    /// Build from `(dimension, exponent)` pairs, summing repeats
    pub fn from_exponents<I>(exponents: I) -> Self
    where
        I: IntoIterator<Item = (String, i32)>,
    {
        let mut map = BTreeMap::new();
        for (dimension, exponent) in exponents {
            *map.entry(dimension).or_insert(0) += exponent;
        }
        map.retain(|_, exponent| *exponent != 0);
        Self(map)
    }

    pub fn exponent(&self, dimension: &str) -> i32 {
        self.0.get(dimension).copied().unwrap_or(0)
    }

    pub fn is_dimensionless(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(dimension, exponent)| (dimension.as_str(), *exponent))
    }

    /// Exponents add
    pub fn mul(&self, other: &Self) -> Self {
        Self::from_exponents(self.owned_pairs().chain(other.owned_pairs()))
    }

    /// Exponents subtract
    pub fn div(&self, other: &Self) -> Self {
        Self::from_exponents(
            self.owned_pairs()
                .chain(other.owned_pairs().map(|(dimension, exponent)| (dimension, -exponent))),
        )
    }

    /// Every exponent multiplied by `power`
    pub fn powi(&self, power: i32) -> Self {
        Self::from_exponents(
            self.owned_pairs()
                .map(|(dimension, exponent)| (dimension, exponent * power)),
        )
    }

    /// Stable textual key, e.g. `[length]^2*[time]^-1`
    ///
    /// Dimensions appear in lexical order, so equal dimensionalities always
    /// produce the same signature.
    pub fn signature(&self) -> String {
        if self.0.is_empty() {
            return "[]".to_string();
        }
        self.0
            .iter()
            .map(|(dimension, exponent)| match exponent {
                1 => format!("[{}]", dimension),
                n => format!("[{}]^{}", dimension, n),
            })
            .collect::<Vec<_>>()
            .join("*")
    }

    fn owned_pairs(&self) -> impl Iterator<Item = (String, i32)> + '_ {
        self.0.iter().map(|(dimension, exponent)| (dimension.clone(), *exponent))
    }
}

impl fmt::Display for Dimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signature())
    }
}

impl From<&BTreeMap<String, i32>> for Dimensionality {
    fn from(map: &BTreeMap<String, i32>) -> Self {
        Self::from_exponents(map.iter().map(|(dimension, exponent)| (dimension.clone(), *exponent)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn energy() -> Dimensionality {
        Dimensionality::from_exponents([
            ("mass".to_string(), 1),
            ("length".to_string(), 2),
            ("time".to_string(), -2),
        ])
    }

    #[test]
    fn test_mul_and_div_cancel() {
        let time = Dimensionality::base("time");
        let power = energy().div(&time);
        assert_eq!(power.exponent("time"), -3);
        assert_eq!(power.mul(&time), energy());
        assert!(energy().div(&energy()).is_dimensionless());
    }

    #[test]
    fn test_zero_exponents_are_dropped() {
        let dims = Dimensionality::from_exponents([
            ("length".to_string(), 1),
            ("length".to_string(), -1),
        ]);
        assert_eq!(dims, Dimensionality::dimensionless());
        assert_eq!(dims.signature(), "[]");
    }

    #[test]
    fn test_signature_is_ordered() {
        assert_eq!(energy().signature(), "[length]^2*[mass]*[time]^-2");
        assert_eq!(Dimensionality::base("length").powi(3).signature(), "[length]^3");
    }
}
