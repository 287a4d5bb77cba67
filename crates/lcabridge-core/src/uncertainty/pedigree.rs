//! Pedigree matrix scores and their ln-variance contributions
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use lcabridge_tables::PedigreeTable;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Five data-quality scores, each 1 (best) to 5 (worst)
///
/// Order: reliability, completeness, temporal correlation, geographical
/// correlation, further technological correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u8; 5]", into = "[u8; 5]")]
pub struct PedigreeMatrix {
    scores: [u8; 5],
}

/// Result of comparing pedigree contributions with a supplied total
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PedigreeCheck {
    Consistent,
    Mismatch { expected: f64, supplied: f64 },
}

/// Pedigree information recovered from a structured comment
#[derive(Debug, Clone, PartialEq)]
pub struct PedigreeComment {
    pub matrix: PedigreeMatrix,
    pub basic_variance: Option<f64>,
    pub total_variance: Option<f64>,
}

impl PedigreeMatrix {
    pub fn new(scores: [u8; 5]) -> Result<Self> {
        if let Some(bad) = scores.iter().find(|score| !(1..=5).contains(*score)) {
            return Err(Error::uncertainty_shape(
                "pedigree",
                format!("score {} is outside 1..=5 in {:?}", bad, scores),
            ));
        }
        Ok(Self { scores })
    }

    pub fn scores(&self) -> [u8; 5] {
        self.scores
    }

    /// Sum of the per-indicator ln-variance contributions
    pub fn variance_contribution(&self, table: &PedigreeTable) -> f64 {
        table
            .indicators
            .rows()
            .iter()
            .zip(self.scores.iter())
            .map(|((_, row), score)| row[usize::from(*score) - 1])
            .sum()
    }

    /// Compare `basic + contribution` with the supplied total variance
    pub fn check(
        &self,
        table: &PedigreeTable,
        basic_variance: f64,
        total_variance: f64,
        tolerance: f64,
    ) -> PedigreeCheck {
        let expected = basic_variance + self.variance_contribution(table);
        if (expected - total_variance).abs() <= tolerance {
            PedigreeCheck::Consistent
        } else {
            PedigreeCheck::Mismatch {
                expected,
                supplied: total_variance,
            }
        }
    }

    /// Structured comment embedding the scores and variances
    pub fn to_comment(&self, basic_variance: Option<f64>, total_variance: Option<f64>) -> String {
        let mut comment = format!("Pedigree matrix: {}", self);
        if let Some(basic) = basic_variance {
            comment.push_str(&format!("; basic variance: {}", basic));
        }
        if let Some(total) = total_variance {
            comment.push_str(&format!("; variance with pedigree uncertainty: {}", total));
        }
        comment
    }

    /// Find a structured pedigree comment anywhere in `text`
    pub fn parse_comment(text: &str) -> Option<PedigreeComment> {
        let captures = comment_regex().captures(text)?;
        let mut scores = [0u8; 5];
        for (i, score) in scores.iter_mut().enumerate() {
            *score = captures.get(i + 1)?.as_str().parse().ok()?;
        }
        let number = |group: usize| {
            captures
                .get(group)
                .and_then(|m| m.as_str().parse::<f64>().ok())
        };
        Some(PedigreeComment {
            matrix: Self::new(scores).ok()?,
            basic_variance: number(6),
            total_variance: number(7),
        })
    }
}

impl fmt::Display for PedigreeMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, c, t, g, tech] = self.scores;
        write!(f, "({},{},{},{},{})", r, c, t, g, tech)
    }
}

impl TryFrom<[u8; 5]> for PedigreeMatrix {
    type Error = Error;

    fn try_from(scores: [u8; 5]) -> Result<Self> {
        Self::new(scores)
    }
}

impl From<PedigreeMatrix> for [u8; 5] {
    fn from(matrix: PedigreeMatrix) -> Self {
        matrix.scores
    }
}

fn comment_regex() -> &'static Regex {
    static COMMENT: OnceLock<Regex> = OnceLock::new();
    COMMENT.get_or_init(|| {
        Regex::new(
            r"Pedigree matrix: \((\d),\s*(\d),\s*(\d),\s*(\d),\s*(\d)\)(?:; basic variance: ([-+0-9.eE]+))?(?:; variance with pedigree uncertainty: ([-+0-9.eE]+))?",
        )
        .expect("pedigree comment pattern is valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcabridge_tables::ConversionTables;

    fn table() -> PedigreeTable {
        ConversionTables::builtin().unwrap().pedigree
    }

    #[test]
    fn test_contribution_lookup() {
        let matrix = PedigreeMatrix::new([4, 3, 1, 3, 4]).unwrap();
        assert!((matrix.variance_contribution(&table()) - 0.0487).abs() < 1e-12);

        let best = PedigreeMatrix::new([1, 1, 1, 1, 1]).unwrap();
        assert_eq!(best.variance_contribution(&table()), 0.0);
    }

    #[test]
    fn test_score_range_enforced() {
        assert!(PedigreeMatrix::new([0, 1, 1, 1, 1]).is_err());
        assert!(PedigreeMatrix::new([1, 1, 1, 1, 6]).is_err());
    }

    #[test]
    fn test_check_tolerance() {
        let matrix = PedigreeMatrix::new([4, 3, 1, 3, 4]).unwrap();
        let table = table();
        assert_eq!(
            matrix.check(&table, 0.0006, 0.0493, 1e-6),
            PedigreeCheck::Consistent
        );
        assert!(matches!(
            matrix.check(&table, 0.0006, 0.06, 1e-6),
            PedigreeCheck::Mismatch { .. }
        ));
    }

    #[test]
    fn test_comment_round_trip() {
        let matrix = PedigreeMatrix::new([2, 3, 1, 5, 4]).unwrap();
        let comment = matrix.to_comment(Some(0.0006), Some(0.0493));
        assert_eq!(
            comment,
            "Pedigree matrix: (2,3,1,5,4); basic variance: 0.0006; variance with pedigree uncertainty: 0.0493"
        );
        let parsed = PedigreeMatrix::parse_comment(&format!("Measured on site. {}", comment)).unwrap();
        assert_eq!(parsed.matrix, matrix);
        assert_eq!(parsed.basic_variance, Some(0.0006));
        assert_eq!(parsed.total_variance, Some(0.0493));
    }

    #[test]
    fn test_comment_without_template() {
        assert!(PedigreeMatrix::parse_comment("estimated from literature").is_none());
    }
}
