//! Engine configuration
//!
//! Configuration is plain serde data loaded from YAML or JSON through the
//! tables crate's format-detecting parser, with a small set of environment
//! overrides applied on top.
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result, StrictMode};
use crate::identifier::IdentifierKey;
use lcabridge_tables::{parse_content, parse_file, Format};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding `strict_mode` (`strict` or `warn`)
pub const ENV_STRICT_MODE: &str = "LCABRIDGE_STRICT_MODE";

/// Environment variable overriding `pedigree_tolerance`
pub const ENV_PEDIGREE_TOLERANCE: &str = "LCABRIDGE_PEDIGREE_TOLERANCE";

/// Settings for one conversion session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Handling of malformed uncertainty records
    pub strict_mode: StrictMode,

    /// Largest accepted difference between pedigree and supplied variance
    pub pedigree_tolerance: f64,

    /// Prefix of generated names for anonymous variables
    pub anonymous_variable_prefix: String,

    /// Prefix of generated unit conversion ratio variables
    pub unit_conversion_variable_prefix: String,

    /// Name of the unit conversion pseudo-call in formulas
    pub unit_conversion_marker: String,

    /// Name of the cross-reference pseudo-call in formulas
    pub reference_marker: String,

    /// 16-character ASCII key replacing the built-in identifier key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_key: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_mode: StrictMode::Warn,
            pedigree_tolerance: 1e-6,
            anonymous_variable_prefix: "var_".to_string(),
            unit_conversion_variable_prefix: "unit_conversion".to_string(),
            unit_conversion_marker: "UnitConversion".to_string(),
            reference_marker: "Ref".to_string(),
            identifier_key: None,
        }
    }
}

impl EngineConfig {
    /// Load and validate configuration from a `.yaml`, `.yml` or `.json` file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Self = parse_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_content(content: &str, format: Format) -> Result<Self> {
        let config: Self = parse_content(content, format, Path::new("<config>"))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `LCABRIDGE_STRICT_MODE` and `LCABRIDGE_PEDIGREE_TOLERANCE`
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with(|name| std::env::var(name).ok())
    }

    fn merge_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ENV_STRICT_MODE) {
            self.strict_mode = match mode.trim().to_ascii_lowercase().as_str() {
                "strict" => StrictMode::Strict,
                "warn" => StrictMode::Warn,
                other => {
                    return Err(Error::configuration(format!(
                        "{} must be 'strict' or 'warn', got '{}'",
                        ENV_STRICT_MODE, other
                    )))
                }
            };
        }
        if let Some(tolerance) = lookup(ENV_PEDIGREE_TOLERANCE) {
            self.pedigree_tolerance = tolerance.trim().parse().map_err(|e| Error::Configuration {
                message: format!("{} is not a number: '{}'", ENV_PEDIGREE_TOLERANCE, tolerance),
                source: Some(anyhow::Error::new(e)),
            })?;
        }
        self.validate()
    }

    /// Check value ranges and names
    pub fn validate(&self) -> Result<()> {
        if !(self.pedigree_tolerance.is_finite() && self.pedigree_tolerance >= 0.0) {
            return Err(Error::configuration(format!(
                "pedigree_tolerance must be a non-negative number, got {}",
                self.pedigree_tolerance
            )));
        }
        for (setting, value) in [
            ("anonymous_variable_prefix", &self.anonymous_variable_prefix),
            ("unit_conversion_variable_prefix", &self.unit_conversion_variable_prefix),
            ("unit_conversion_marker", &self.unit_conversion_marker),
            ("reference_marker", &self.reference_marker),
        ] {
            if !is_identifier(value) {
                return Err(Error::configuration(format!(
                    "{} must be a formula identifier, got '{}'",
                    setting, value
                )));
            }
        }
        self.identifier_key().map(|_| ())
    }

    /// The configured identifier key, or the built-in one
    pub fn identifier_key(&self) -> Result<IdentifierKey> {
        match &self.identifier_key {
            Some(text) => IdentifierKey::from_text(text),
            None => Ok(IdentifierKey::default()),
        }
    }
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Builder for creating configurations programmatically
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict_mode(mut self, mode: StrictMode) -> Self {
        self.config.strict_mode = mode;
        self
    }

    pub fn pedigree_tolerance(mut self, tolerance: f64) -> Self {
        self.config.pedigree_tolerance = tolerance;
        self
    }

    pub fn anonymous_variable_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.anonymous_variable_prefix = prefix.into();
        self
    }

    pub fn identifier_key(mut self, key: impl Into<String>) -> Self {
        self.config.identifier_key = Some(key.into());
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
