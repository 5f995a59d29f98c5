//! Renderer configuration.

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Input vocabulary. Selects both the dispatch rules and the template set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Flat HTML tags with structural meaning carried by `class`.
    Html,
    /// CNXML+ with dedicated structural tags.
    #[default]
    Cnxml,
}

impl FromStr for Dialect {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" | "xhtml" => Ok(Self::Html),
            "cnxml" | "cnxml+" | "cnxmlplus" => Ok(Self::Cnxml),
            _ => Err(ConfigError::UnknownDialect(s.to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Html => f.write_str("html"),
            Self::Cnxml => f.write_str("cnxml"),
        }
    }
}

/// Where a currency symbol goes relative to its amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyPosition {
    #[default]
    Front,
    Back,
}

impl CurrencyPosition {
    /// Parse an attribute value, falling back to `Front` for anything but `back`.
    pub fn from_attr(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("back") {
            Self::Back
        } else {
            Self::Front
        }
    }
}

/// Numeric formatting policy used by the normalization pass.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NumberPolicy {
    /// Currency decimals when the literal is an integer.
    pub integer_precision: usize,
    /// Currency decimals when the literal has a fractional part.
    pub fractional_precision: usize,
    pub currency_symbol: String,
    pub currency_position: CurrencyPosition,
}

impl Default for NumberPolicy {
    fn default() -> Self {
        Self {
            integer_precision: 0,
            fractional_precision: 2,
            currency_symbol: "R".to_string(),
            currency_position: CurrencyPosition::Front,
        }
    }
}

/// Configuration for LaTeX rendering.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderConfig {
    pub dialect: Dialect,
    /// Wrap the output in the `standalone` template instead of `document`.
    pub standalone: bool,
    /// Maximum element nesting rendered before a node is replaced by the
    /// `error` template.
    pub max_depth: usize,
    /// Fraction of `\textwidth` shared by all columns of a table.
    pub table_width: f64,
    /// Default fraction of `\textwidth` for images.
    pub image_width: f64,
    pub numbers: NumberPolicy,
    /// Template overrides layered over the built-in set, by name.
    pub templates: HashMap<String, String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Cnxml,
            standalone: false,
            max_depth: 256,
            table_width: 0.85,
            image_width: 0.5,
            numbers: NumberPolicy::default(),
            templates: HashMap::new(),
        }
    }
}

impl RenderConfig {
    /// Default configuration for a dialect.
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    /// Load configuration from TOML.
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }
}
