//! Engine configuration
//!
//! Controls how strictly rule strings are parsed and how the combiner
//! builds composite rule strings. Deserializable from JSON so hosts can
//! ship it alongside their other settings.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How strictly the parser treats closing parentheses and trailing tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Closing token must be `)`, leftover tokens are rejected
    #[default]
    Strict,
    /// Closing token is consumed unchecked, leftover tokens are ignored
    Lenient,
}

/// How the combiner joins existing rule strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineStyle {
    /// Left-associative, fully parenthesized binary chain
    #[default]
    Chained,
    /// `" " + OP + " ".join("(rule)")`, kept byte-compatible with old stored rules
    Legacy,
}

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub parse_mode: ParseMode,
    pub combine_style: CombineStyle,
}

impl EngineConfig {
    /// Parse a configuration from JSON; missing keys fall back to defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Configuration reproducing the permissive parsing and combining of previously stored rules
    pub fn legacy() -> Self {
        Self {
            parse_mode: ParseMode::Lenient,
            combine_style: CombineStyle::Legacy,
        }
    }
}
