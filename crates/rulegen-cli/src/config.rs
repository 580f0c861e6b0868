//! # CLI Configuration
//!
//! Optional YAML file passed with `--config`:
//!
//! ```yaml
//! validation:
//!   on_invalid: blocking
//! output:
//!   trailing_newline: true
//! ```
//!
//! Every key is optional. Unknown keys are rejected so a typo does not
//! silently fall back to a default. Command-line flags override the file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// What `generate` does when the finished document fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Write the document anyway, then report the violations and fail.
    #[default]
    Advisory,
    /// Report the violations and fail without writing.
    Blocking,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulegenConfig {
    pub validation: ValidationSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationSettings {
    pub on_invalid: ValidationPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    /// End written documents with a newline.
    pub trailing_newline: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            trailing_newline: true,
        }
    }
}

impl RulegenConfig {
    /// Load the configuration file, or the defaults when none is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("invalid config: {}", path.display()))?;
        tracing::debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    /// Parse configuration text. Empty text yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}
