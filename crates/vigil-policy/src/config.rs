//! Evaluator options and configuration loading.
//!
//! Sources, lowest priority first:
//! 1. Defaults
//! 2. TOML file (`vigil.toml` unless a path is given)
//! 3. Environment variables - `VIGIL__*` pattern, e.g. `VIGIL__EVALUATOR__FAST_REJECT=false`

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use vigil_core::GROUP_PUBLIC;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config build error: {0}")]
    Build(#[from] config::ConfigError),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VigilConfig {
    #[serde(default)]
    pub evaluator: EvaluatorOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Options applied when building a policy evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorOptions {
    /// Reject requests from the aggregates before calling the structural matcher.
    /// When disabled every request goes straight to the matcher.
    pub fast_reject: bool,

    /// Custom conditions are not evaluated, so they do not lower a policy's priority.
    pub disable_custom_conditions: bool,

    /// Group every user belongs to.
    pub public_group: String,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            fast_reject: true,
            disable_custom_conditions: false,
            public_group: GROUP_PUBLIC.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl VigilConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.evaluator.public_group.trim().is_empty() {
            return Err(ConfigError::Validation(
                "evaluator.public_group must not be empty".into(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Validation(
                "logging.level must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from an optional TOML file plus `VIGIL__*` environment overrides.
///
/// A missing file is not an error; defaults apply.
pub fn load_config(path: Option<&str>) -> Result<VigilConfig, ConfigError> {
    let path = PathBuf::from(path.unwrap_or("vigil.toml"));

    let mut builder = Config::builder();
    if path.exists() {
        builder = builder.add_source(File::from(path));
    }
    builder = builder.add_source(
        Environment::with_prefix("VIGIL")
            .try_parsing(true)
            .separator("__"),
    );

    let merged: VigilConfig = builder.build()?.try_deserialize()?;
    merged.validate()?;

    tracing::debug!(?merged, "loaded configuration");
    Ok(merged)
}

pub fn load_config_with_default_path<P: AsRef<Path>>(
    path: Option<P>,
) -> Result<VigilConfig, ConfigError> {
    let p = path
        .as_ref()
        .map(|p| p.as_ref().to_string_lossy().to_string());
    load_config(p.as_deref())
}
