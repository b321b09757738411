//! Scoring settings and externally supplied program descriptors.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    engine::{dupes::TimeComparison, registry::Registry},
    handlers::activity::{ActivityDescriptor, ActivityScoringPolicy},
};

/// Errors raised while loading or validating scoring configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a config file failed.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    /// Config JSON did not parse.
    #[error("config json error: {0}")]
    Json(#[from] serde_json::Error),
    /// A descriptor failed validation.
    #[error("invalid descriptor `{key}`: {reason}")]
    InvalidDescriptor {
        /// Offending descriptor key.
        key: String,
        /// What was wrong.
        reason: String,
    },
}

/// User-level settings consulted during handler resolution and scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Entity prefix whose subdivisions the primary subdivision award counts.
    pub primary_country: String,
    /// Entity prefix whose subdivisions the secondary subdivision award counts.
    pub secondary_country: String,
    /// Enables hunting handlers for programs the operation is not activating.
    pub general_hunting: bool,
    /// Handler keys excluded from general hunting.
    pub disabled_hunting: Vec<String>,
    /// Time comparison used by the default handler's near-dupe check.
    pub default_time_comparison: TimeComparison,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            primary_country: "K".to_string(),
            secondary_country: "VE".to_string(),
            general_hunting: true,
            disabled_hunting: Vec::new(),
            default_time_comparison: TimeComparison::Inclusive,
        }
    }
}

impl Settings {
    /// True when general hunting is on and not disabled for `key`.
    pub fn hunting_enabled_for(&self, key: &str) -> bool {
        self.general_hunting && !self.disabled_hunting.iter().any(|k| k == key)
    }
}

/// Settings plus the activity programs to register.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// User settings.
    pub settings: Settings,
    /// Declarative activity programs.
    pub activities: Vec<ActivityDescriptor>,
}

impl ScoringConfig {
    /// Parses config from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Validates every descriptor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for descriptor in &self.activities {
            descriptor.validate()?;
        }
        Ok(())
    }

    /// Registry with built-in handlers plus one policy per descriptor.
    pub fn build_registry(&self) -> Result<Registry, ConfigError> {
        let mut registry = Registry::with_builtins();
        for descriptor in &self.activities {
            let policy = ActivityScoringPolicy::from_descriptor(descriptor.clone())?;
            registry.register_activity(policy);
        }
        Ok(registry)
    }
}
