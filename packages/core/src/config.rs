//! Engine configuration
//!
//! Everything has a working default; `from_env` overrides individual fields
//! from `SINOPTICO_*` variables.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_AUDIT_ENABLED: &str = "SINOPTICO_AUDIT_ENABLED";
pub const ENV_ENFORCE_KIND_RULES: &str = "SINOPTICO_ENFORCE_KIND_RULES";
pub const ENV_LOG: &str = "SINOPTICO_LOG";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} (expected true/false)")]
    InvalidBool { key: String, value: String },

    #[error("Log filter must not be empty")]
    EmptyLogFilter,
}

/// Configuration for the hierarchy services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinopticoConfig {
    /// Write audit records for create/update/delete
    pub audit_enabled: bool,

    /// Reject illegal parent/child kind combinations
    /// (e.g. a supply with children, a product under anything)
    pub enforce_kind_rules: bool,

    /// Fallback `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for SinopticoConfig {
    fn default() -> Self {
        Self {
            audit_enabled: true,
            enforce_kind_rules: true,
            log_filter: "info".to_string(),
        }
    }
}

impl SinopticoConfig {
    /// Defaults overridden by process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_AUDIT_ENABLED) {
            config.audit_enabled = parse_bool(ENV_AUDIT_ENABLED, &value)?;
        }
        if let Some(value) = lookup(ENV_ENFORCE_KIND_RULES) {
            config.enforce_kind_rules = parse_bool(ENV_ENFORCE_KIND_RULES, &value)?;
        }
        if let Some(value) = lookup(ENV_LOG) {
            config.log_filter = value;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::EmptyLogFilter);
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
