//! # Runtime Configuration Module
//!
//! Settings that shape routing and validation, loaded from YAML and/or the environment.
//!
//! ## Environment Variables
//!
//! ### `SWAGR_CUSTOM_PREFIX`
//!
//! Prefix of custom schema keys and placeholder path segments. Default: `is-x-`, giving
//! `is-x-auth`, `is-x-obscure` and segments such as `is-x-integer-petId`.
//!
//! ### `SWAGR_BASE_PATH`
//!
//! Leading path stripped from every request before resolution, e.g. `/api/v1`. Default: empty.
//!
//! ### `SWAGR_PLACEHOLDER_TYPES`
//!
//! Comma-separated placeholder types in priority order. Default: `integer,string`.
//!
//! ### `SWAGR_SIGNATURE_CACHE`
//!
//! `off`, `false` or `0` disables the compiled-signature cache. Default: enabled.
//!
//! ### `SWAGR_LOG_INCOMING`
//!
//! Log the (redacted) incoming request data at debug level. Default: `true`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use swagrouter::runtime_config::RuntimeConfig;
//!
//! // Environment only
//! let config = RuntimeConfig::from_env();
//!
//! // File first, environment on top
//! let config = RuntimeConfig::from_yaml_file("config/router.yaml")?.apply_env_overrides();
//! ```
//!
//! ```yaml
//! custom_prefix: is-x-
//! base_path: /system/webdev/project
//! placeholder_types: [integer, string]
//! signature_cache: true
//! ```

use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::warn;

use crate::spec::SchemaType;

/// Default prefix of custom schema keys.
pub const DEFAULT_CUSTOM_PREFIX: &str = "is-x-";

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub custom_prefix: String,
    pub base_path: String,
    /// Placeholder types in resolution priority order
    pub placeholder_types: Vec<SchemaType>,
    pub signature_cache: bool,
    pub log_incoming_data: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            custom_prefix: DEFAULT_CUSTOM_PREFIX.to_string(),
            base_path: String::new(),
            placeholder_types: vec![SchemaType::Integer, SchemaType::String],
            signature_cache: true,
            log_incoming_data: true,
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by `SWAGR_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().apply_env_overrides()
    }

    /// Load from a YAML file; keys not present keep their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading runtime config {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("parsing runtime config {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Layer environment values on top of this configuration.
    #[must_use]
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(prefix) = env::var("SWAGR_CUSTOM_PREFIX") {
            self.custom_prefix = prefix;
        }
        if let Ok(base) = env::var("SWAGR_BASE_PATH") {
            self.base_path = base;
        }
        if let Ok(types) = env::var("SWAGR_PLACEHOLDER_TYPES") {
            match parse_types(&types) {
                Ok(parsed) if !parsed.is_empty() => self.placeholder_types = parsed,
                _ => warn!(value = %types, "Ignoring invalid SWAGR_PLACEHOLDER_TYPES"),
            }
        }
        if let Ok(cache) = env::var("SWAGR_SIGNATURE_CACHE") {
            self.signature_cache = !is_off(&cache);
        }
        if let Ok(log) = env::var("SWAGR_LOG_INCOMING") {
            self.log_incoming_data = !is_off(&log);
        }
        self
    }
}

fn is_off(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "off" | "false" | "0" | "no"
    )
}

fn parse_types(value: &str) -> Result<Vec<SchemaType>, crate::spec::SchemaError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}
