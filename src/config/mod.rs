//! # Configuration
//!
//! Settings for ConfigMap and Secret sources.
//!
//! Settings come either from environment variables (`CONFIGMAP_*`, `SECRETS_*`),
//! following the same conventions as the rest of our tooling, or from a YAML file:
//!
//! ```yaml
//! configMaps:
//!   name: my-app
//!   failFast: true
//! secrets:
//!   enabled: false
//! ```

mod retry;
mod sources;

pub use retry::RetryConfig;
pub use sources::{SourceEntry, SourcesConfig};

use crate::constants::{CONFIGMAP_ENV_PREFIX, SECRETS_ENV_PREFIX};
use crate::error::ConfigError;
use crate::source::SourceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Complete configuration: one section per source kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub config_maps: SourcesConfig,
    pub secrets: SourcesConfig,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            config_maps: SourcesConfig::from_env(CONFIGMAP_ENV_PREFIX),
            secrets: SourcesConfig::from_env(SECRETS_ENV_PREFIX),
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid YAML and any validation error.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`AppConfig::from_yaml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// # Errors
    ///
    /// Returns the first invalid setting of either section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config_maps.validate()?;
        self.secrets.validate()
    }

    /// Section for `kind`
    #[must_use]
    pub fn for_kind(&self, kind: SourceKind) -> &SourcesConfig {
        match kind {
            SourceKind::ConfigMap => &self.config_maps,
            SourceKind::Secret => &self.secrets,
        }
    }
}

/// Parse `k=v,k2=v2` into a label map, ignoring malformed pairs
#[must_use]
pub fn parse_labels(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as boolean or return default
pub(crate) fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read environment variable as string or return default
pub(crate) fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
