//! # Sources Configuration
//!
//! Declarative settings for ConfigMap or Secret sources and their conversion
//! into [`NormalizedSource`] values.
//!
//! ```yaml
//! name: my-app
//! namespace: default
//! failFast: true
//! prefix: ""
//! includeProfileSpecificSources: true
//! sources:
//!   - name: shared
//!     prefix: "shared."
//!   - labels:
//!       app: my-app
//! retry:
//!   maxAttempts: 5
//! ```

use crate::config::{
    env_var_or_default_bool, env_var_or_default_str, parse_labels, RetryConfig,
};
use crate::constants::{APP_NAME_ENV, DEFAULT_SOURCE_NAME};
use crate::error::ConfigError;
use crate::namespace::NamespaceResolver;
use crate::source::{LabeledSource, NamedSource, NormalizedSource, SourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// One explicit entry of `sources`; unset fields inherit the top-level values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceEntry {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub include_profile_specific_sources: Option<bool>,
}

/// Settings for every source of one kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourcesConfig {
    pub enabled: bool,
    /// Default object name; falls back to `APP_NAME`, then `application`
    pub name: Option<String>,
    /// Default namespace; empty means "resolve from the environment"
    pub namespace: String,
    pub fail_fast: bool,
    pub prefix: String,
    pub include_profile_specific_sources: bool,
    /// Label selector used when no explicit `sources` are given
    pub labels: BTreeMap<String, String>,
    pub sources: Vec<SourceEntry>,
    pub retry: RetryConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: None,
            namespace: String::new(),
            fail_fast: false,
            prefix: String::new(),
            include_profile_specific_sources: true,
            labels: BTreeMap::new(),
            sources: Vec::new(),
            retry: RetryConfig::default(),
        }
    }
}

impl SourcesConfig {
    /// Load from `<prefix>*` environment variables (e.g. `CONFIGMAP_NAME`)
    #[must_use]
    pub fn from_env(prefix: &str) -> Self {
        let name = std::env::var(format!("{prefix}NAME"))
            .ok()
            .filter(|name| !name.is_empty());
        Self {
            enabled: env_var_or_default_bool(&format!("{prefix}ENABLED"), true),
            name,
            namespace: env_var_or_default_str(&format!("{prefix}NAMESPACE"), ""),
            fail_fast: env_var_or_default_bool(&format!("{prefix}FAIL_FAST"), false),
            prefix: env_var_or_default_str(&format!("{prefix}PREFIX"), ""),
            include_profile_specific_sources: env_var_or_default_bool(
                &format!("{prefix}INCLUDE_PROFILE_SPECIFIC_SOURCES"),
                true,
            ),
            labels: parse_labels(&env_var_or_default_str(&format!("{prefix}LABELS"), "")),
            sources: Vec::new(),
            retry: RetryConfig::from_env(prefix),
        }
    }

    /// # Errors
    ///
    /// Returns the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retry.validate()
    }

    /// Object name used when neither the entry nor the top level sets one
    #[must_use]
    pub fn default_name(&self) -> String {
        self.name
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| std::env::var(APP_NAME_ENV).ok().filter(|name| !name.is_empty()))
            .unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_string())
    }

    /// Turn the settings into the list of sources to locate, in precedence order
    ///
    /// Without explicit `sources`, one named source is built from the top level
    /// (plus a labeled source when top-level `labels` are set). Each explicit
    /// entry becomes a named source when it has a name, a labeled source when it
    /// only has labels, and is skipped otherwise. Duplicates keep the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NamespaceUnresolved`] when a source has no namespace
    /// and none can be derived from the environment.
    pub fn determine_sources(
        &self,
        kind: SourceKind,
        resolver: &NamespaceResolver,
    ) -> Result<Vec<NormalizedSource>, ConfigError> {
        let mut result: Vec<NormalizedSource> = Vec::new();

        if self.sources.is_empty() {
            let namespace = resolver.resolve(&self.namespace)?;
            result.push(NormalizedSource::Named(
                NamedSource::new(kind, self.default_name(), namespace.clone())
                    .with_prefix(self.prefix.clone())
                    .with_fail_fast(self.fail_fast)
                    .with_profile_specific_sources(self.include_profile_specific_sources),
            ));
            if !self.labels.is_empty() {
                result.push(NormalizedSource::Labeled(
                    LabeledSource::new(kind, namespace, self.labels.clone())
                        .with_fail_fast(self.fail_fast),
                ));
            }
            return Ok(result);
        }

        for entry in &self.sources {
            let namespace = resolver.resolve(entry.namespace.as_deref().unwrap_or(&self.namespace))?;
            let source = match entry.name.as_deref().filter(|name| !name.is_empty()) {
                Some(name) => NormalizedSource::Named(
                    NamedSource::new(kind, name, namespace)
                        .with_prefix(entry.prefix.clone().unwrap_or_else(|| self.prefix.clone()))
                        .with_fail_fast(self.fail_fast)
                        .with_profile_specific_sources(
                            entry
                                .include_profile_specific_sources
                                .unwrap_or(self.include_profile_specific_sources),
                        ),
                ),
                None if !entry.labels.is_empty() => NormalizedSource::Labeled(
                    LabeledSource::new(kind, namespace, entry.labels.clone())
                        .with_fail_fast(self.fail_fast),
                ),
                None => {
                    warn!(
                        kind = kind.as_str(),
                        "Skipping source entry with neither a name nor labels"
                    );
                    continue;
                }
            };
            if !result.contains(&source) {
                result.push(source);
            }
        }

        Ok(result)
    }
}
