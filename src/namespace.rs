//! # Namespace Resolution
//!
//! Sources may leave their namespace empty. It is then resolved from, in order:
//! 1. the `KUBERNETES_NAMESPACE` environment variable
//! 2. the service account namespace file mounted into the pod

use crate::constants::{NAMESPACE_ENV, SERVICE_ACCOUNT_NAMESPACE_PATH};
use crate::error::ConfigError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves empty namespaces
#[derive(Debug, Clone)]
pub struct NamespaceResolver {
    env_value: Option<String>,
    service_account_path: PathBuf,
}

impl Default for NamespaceResolver {
    fn default() -> Self {
        Self::from_env()
    }
}

impl NamespaceResolver {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            env_value: std::env::var(NAMESPACE_ENV).ok(),
            service_account_path: PathBuf::from(SERVICE_ACCOUNT_NAMESPACE_PATH),
        }
    }

    /// Resolver with explicit inputs, mostly for tests and embedding
    #[must_use]
    pub fn new(env_value: Option<String>, service_account_path: impl AsRef<Path>) -> Self {
        Self {
            env_value,
            service_account_path: service_account_path.as_ref().to_path_buf(),
        }
    }

    /// Return `explicit` when set, otherwise walk the fallback chain
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NamespaceUnresolved`] when nothing yields a namespace.
    pub fn resolve(&self, explicit: &str) -> Result<String, ConfigError> {
        if !explicit.is_empty() {
            return Ok(explicit.to_string());
        }

        if let Some(namespace) = self.env_value.as_deref().map(str::trim) {
            if !namespace.is_empty() {
                debug!(namespace, "Namespace resolved from {}", NAMESPACE_ENV);
                return Ok(namespace.to_string());
            }
        }

        match std::fs::read_to_string(&self.service_account_path) {
            Ok(content) if !content.trim().is_empty() => {
                let namespace = content.trim().to_string();
                debug!(
                    namespace = namespace.as_str(),
                    "Namespace resolved from {}",
                    self.service_account_path.display()
                );
                Ok(namespace)
            }
            _ => Err(ConfigError::NamespaceUnresolved),
        }
    }
}
