//! # Constants
//!
//! Shared constants used throughout the crate.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default number of attempts (first attempt included) before giving up
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 6;

/// Default delay before the first retry (milliseconds)
pub const DEFAULT_RETRY_INITIAL_INTERVAL_MS: u64 = 1000;

/// Default growth factor applied to the delay after each retry
pub const DEFAULT_RETRY_MULTIPLIER: f64 = 1.1;

/// Default cap on the delay between two attempts (milliseconds)
pub const DEFAULT_RETRY_MAX_INTERVAL_MS: u64 = 2000;

/// Default jitter ratio; each delay is shortened by a random fraction up to this value
pub const DEFAULT_RETRY_JITTER: f64 = 0.1;

/// Source name used when neither configuration nor `APP_NAME` provides one
pub const DEFAULT_SOURCE_NAME: &str = "application";

/// Environment variable holding the application name (default source name)
pub const APP_NAME_ENV: &str = "APP_NAME";

/// Environment variable holding a comma separated list of active profiles
pub const ACTIVE_PROFILES_ENV: &str = "ACTIVE_PROFILES";

/// Environment variable consulted when a source namespace is empty
pub const NAMESPACE_ENV: &str = "KUBERNETES_NAMESPACE";

/// Service account namespace file mounted into every pod
pub const SERVICE_ACCOUNT_NAMESPACE_PATH: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// Environment variable prefix for ConfigMap source settings
pub const CONFIGMAP_ENV_PREFIX: &str = "CONFIGMAP_";

/// Environment variable prefix for Secret source settings
pub const SECRETS_ENV_PREFIX: &str = "SECRETS_";

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "kube_property_sources=info";
