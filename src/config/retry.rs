//! # Retry Configuration
//!
//! Budget and timing of the retry decorator.

use crate::backoff::ExponentialBackoff;
use crate::config::{env_var_or_default, env_var_or_default_bool};
use crate::constants::{
    DEFAULT_RETRY_INITIAL_INTERVAL_MS, DEFAULT_RETRY_JITTER, DEFAULT_RETRY_MAX_ATTEMPTS,
    DEFAULT_RETRY_MAX_INTERVAL_MS, DEFAULT_RETRY_MULTIPLIER,
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for one kind of source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    /// When false, a single attempt is made (terminal behaviour is unchanged)
    pub enabled: bool,
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry (milliseconds)
    pub initial_interval_ms: u64,
    /// Growth factor applied after every retry
    pub multiplier: f64,
    /// Upper bound for any delay (milliseconds)
    pub max_interval_ms: u64,
    /// Random fraction in `[0, 1]` removed from each delay
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            initial_interval_ms: DEFAULT_RETRY_INITIAL_INTERVAL_MS,
            multiplier: DEFAULT_RETRY_MULTIPLIER,
            max_interval_ms: DEFAULT_RETRY_MAX_INTERVAL_MS,
            jitter: DEFAULT_RETRY_JITTER,
        }
    }
}

impl RetryConfig {
    /// Load from `<prefix>RETRY_*` environment variables with defaults
    #[must_use]
    pub fn from_env(prefix: &str) -> Self {
        Self {
            enabled: env_var_or_default_bool(&format!("{prefix}RETRY_ENABLED"), true),
            max_attempts: env_var_or_default(
                &format!("{prefix}RETRY_MAX_ATTEMPTS"),
                DEFAULT_RETRY_MAX_ATTEMPTS,
            ),
            initial_interval_ms: env_var_or_default(
                &format!("{prefix}RETRY_INITIAL_INTERVAL_MS"),
                DEFAULT_RETRY_INITIAL_INTERVAL_MS,
            ),
            multiplier: env_var_or_default(
                &format!("{prefix}RETRY_MULTIPLIER"),
                DEFAULT_RETRY_MULTIPLIER,
            ),
            max_interval_ms: env_var_or_default(
                &format!("{prefix}RETRY_MAX_INTERVAL_MS"),
                DEFAULT_RETRY_MAX_INTERVAL_MS,
            ),
            jitter: env_var_or_default(&format!("{prefix}RETRY_JITTER"), DEFAULT_RETRY_JITTER),
        }
    }

    /// Policy that never retries
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRetry`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidRetry(
                "maxAttempts must be at least 1".to_string(),
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::InvalidRetry(format!(
                "multiplier must be >= 1.0, got {}",
                self.multiplier
            )));
        }
        if self.initial_interval_ms > self.max_interval_ms {
            return Err(ConfigError::InvalidRetry(format!(
                "initialIntervalMs ({}) must not exceed maxIntervalMs ({})",
                self.initial_interval_ms, self.max_interval_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::InvalidRetry(format!(
                "jitter must be within [0, 1], got {}",
                self.jitter
            )));
        }
        Ok(())
    }

    /// Number of attempts the decorator will actually make
    #[must_use]
    pub fn effective_max_attempts(&self) -> u32 {
        if self.enabled {
            self.max_attempts.max(1)
        } else {
            1
        }
    }

    #[must_use]
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    #[must_use]
    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    /// Fresh backoff sequence for one `locate` call
    #[must_use]
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self.initial_interval(), self.multiplier, self.max_interval())
            .with_jitter(self.jitter)
    }
}
