//! # Logging
//!
//! Tracing subscriber setup.
//!
//! `RUST_LOG` controls filtering (default `kube_property_sources=info`);
//! `LOG_FORMAT=json` switches to JSON lines, anything else gives plain text.

use crate::config::env_var_or_default_str;
use crate::constants::DEFAULT_LOG_FILTER;
use tracing_subscriber::EnvFilter;

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Text,
}

impl LogFormat {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    /// Read `LOG_FORMAT` from the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::parse(&env_var_or_default_str("LOG_FORMAT", "text"))
    }
}

/// Install the global tracing subscriber
///
/// Returns false when a subscriber was already installed (e.g. by an embedding host).
pub fn init_tracing(format: LogFormat) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    result.is_ok()
}
