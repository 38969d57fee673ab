//! # Errors
//!
//! Error taxonomy for locating property sources.
//!
//! - [`TransportError`] - network / API failure that does not mean "object absent"; retryable
//! - [`MappingError`] - the object exists but its payload cannot be turned into properties; never retried
//! - [`LocateError`] - what a locator returns, wrapping the above plus not-found and retry exhaustion
//! - [`ConfigError`] - invalid or unreadable configuration

use crate::source::SourceKind;
use std::path::PathBuf;
use thiserror::Error;

/// Transient failure talking to the cluster API
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    status: Option<u16>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Attach the HTTP status code returned by the API server
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// HTTP status code, when the failure came from an API response
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

impl From<kube::Error> for TransportError {
    fn from(error: kube::Error) -> Self {
        let status = match &error {
            kube::Error::Api(response) => Some(response.code),
            _ => None,
        };
        Self {
            message: error.to_string(),
            status,
            source: Some(Box::new(error)),
        }
    }
}

/// Payload of an existing object that cannot be converted to properties
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("{kind} '{object}' entry '{key}' is not valid UTF-8")]
    InvalidUtf8 {
        kind: SourceKind,
        object: String,
        key: String,
    },
    #[error("{kind} '{object}' entry '{key}' could not be parsed: {reason}")]
    MalformedFile {
        kind: SourceKind,
        object: String,
        key: String,
        reason: String,
    },
}

/// Failure of a single `locate` call
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("Failed to read {kind} with name '{name}' in namespace '{namespace}': {source}")]
    Transport {
        kind: SourceKind,
        name: String,
        namespace: String,
        #[source]
        source: TransportError,
    },
    #[error("{kind} with name '{name}' in namespace '{namespace}' not found")]
    SourceNotFound {
        kind: SourceKind,
        name: String,
        namespace: String,
    },
    #[error("Unable to map {kind} with name '{name}' in namespace '{namespace}': {source}")]
    Mapping {
        kind: SourceKind,
        name: String,
        namespace: String,
        #[source]
        source: MappingError,
    },
    #[error("Unable to read {kind} with name '{name}' in namespace '{namespace}'")]
    RetryExhausted {
        kind: SourceKind,
        name: String,
        namespace: String,
        attempts: u32,
        #[source]
        last_error: Box<LocateError>,
    },
    #[error("Invalid {kind} source in namespace '{namespace}': {reason}")]
    InvalidSource {
        kind: SourceKind,
        namespace: String,
        reason: String,
    },
}

impl LocateError {
    /// Only transport failures are worth another attempt
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, LocateError::Transport { .. })
    }

    /// Short label used for metrics and structured logs
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            LocateError::Transport { .. } => "transport",
            LocateError::SourceNotFound { .. } => "not-found",
            LocateError::Mapping { .. } => "mapping",
            LocateError::RetryExhausted { .. } => "retry-exhausted",
            LocateError::InvalidSource { .. } => "invalid-source",
        }
    }

    /// Kind, name and namespace of the object the failure is about
    #[must_use]
    pub fn object(&self) -> Option<(SourceKind, &str, &str)> {
        match self {
            LocateError::Transport {
                kind,
                name,
                namespace,
                ..
            }
            | LocateError::SourceNotFound {
                kind,
                name,
                namespace,
            }
            | LocateError::Mapping {
                kind,
                name,
                namespace,
                ..
            }
            | LocateError::RetryExhausted {
                kind,
                name,
                namespace,
                ..
            } => Some((*kind, name.as_str(), namespace.as_str())),
            LocateError::InvalidSource { .. } => None,
        }
    }
}

/// Invalid or unreadable configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid retry configuration: {0}")]
    InvalidRetry(String),
    #[error(
        "Namespace could not be resolved: set it explicitly, export KUBERNETES_NAMESPACE or run inside a pod"
    )]
    NamespaceUnresolved,
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}
