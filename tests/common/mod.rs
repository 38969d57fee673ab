//! Common test utilities for locator integration tests
//!
//! Provides an in-memory [`RemoteClient`] with scripted failures and call
//! counters, plus shared tracing setup.

#![allow(dead_code, reason = "Not every test binary uses every helper")]

use async_trait::async_trait;
use kube_property_sources::client::{RawRemoteObject, RemoteClient};
use kube_property_sources::config::RetryConfig;
use kube_property_sources::error::TransportError;
use kube_property_sources::source::SourceKind;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static TRACING_INIT: Once = Once::new();

/// Install a test subscriber once per test binary
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "kube_property_sources=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Scripted outcome of the next remote call
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    /// Transport failure with the given HTTP status
    Fail(u16),
    Serve,
}

#[derive(Debug, Default)]
struct State {
    objects: Mutex<BTreeMap<(String, String, String), (SourceKind, RawRemoteObject)>>,
    script: Mutex<VecDeque<Outcome>>,
    always_fail: Mutex<Option<u16>>,
    fetch_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

/// In-memory cluster; clones share state so tests can inspect counters after
/// handing a clone to a locator
#[derive(Debug, Clone, Default)]
pub struct FakeRemoteClient {
    state: Arc<State>,
}

impl FakeRemoteClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object; a later object with the same kind, namespace and name replaces it
    pub fn with_object(self, kind: SourceKind, object: RawRemoteObject) -> Self {
        self.insert(kind, object);
        self
    }

    pub fn insert(&self, kind: SourceKind, object: RawRemoteObject) {
        let key = (
            kind.as_str().to_string(),
            object.namespace.clone(),
            object.name.clone(),
        );
        self.state
            .objects
            .lock()
            .unwrap()
            .insert(key, (kind, object));
    }

    /// Fail the next `count` calls with a 503, then serve normally
    pub fn fail_next(self, count: usize) -> Self {
        {
            let mut script = self.state.script.lock().unwrap();
            for _ in 0..count {
                script.push_back(Outcome::Fail(503));
            }
        }
        self
    }

    /// Append an explicit outcome to the per-call script
    pub fn then(self, outcome: Outcome) -> Self {
        self.state.script.lock().unwrap().push_back(outcome);
        self
    }

    /// Fail every call once the script is used up
    pub fn fail_always(self) -> Self {
        *self.state.always_fail.lock().unwrap() = Some(503);
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.state.list_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.fetch_calls() + self.list_calls()
    }

    fn next_outcome(&self) -> Result<(), TransportError> {
        let scripted = self.state.script.lock().unwrap().pop_front();
        let status = match scripted {
            Some(Outcome::Fail(status)) => Some(status),
            Some(Outcome::Serve) => None,
            None => *self.state.always_fail.lock().unwrap(),
        };
        match status {
            Some(status) => Err(TransportError::new("remote call failed").with_status(status)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteClient for FakeRemoteClient {
    async fn fetch_by_name(
        &self,
        kind: SourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<RawRemoteObject>, TransportError> {
        self.state.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.next_outcome()?;
        let key = (
            kind.as_str().to_string(),
            namespace.to_string(),
            name.to_string(),
        );
        Ok(self
            .state
            .objects
            .lock()
            .unwrap()
            .get(&key)
            .map(|(_, object)| object.clone()))
    }

    async fn list_by_label(
        &self,
        kind: SourceKind,
        namespace: &str,
        _selector: &str,
    ) -> Result<Vec<RawRemoteObject>, TransportError> {
        self.state.list_calls.fetch_add(1, Ordering::SeqCst);
        self.next_outcome()?;
        // Label filtering is the API server's job; every object of the kind matches
        Ok(self
            .state
            .objects
            .lock()
            .unwrap()
            .values()
            .filter(|(object_kind, object)| *object_kind == kind && object.namespace == namespace)
            .map(|(_, object)| object.clone())
            .collect())
    }
}

/// Retry policy without jitter so backoff timing is deterministic
pub fn retry_config(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        jitter: 0.0,
        ..RetryConfig::default()
    }
}
