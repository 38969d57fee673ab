//! # Retryable Locator
//!
//! Decorates any [`PropertySourceLocator`] with a bounded retry policy.
//!
//! ```text
//! ATTEMPTING(n) --ok--------------------------------> DONE
//! ATTEMPTING(n) --transport error, n < max----------> BACKOFF(n) --sleep--> ATTEMPTING(n+1)
//! ATTEMPTING(n) --transport error, n == max---------> EXHAUSTED
//! ATTEMPTING(n) --any other error-------------------> FAILED
//! ```
//!
//! `EXHAUSTED` is fatal ([`LocateError::RetryExhausted`], naming the object
//! whose read failed last) when the target is fail-fast, otherwise it
//! resolves to an empty property source named like a successful locate. `FAILED`
//! always surfaces: mapping errors cannot be fixed by retrying.
//!
//! The wrapped locator is invoked exactly `max_attempts` times at most; the
//! first attempt counts as attempt 1.

use crate::config::RetryConfig;
use crate::environment::Environment;
use crate::error::LocateError;
use crate::locator::{PropertySource, PropertySourceLocator, SourceTarget};
use crate::observability::metrics;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info, warn, Instrument};

/// Per-call retry bookkeeping, dropped when `locate` returns
#[derive(Debug)]
struct RetryState {
    attempt: u32,
    max_attempts: u32,
    next_backoff: Duration,
    backoff: crate::backoff::ExponentialBackoff,
}

#[derive(Debug)]
enum Phase {
    Attempting,
    Backoff(LocateError),
    Done(PropertySource),
    Exhausted(LocateError),
    Failed(LocateError),
}

/// Retry decorator around a [`PropertySourceLocator`]
#[derive(Debug)]
pub struct RetryableLocator<L> {
    inner: L,
    retry: RetryConfig,
}

impl<L: PropertySourceLocator> RetryableLocator<L> {
    #[must_use]
    pub fn new(inner: L, retry: RetryConfig) -> Self {
        Self { inner, retry }
    }

    #[must_use]
    pub fn inner(&self) -> &L {
        &self.inner
    }

    #[must_use]
    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    async fn locate_with_retry(
        &self,
        environment: &dyn Environment,
    ) -> Result<PropertySource, LocateError> {
        let target = self.inner.target();
        let mut state = RetryState {
            attempt: 1,
            max_attempts: self.retry.effective_max_attempts(),
            next_backoff: Duration::ZERO,
            backoff: self.retry.backoff(),
        };
        let mut phase = Phase::Attempting;

        loop {
            phase = match phase {
                Phase::Attempting => {
                    metrics::increment_locate_attempts(target.kind);
                    match self.inner.locate(environment).await {
                        Ok(source) => Phase::Done(source),
                        Err(e) if e.is_retryable() && state.attempt < state.max_attempts => {
                            Phase::Backoff(e)
                        }
                        Err(e) if e.is_retryable() => Phase::Exhausted(e),
                        Err(e) => Phase::Failed(e),
                    }
                }
                Phase::Backoff(last_error) => {
                    state.next_backoff = state.backoff.next_backoff();
                    warn!(
                        attempt = state.attempt,
                        max_attempts = state.max_attempts,
                        error = %last_error,
                        "🔄 Attempt {}/{} failed, retrying in {}ms",
                        state.attempt,
                        state.max_attempts,
                        state.next_backoff.as_millis()
                    );
                    metrics::increment_locate_retries(target.kind);
                    tokio::time::sleep(state.next_backoff).await;
                    state.attempt += 1;
                    Phase::Attempting
                }
                Phase::Done(source) => {
                    if state.attempt > 1 {
                        info!(
                            attempts = state.attempt,
                            "✅ Located {} after {} attempts",
                            target.kind,
                            state.attempt
                        );
                    }
                    return Ok(source);
                }
                Phase::Exhausted(last_error) => {
                    return self.exhausted(last_error, state.attempt);
                }
                Phase::Failed(e) => {
                    error!(
                        attempt = state.attempt,
                        reason = e.reason(),
                        error = %e,
                        "❌ Locating {} failed with a non-retryable error",
                        target.kind
                    );
                    metrics::increment_locate_failures(target.kind, e.reason());
                    return Err(e);
                }
            };
        }
    }

    fn exhausted(
        &self,
        last_error: LocateError,
        attempts: u32,
    ) -> Result<PropertySource, LocateError> {
        let target = self.inner.target();
        metrics::increment_locate_failures(target.kind, "retry-exhausted");
        let (kind, name, namespace) = last_error.object().map_or_else(
            || (target.kind, target.name.clone(), target.namespace.clone()),
            |(kind, name, namespace)| (kind, name.to_string(), namespace.to_string()),
        );

        if target.fail_fast {
            error!(
                kind = kind.as_str(),
                name = name.as_str(),
                namespace = namespace.as_str(),
                attempts,
                error = %last_error,
                "❌ Unable to read {} after {} attempts, fail-fast is enabled",
                kind,
                attempts
            );
            return Err(LocateError::RetryExhausted {
                kind,
                name,
                namespace,
                attempts,
                last_error: Box::new(last_error),
            });
        }

        warn!(
            kind = kind.as_str(),
            name = name.as_str(),
            namespace = namespace.as_str(),
            attempts,
            error = %last_error,
            "⚠️  Unable to read {} after {} attempts, continuing with an empty property source",
            kind,
            attempts
        );
        Ok(PropertySource::empty(self.inner.property_source_name()))
    }
}

#[async_trait]
impl<L: PropertySourceLocator> PropertySourceLocator for RetryableLocator<L> {
    async fn locate(&self, environment: &dyn Environment) -> Result<PropertySource, LocateError> {
        let target = self.inner.target();
        let span = tracing::info_span!(
            "property_source.locate",
            kind = target.kind.as_str(),
            name = target.name.as_str(),
            namespace = target.namespace.as_str(),
        );
        self.locate_with_retry(environment).instrument(span).await
    }

    fn target(&self) -> &SourceTarget {
        self.inner.target()
    }

    fn property_source_name(&self) -> String {
        self.inner.property_source_name()
    }
}
