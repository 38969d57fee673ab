//! # Metrics
//!
//! Prometheus metrics for monitoring property source loading.
//!
//! ## Metrics Exposed
//!
//! - `property_source_locate_attempts_total{kind}` - Attempts made by the retry decorator
//! - `property_source_locate_retries_total{kind}` - Attempts that were followed by a backoff
//! - `property_source_locate_failures_total{kind,reason}` - Terminal failures by reason
//! - `property_source_properties_loaded{kind}` - Properties in the last located source

use crate::source::SourceKind;
use anyhow::Result;
use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Registry, TextEncoder};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static LOCATE_ATTEMPTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "property_source_locate_attempts_total",
            "Total number of locate attempts by source kind",
        ),
        &["kind"],
    )
    .expect("Failed to create LOCATE_ATTEMPTS_TOTAL metric - this should never happen")
});

static LOCATE_RETRIES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "property_source_locate_retries_total",
            "Total number of retries scheduled after a transport failure",
        ),
        &["kind"],
    )
    .expect("Failed to create LOCATE_RETRIES_TOTAL metric - this should never happen")
});

static LOCATE_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "property_source_locate_failures_total",
            "Total number of terminal locate failures by kind and reason",
        ),
        &["kind", "reason"],
    )
    .expect("Failed to create LOCATE_FAILURES_TOTAL metric - this should never happen")
});

static PROPERTIES_LOADED: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        prometheus::Opts::new(
            "property_source_properties_loaded",
            "Number of properties in the most recently located property source",
        ),
        &["kind"],
    )
    .expect("Failed to create PROPERTIES_LOADED metric - this should never happen")
});

/// Register all metrics with the crate registry
///
/// Registering twice is not an error; the second call is a no-op.
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    let collectors: [Box<dyn prometheus::core::Collector>; 4] = [
        Box::new(LOCATE_ATTEMPTS_TOTAL.clone()),
        Box::new(LOCATE_RETRIES_TOTAL.clone()),
        Box::new(LOCATE_FAILURES_TOTAL.clone()),
        Box::new(PROPERTIES_LOADED.clone()),
    ];
    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Render every registered metric in the Prometheus text format
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn gather_text() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn increment_locate_attempts(kind: SourceKind) {
    LOCATE_ATTEMPTS_TOTAL
        .with_label_values(&[kind.as_str()])
        .inc();
}

pub fn increment_locate_retries(kind: SourceKind) {
    LOCATE_RETRIES_TOTAL
        .with_label_values(&[kind.as_str()])
        .inc();
}

pub fn increment_locate_failures(kind: SourceKind, reason: &str) {
    LOCATE_FAILURES_TOTAL
        .with_label_values(&[kind.as_str(), reason])
        .inc();
}

pub fn set_properties_loaded(kind: SourceKind, count: usize) {
    let count = i64::try_from(count).unwrap_or(i64::MAX);
    PROPERTIES_LOADED
        .with_label_values(&[kind.as_str()])
        .set(count);
}
