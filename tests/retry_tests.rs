//! Retry behaviour of [`RetryableLocator`] around the Kubernetes locator.
//!
//! Time is paused in every test so backoff sleeps complete instantly.

mod common;

use common::{init_tracing, retry_config, FakeRemoteClient, Outcome};
use kube_property_sources::client::RawRemoteObject;
use kube_property_sources::config::{RetryConfig, SourceEntry, SourcesConfig};
use kube_property_sources::environment::StaticEnvironment;
use kube_property_sources::error::{LocateError, MappingError};
use kube_property_sources::locator::{
    KubernetesPropertySourceLocator, PropertySourceLocator, RetryableLocator,
};
use kube_property_sources::namespace::NamespaceResolver;
use kube_property_sources::source::{LabeledSource, NamedSource, NormalizedSource, SourceKind};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

fn secret_source(fail_fast: bool) -> NormalizedSource {
    NormalizedSource::Named(
        NamedSource::new(SourceKind::Secret, "my-secret", "default").with_fail_fast(fail_fast),
    )
}

fn my_secret() -> RawRemoteObject {
    RawRemoteObject::new("my-secret", "default")
        .with_binary("some.sensitive.prop", b"secret-value".to_vec())
}

fn team_resolver() -> NamespaceResolver {
    NamespaceResolver::new(Some("team".to_string()), "/nonexistent/namespace")
}

fn entry(name: &str, namespace: &str) -> SourceEntry {
    SourceEntry {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..SourceEntry::default()
    }
}

fn retrying_from_config(
    client: &FakeRemoteClient,
    config: &SourcesConfig,
    retry: RetryConfig,
) -> RetryableLocator<KubernetesPropertySourceLocator<FakeRemoteClient>> {
    let inner = KubernetesPropertySourceLocator::from_config(
        client.clone(),
        SourceKind::ConfigMap,
        config,
        &team_resolver(),
    )
    .unwrap();
    RetryableLocator::new(inner, retry)
}

fn retrying(
    client: &FakeRemoteClient,
    source: NormalizedSource,
    retry: RetryConfig,
) -> RetryableLocator<KubernetesPropertySourceLocator<FakeRemoteClient>> {
    RetryableLocator::new(
        KubernetesPropertySourceLocator::for_source(client.clone(), source),
        retry,
    )
}

#[tokio::test(start_paused = true)]
async fn test_no_retry_when_first_attempt_succeeds() {
    init_tracing();
    let client = FakeRemoteClient::new().with_object(SourceKind::Secret, my_secret());
    let locator = retrying(&client, secret_source(true), retry_config(5));

    let source = locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap();

    assert_eq!(client.fetch_calls(), 1);
    assert_eq!(source.name(), "secret.default.my-secret");
    assert_eq!(source.get("some.sensitive.prop"), Some("secret-value"));
}

#[tokio::test(start_paused = true)]
async fn test_succeeds_after_three_transport_failures() {
    init_tracing();
    let client = FakeRemoteClient::new()
        .with_object(SourceKind::Secret, my_secret())
        .fail_next(3);
    let locator = retrying(&client, secret_source(true), retry_config(5));

    let source = locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap();

    assert_eq!(client.fetch_calls(), 4);
    assert_eq!(source.get("some.sensitive.prop"), Some("secret-value"));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_with_fail_fast_reports_target() {
    init_tracing();
    let client = FakeRemoteClient::new()
        .with_object(SourceKind::Secret, my_secret())
        .fail_always();
    let locator = retrying(&client, secret_source(true), retry_config(5));

    let err = locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap_err();

    assert_eq!(client.fetch_calls(), 5);
    assert_eq!(
        err.to_string(),
        "Unable to read Secret with name 'my-secret' in namespace 'default'"
    );
    match err {
        LocateError::RetryExhausted {
            attempts,
            last_error,
            ..
        } => {
            assert_eq!(attempts, 5);
            assert!(matches!(*last_error, LocateError::Transport { .. }));
        }
        other => panic!("expected RetryExhausted, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_without_fail_fast_yields_empty_source() {
    init_tracing();
    let client = FakeRemoteClient::new().fail_always();
    let locator = retrying(&client, secret_source(false), retry_config(5));

    let source = locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap();

    assert_eq!(client.fetch_calls(), 5);
    assert!(source.is_empty());
    assert_eq!(source.name(), "secret.default.my-secret");
}

#[tokio::test(start_paused = true)]
async fn test_mapping_error_is_not_retried() {
    init_tracing();
    let broken = RawRemoteObject::new("my-secret", "default").with_binary("key", vec![0xff, 0xfe]);
    let client = FakeRemoteClient::new().with_object(SourceKind::Secret, broken);
    let locator = retrying(&client, secret_source(true), retry_config(5));

    let err = locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap_err();

    assert_eq!(client.fetch_calls(), 1);
    match err {
        LocateError::Mapping { source, .. } => {
            assert!(matches!(source, MappingError::InvalidUtf8 { ref key, .. } if key == "key"));
        }
        other => panic!("expected Mapping, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_missing_object_with_fail_fast_is_not_retried() {
    init_tracing();
    let client = FakeRemoteClient::new();
    let locator = retrying(&client, secret_source(true), retry_config(5));

    let err = locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap_err();

    assert_eq!(client.fetch_calls(), 1);
    assert!(matches!(err, LocateError::SourceNotFound { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_disabled_retry_makes_single_attempt() {
    init_tracing();
    let client = FakeRemoteClient::new().fail_always();
    let locator = retrying(&client, secret_source(true), RetryConfig::disabled());

    let err = locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap_err();

    assert_eq!(client.fetch_calls(), 1);
    assert!(matches!(err, LocateError::RetryExhausted { attempts: 1, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_disabled_retry_without_fail_fast_yields_empty_source() {
    init_tracing();
    let client = FakeRemoteClient::new().fail_always();
    let locator = retrying(&client, secret_source(false), RetryConfig::disabled());

    let source = locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap();

    assert_eq!(client.fetch_calls(), 1);
    assert!(source.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_backoff_waits_grow_between_attempts() {
    init_tracing();
    let client = FakeRemoteClient::new()
        .with_object(SourceKind::Secret, my_secret())
        .fail_next(3);
    let locator = retrying(&client, secret_source(true), retry_config(5));

    let start = Instant::now();
    locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap();
    let elapsed = start.elapsed();

    // 1000ms + 1100ms + 1210ms
    assert!(elapsed >= Duration::from_millis(3300), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(3400), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_backoff_is_capped_by_max_interval() {
    init_tracing();
    let client = FakeRemoteClient::new().fail_always();
    let retry = RetryConfig {
        max_attempts: 4,
        initial_interval_ms: 1000,
        multiplier: 3.0,
        max_interval_ms: 2000,
        jitter: 0.0,
        ..RetryConfig::default()
    };
    let locator = retrying(&client, secret_source(false), retry);

    let start = Instant::now();
    locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap();

    // 1000ms + 2000ms + 2000ms
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(5000), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(5100), "elapsed {elapsed:?}");
    assert_eq!(client.fetch_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_failure_on_profile_object_retries_whole_locate() {
    init_tracing();
    let client = FakeRemoteClient::new()
        .with_object(SourceKind::Secret, my_secret())
        .with_object(
            SourceKind::Secret,
            RawRemoteObject::new("my-secret-dev", "default")
                .with_binary("some.sensitive.prop", b"dev-value".to_vec()),
        )
        .then(Outcome::Serve)
        .then(Outcome::Fail(500));
    let source = NormalizedSource::Named(
        NamedSource::new(SourceKind::Secret, "my-secret", "default")
            .with_fail_fast(true)
            .with_profile_specific_sources(true),
    );
    let locator = retrying(&client, source, retry_config(5));

    let source = locator
        .locate(&StaticEnvironment::new(["dev"]))
        .await
        .unwrap();

    // base + failed profile fetch, then base + profile again
    assert_eq!(client.fetch_calls(), 4);
    assert_eq!(source.get("some.sensitive.prop"), Some("dev-value"));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_locates_keep_separate_budgets() {
    init_tracing();
    let client = FakeRemoteClient::new().fail_always();
    let first = retrying(&client, secret_source(false), retry_config(3));
    let second = retrying(&client, secret_source(false), retry_config(3));
    let environment = StaticEnvironment::default();

    let (a, b) = tokio::join!(first.locate(&environment), second.locate(&environment));

    assert!(a.unwrap().is_empty());
    assert!(b.unwrap().is_empty());
    assert_eq!(client.fetch_calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_succeeds_on_last_allowed_attempt() {
    init_tracing();
    let client = FakeRemoteClient::new()
        .with_object(SourceKind::Secret, my_secret())
        .fail_next(4);
    let locator = retrying(&client, secret_source(true), retry_config(5));

    let source = locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap();

    assert_eq!(client.fetch_calls(), 5);
    assert_eq!(source.get("some.sensitive.prop"), Some("secret-value"));
}

#[tokio::test(start_paused = true)]
async fn test_label_list_failure_is_retried() {
    init_tracing();
    let client = FakeRemoteClient::new()
        .with_object(
            SourceKind::ConfigMap,
            RawRemoteObject::new("web-config", "default").with_text("port", "8080"),
        )
        .fail_next(2);
    let source = NormalizedSource::Labeled(
        LabeledSource::new(
            SourceKind::ConfigMap,
            "default",
            BTreeMap::from([("app".to_string(), "web".to_string())]),
        )
        .with_fail_fast(true),
    );
    let locator = retrying(&client, source, retry_config(5));

    let located = locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap();

    assert_eq!(client.list_calls(), 3);
    assert_eq!(client.fetch_calls(), 0);
    assert_eq!(located.get("port"), Some("8080"));
}

#[tokio::test(start_paused = true)]
async fn test_malformed_embedded_file_is_not_retried() {
    init_tracing();
    let client = FakeRemoteClient::new().with_object(
        SourceKind::ConfigMap,
        RawRemoteObject::new("my-app", "default").with_text("application.yaml", "key: [unclosed"),
    );
    let source = NormalizedSource::Named(
        NamedSource::new(SourceKind::ConfigMap, "my-app", "default").with_fail_fast(true),
    );
    let locator = retrying(&client, source, retry_config(5));

    let err = locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap_err();

    assert_eq!(client.fetch_calls(), 1);
    match err {
        LocateError::Mapping { source, .. } => {
            assert!(
                matches!(source, MappingError::MalformedFile { ref key, .. } if key == "application.yaml")
            );
        }
        other => panic!("expected Mapping, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_from_config_names_failing_source() {
    init_tracing();
    let client = FakeRemoteClient::new().fail_always();
    let config = SourcesConfig {
        namespace: "team".to_string(),
        fail_fast: true,
        sources: vec![entry("shared", "platform")],
        ..SourcesConfig::default()
    };
    let locator = retrying_from_config(&client, &config, retry_config(3));

    let err = locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap_err();

    assert_eq!(client.fetch_calls(), 3);
    assert_eq!(
        err.to_string(),
        "Unable to read ConfigMap with name 'shared' in namespace 'platform'"
    );
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_names_the_source_that_failed_last() {
    init_tracing();
    let client = FakeRemoteClient::new()
        .with_object(
            SourceKind::ConfigMap,
            RawRemoteObject::new("my-app", "team").with_text("k", "v"),
        )
        .then(Outcome::Serve)
        .fail_always();
    let config = SourcesConfig {
        fail_fast: true,
        include_profile_specific_sources: false,
        sources: vec![entry("my-app", "team"), entry("shared", "platform")],
        ..SourcesConfig::default()
    };
    let locator = retrying_from_config(&client, &config, RetryConfig::disabled());

    let err = locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap_err();

    // my-app is served, shared fails
    assert_eq!(client.fetch_calls(), 2);
    assert!(matches!(
        err,
        LocateError::RetryExhausted { ref name, ref namespace, attempts: 1, .. }
            if name == "shared" && namespace == "platform"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_without_fail_fast_keeps_composite_name() {
    init_tracing();
    let client = FakeRemoteClient::new().fail_always();
    let config = SourcesConfig {
        sources: vec![entry("my-app", "team"), entry("shared", "platform")],
        ..SourcesConfig::default()
    };
    let locator = retrying_from_config(&client, &config, retry_config(2));

    let source = locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap();

    assert_eq!(client.fetch_calls(), 2);
    assert!(source.is_empty());
    assert_eq!(source.name(), "composite-configmap");
}

#[tokio::test(start_paused = true)]
async fn test_empty_source_name_is_rejected_without_fetching() {
    init_tracing();
    let client = FakeRemoteClient::new().fail_always();
    let source = NormalizedSource::Named(
        NamedSource::new(SourceKind::ConfigMap, "", "default").with_fail_fast(true),
    );
    let locator = retrying(&client, source, retry_config(5));

    let err = locator
        .locate(&StaticEnvironment::default())
        .await
        .unwrap_err();

    assert_eq!(client.calls(), 0);
    assert!(!err.is_retryable());
    assert!(matches!(err, LocateError::InvalidSource { ref namespace, .. } if namespace == "default"));
}
