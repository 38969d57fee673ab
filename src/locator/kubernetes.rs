//! # Kubernetes Locator
//!
//! Single-shot locator: every call resolves the configured sources against the
//! active profiles, fetches each object exactly once, maps it and merges the
//! results in order (later sources and later profiles win).
//!
//! Not-found handling:
//! - base object missing and `failFast` set: [`LocateError::SourceNotFound`]
//! - base object missing otherwise, or a profile-specific object missing: skipped
//!
//! A source with an empty name or an empty label selector is rejected with
//! [`LocateError::InvalidSource`] before anything is fetched.
//!
//! Transport failures are returned untouched; retrying is the decorator's job.

use crate::client::RemoteClient;
use crate::config::SourcesConfig;
use crate::environment::Environment;
use crate::error::{ConfigError, LocateError};
use crate::locator::{PropertySource, PropertySourceLocator, SourceTarget};
use crate::mapper::SourceDataMapper;
use crate::namespace::NamespaceResolver;
use crate::observability::metrics;
use crate::source::{LabeledSource, NamedSource, NormalizedSource, SourceKind};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Locator for ConfigMaps or Secrets through a [`RemoteClient`]
#[derive(Debug)]
pub struct KubernetesPropertySourceLocator<C> {
    client: C,
    sources: Vec<NormalizedSource>,
    target: SourceTarget,
}

impl<C: RemoteClient> KubernetesPropertySourceLocator<C> {
    /// Locator over an explicit list of sources; all must share `target.kind`
    #[must_use]
    pub fn new(client: C, sources: Vec<NormalizedSource>, target: SourceTarget) -> Self {
        Self {
            client,
            sources,
            target,
        }
    }

    /// Locator over exactly one source
    #[must_use]
    pub fn for_source(client: C, source: NormalizedSource) -> Self {
        let target = SourceTarget::new(
            source.kind(),
            source.identifier(),
            source.namespace(),
            source.fail_fast(),
        );
        Self::new(client, vec![source], target)
    }

    /// Locator built from declarative settings
    ///
    /// The target names the first resolved source, so a configuration whose
    /// entries all carry their own namespace never needs the top-level one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a source's namespace cannot be resolved.
    pub fn from_config(
        client: C,
        kind: SourceKind,
        config: &SourcesConfig,
        resolver: &NamespaceResolver,
    ) -> Result<Self, ConfigError> {
        let sources = config.determine_sources(kind, resolver)?;
        let target = match sources.first() {
            Some(first) => SourceTarget::new(
                kind,
                first.identifier(),
                first.namespace(),
                config.fail_fast,
            ),
            // Every entry was skipped; nothing will be read
            None => SourceTarget::new(
                kind,
                config.default_name(),
                resolver
                    .resolve(&config.namespace)
                    .unwrap_or_else(|_| config.namespace.clone()),
                config.fail_fast,
            ),
        };
        Ok(Self::new(client, sources, target))
    }

    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    #[must_use]
    pub fn sources(&self) -> &[NormalizedSource] {
        &self.sources
    }

    async fn locate_named(
        &self,
        source: &NormalizedSource,
        named: &NamedSource,
        active_profiles: &[String],
        mapper: &SourceDataMapper,
    ) -> Result<BTreeMap<String, String>, LocateError> {
        let kind = named.kind();
        let namespace = named.namespace();
        if named.name().is_empty() {
            return Err(LocateError::InvalidSource {
                kind,
                namespace: namespace.to_string(),
                reason: "object name is empty".to_string(),
            });
        }
        let mut merged = BTreeMap::new();

        for (index, object_name) in named.resolved_names(active_profiles).iter().enumerate() {
            let fetched = self
                .client
                .fetch_by_name(kind, namespace, object_name)
                .await
                .map_err(|source| LocateError::Transport {
                    kind,
                    name: object_name.clone(),
                    namespace: namespace.to_string(),
                    source,
                })?;

            let Some(object) = fetched else {
                if index == 0 && named.fail_fast() {
                    return Err(LocateError::SourceNotFound {
                        kind,
                        name: object_name.clone(),
                        namespace: namespace.to_string(),
                    });
                }
                if index == 0 {
                    warn!(
                        kind = kind.as_str(),
                        name = object_name.as_str(),
                        namespace,
                        "{} not found, continuing without it",
                        kind
                    );
                } else {
                    debug!(
                        kind = kind.as_str(),
                        name = object_name.as_str(),
                        namespace,
                        "Profile-specific object not found"
                    );
                }
                continue;
            };

            let properties =
                mapper
                    .map(&object, source)
                    .map_err(|source| LocateError::Mapping {
                        kind,
                        name: object_name.clone(),
                        namespace: namespace.to_string(),
                        source,
                    })?;
            merged.extend(properties);
        }

        Ok(merged)
    }

    async fn locate_labeled(
        &self,
        source: &NormalizedSource,
        labeled: &LabeledSource,
        mapper: &SourceDataMapper,
    ) -> Result<BTreeMap<String, String>, LocateError> {
        let kind = labeled.kind();
        let selector = labeled.selector();
        let namespace = labeled.namespace();
        if labeled.labels().is_empty() {
            return Err(LocateError::InvalidSource {
                kind,
                namespace: namespace.to_string(),
                reason: "label selector is empty".to_string(),
            });
        }

        let objects = self
            .client
            .list_by_label(kind, namespace, &selector)
            .await
            .map_err(|source| LocateError::Transport {
                kind,
                name: selector.clone(),
                namespace: namespace.to_string(),
                source,
            })?;

        if objects.is_empty() {
            warn!(
                kind = kind.as_str(),
                selector = selector.as_str(),
                namespace,
                "No objects match label selector"
            );
        }

        mapper
            .map_all(objects, source)
            .map_err(|source| LocateError::Mapping {
                kind,
                name: selector,
                namespace: namespace.to_string(),
                source,
            })
    }
}

#[async_trait]
impl<C: RemoteClient> PropertySourceLocator for KubernetesPropertySourceLocator<C> {
    async fn locate(&self, environment: &dyn Environment) -> Result<PropertySource, LocateError> {
        let active_profiles = environment.active_profiles();
        let mapper = SourceDataMapper::new(&active_profiles);
        let mut merged = BTreeMap::new();

        for source in &self.sources {
            debug!(source = %source, "Locating source");
            let properties = match source {
                NormalizedSource::Named(named) => {
                    self.locate_named(source, named, &active_profiles, &mapper)
                        .await?
                }
                NormalizedSource::Labeled(labeled) => {
                    self.locate_labeled(source, labeled, &mapper).await?
                }
            };
            merged.extend(properties);
        }

        let property_source = PropertySource::new(self.property_source_name(), merged);
        metrics::set_properties_loaded(self.target.kind, property_source.len());
        info!(
            property_source = property_source.name(),
            properties = property_source.len(),
            "Located property source"
        );
        Ok(property_source)
    }

    fn target(&self) -> &SourceTarget {
        &self.target
    }

    fn property_source_name(&self) -> String {
        match self.sources.as_slice() {
            [single] => single.property_source_name(),
            _ => format!("composite-{}", self.target.kind.as_str()),
        }
    }
}
