//! # Normalized Sources
//!
//! Describes *what* to fetch from the cluster and *how strictly* to fail,
//! independently of the shape of the Kubernetes objects themselves.
//!
//! A source is either:
//! - [`NamedSource`] - one object fetched by exact name (optionally with
//!   `<name>-<profile>` variants)
//! - [`LabeledSource`] - every object matching a label selector, merged
//!
//! Identity of a named source is `(kind, name, namespace)`. The prefix and the
//! profile flag are not part of it: two sources that only differ in prefix point
//! at the same remote object.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Kind of Kubernetes object backing a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    ConfigMap,
    Secret,
}

impl SourceKind {
    /// Lowercase form used in property source names (`configmap`, `secret`)
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::ConfigMap => "configmap",
            SourceKind::Secret => "secret",
        }
    }

    /// Human readable object kind used in operator-facing messages
    #[must_use]
    pub fn target(&self) -> &'static str {
        match self {
            SourceKind::ConfigMap => "ConfigMap",
            SourceKind::Secret => "Secret",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target())
    }
}

/// A source fetched by exact object name
#[derive(Debug, Clone)]
pub struct NamedSource {
    kind: SourceKind,
    name: String,
    namespace: String,
    fail_fast: bool,
    prefix: String,
    include_profile_specific_sources: bool,
}

impl NamedSource {
    #[must_use]
    pub fn new(kind: SourceKind, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: namespace.into(),
            fail_fast: false,
            prefix: String::new(),
            include_profile_specific_sources: false,
        }
    }

    /// Prefix prepended verbatim to every derived property key
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    #[must_use]
    pub fn with_profile_specific_sources(mut self, include: bool) -> Self {
        self.include_profile_specific_sources = include;
        self
    }

    #[must_use]
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn profile_specific_sources(&self) -> bool {
        self.include_profile_specific_sources
    }

    /// Object names to fetch for the given active profiles
    ///
    /// The base name always comes first. When profile-specific sources are enabled,
    /// `<name>-<profile>` follows for each profile in activation order, so the most
    /// specific layer is merged last and wins on key collisions.
    #[must_use]
    pub fn resolved_names(&self, active_profiles: &[String]) -> Vec<String> {
        let mut names = vec![self.name.clone()];
        if self.include_profile_specific_sources {
            names.extend(
                active_profiles
                    .iter()
                    .filter(|profile| !profile.is_empty())
                    .map(|profile| format!("{}-{}", self.name, profile)),
            );
        }
        names
    }
}

impl PartialEq for NamedSource {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name == other.name && self.namespace == other.namespace
    }
}

impl Eq for NamedSource {}

impl Hash for NamedSource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.name.hash(state);
        self.namespace.hash(state);
    }
}

/// A source made of every object matching a label selector
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabeledSource {
    kind: SourceKind,
    namespace: String,
    labels: BTreeMap<String, String>,
    fail_fast: bool,
}

impl LabeledSource {
    #[must_use]
    pub fn new(
        kind: SourceKind,
        namespace: impl Into<String>,
        labels: BTreeMap<String, String>,
    ) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            labels,
            fail_fast: false,
        }
    }

    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    #[must_use]
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    #[must_use]
    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    /// Label selector in Kubernetes syntax, keys sorted: `app=web,tier=backend`
    #[must_use]
    pub fn selector(&self) -> String {
        self.labels
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// What to fetch, and how strictly to fail when it cannot be fetched
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NormalizedSource {
    Named(NamedSource),
    Labeled(LabeledSource),
}

impl NormalizedSource {
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        match self {
            NormalizedSource::Named(source) => source.kind(),
            NormalizedSource::Labeled(source) => source.kind(),
        }
    }

    /// Object name; empty for labeled sources, which resolve by selector instead
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            NormalizedSource::Named(source) => source.name(),
            NormalizedSource::Labeled(_) => "",
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        match self {
            NormalizedSource::Named(source) => source.namespace(),
            NormalizedSource::Labeled(source) => source.namespace(),
        }
    }

    #[must_use]
    pub fn fail_fast(&self) -> bool {
        match self {
            NormalizedSource::Named(source) => source.fail_fast(),
            NormalizedSource::Labeled(source) => source.fail_fast(),
        }
    }

    /// Name or selector, whichever identifies the remote object(s)
    #[must_use]
    pub fn identifier(&self) -> String {
        match self {
            NormalizedSource::Named(source) => source.name().to_string(),
            NormalizedSource::Labeled(source) => source.selector(),
        }
    }

    /// Name of the property source built from this source,
    /// e.g. `configmap.default.my-app`
    #[must_use]
    pub fn property_source_name(&self) -> String {
        format!(
            "{}.{}.{}",
            self.kind().as_str(),
            self.namespace(),
            self.identifier()
        )
    }

    /// Copy of this source bound to `namespace`
    #[must_use]
    pub fn with_namespace(&self, namespace: &str) -> Self {
        match self {
            NormalizedSource::Named(source) => NormalizedSource::Named(NamedSource {
                namespace: namespace.to_string(),
                ..source.clone()
            }),
            NormalizedSource::Labeled(source) => NormalizedSource::Labeled(LabeledSource {
                namespace: namespace.to_string(),
                ..source.clone()
            }),
        }
    }
}

impl fmt::Display for NormalizedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedSource::Named(source) => write!(
                f,
                "{{ {} name : '{}', namespace : '{}', prefix : '{}' }}",
                source.kind().as_str(),
                source.name(),
                source.namespace(),
                source.prefix()
            ),
            NormalizedSource::Labeled(source) => write!(
                f,
                "{{ {} labels : '{}', namespace : '{}' }}",
                source.kind().as_str(),
                source.selector(),
                source.namespace()
            ),
        }
    }
}
