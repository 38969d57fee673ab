//! # Property Source Locators
//!
//! A locator turns the current [`Environment`] into a named [`PropertySource`].
//!
//! - [`KubernetesPropertySourceLocator`] - single shot: resolve, fetch, map, merge
//! - [`RetryableLocator`] - decorator retrying transport failures with backoff
//!
//! Both expose the same single-method contract so the host can use either.

mod kubernetes;
mod retry;

pub use kubernetes::KubernetesPropertySourceLocator;
pub use retry::RetryableLocator;

use crate::environment::Environment;
use crate::error::LocateError;
use crate::source::SourceKind;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Named, flat mapping from dotted keys to values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySource {
    name: String,
    properties: BTreeMap<String, String>,
}

impl PropertySource {
    #[must_use]
    pub fn new(name: impl Into<String>, properties: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    /// Property source with no properties (the non fail-fast fallback)
    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, BTreeMap::new())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    #[must_use]
    pub fn into_properties(self) -> BTreeMap<String, String> {
        self.properties
    }
}

/// What a locator is about, used for operator-facing messages and terminal behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTarget {
    pub kind: SourceKind,
    pub name: String,
    pub namespace: String,
    pub fail_fast: bool,
}

impl SourceTarget {
    #[must_use]
    pub fn new(
        kind: SourceKind,
        name: impl Into<String>,
        namespace: impl Into<String>,
        fail_fast: bool,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: namespace.into(),
            fail_fast,
        }
    }

    /// `configmap.<namespace>.<name>` / `secret.<namespace>.<name>`
    #[must_use]
    pub fn property_source_name(&self) -> String {
        format!("{}.{}.{}", self.kind.as_str(), self.namespace, self.name)
    }
}

/// Produces a property source for the given environment
///
/// Implementations keep no state between calls; `locate` may be called
/// repeatedly and concurrently.
#[async_trait]
pub trait PropertySourceLocator: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`LocateError`] describing why no property source could be built.
    async fn locate(&self, environment: &dyn Environment) -> Result<PropertySource, LocateError>;

    /// Kind, name and namespace this locator reads, and whether failures are fatal
    fn target(&self) -> &SourceTarget;

    /// Name of the property source `locate` produces, also used for the
    /// empty fallback after exhausted retries
    fn property_source_name(&self) -> String {
        self.target().property_source_name()
    }
}
