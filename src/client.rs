//! # Remote Client
//!
//! The seam between the locators and the cluster API.
//!
//! Locators only ever talk to a [`RemoteClient`]; production code injects
//! [`KubeRemoteClient`] (backed by `kube::Api`), tests inject an in-memory fake.

use crate::error::TransportError;
use crate::source::SourceKind;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::{Api, ListParams};
use kube::Client;
use std::collections::BTreeMap;
use tracing::debug;

/// Raw value of a single data entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 text (ConfigMap `data`)
    Text(String),
    /// Opaque bytes (Secret `data`, already base64-decoded by the client)
    Binary(Vec<u8>),
}

/// A ConfigMap or Secret reduced to the fields the mapper needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRemoteObject {
    pub name: String,
    pub namespace: String,
    pub data: BTreeMap<String, Payload>,
}

impl RawRemoteObject {
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            data: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), Payload::Text(value.into()));
        self
    }

    #[must_use]
    pub fn with_binary(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.data.insert(key.into(), Payload::Binary(value.into()));
        self
    }

    /// Build from a ConfigMap; `binaryData` is not a configuration payload and is ignored
    #[must_use]
    pub fn from_config_map(config_map: ConfigMap, fallback_namespace: &str) -> Self {
        let name = config_map.metadata.name.unwrap_or_default();
        let namespace = config_map
            .metadata
            .namespace
            .unwrap_or_else(|| fallback_namespace.to_string());
        let data = config_map
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, Payload::Text(value)))
            .collect();
        Self {
            name,
            namespace,
            data,
        }
    }

    #[must_use]
    pub fn from_secret(secret: Secret, fallback_namespace: &str) -> Self {
        let name = secret.metadata.name.unwrap_or_default();
        let namespace = secret
            .metadata
            .namespace
            .unwrap_or_else(|| fallback_namespace.to_string());
        let data = secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, Payload::Binary(value.0)))
            .collect();
        Self {
            name,
            namespace,
            data,
        }
    }
}

/// Read access to ConfigMaps and Secrets
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Fetch one object by name
    ///
    /// Returns `Ok(None)` when the API answers "not found"; every other failure
    /// is a [`TransportError`].
    async fn fetch_by_name(
        &self,
        kind: SourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<RawRemoteObject>, TransportError>;

    /// List every object matching `selector` (Kubernetes label selector syntax)
    async fn list_by_label(
        &self,
        kind: SourceKind,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<RawRemoteObject>, TransportError>;
}

/// [`RemoteClient`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeRemoteClient {
    client: Client,
}

impl std::fmt::Debug for KubeRemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeRemoteClient")
            .field("default_namespace", &self.client.default_namespace())
            .finish_non_exhaustive()
    }
}

impl KubeRemoteClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Namespace of the active kubeconfig context (or the pod's namespace in-cluster)
    #[must_use]
    pub fn default_namespace(&self) -> &str {
        self.client.default_namespace()
    }
}

#[async_trait]
impl RemoteClient for KubeRemoteClient {
    async fn fetch_by_name(
        &self,
        kind: SourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<RawRemoteObject>, TransportError> {
        debug!(kind = kind.as_str(), namespace, name, "Fetching object by name");
        match kind {
            SourceKind::ConfigMap => {
                let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
                let object = api.get_opt(name).await?;
                Ok(object.map(|cm| RawRemoteObject::from_config_map(cm, namespace)))
            }
            SourceKind::Secret => {
                let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
                let object = api.get_opt(name).await?;
                Ok(object.map(|secret| RawRemoteObject::from_secret(secret, namespace)))
            }
        }
    }

    async fn list_by_label(
        &self,
        kind: SourceKind,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<RawRemoteObject>, TransportError> {
        debug!(kind = kind.as_str(), namespace, selector, "Listing objects by label");
        let params = ListParams::default().labels(selector);
        match kind {
            SourceKind::ConfigMap => {
                let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
                let list = api.list(&params).await?;
                Ok(list
                    .items
                    .into_iter()
                    .map(|cm| RawRemoteObject::from_config_map(cm, namespace))
                    .collect())
            }
            SourceKind::Secret => {
                let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
                let list = api.list(&params).await?;
                Ok(list
                    .items
                    .into_iter()
                    .map(|secret| RawRemoteObject::from_secret(secret, namespace))
                    .collect())
            }
        }
    }
}
