//! # Kube Property Sources
//!
//! Loads application properties from Kubernetes ConfigMaps and Secrets.
//!
//! A [`locator::KubernetesPropertySourceLocator`] resolves the configured
//! sources (by name, with optional profile-specific variants, or by label
//! selector), fetches each object through a [`client::RemoteClient`] and maps
//! its data into a flat [`locator::PropertySource`]. Wrapping it in a
//! [`locator::RetryableLocator`] adds bounded exponential-backoff retries for
//! transient transport failures.
//!
//! ```no_run
//! use kube_property_sources::client::KubeRemoteClient;
//! use kube_property_sources::config::AppConfig;
//! use kube_property_sources::environment::ProcessEnvironment;
//! use kube_property_sources::locator::{
//!     KubernetesPropertySourceLocator, PropertySourceLocator, RetryableLocator,
//! };
//! use kube_property_sources::namespace::NamespaceResolver;
//! use kube_property_sources::source::SourceKind;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = AppConfig::from_env();
//! let client = KubeRemoteClient::new(kube::Client::try_default().await?);
//! let locator = KubernetesPropertySourceLocator::from_config(
//!     client,
//!     SourceKind::ConfigMap,
//!     &config.config_maps,
//!     &NamespaceResolver::from_env(),
//! )?;
//! let locator = RetryableLocator::new(locator, config.config_maps.retry.clone());
//! let source = locator.locate(&ProcessEnvironment::from_env()).await?;
//! println!("{} properties", source.len());
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod client;
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod locator;
pub mod mapper;
pub mod namespace;
pub mod observability;
pub mod source;
