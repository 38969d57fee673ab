//! # kube-property-sources
//!
//! Locates ConfigMap and Secret property sources in the current cluster and
//! prints them. See [`cli`] for the available commands.

mod cli;

use anyhow::Result;
use clap::Parser;
use kube_property_sources::observability::logging::{init_tracing, LogFormat};
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before any kube client is created
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    init_tracing(LogFormat::from_env());

    debug!(
        git_hash = env!("BUILD_GIT_HASH"),
        built = env!("BUILD_DATETIME"),
        "kube-property-sources {}",
        env!("CARGO_PKG_VERSION")
    );

    cli::run(cli::Cli::parse()).await
}
