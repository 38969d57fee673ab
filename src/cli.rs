//! # CLI
//!
//! Command-line interface for locating property sources in a live cluster.
//!
//! ## Usage
//!
//! ```bash
//! # ConfigMaps and Secrets configured through CONFIGMAP_* / SECRETS_* variables
//! kube-property-sources locate
//!
//! # Only ConfigMaps, from a config file, with the dev profile active
//! kube-property-sources locate --config sources.yaml --kind configmap --profiles dev
//!
//! # JSON output followed by the Prometheus metrics of the run
//! kube-property-sources locate --format json --metrics
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kube_property_sources::client::KubeRemoteClient;
use kube_property_sources::config::AppConfig;
use kube_property_sources::environment::{Environment, ProcessEnvironment, StaticEnvironment};
use kube_property_sources::locator::{
    KubernetesPropertySourceLocator, PropertySource, PropertySourceLocator, RetryableLocator,
};
use kube_property_sources::namespace::NamespaceResolver;
use kube_property_sources::observability::metrics;
use kube_property_sources::source::SourceKind;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::{info, warn};

/// Load application properties from Kubernetes ConfigMaps and Secrets
#[derive(Parser, Debug)]
#[command(name = "kube-property-sources", version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Locate property sources and print the merged properties
    Locate(LocateArgs),
}

#[derive(clap::Args, Debug)]
pub struct LocateArgs {
    /// YAML configuration file (defaults to CONFIGMAP_* / SECRETS_* environment variables)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Which source kinds to locate
    #[arg(short, long, value_enum, default_value_t = KindArg::All)]
    pub kind: KindArg,

    /// Active profiles, comma separated (defaults to ACTIVE_PROFILES)
    #[arg(short, long)]
    pub profiles: Option<String>,

    /// Namespace for sources that do not set one
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Properties)]
    pub format: OutputFormat,

    /// Print Prometheus metrics after the properties
    #[arg(long)]
    pub metrics: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    #[value(name = "configmap")]
    ConfigMap,
    Secret,
    All,
}

impl KindArg {
    fn kinds(self) -> Vec<SourceKind> {
        match self {
            KindArg::ConfigMap => vec![SourceKind::ConfigMap],
            KindArg::Secret => vec![SourceKind::Secret],
            KindArg::All => vec![SourceKind::ConfigMap, SourceKind::Secret],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Properties,
    Json,
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Locate(args) => locate(args).await,
    }
}

async fn locate(args: LocateArgs) -> Result<()> {
    metrics::register_metrics().context("Failed to register metrics")?;

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => {
            let config = AppConfig::from_env();
            config
                .validate()
                .context("Invalid configuration in environment")?;
            config
        }
    };
    if let Some(namespace) = &args.namespace {
        config.config_maps.namespace.clone_from(namespace);
        config.secrets.namespace.clone_from(namespace);
    }

    let environment: Box<dyn Environment> = match &args.profiles {
        Some(list) => Box::new(StaticEnvironment::parse(list)),
        None => Box::new(ProcessEnvironment::from_env()),
    };

    let client = kube::Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let client = KubeRemoteClient::new(client);
    let resolver = NamespaceResolver::from_env();

    let mut sources = Vec::new();
    for kind in args.kind.kinds() {
        let sources_config = config.for_kind(kind);
        if !sources_config.enabled {
            info!(kind = kind.as_str(), "{} sources disabled, skipping", kind);
            continue;
        }
        let locator = KubernetesPropertySourceLocator::from_config(
            client.clone(),
            kind,
            sources_config,
            &resolver,
        )
        .with_context(|| format!("Failed to configure {kind} sources"))?;
        let locator = RetryableLocator::new(locator, sources_config.retry.clone());
        let source = locator
            .locate(environment.as_ref())
            .await
            .with_context(|| format!("Failed to locate {kind} property source"))?;
        if source.is_empty() {
            warn!(property_source = source.name(), "⚠️  Property source is empty");
        }
        sources.push(source);
    }

    print!("{}", render(&sources, args.format)?);
    if args.metrics {
        print!("{}", metrics::gather_text()?);
    }
    Ok(())
}

fn render(sources: &[PropertySource], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Properties => {
            let mut out = String::new();
            for source in sources {
                writeln!(out, "# {}", source.name())?;
                for (key, value) in source.iter() {
                    writeln!(out, "{key}={value}")?;
                }
            }
            Ok(out)
        }
        OutputFormat::Json => {
            let document: BTreeMap<&str, &BTreeMap<String, String>> = sources
                .iter()
                .map(|source| (source.name(), source.properties()))
                .collect();
            let mut out = serde_json::to_string_pretty(&document)
                .context("Failed to serialize property sources")?;
            out.push('\n');
            Ok(out)
        }
    }
}
