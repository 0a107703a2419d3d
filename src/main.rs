//! Registry host diagnostics.
//!
//! Shows how a hostname resolves to registry hosts and whether a blob
//! check would reach the registry.
//!
//! ```text
//! registry-nocheck [--config hosts.toml] [--skip-existing-layers-check] hosts docker.io
//! registry-nocheck --skip-existing-layers-check check alpine:3.20 sha256:...
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use registry_nocheck::config::{load_config, static_hosts, RegistryConfig};
use registry_nocheck::observability::logging::init_logging;
use registry_nocheck::registry::{
    new_no_check_resolver, BlobStatus, HostSummary, Reference, Resolver, ResolverOptions,
};

#[derive(Parser)]
#[command(name = "registry-nocheck")]
#[command(about = "Inspect registry host resolution and blob existence checks", long_about = None)]
struct Cli {
    /// Host configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Answer blob existence checks locally instead of asking the registry.
    #[arg(long)]
    skip_existing_layers_check: bool,

    /// Log level; RUST_LOG takes precedence.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the hosts a registry hostname resolves to
    Hosts { hostname: String },
    /// Check whether a blob exists in a repository
    Check { reference: String, digest: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RegistryConfig::default(),
    };
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.observability.log_level.clone());
    init_logging(&level);

    tracing::info!(
        config = ?cli.config,
        hosts = config.hosts.len(),
        skip_existing_layers_check = skips_existing_check(&cli, &config),
        "Configuration loaded"
    );

    let resolver = build_resolver(&cli, &config);

    match cli.command {
        Commands::Hosts { hostname } => {
            let hosts = resolver.hosts(&hostname)?;
            let summaries: Vec<HostSummary> = hosts.iter().map(HostSummary::from).collect();
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        Commands::Check { reference, digest } => {
            let reference: Reference = reference.parse()?;
            let status = resolver.blob_exists(&reference, &digest).await?;
            let output = match status {
                BlobStatus::Exists { size } => json!({
                    "reference": reference.to_string(),
                    "digest": digest,
                    "exists": true,
                    "size": size,
                }),
                BlobStatus::Missing => json!({
                    "reference": reference.to_string(),
                    "digest": digest,
                    "exists": false,
                }),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// The flag and the config value are OR-ed; either one turns checks off.
fn skips_existing_check(cli: &Cli, config: &RegistryConfig) -> bool {
    cli.skip_existing_layers_check || config.skip_existing_layers_check
}

fn build_resolver(cli: &Cli, config: &RegistryConfig) -> Resolver {
    let options = ResolverOptions::new(static_hosts(config));
    if skips_existing_check(cli, config) {
        new_no_check_resolver(options)
    } else {
        Resolver::new(options)
    }
}
