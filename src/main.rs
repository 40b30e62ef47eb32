use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};

use release_registry::config::RegistryConfig;
use release_registry::logging;
use release_registry::module::lookup::ModuleLookup;
use release_registry::provider::cache::SqliteCacheStore;
use release_registry::provider::lookup::ProviderLookup;
use release_registry::release::source::ReleaseSource;
use release_registry::release::sources::GitHubReleaseSource;

/// Exit code for lookups that found nothing
const NOT_FOUND_EXIT_CODE: u8 = 2;

#[derive(Parser)]
#[command(name = "release-registry")]
#[command(version, about = "Provider and module registry backed by GitHub releases")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the available versions of a provider
    ProviderVersions { namespace: String, provider_type: String },

    /// Show download details for one provider version and platform
    ProviderDownload {
        namespace: String,
        provider_type: String,
        version: String,
        os: String,
        arch: String,
    },

    /// Refresh the cached versions of one provider
    Populate { namespace: String, provider_type: String },

    /// Refresh every cached provider whose record is stale
    PopulateStale,

    /// List the available versions of a module
    ModuleVersions {
        namespace: String,
        name: String,
        system: String,
    },

    /// Show where to download one module version
    ModuleDownload {
        namespace: String,
        name: String,
        system: String,
        version: String,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = logging::init(cli.log_file.as_deref(), cli.log_json)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = RegistryConfig::load(cli.config.as_deref())?
        .with_env_token(std::env::var("GITHUB_TOKEN").ok());
    if config.github.token.is_none() {
        warn!("No GitHub token configured; release queries will be rejected until GITHUB_TOKEN is set");
    }
    let source: Arc<dyn ReleaseSource> = Arc::new(
        GitHubReleaseSource::new(&config.github.api_url, config.github.token.clone())
            .context("Failed to create GitHub client")?,
    );

    match cli.command {
        Command::ProviderVersions {
            namespace,
            provider_type,
        } => {
            let lookup = provider_lookup(source, &config);
            print_found(lookup.list_versions(&namespace, &provider_type).await?)
        }
        Command::ProviderDownload {
            namespace,
            provider_type,
            version,
            os,
            arch,
        } => {
            let lookup = provider_lookup(source, &config);
            let details = lookup
                .get_version(&namespace, &provider_type, &version, &os, &arch)
                .await?;
            print_found(details)
        }
        Command::Populate {
            namespace,
            provider_type,
        } => {
            let lookup = provider_lookup(source, &config);
            let outcome = lookup.populate(&namespace, &provider_type).await?;
            info!(?outcome, "Population finished");
            Ok(ExitCode::SUCCESS)
        }
        Command::PopulateStale => {
            let lookup = provider_lookup(source, &config);
            let refreshed = lookup.populate_stale().await?;
            print_json(&refreshed)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::ModuleVersions {
            namespace,
            name,
            system,
        } => {
            let lookup = ModuleLookup::new(source, &config);
            print_found(lookup.list_module_versions(&namespace, &name, &system).await?)
        }
        Command::ModuleDownload {
            namespace,
            name,
            system,
            version,
        } => {
            let lookup = ModuleLookup::new(source, &config);
            print_found(
                lookup
                    .module_download(&namespace, &name, &system, &version)
                    .await?,
            )
        }
    }
}

fn provider_lookup(
    source: Arc<dyn ReleaseSource>,
    config: &RegistryConfig,
) -> ProviderLookup<SqliteCacheStore> {
    let store = initialize_store(&config.db_path());
    ProviderLookup::new(source, store, config.clone())
}

/// Opens the cache database, or None so lookups fall back to upstream.
fn initialize_store(db_path: &Path) -> Option<Arc<SqliteCacheStore>> {
    let data_dir = db_path.parent().unwrap_or_else(|| Path::new("."));
    if let Err(e) = std::fs::create_dir_all(data_dir) {
        error!("Failed to create data directory {:?}: {}", data_dir, e);
        return None;
    }

    match SqliteCacheStore::new(db_path) {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            error!("Failed to initialize cache: {}", e);
            None
        }
    }
}

fn print_found<T: Serialize>(value: Option<T>) -> anyhow::Result<ExitCode> {
    print_json(&value)?;
    Ok(match value {
        Some(_) => ExitCode::SUCCESS,
        None => ExitCode::from(NOT_FOUND_EXIT_CODE),
    })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
