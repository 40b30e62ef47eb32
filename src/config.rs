use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use serde::Deserialize;
use thiserror::Error;

use crate::provider::types::GpgPublicKey;
use crate::release::sources::github::DEFAULT_BASE_URL;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default age after which a cache record is stale in seconds (55 minutes)
pub const DEFAULT_CACHE_TTL_SECS: i64 = 55 * 60;

/// Default allowance subtracted from `since` when collecting new releases (2 minutes)
pub const DEFAULT_SINCE_PADDING_SECS: i64 = 2 * 60;

/// Default deadline for a single lookup or population run (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Timeout for downloading a single release asset (60 seconds)
pub const ASSET_DOWNLOAD_TIMEOUT_SECS: u64 = 60;

/// Number of releases requested per upstream page
pub const RELEASES_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Registry configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    pub cache: CacheConfig,
    pub github: GitHubConfig,
    /// Namespaces whose providers are released from another GitHub owner
    pub provider_namespace_redirects: HashMap<String, String>,
    /// Public keys served with provider downloads, by namespace
    pub signing_keys: HashMap<String, Vec<GpgPublicKey>>,
    pub request_timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            github: GitHubConfig::default(),
            provider_namespace_redirects: HashMap::new(),
            signing_keys: HashMap::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Record age in seconds after which it is refreshed
    pub ttl_secs: i64,
    /// Allowance in seconds for clock skew between releases and bookkeeping
    pub since_padding_secs: i64,
    /// Database location, defaults to [`db_path`]
    pub db_path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            since_padding_secs: DEFAULT_SINCE_PADDING_SECS,
            db_path: None,
        }
    }
}

/// Upstream API configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GitHubConfig {
    pub api_url: String,
    /// Required by the GraphQL release queries, which reject anonymous
    /// requests. Falls back to `GITHUB_TOKEN`.
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            token: None,
        }
    }
}

impl RegistryConfig {
    /// Loads configuration from a JSON file, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fills in the GitHub token from the environment when the file has none
    pub fn with_env_token(mut self, env_token: Option<String>) -> Self {
        if self.github.token.is_none() {
            self.github.token = env_token.filter(|t| !t.is_empty());
        }
        self
    }

    /// Maps a namespace to the owner that actually publishes its releases
    pub fn effective_provider_namespace<'a>(&'a self, namespace: &'a str) -> &'a str {
        self.provider_namespace_redirects
            .get(namespace)
            .map(String::as_str)
            .unwrap_or(namespace)
    }

    pub fn cache_ttl(&self) -> TimeDelta {
        TimeDelta::seconds(self.cache.ttl_secs)
    }

    pub fn since_padding(&self) -> TimeDelta {
        TimeDelta::seconds(self.cache.since_padding_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Database path, honoring the configured override
    pub fn db_path(&self) -> PathBuf {
        self.cache.db_path.clone().unwrap_or_else(db_path)
    }
}

/// Returns the path to the data directory for release-registry.
/// Uses $XDG_DATA_HOME/release-registry if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/release-registry,
/// or ./release-registry if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the database file.
pub fn db_path() -> PathBuf {
    data_dir().join("cache.db")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("release-registry")
}
