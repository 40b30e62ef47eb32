//! Request-time provider lookups over the cache and the upstream feed
//!
//! ```text
//! CacheLookup ──fresh hit──────────────────────────────▶ KeyAttachment ─▶ Done
//!      │
//!      └─miss / stale / store error─▶ LiveHarvest ─▶ AssetResolution ─┘
//!                                          │
//!                                          └─repository absent─▶ NotFound
//! ```
//!
//! A fresh record is trusted as complete: a version or platform missing from
//! it is not found, without consulting upstream. Store read failures are
//! treated as misses.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tracing::{error, info, instrument, warn};

use crate::config::RegistryConfig;
use crate::provider::cache::CacheStore;
use crate::provider::harvest::{harvest_provider, resolve_download_detail};
use crate::provider::keys::SigningKeyTable;
use crate::provider::naming::{cache_key, parse_cache_key, provider_repo_name};
use crate::provider::types::{CacheRecord, Platform, VersionDetails, VersionList};
use crate::release::error::{CacheError, RegistryError};
use crate::release::filter::{collect_releases_since, find_release};
use crate::release::source::ReleaseSource;

/// Result of a population run for one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulateOutcome {
    /// A full harvest replaced the record
    Harvested { versions: usize },
    /// No new versions since the last run; the record was re-stamped
    Unchanged { versions: usize },
    /// The provider repository does not exist upstream
    RepositoryNotFound,
}

pub struct ProviderLookup<S: CacheStore> {
    source: Arc<dyn ReleaseSource>,
    store: Option<Arc<S>>,
    keys: SigningKeyTable,
    config: RegistryConfig,
}

impl<S: CacheStore> ProviderLookup<S> {
    pub fn new(
        source: Arc<dyn ReleaseSource>,
        store: Option<Arc<S>>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            source,
            store,
            keys: SigningKeyTable::new(config.signing_keys.clone()),
            config,
        }
    }

    fn ttl(&self) -> TimeDelta {
        self.config.cache_ttl()
    }

    fn request_timeout(&self) -> Duration {
        self.config.request_timeout()
    }

    /// Lists every known version of a provider.
    ///
    /// Returns `Ok(None)` when nothing is cached and the repository does not exist.
    #[instrument(skip(self))]
    pub async fn list_versions(
        &self,
        namespace: &str,
        provider_type: &str,
    ) -> Result<Option<VersionList>, RegistryError> {
        with_deadline(
            self.request_timeout(),
            self.list_versions_inner(namespace, provider_type),
        )
        .await
    }

    async fn list_versions_inner(
        &self,
        namespace: &str,
        provider_type: &str,
    ) -> Result<Option<VersionList>, RegistryError> {
        let key = cache_key(namespace, provider_type);

        if let Some(record) = self.fresh_record(&key) {
            return Ok(Some(VersionList::from(&record)));
        }

        let owner = self.config.effective_provider_namespace(namespace);
        let repo = provider_repo_name(provider_type);

        if !self.source.repository_exists(owner, &repo).await? {
            info!(owner, repo = %repo, "Provider repository not found");
            return Ok(None);
        }

        let record = harvest_provider(&*self.source, owner, &repo, &key).await?;
        self.store_opportunistically(&record);

        Ok(Some(VersionList::from(&record)))
    }

    /// Resolves download details for one version on one platform, with signing keys attached.
    ///
    /// Returns `Ok(None)` when the version or platform is not available.
    #[instrument(skip(self))]
    pub async fn get_version(
        &self,
        namespace: &str,
        provider_type: &str,
        version: &str,
        os: &str,
        arch: &str,
    ) -> Result<Option<VersionDetails>, RegistryError> {
        let details = with_deadline(
            self.request_timeout(),
            self.get_version_inner(namespace, provider_type, version, os, arch),
        )
        .await?;

        Ok(details.map(|mut details| {
            details.signing_keys = self.keys.signing_keys(namespace);
            details
        }))
    }

    async fn get_version_inner(
        &self,
        namespace: &str,
        provider_type: &str,
        version: &str,
        os: &str,
        arch: &str,
    ) -> Result<Option<VersionDetails>, RegistryError> {
        let key = cache_key(namespace, provider_type);

        if let Some(record) = self.fresh_record(&key) {
            let details = record.version_details(version, os, arch);
            if details.is_none() {
                info!(key = %key, version, os, arch, "Version not in cached record");
            }
            return Ok(details);
        }

        let owner = self.config.effective_provider_namespace(namespace);
        let repo = provider_repo_name(provider_type);

        if !self.source.repository_exists(owner, &repo).await? {
            info!(owner, repo = %repo, "Provider repository not found");
            return Ok(None);
        }

        let Some(release) = find_release(&*self.source, owner, &repo, version).await? else {
            return Ok(None);
        };

        let platform = Platform::new(os, arch);
        let resolved = resolve_download_detail(&*self.source, &release, &platform).await?;

        Ok(resolved.map(|(protocols, detail)| VersionDetails::new(protocols, detail)))
    }

    /// Refreshes the stored record for one provider.
    ///
    /// Unlike the read path, store failures are returned as errors.
    #[instrument(skip(self))]
    pub async fn populate(
        &self,
        namespace: &str,
        provider_type: &str,
    ) -> Result<PopulateOutcome, RegistryError> {
        with_deadline(
            self.request_timeout(),
            self.populate_inner(namespace, provider_type),
        )
        .await
    }

    async fn populate_inner(
        &self,
        namespace: &str,
        provider_type: &str,
    ) -> Result<PopulateOutcome, RegistryError> {
        let store = self.store.as_ref().ok_or(CacheError::NotConfigured)?;
        let key = cache_key(namespace, provider_type);
        let owner = self.config.effective_provider_namespace(namespace);
        let repo = provider_repo_name(provider_type);

        let existing = store.get(&key)?;

        if !self.source.repository_exists(owner, &repo).await? {
            info!(owner, repo = %repo, "Provider repository not found");
            return Ok(PopulateOutcome::RepositoryNotFound);
        }

        if let Some(existing) = existing {
            let started = Utc::now();
            let recent = collect_releases_since(
                &*self.source,
                owner,
                &repo,
                Some(existing.last_updated),
                self.config.since_padding(),
            )
            .await?;

            let has_new_version = recent
                .iter()
                .filter_map(|release| release.version())
                .any(|version| !existing.contains_version(&version));

            if !has_new_version {
                let refreshed = CacheRecord::new(key, existing.versions, started);
                store.put(&refreshed)?;
                info!(key = %refreshed.key, "No new releases, record re-stamped");
                return Ok(PopulateOutcome::Unchanged {
                    versions: refreshed.versions.len(),
                });
            }
        }

        let record = harvest_provider(&*self.source, owner, &repo, &key).await?;
        store.put(&record)?;
        info!(key = %key, versions = record.versions.len(), "Stored provider versions");

        Ok(PopulateOutcome::Harvested {
            versions: record.versions.len(),
        })
    }

    /// Populates every stale record in the store.
    ///
    /// Failures are logged per provider and do not stop the run. Returns the
    /// keys that were refreshed successfully.
    pub async fn populate_stale(&self) -> Result<Vec<String>, RegistryError> {
        let store = self.store.as_ref().ok_or(CacheError::NotConfigured)?;
        let stale = store.stale_keys(Utc::now(), self.ttl())?;
        info!(count = stale.len(), "Refreshing stale provider records");

        let mut refreshed = Vec::with_capacity(stale.len());
        for key in stale {
            let Some((namespace, provider_type)) = parse_cache_key(&key) else {
                warn!(key = %key, "Skipping malformed cache key");
                continue;
            };

            match self.populate(namespace, provider_type).await {
                Ok(PopulateOutcome::RepositoryNotFound) => {
                    info!(key = %key, "Provider repository no longer exists");
                }
                Ok(_) => refreshed.push(key),
                Err(e) => error!(key = %key, "Failed to populate provider versions: {}", e),
            }
        }

        Ok(refreshed)
    }

    /// Returns the stored record when present and fresh.
    fn fresh_record(&self, key: &str) -> Option<CacheRecord> {
        let store = self.store.as_ref()?;

        match store.get(key) {
            Ok(Some(record)) if !record.is_stale(self.ttl()) => {
                info!(key, "Cache hit");
                Some(record)
            }
            Ok(Some(record)) => {
                info!(key, last_updated = %record.last_updated, "Cache record is stale");
                None
            }
            Ok(None) => {
                info!(key, "Cache miss");
                None
            }
            Err(e) => {
                warn!(key, "Failed to read cache, falling back to upstream: {}", e);
                None
            }
        }
    }

    fn store_opportunistically(&self, record: &CacheRecord) {
        let Some(store) = self.store.as_ref() else {
            return;
        };

        if let Err(e) = store.put(record) {
            error!(key = %record.key, "Failed to store provider versions: {}", e);
        }
    }
}

/// Bounds `future` by `timeout`; expiry drops the in-flight work.
pub(crate) async fn with_deadline<T, F>(timeout: Duration, future: F) -> Result<T, RegistryError>
where
    F: Future<Output = Result<T, RegistryError>>,
{
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| RegistryError::DeadlineExceeded)?
}
