//! Cache store test utilities

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use release_registry::provider::cache::{CacheStore, SqliteCacheStore};
use release_registry::provider::types::{CacheRecord, CacheVersion, Platform, VersionDownloadDetail};

/// Create a SQLite store in a temporary directory
pub fn create_test_store() -> (TempDir, Arc<SqliteCacheStore>) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let store = SqliteCacheStore::new(&db_path).unwrap();
    (temp_dir, Arc::new(store))
}

/// A cached version of `terraform-provider-{provider_type}` built for each platform
pub fn cached_version(provider_type: &str, version: &str, platforms: &[(&str, &str)]) -> CacheVersion {
    CacheVersion {
        version: version.to_string(),
        protocols: vec!["5.0".to_string()],
        download_details: platforms
            .iter()
            .map(|(os, arch)| VersionDownloadDetail {
                platform: Platform::new(os, arch),
                filename: format!("terraform-provider-{provider_type}_{version}_{os}_{arch}.zip"),
                download_url: format!("https://cached.example.com/{version}/{os}_{arch}.zip"),
                shasums_url: format!("https://cached.example.com/{version}/SHA256SUMS"),
                shasums_signature_url: format!("https://cached.example.com/{version}/SHA256SUMS.sig"),
                shasum: format!("cached-{os}-{arch}"),
            })
            .collect(),
    }
}

/// Store a record directly, bypassing any lookup
pub fn seed_record(
    store: &SqliteCacheStore,
    key: &str,
    versions: Vec<CacheVersion>,
    last_updated: DateTime<Utc>,
) {
    store
        .put(&CacheRecord::new(key.to_string(), versions, last_updated))
        .unwrap();
}
