use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[cfg(test)]
use mockall::automock;

use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::provider::types::{CacheRecord, CacheVersion};
use crate::release::error::CacheError;

/// Key-value store for provider version records
#[cfg_attr(test, automock)]
pub trait CacheStore: Send + Sync + 'static {
    /// Get the record stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<CacheRecord>, CacheError>;

    /// Replace the record stored under `record.key` as a whole
    fn put(&self, record: &CacheRecord) -> Result<(), CacheError>;

    /// Keys of records that are stale at `now`
    fn stale_keys(&self, now: DateTime<Utc>, ttl: TimeDelta) -> Result<Vec<String>, CacheError>;
}

pub struct SqliteCacheStore {
    conn: Mutex<Connection>,
}

impl SqliteCacheStore {
    pub fn new(db_path: &Path) -> Result<Self, CacheError> {
        info!("Initializing cache database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // Readers must never block on the population job
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        debug!("Database connection established");

        let store = Self {
            conn: Mutex::new(conn),
        };

        store.create_schema()?;
        info!("Cache initialized successfully");

        Ok(store)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn create_schema(&self) -> Result<(), CacheError> {
        debug!("Creating database schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS cache_records (
                key TEXT PRIMARY KEY,
                versions TEXT NOT NULL,
                last_updated INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_last_updated ON cache_records(last_updated)",
            [],
        )?;

        debug!("Database schema created successfully");
        Ok(())
    }
}

impl CacheStore for SqliteCacheStore {
    fn get(&self, key: &str) -> Result<Option<CacheRecord>, CacheError> {
        let conn = self.lock_conn()?;
        let result = conn.query_row(
            "SELECT versions, last_updated FROM cache_records WHERE key = ?1",
            [key],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        );

        let (versions, last_updated_ms) = match result {
            Ok(row) => row,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        drop(conn);

        let versions: Vec<CacheVersion> = serde_json::from_str(&versions)?;
        let last_updated = DateTime::from_timestamp_millis(last_updated_ms)
            .ok_or(CacheError::InvalidTimestamp(last_updated_ms))?;

        Ok(Some(CacheRecord {
            key: key.to_string(),
            versions,
            last_updated,
        }))
    }

    fn put(&self, record: &CacheRecord) -> Result<(), CacheError> {
        let unique = record.unique_versions();
        debug!("Storing {} versions for {}", unique.len(), record.key);

        let versions = serde_json::to_string(&unique)?;
        let last_updated = record.last_updated.timestamp_millis();

        let conn = self.lock_conn()?;

        // A single upsert so readers see either the old or the new record
        conn.execute(
            r#"
            INSERT INTO cache_records (key, versions, last_updated)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                versions = excluded.versions,
                last_updated = excluded.last_updated
            "#,
            (&record.key, &versions, last_updated),
        )?;

        Ok(())
    }

    fn stale_keys(&self, now: DateTime<Utc>, ttl: TimeDelta) -> Result<Vec<String>, CacheError> {
        let cutoff = (now - ttl).timestamp_millis();

        let conn = self.lock_conn()?;
        let mut stmt =
            conn.prepare("SELECT key FROM cache_records WHERE last_updated < ?1 ORDER BY key")?;

        let keys = stmt
            .query_map([cutoff], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::types::{Platform, VersionDownloadDetail};
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, SqliteCacheStore) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let store = SqliteCacheStore::new(&db_path).unwrap();
        (temp_dir, store)
    }

    fn cache_version(version: &str) -> CacheVersion {
        CacheVersion {
            version: version.to_string(),
            protocols: vec!["5.0".to_string(), "6.0".to_string()],
            download_details: vec![VersionDownloadDetail {
                platform: Platform::new("linux", "amd64"),
                filename: format!("terraform-provider-foo_{version}_linux_amd64.zip"),
                download_url: format!("https://example.com/{version}/linux_amd64.zip"),
                shasums_url: format!("https://example.com/{version}/SHA256SUMS"),
                shasums_signature_url: format!("https://example.com/{version}/SHA256SUMS.sig"),
                shasum: "e3b0c44298fc1c149afbf4c8996fb924".to_string(),
            }],
        }
    }

    fn record(key: &str, versions: &[&str], last_updated: DateTime<Utc>) -> CacheRecord {
        CacheRecord::new(
            key.to_string(),
            versions.iter().map(|v| cache_version(v)).collect(),
            last_updated,
        )
    }

    #[test]
    fn get_returns_none_for_missing_key() {
        let (_temp_dir, store) = create_test_store();

        assert_eq!(store.get("hashicorp/missing").unwrap(), None);
    }

    #[test]
    fn put_then_get_returns_equivalent_record() {
        let (_temp_dir, store) = create_test_store();
        let written = record("hashicorp/foo", &["2.0.0", "1.0.0"], Utc::now());

        store.put(&written).unwrap();
        let read = store.get("hashicorp/foo").unwrap().unwrap();

        assert_eq!(read.key, written.key);
        assert_eq!(read.versions, written.versions);
        assert_eq!(
            read.last_updated.timestamp_millis(),
            written.last_updated.timestamp_millis()
        );
    }

    #[test]
    fn put_replaces_existing_record_wholesale() {
        let (_temp_dir, store) = create_test_store();

        store
            .put(&record("hashicorp/foo", &["1.0.0", "0.9.0"], Utc::now()))
            .unwrap();
        store
            .put(&record("hashicorp/foo", &["1.1.0"], Utc::now()))
            .unwrap();

        let read = store.get("hashicorp/foo").unwrap().unwrap();
        let versions: Vec<_> = read.versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(versions, vec!["1.1.0"]);
    }

    #[test]
    fn put_keeps_first_of_duplicate_versions() {
        let (_temp_dir, store) = create_test_store();
        let mut duplicate = cache_version("1.0.0");
        duplicate.protocols = vec!["4.0".to_string()];
        let written = CacheRecord {
            key: "hashicorp/foo".to_string(),
            versions: vec![cache_version("1.0.0"), cache_version("0.9.0"), duplicate],
            last_updated: Utc::now(),
        };

        store.put(&written).unwrap();
        let read = store.get("hashicorp/foo").unwrap().unwrap();

        let versions: Vec<_> = read.versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(versions, vec!["1.0.0", "0.9.0"]);
        assert_eq!(read.versions[0].protocols, vec!["5.0", "6.0"]);
    }

    #[test]
    fn get_reports_corrupt_versions_as_error() {
        let (_temp_dir, store) = create_test_store();
        store
            .lock_conn()
            .unwrap()
            .execute(
                "INSERT INTO cache_records (key, versions, last_updated) VALUES ('a/b', 'not json', 0)",
                [],
            )
            .unwrap();

        assert!(matches!(
            store.get("a/b"),
            Err(CacheError::Serialization(_))
        ));
    }

    #[test]
    fn stale_keys_returns_only_records_older_than_ttl() {
        let (_temp_dir, store) = create_test_store();
        let now = Utc::now();
        let ttl = TimeDelta::minutes(55);

        store
            .put(&record("hashicorp/old", &["1.0.0"], now - TimeDelta::hours(2)))
            .unwrap();
        store
            .put(&record("hashicorp/fresh", &["1.0.0"], now - TimeDelta::minutes(5)))
            .unwrap();

        assert_eq!(store.stale_keys(now, ttl).unwrap(), vec!["hashicorp/old"]);
    }

    #[test]
    fn store_persists_across_connections() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        {
            let store = SqliteCacheStore::new(&db_path).unwrap();
            store
                .put(&record("hashicorp/foo", &["1.0.0"], Utc::now()))
                .unwrap();
        }

        let reopened = SqliteCacheStore::new(&db_path).unwrap();
        assert!(reopened.get("hashicorp/foo").unwrap().is_some());
    }
}
