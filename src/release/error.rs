use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Cache lock poisoned")]
    LockPoisoned,

    #[error("Failed to (de)serialize cache record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid last_updated timestamp: {0}")]
    InvalidTimestamp(i64),

    #[error("No cache store configured")]
    NotConfigured,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upstream query failed: {0}")]
    UpstreamQuery(String),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unexpected status code when downloading asset: {0}")]
    DownloadStatus(u16),

    #[error("Cache unavailable: {0}")]
    Cache(#[from] CacheError),

    #[error("Request deadline exceeded")]
    DeadlineExceeded,
}
