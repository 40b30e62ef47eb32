//! Release builders and an in-memory paged source shared by unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::release::error::RegistryError;
use crate::release::source::ReleaseSource;
use crate::release::types::{Asset, Release, ReleasePage};

/// Reference instant all fixture timestamps are relative to
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// A published release created `minutes` after [`base_time`]
pub fn release(tag: &str, minutes: i64) -> Release {
    Release {
        id: format!("id-{tag}"),
        tag_name: tag.to_string(),
        created_at: base_time() + TimeDelta::minutes(minutes),
        draft: false,
        prerelease: false,
        latest: false,
        assets: vec![],
        tarball_url: format!("https://codeload.example.com/tarball/{tag}"),
    }
}

pub fn asset(name: &str) -> Asset {
    Asset {
        id: format!("id-{name}"),
        name: name.to_string(),
        download_url: format!("https://downloads.example.com/{name}"),
    }
}

/// Serves fixed pages, using the page index as the cursor, and counts queries.
pub struct PagedSource {
    pages: Vec<Vec<Release>>,
    downloads: HashMap<String, Vec<u8>>,
    page_requests: AtomicUsize,
}

impl PagedSource {
    pub fn new(pages: Vec<Vec<Release>>) -> Self {
        Self {
            pages,
            downloads: HashMap::new(),
            page_requests: AtomicUsize::new(0),
        }
    }

    /// Splits `releases` into pages of `page_size`
    pub fn paged(releases: Vec<Release>, page_size: usize) -> Self {
        let pages = releases
            .chunks(page_size)
            .map(|chunk| chunk.to_vec())
            .collect();
        Self::new(pages)
    }

    pub fn with_download(mut self, url: &str, body: &str) -> Self {
        self.downloads
            .insert(url.to_string(), body.as_bytes().to_vec());
        self
    }

    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ReleaseSource for PagedSource {
    async fn fetch_release_page(
        &self,
        _owner: &str,
        _name: &str,
        cursor: Option<String>,
    ) -> Result<ReleasePage, RegistryError> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);

        let index = match cursor {
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|e| RegistryError::UpstreamQuery(e.to_string()))?,
            None => 0,
        };

        let releases = self.pages.get(index).cloned().unwrap_or_default();
        let next_cursor = (index + 1 < self.pages.len()).then(|| (index + 1).to_string());

        Ok(ReleasePage {
            releases,
            next_cursor,
        })
    }

    async fn repository_exists(&self, _owner: &str, _name: &str) -> Result<bool, RegistryError> {
        Ok(true)
    }

    async fn download_asset(&self, url: &str) -> Result<Vec<u8>, RegistryError> {
        self.downloads
            .get(url)
            .cloned()
            .ok_or(RegistryError::DownloadStatus(404))
    }
}
