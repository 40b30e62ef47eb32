//! In-memory release source for driving lookups without network access

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use release_registry::release::error::RegistryError;
use release_registry::release::source::ReleaseSource;
use release_registry::release::types::{Asset, Release, ReleasePage};

const DOWNLOAD_BASE: &str = "https://downloads.example.com";

/// Fake upstream holding releases per repository, newest first.
///
/// Cursors are page indexes. Calls are counted so tests can assert how much
/// upstream traffic a lookup caused.
pub struct FakeReleaseSource {
    page_size: usize,
    repositories: Mutex<HashMap<(String, String), Vec<Release>>>,
    downloads: Mutex<HashMap<String, Vec<u8>>>,
    publish_on_download: Mutex<Option<PendingRelease>>,
    page_requests: AtomicUsize,
    download_requests: AtomicUsize,
}

/// Provider release that shows up upstream while a harvest is running
struct PendingRelease {
    owner: String,
    provider_type: String,
    version: String,
    platforms: Vec<(String, String)>,
}

impl Default for FakeReleaseSource {
    fn default() -> Self {
        Self::new(100)
    }
}

impl FakeReleaseSource {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            repositories: Mutex::new(HashMap::new()),
            downloads: Mutex::new(HashMap::new()),
            publish_on_download: Mutex::new(None),
            page_requests: AtomicUsize::new(0),
            download_requests: AtomicUsize::new(0),
        }
    }

    /// Registers an empty repository
    pub fn add_repository(&self, owner: &str, repo: &str) {
        self.repositories
            .lock()
            .unwrap()
            .entry((owner.to_string(), repo.to_string()))
            .or_default();
    }

    /// Adds a release, keeping the repository ordered newest first
    pub fn add_release(&self, owner: &str, repo: &str, release: Release) {
        let mut repositories = self.repositories.lock().unwrap();
        let releases = repositories
            .entry((owner.to_string(), repo.to_string()))
            .or_default();
        releases.push(release);
        releases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    pub fn add_download(&self, url: &str, body: &str) {
        self.downloads
            .lock()
            .unwrap()
            .insert(url.to_string(), body.as_bytes().to_vec());
    }

    /// Adds a signed provider release built for `platforms`, with its checksum manifest
    pub fn add_provider_release(
        &self,
        owner: &str,
        provider_type: &str,
        version: &str,
        created_at: DateTime<Utc>,
        platforms: &[(&str, &str)],
    ) {
        let repo = format!("terraform-provider-{provider_type}");
        let prefix = format!("{repo}_{version}");

        let mut assets: Vec<Asset> = platforms
            .iter()
            .map(|(os, arch)| asset(&format!("{prefix}_{os}_{arch}.zip")))
            .collect();
        assets.push(asset(&format!("{prefix}_SHA256SUMS")));
        assets.push(asset(&format!("{prefix}_SHA256SUMS.sig")));

        let shasums: String = platforms
            .iter()
            .map(|(os, arch)| format!("sha-{version}-{os}-{arch}  {prefix}_{os}_{arch}.zip\n"))
            .collect();
        self.add_download(&download_url(&format!("{prefix}_SHA256SUMS")), &shasums);

        self.add_release(owner, &repo, release(&format!("v{version}"), created_at, assets));
    }

    /// Publishes a provider release, stamped with the current time, during the
    /// next asset download
    pub fn publish_during_download(
        &self,
        owner: &str,
        provider_type: &str,
        version: &str,
        platforms: &[(&str, &str)],
    ) {
        *self.publish_on_download.lock().unwrap() = Some(PendingRelease {
            owner: owner.to_string(),
            provider_type: provider_type.to_string(),
            version: version.to_string(),
            platforms: platforms
                .iter()
                .map(|(os, arch)| (os.to_string(), arch.to_string()))
                .collect(),
        });
    }

    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }

    pub fn download_requests(&self) -> usize {
        self.download_requests.load(Ordering::SeqCst)
    }

    /// Total upstream calls of any kind except existence checks
    pub fn upstream_requests(&self) -> usize {
        self.page_requests() + self.download_requests()
    }
}

#[async_trait]
impl ReleaseSource for FakeReleaseSource {
    async fn fetch_release_page(
        &self,
        owner: &str,
        name: &str,
        cursor: Option<String>,
    ) -> Result<ReleasePage, RegistryError> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);

        let repositories = self.repositories.lock().unwrap();
        let Some(releases) = repositories.get(&(owner.to_string(), name.to_string())) else {
            return Err(RegistryError::UpstreamQuery(format!(
                "Could not resolve to a Repository with the name '{owner}/{name}'"
            )));
        };

        let index: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
        let start = index * self.page_size;
        let page: Vec<Release> = releases.iter().skip(start).take(self.page_size).cloned().collect();
        let next_cursor = (start + self.page_size < releases.len()).then(|| (index + 1).to_string());

        Ok(ReleasePage {
            releases: page,
            next_cursor,
        })
    }

    async fn repository_exists(&self, owner: &str, name: &str) -> Result<bool, RegistryError> {
        Ok(self
            .repositories
            .lock()
            .unwrap()
            .contains_key(&(owner.to_string(), name.to_string())))
    }

    async fn download_asset(&self, url: &str) -> Result<Vec<u8>, RegistryError> {
        self.download_requests.fetch_add(1, Ordering::SeqCst);

        let pending = self.publish_on_download.lock().unwrap().take();
        if let Some(pending) = pending {
            let platforms: Vec<(&str, &str)> = pending
                .platforms
                .iter()
                .map(|(os, arch)| (os.as_str(), arch.as_str()))
                .collect();
            self.add_provider_release(
                &pending.owner,
                &pending.provider_type,
                &pending.version,
                Utc::now(),
                &platforms,
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        self.downloads
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(RegistryError::DownloadStatus(404))
    }
}

pub fn download_url(name: &str) -> String {
    format!("{DOWNLOAD_BASE}/{name}")
}

pub fn asset(name: &str) -> Asset {
    Asset {
        id: format!("asset-{name}"),
        name: name.to_string(),
        download_url: download_url(name),
    }
}

/// A published release
pub fn release(tag: &str, created_at: DateTime<Utc>, assets: Vec<Asset>) -> Release {
    Release {
        id: format!("release-{tag}"),
        tag_name: tag.to_string(),
        created_at,
        draft: false,
        prerelease: false,
        latest: false,
        assets,
        tarball_url: format!("https://codeload.example.com/tarball/{tag}"),
    }
}
