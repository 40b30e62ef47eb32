//! Source trait for querying release history from an upstream host

#[cfg(test)]
use mockall::automock;

use crate::release::error::RegistryError;
use crate::release::types::ReleasePage;

/// Trait for reading releases and release assets from an upstream host
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetches one page of releases for a repository
    ///
    /// # Arguments
    /// * `owner` - Repository owner (e.g., "hashicorp")
    /// * `name` - Repository name (e.g., "terraform-provider-aws")
    /// * `cursor` - Continuation cursor from the previous page, None for the first page
    ///
    /// # Returns
    /// * `Ok(ReleasePage)` - Releases ordered from newest to oldest, plus the next cursor
    /// * `Err(RegistryError)` - If the query could not be built or sent
    async fn fetch_release_page(
        &self,
        owner: &str,
        name: &str,
        cursor: Option<String>,
    ) -> Result<ReleasePage, RegistryError>;

    /// Checks whether a repository exists, distinguishing absence from transport failures
    async fn repository_exists(&self, owner: &str, name: &str) -> Result<bool, RegistryError>;

    /// Downloads the contents of a release asset
    ///
    /// Any status other than 200 is an error.
    async fn download_asset(&self, url: &str) -> Result<Vec<u8>, RegistryError>;
}
