//! GitHub release source (GraphQL release pages, REST repository lookup)

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{ASSET_DOWNLOAD_TIMEOUT_SECS, RELEASES_PAGE_SIZE};
use crate::release::error::RegistryError;
use crate::release::source::ReleaseSource;
use crate::release::types::{Asset, Release, ReleasePage};

/// Default base URL for GitHub API
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

const RELEASES_QUERY: &str = r#"query($owner: String!, $name: String!, $perPage: Int!, $endCursor: String) {
  repository(owner: $owner, name: $name) {
    releases(first: $perPage, orderBy: {field: CREATED_AT, direction: DESC}, after: $endCursor) {
      pageInfo { hasNextPage endCursor }
      nodes {
        id
        tagName
        isDraft
        isPrerelease
        isLatest
        createdAt
        tagCommit { tarballUrl }
        releaseAssets(first: 100) { nodes { id name downloadUrl } }
      }
    }
  }
}"#;

/// Request body for one page of releases
#[derive(Debug, Serialize)]
struct ReleasesRequest<'a> {
    query: &'static str,
    variables: ReleasesVariables<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReleasesVariables<'a> {
    owner: &'a str,
    name: &'a str,
    per_page: u32,
    end_cursor: Option<&'a str>,
}

/// Response envelope from the GraphQL endpoint
#[derive(Debug, Deserialize)]
struct ReleasesResponse {
    data: Option<ReleasesData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ReleasesData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
struct RepositoryNode {
    releases: ReleaseConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseConnection {
    page_info: PageInfo,
    nodes: Vec<ReleaseNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseNode {
    id: String,
    tag_name: String,
    is_draft: bool,
    is_prerelease: bool,
    is_latest: bool,
    created_at: DateTime<Utc>,
    tag_commit: Option<TagCommit>,
    release_assets: AssetConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagCommit {
    tarball_url: String,
}

#[derive(Debug, Deserialize)]
struct AssetConnection {
    nodes: Vec<AssetNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetNode {
    id: String,
    name: String,
    download_url: String,
}

impl From<ReleaseNode> for Release {
    fn from(node: ReleaseNode) -> Self {
        Self {
            id: node.id,
            tag_name: node.tag_name,
            created_at: node.created_at,
            draft: node.is_draft,
            prerelease: node.is_prerelease,
            latest: node.is_latest,
            assets: node
                .release_assets
                .nodes
                .into_iter()
                .map(|a| Asset {
                    id: a.id,
                    name: a.name,
                    download_url: a.download_url,
                })
                .collect(),
            tarball_url: node.tag_commit.map(|c| c.tarball_url).unwrap_or_default(),
        }
    }
}

/// Release source backed by the GitHub API
pub struct GitHubReleaseSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubReleaseSource {
    /// Creates a new GitHubReleaseSource with a custom base URL
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .user_agent("release-registry")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn rate_limit_error(response: &reqwest::Response) -> RegistryError {
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());
    RegistryError::RateLimited {
        retry_after_secs: retry_after,
    }
}

#[async_trait::async_trait]
impl ReleaseSource for GitHubReleaseSource {
    async fn fetch_release_page(
        &self,
        owner: &str,
        name: &str,
        cursor: Option<String>,
    ) -> Result<ReleasePage, RegistryError> {
        let url = format!("{}/graphql", self.base_url);
        let body = ReleasesRequest {
            query: RELEASES_QUERY,
            variables: ReleasesVariables {
                owner,
                name,
                per_page: RELEASES_PAGE_SIZE,
                end_cursor: cursor.as_deref(),
            },
        };

        let response = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(rate_limit_error(&response));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED && self.token.is_none() {
            warn!("GitHub GraphQL API rejected an anonymous request: {}", url);
            return Err(RegistryError::UpstreamQuery(format!(
                "Unexpected status: {}; the GraphQL API requires a token",
                status
            )));
        }

        if !status.is_success() {
            warn!("GitHub GraphQL API returned status {}: {}", status, url);
            return Err(RegistryError::UpstreamQuery(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let payload: ReleasesResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub releases response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        if !payload.errors.is_empty() {
            let messages: Vec<_> = payload.errors.into_iter().map(|e| e.message).collect();
            return Err(RegistryError::UpstreamQuery(messages.join("; ")));
        }

        let repository = payload
            .data
            .and_then(|data| data.repository)
            .ok_or_else(|| {
                RegistryError::UpstreamQuery(format!("Repository {owner}/{name} not returned"))
            })?;

        let connection = repository.releases;
        let next_cursor = if connection.page_info.has_next_page {
            connection.page_info.end_cursor
        } else {
            None
        };

        Ok(ReleasePage {
            releases: connection.nodes.into_iter().map(Release::from).collect(),
            next_cursor,
        })
    }

    async fn repository_exists(&self, owner: &str, name: &str) -> Result<bool, RegistryError> {
        let url = format!("{}/repos/{}/{}", self.base_url, owner, name);

        let response = self
            .authorize(self.client.get(&url))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            info!(owner, name, "Repository does not exist");
            return Ok(false);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(rate_limit_error(&response));
        }

        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(RegistryError::UpstreamQuery(format!(
                "Unexpected status: {}",
                status
            )));
        }

        Ok(true)
    }

    async fn download_asset(&self, url: &str) -> Result<Vec<u8>, RegistryError> {
        info!(url, "Downloading asset");

        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(ASSET_DOWNLOAD_TIMEOUT_SECS))
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(url, status = status.as_u16(), "Unexpected status code when downloading asset");
            return Err(RegistryError::DownloadStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}
