//! Release feed values as returned by an upstream source

use chrono::{DateTime, Utc};

/// A tagged, versioned publication with downloadable assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub id: String,
    pub tag_name: String,
    pub created_at: DateTime<Utc>,
    pub draft: bool,
    pub prerelease: bool,
    pub latest: bool,
    pub assets: Vec<Asset>,
    /// Source archive of the tagged commit
    pub tarball_url: String,
}

impl Release {
    /// Drafts and prereleases are never installable.
    pub fn is_candidate(&self) -> bool {
        !self.draft && !self.prerelease
    }

    /// Version number carried by the tag (`v1.2.3` -> `1.2.3`).
    ///
    /// Returns None for tags that are not semantic versions.
    pub fn version(&self) -> Option<String> {
        let stripped = self.tag_name.strip_prefix('v')?;
        semver::Version::parse(stripped).ok()?;
        Some(stripped.to_string())
    }
}

/// A single downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub download_url: String,
}

/// One page of releases, ordered by creation time descending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleasePage {
    pub releases: Vec<Release>,
    /// Cursor for the following page, None once the feed is exhausted
    pub next_cursor: Option<String>,
}

/// Tag name a release for `version` is expected to carry.
pub fn tag_for_version(version: &str) -> String {
    format!("v{version}")
}
