//! Provider version records and registry response shapes

use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Operating system and architecture a provider binary is built for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
        }
    }
}

/// One platform's resolved artifact for a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDownloadDetail {
    pub platform: Platform,
    pub filename: String,
    pub download_url: String,
    pub shasums_url: String,
    pub shasums_signature_url: String,
    pub shasum: String,
}

/// Everything needed to serve one provider version, without signing keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheVersion {
    pub version: String,
    pub protocols: Vec<String>,
    pub download_details: Vec<VersionDownloadDetail>,
}

impl CacheVersion {
    /// Converts to the version listing entry
    pub fn to_version(&self) -> Version {
        Version {
            version: self.version.clone(),
            protocols: self.protocols.clone(),
            platforms: self
                .download_details
                .iter()
                .map(|d| d.platform.clone())
                .collect(),
        }
    }

    /// Download details for one platform, with empty signing keys
    pub fn version_details(&self, os: &str, arch: &str) -> Option<VersionDetails> {
        self.download_details
            .iter()
            .find(|d| d.platform.os == os && d.platform.arch == arch)
            .map(|d| VersionDetails::new(self.protocols.clone(), d.clone()))
    }
}

/// All known versions of one provider, stored and replaced as a whole
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    /// `{namespace}/{type}`
    pub key: String,
    pub versions: Vec<CacheVersion>,
    pub last_updated: DateTime<Utc>,
}

impl CacheRecord {
    /// Builds a record, keeping the first occurrence of each version string
    pub fn new(key: String, versions: Vec<CacheVersion>, last_updated: DateTime<Utc>) -> Self {
        let mut unique: IndexMap<String, CacheVersion> = IndexMap::with_capacity(versions.len());
        for version in versions {
            unique.entry(version.version.clone()).or_insert(version);
        }

        Self {
            key,
            versions: unique.into_values().collect(),
            last_updated,
        }
    }

    /// Versions in order, skipping any version string seen earlier.
    ///
    /// The fields are public, so a record built without [`CacheRecord::new`]
    /// may still carry duplicates.
    pub fn unique_versions(&self) -> Vec<&CacheVersion> {
        let mut unique: IndexMap<&str, &CacheVersion> = IndexMap::with_capacity(self.versions.len());
        for version in &self.versions {
            unique.entry(version.version.as_str()).or_insert(version);
        }
        unique.into_values().collect()
    }

    /// True when the record is older than `ttl` at `now`
    pub fn is_stale_at(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now - self.last_updated > ttl
    }

    pub fn is_stale(&self, ttl: TimeDelta) -> bool {
        self.is_stale_at(Utc::now(), ttl)
    }

    pub fn contains_version(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v.version == version)
    }

    pub fn to_versions(&self) -> Vec<Version> {
        self.versions.iter().map(CacheVersion::to_version).collect()
    }

    /// Download details for an exact version and platform
    pub fn version_details(&self, version: &str, os: &str, arch: &str) -> Option<VersionDetails> {
        self.versions
            .iter()
            .find(|v| v.version == version)
            .and_then(|v| v.version_details(os, arch))
    }
}

/// Provider version listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub version: String,
    pub protocols: Vec<String>,
    pub platforms: Vec<Platform>,
}

/// Response body for listing provider versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionList {
    pub versions: Vec<Version>,
}

impl From<&CacheRecord> for VersionList {
    fn from(record: &CacheRecord) -> Self {
        Self {
            versions: record.to_versions(),
        }
    }
}

/// Response body for downloading one provider version on one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDetails {
    pub protocols: Vec<String>,
    pub os: String,
    pub arch: String,
    pub filename: String,
    pub download_url: String,
    pub shasums_url: String,
    pub shasums_signature_url: String,
    pub shasum: String,
    pub signing_keys: SigningKeys,
}

impl VersionDetails {
    pub fn new(protocols: Vec<String>, detail: VersionDownloadDetail) -> Self {
        Self {
            protocols,
            os: detail.platform.os,
            arch: detail.platform.arch,
            filename: detail.filename,
            download_url: detail.download_url,
            shasums_url: detail.shasums_url,
            shasums_signature_url: detail.shasums_signature_url,
            shasum: detail.shasum,
            signing_keys: SigningKeys::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKeys {
    pub gpg_public_keys: Vec<GpgPublicKey>,
}

/// Armored public key used to verify a checksum manifest signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpgPublicKey {
    #[serde(alias = "keyId")]
    pub key_id: String,
    #[serde(alias = "asciiArmor")]
    pub ascii_armor: String,
}
