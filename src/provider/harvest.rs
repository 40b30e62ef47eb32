//! Turns upstream releases into provider version records
//!
//! A release contributes a version only when it carries both the checksum
//! manifest and its signature. Each platform listed in the manifest is then
//! matched to a binary archive; platforms without one are left out of that
//! version rather than failing it.

use chrono::{TimeDelta, Utc};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::provider::checksums::ChecksumManifest;
use crate::provider::naming::{
    MANIFEST_SUFFIX, SHASUMS_SIGNATURE_SUFFIX, SHASUMS_SUFFIX, archive_suffix,
};
use crate::provider::types::{CacheRecord, CacheVersion, Platform, VersionDownloadDetail};
use crate::release::asset::find_asset_by_suffix;
use crate::release::error::RegistryError;
use crate::release::filter::collect_releases_since;
use crate::release::source::ReleaseSource;
use crate::release::types::{Asset, Release};

/// Protocols assumed when a release has no protocol manifest
pub const DEFAULT_PROTOCOLS: &[&str] = &["5.0"];

#[derive(Debug, Deserialize)]
struct ProviderManifest {
    metadata: ProviderManifestMetadata,
}

#[derive(Debug, Deserialize)]
struct ProviderManifestMetadata {
    #[serde(default)]
    protocol_versions: Vec<String>,
}

/// The checksum manifest and signature assets of one release
struct ChecksumAssets {
    shasums: Asset,
    signature: Asset,
}

impl ChecksumAssets {
    fn find(release: &Release) -> Option<Self> {
        let Some(shasums) = find_asset_by_suffix(&release.assets, SHASUMS_SUFFIX) else {
            info!(release = %release.tag_name, "Release has no checksum manifest");
            return None;
        };
        let Some(signature) = find_asset_by_suffix(&release.assets, SHASUMS_SIGNATURE_SUFFIX)
        else {
            info!(release = %release.tag_name, "Release has no checksum signature");
            return None;
        };
        Some(Self { shasums, signature })
    }

    async fn manifest<S>(&self, source: &S) -> Result<ChecksumManifest, RegistryError>
    where
        S: ReleaseSource + ?Sized,
    {
        let body = source.download_asset(&self.shasums.download_url).await?;
        Ok(ChecksumManifest::parse(&String::from_utf8_lossy(&body)))
    }

    fn download_detail(
        &self,
        release: &Release,
        manifest: &ChecksumManifest,
        platform: &Platform,
    ) -> Option<VersionDownloadDetail> {
        let Some(archive) = find_asset_by_suffix(&release.assets, &archive_suffix(platform)) else {
            debug!(release = %release.tag_name, os = %platform.os, arch = %platform.arch, "No archive for platform");
            return None;
        };
        let Some(shasum) = manifest.checksum_for(&archive.name) else {
            debug!(release = %release.tag_name, archive = %archive.name, "Archive missing from checksum manifest");
            return None;
        };

        Some(VersionDownloadDetail {
            platform: platform.clone(),
            shasum: shasum.to_string(),
            filename: archive.name,
            download_url: archive.download_url,
            shasums_url: self.shasums.download_url.clone(),
            shasums_signature_url: self.signature.download_url.clone(),
        })
    }
}

/// Reads supported protocol versions from the release's manifest asset.
///
/// Falls back to [`DEFAULT_PROTOCOLS`] when the release has no manifest or it
/// cannot be parsed.
pub async fn fetch_protocols<S>(source: &S, release: &Release) -> Result<Vec<String>, RegistryError>
where
    S: ReleaseSource + ?Sized,
{
    let defaults = || -> Vec<String> { DEFAULT_PROTOCOLS.iter().map(|p| p.to_string()).collect() };

    let Some(asset) = find_asset_by_suffix(&release.assets, MANIFEST_SUFFIX) else {
        return Ok(defaults());
    };

    let body = source.download_asset(&asset.download_url).await?;
    match serde_json::from_slice::<ProviderManifest>(&body) {
        Ok(manifest) if !manifest.metadata.protocol_versions.is_empty() => {
            Ok(manifest.metadata.protocol_versions)
        }
        Ok(_) => Ok(defaults()),
        Err(e) => {
            warn!(release = %release.tag_name, "Failed to parse provider manifest: {}", e);
            Ok(defaults())
        }
    }
}

/// Builds the version entry for a release across every platform it ships.
///
/// Returns None when the release is not a semantic version, lacks checksum
/// assets, or no platform could be fully resolved.
pub async fn build_cache_version<S>(
    source: &S,
    release: &Release,
) -> Result<Option<CacheVersion>, RegistryError>
where
    S: ReleaseSource + ?Sized,
{
    let Some(version) = release.version() else {
        info!(release = %release.tag_name, "Skipping release with non-semver tag");
        return Ok(None);
    };
    let Some(assets) = ChecksumAssets::find(release) else {
        return Ok(None);
    };

    let manifest = assets.manifest(source).await?;
    let download_details: Vec<_> = manifest
        .platforms()
        .iter()
        .filter_map(|platform| assets.download_detail(release, &manifest, platform))
        .collect();

    if download_details.is_empty() {
        info!(release = %release.tag_name, "No platform could be resolved for release");
        return Ok(None);
    }

    let protocols = fetch_protocols(source, release).await?;

    Ok(Some(CacheVersion {
        version,
        protocols,
        download_details,
    }))
}

/// Resolves a single platform of a release, for lookups that bypass the cache.
pub async fn resolve_download_detail<S>(
    source: &S,
    release: &Release,
    platform: &Platform,
) -> Result<Option<(Vec<String>, VersionDownloadDetail)>, RegistryError>
where
    S: ReleaseSource + ?Sized,
{
    let Some(assets) = ChecksumAssets::find(release) else {
        return Ok(None);
    };
    if find_asset_by_suffix(&release.assets, &archive_suffix(platform)).is_none() {
        info!(release = %release.tag_name, os = %platform.os, arch = %platform.arch, "Platform not built for release");
        return Ok(None);
    }

    let manifest = assets.manifest(source).await?;
    let Some(detail) = assets.download_detail(release, &manifest, platform) else {
        return Ok(None);
    };

    let protocols = fetch_protocols(source, release).await?;
    Ok(Some((protocols, detail)))
}

/// Harvests every installable version of a provider repository into a record.
///
/// The record is stamped with the time the harvest started, so a release
/// published while it runs is still newer than `last_updated`.
#[instrument(skip(source))]
pub async fn harvest_provider<S>(
    source: &S,
    owner: &str,
    repo: &str,
    key: &str,
) -> Result<CacheRecord, RegistryError>
where
    S: ReleaseSource + ?Sized,
{
    let started = Utc::now();
    let releases = collect_releases_since(source, owner, repo, None, TimeDelta::zero()).await?;

    let mut versions = Vec::with_capacity(releases.len());
    for release in &releases {
        if let Some(version) = build_cache_version(source, release).await? {
            versions.push(version);
        }
    }

    info!(releases = releases.len(), versions = versions.len(), "Harvested provider versions");
    Ok(CacheRecord::new(key.to_string(), versions, started))
}
