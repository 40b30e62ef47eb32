//! Release traversals with early termination
//!
//! Both traversals consume pages strictly in order, requesting page N+1 only
//! after page N has been inspected, and skip drafts and prereleases.

use std::pin::pin;

use chrono::{DateTime, TimeDelta, Utc};
use futures::TryStreamExt;
use tracing::{debug, info, instrument};

use crate::release::error::RegistryError;
use crate::release::pages::release_pages;
use crate::release::source::ReleaseSource;
use crate::release::types::{Release, tag_for_version};

/// Finds the installable release tagged `v{version}`.
///
/// Returns `Ok(None)` when pagination is exhausted without a match.
#[instrument(skip(source))]
pub async fn find_release<S>(
    source: &S,
    owner: &str,
    name: &str,
    version: &str,
) -> Result<Option<Release>, RegistryError>
where
    S: ReleaseSource + ?Sized,
{
    let tag = tag_for_version(version);
    let mut pages = pin!(release_pages(source, owner, name));

    while let Some(releases) = pages.try_next().await? {
        let found = releases
            .into_iter()
            .find(|release| release.is_candidate() && release.tag_name == tag);

        if let Some(release) = found {
            info!(release = %release.tag_name, "Release found");
            return Ok(Some(release));
        }
    }

    info!("Release not found");
    Ok(None)
}

/// Collects installable releases created at or after `since - padding`.
///
/// Releases arrive newest first, so the first release older than the cutoff
/// ends the traversal without requesting further pages. Without `since` every
/// installable release is collected.
#[instrument(skip(source, padding))]
pub async fn collect_releases_since<S>(
    source: &S,
    owner: &str,
    name: &str,
    since: Option<DateTime<Utc>>,
    padding: TimeDelta,
) -> Result<Vec<Release>, RegistryError>
where
    S: ReleaseSource + ?Sized,
{
    let cutoff = since.map(|since| since - padding);
    let mut collected = Vec::new();
    let mut pages = pin!(release_pages(source, owner, name));

    while let Some(releases) = pages.try_next().await? {
        debug!(count = releases.len(), "Checking for possible new releases");

        for release in releases {
            if !release.is_candidate() {
                continue;
            }

            if cutoff.is_some_and(|cutoff| release.created_at < cutoff) {
                info!(
                    release = %release.tag_name,
                    created_at = %release.created_at,
                    "Release was created before cutoff, stopping"
                );
                return Ok(collected);
            }

            debug!(release = %release.tag_name, created_at = %release.created_at, "Release collected");
            collected.push(release);
        }
    }

    info!(count = collected.len(), "Releases collected");
    Ok(collected)
}
