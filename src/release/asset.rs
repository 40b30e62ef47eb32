//! Asset matching by file name suffix

use tracing::debug;

use crate::release::types::Asset;

/// Returns the first asset whose name ends with `suffix`.
///
/// Asset names embed the project name and version, so only the suffix is
/// stable across providers. A missing asset is an expected outcome.
pub fn find_asset_by_suffix(assets: &[Asset], suffix: &str) -> Option<Asset> {
    let found = assets
        .iter()
        .find(|asset| asset.name.ends_with(suffix))
        .cloned();

    match &found {
        Some(asset) => debug!(suffix, asset = %asset.name, "Asset found"),
        None => debug!(suffix, "Asset not found"),
    }

    found
}
