//! Naming conventions for provider repositories and release artifacts

use crate::provider::types::Platform;

/// Suffix of the checksum manifest asset
pub const SHASUMS_SUFFIX: &str = "_SHA256SUMS";

/// Suffix of the detached signature over the checksum manifest
pub const SHASUMS_SIGNATURE_SUFFIX: &str = "_SHA256SUMS.sig";

/// Suffix of the optional protocol manifest asset
pub const MANIFEST_SUFFIX: &str = "_manifest.json";

/// Repository that hosts releases for provider `provider_type`
pub fn provider_repo_name(provider_type: &str) -> String {
    format!("terraform-provider-{provider_type}")
}

/// Cache key for a provider
pub fn cache_key(namespace: &str, provider_type: &str) -> String {
    format!("{namespace}/{provider_type}")
}

/// Splits a cache key back into namespace and provider type
pub fn parse_cache_key(key: &str) -> Option<(&str, &str)> {
    let (namespace, provider_type) = key.split_once('/')?;
    if namespace.is_empty() || provider_type.is_empty() || provider_type.contains('/') {
        return None;
    }
    Some((namespace, provider_type))
}

/// Suffix of the binary archive built for `platform`
pub fn archive_suffix(platform: &Platform) -> String {
    format!("_{}_{}.zip", platform.os, platform.arch)
}
