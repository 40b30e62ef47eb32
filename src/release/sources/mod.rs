//! Upstream release source implementations

pub mod github;

pub use github::GitHubReleaseSource;
