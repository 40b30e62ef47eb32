//! Upstream release harvesting
//!
//! Pages through a repository's release history, newest first, and narrows it
//! down to installable releases.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Source    │────▶│    Pages    │────▶│   Filter    │
//! │ (one page)  │     │  (cursor)   │     │ (stop rule) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │   Sources   │                         │    Asset    │
//! │  (github)   │                         │  (suffix)   │
//! └─────────────┘                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`source`]: Trait for querying one page of releases from an upstream
//! - [`sources`]: Concrete upstream implementations (GitHub)
//! - [`pages`]: Lazy cursor-driven page stream
//! - [`filter`]: Find-by-version and collect-since traversals
//! - [`asset`]: Suffix matching over a release's assets
//! - [`error`]: Error types for upstream and cache operations
//! - [`types`]: Release, Asset and ReleasePage

pub mod asset;
pub mod error;
pub mod filter;
pub mod pages;
pub mod source;
pub mod sources;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;
