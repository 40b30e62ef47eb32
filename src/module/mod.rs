//! Module version listing and download resolution
//!
//! Modules are served straight from the upstream release feed and are never
//! cached.

pub mod lookup;
pub mod types;
