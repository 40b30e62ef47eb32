//! Release harvesting and provider version cache for a module and provider registry.
//!
//! # Modules
//!
//! - [`release`]: Paginated upstream release feed, filtering and asset matching
//! - [`provider`]: Provider version records, cache store and request-time lookup
//! - [`module`]: Module version listing and download resolution
//! - [`config`]: Registry configuration and defaults
//! - [`logging`]: Tracing subscriber setup

pub mod config;
pub mod logging;
pub mod module;
pub mod provider;
pub mod release;
