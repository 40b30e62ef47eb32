//! Provider version cache and lookups
//!
//! Provider releases are harvested into one [`types::CacheRecord`] per
//! `namespace/type`, stored by a [`cache::CacheStore`] and served through
//! [`lookup::ProviderLookup`]. Records are replaced whole on every write.

pub mod cache;
pub mod checksums;
pub mod harvest;
pub mod keys;
pub mod lookup;
pub mod naming;
pub mod types;
