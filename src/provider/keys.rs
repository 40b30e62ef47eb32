//! Signing keys served alongside provider downloads
//!
//! Keys are looked up per request and never stored in cache records, so a
//! key rotation takes effect without invalidating cached versions.

use std::collections::HashMap;

use crate::provider::types::{GpgPublicKey, SigningKeys};

#[derive(Debug, Clone, Default)]
pub struct SigningKeyTable {
    keys: HashMap<String, Vec<GpgPublicKey>>,
}

impl SigningKeyTable {
    pub fn new(keys: HashMap<String, Vec<GpgPublicKey>>) -> Self {
        Self { keys }
    }

    /// Keys published for `namespace`, empty when the namespace has none
    pub fn signing_keys(&self, namespace: &str) -> SigningKeys {
        SigningKeys {
            gpg_public_keys: self.keys.get(namespace).cloned().unwrap_or_default(),
        }
    }
}
