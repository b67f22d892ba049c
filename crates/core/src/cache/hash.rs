//! Storage key derivation for cache entries.

use sha2::{Digest, Sha256};

use crate::http::RequestKey;

/// Compute the fixed-width row key for a request key.
pub fn compute_key_hash(key: &RequestKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_str().as_bytes());
    hex::encode(hasher.finalize())
}
