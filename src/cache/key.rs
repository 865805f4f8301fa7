use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

use crate::consts::{CACHE_KEY_LEN, CACHE_KEY_SEPARATOR};

/// Cache key for a (base locator, raw overlay payload) pair.
///
/// SHA-256 over `base:overlay`, standard base64, first 16 characters. The
/// overlay is hashed as received, data URI marker included.
pub fn derive_key(base: &str, overlay: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(base);
    hasher.update(CACHE_KEY_SEPARATOR);
    hasher.update(overlay);
    let mut encoded = STANDARD.encode(hasher.finalize());
    encoded.truncate(CACHE_KEY_LEN);
    encoded
}
