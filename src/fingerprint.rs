//! Content fingerprints for announcement deduplication.

use sha2::Digest;
use sha2::Sha256;

/// Collapses whitespace runs to single spaces and trims the ends.
///
/// Every fingerprint call site goes through this, so two renderings of
/// the same announcement that differ only in incidental whitespace hash
/// to the same digest.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// SHA-256 digest over the normalized title and body, hex encoded.
pub fn fingerprint(title: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(title).as_bytes());
    hasher.update(normalize(body).as_bytes());
    hex::encode(hasher.finalize())
}
