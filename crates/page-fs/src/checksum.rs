//! SHA-256 checksums in the canonical `sha256:<hex>` format
//!
//! Used to fingerprint skeleton payloads so a deferred create can tell whether
//! the skeleton changed between enqueue and apply.

use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

/// Compute the checksum of raw bytes.
pub fn compute_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_known_value() {
        assert_eq!(
            compute_checksum(b"hello world"),
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn different_content_different_checksum() {
        assert_ne!(compute_checksum(b"{\"a\":1}"), compute_checksum(b"{\"a\":2}"));
    }
}
