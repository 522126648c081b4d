//! Stable content fingerprints for audit and debugging

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest
pub const FINGERPRINT_LEN: usize = 16;

/// First 16 hex characters of the SHA-256 digest of `bytes`.
///
/// Reported in metrics only; nothing deduplicates on it.
pub fn content_fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(FINGERPRINT_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_known_value() {
        // sha256("") = e3b0c44298fc1c149afbf4c8996fb924...
        assert_eq!(content_fingerprint(b""), "e3b0c44298fc1c14");
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = content_fingerprint(b"same bytes");
        let b = content_fingerprint(b"same bytes");
        assert_eq!(a, b);
        assert_eq!(a.len(), FINGERPRINT_LEN);
        assert_ne!(a, content_fingerprint(b"other bytes"));
    }
}
