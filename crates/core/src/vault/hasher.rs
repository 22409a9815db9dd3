//! Content hashing for change tracking.

use sha2::{Digest, Sha256};

/// Compute the checksum of raw note bytes.
/// SHA-256, returned as lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_known_value() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_content_hash_consistent() {
        let content = b"# Hello\n\nThis is a test.";
        assert_eq!(content_hash(content), content_hash(content));
    }

    #[test]
    fn test_content_hash_different_content() {
        assert_ne!(content_hash(b"# Hello"), content_hash(b"# World"));
    }

    #[test]
    fn test_content_hash_is_byte_exact() {
        // Line endings are content.
        assert_ne!(content_hash(b"a\nb"), content_hash(b"a\r\nb"));
    }
}
