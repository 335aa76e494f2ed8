use sha2::Digest;
use sha2::Sha256;

/// Lowercase-hex SHA-256 digest of raw content bytes.
///
/// Every producer of a `ConfigDocument` (upload, rollback) and every
/// integrity check (disk cache load) uses this same digest.
pub fn content_hash(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        // echo -n '{"k":1}' | sha256sum
        assert_eq!(
            content_hash(b"{\"k\":1}"),
            "a0da1fce57d0e4f9f0ae4e4cbe040d34dcc046255c6c8d18e97f55aaed0655f0"
        );
    }

    #[test]
    fn test_deterministic_and_content_sensitive() {
        assert_eq!(content_hash(b"abc"), content_hash(b"abc"));
        assert_ne!(content_hash(b"abc"), content_hash(b"abd"));
        assert_eq!(content_hash(b"").len(), 64);
    }
}
