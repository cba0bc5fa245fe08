//! Content hashing for exact-match de-duplication.

use sha2::{Digest, Sha256};

/// SHA-256 hasher over normalized content.
///
/// Content is trimmed, lowercased, and has whitespace runs collapsed to a
/// single space before hashing.
///
/// ```rust
/// use annstore::services::deduplication::ContentHasher;
///
/// let hash = ContentHasher::hash("Tokyo is the capital of Japan");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, ContentHasher::hash("  tokyo IS the   capital of japan "));
/// ```
pub struct ContentHasher;

impl ContentHasher {
    /// Lowercase hex SHA-256 of the normalized content.
    #[must_use]
    pub fn hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(Self::normalize(content).as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Normalizes content for hashing.
    #[must_use]
    pub fn normalize(content: &str) -> String {
        content
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}
