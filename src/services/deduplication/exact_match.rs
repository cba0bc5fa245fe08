//! Exact-match de-duplication.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::{ContentHasher, Deduplicator};
use crate::context::CallContext;
use crate::models::Document;

/// Flags documents whose normalized content has been seen before.
///
/// The first occurrence of a piece of content passes and is remembered;
/// every later occurrence, in the same call or a later one, is flagged.
/// Content is reserved when it is checked and forgotten again on
/// [`release`](Deduplicator::release), so a failed insert can be retried.
#[derive(Debug, Default)]
pub struct ExactMatchDeduplicator {
    seen: Mutex<HashSet<String>>,
}

impl ExactMatchDeduplicator {
    /// Creates a deduplicator with no remembered content.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct contents remembered.
    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing has been remembered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets all remembered content.
    pub fn clear(&self) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Deduplicator for ExactMatchDeduplicator {
    fn is_duplicate(&self, _ctx: &CallContext, document: &Document) -> bool {
        let hash = ContentHasher::hash(&document.page_content);
        let duplicate = !self
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(hash);
        if duplicate {
            debug!(content_len = document.page_content.len(), "exact duplicate skipped");
        }
        duplicate
    }

    fn release(&self, _ctx: &CallContext, document: &Document) {
        let hash = ContentHasher::hash(&document.page_content);
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_passes_repeat_flagged() {
        let dedup = ExactMatchDeduplicator::new();
        let ctx = CallContext::new();

        assert!(!dedup.is_duplicate(&ctx, &Document::new("Tokyo")));
        assert!(dedup.is_duplicate(&ctx, &Document::new("Tokyo")));
        assert!(dedup.is_duplicate(&ctx, &Document::new("  tokyo ")));
        assert!(!dedup.is_duplicate(&ctx, &Document::new("Paris")));
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn test_clear_forgets() {
        let dedup = ExactMatchDeduplicator::new();
        let ctx = CallContext::new();
        assert!(!dedup.is_duplicate(&ctx, &Document::new("London")));

        dedup.clear();
        assert!(dedup.is_empty());
        assert!(!dedup.is_duplicate(&ctx, &Document::new("London")));
    }

    #[test]
    fn test_release_allows_retry() {
        let dedup = ExactMatchDeduplicator::new();
        let ctx = CallContext::new();
        let doc = Document::new("Paris");
        assert!(!dedup.is_duplicate(&ctx, &doc));

        dedup.release(&ctx, &Document::new("  PARIS "));
        assert!(dedup.is_empty());
        assert!(!dedup.is_duplicate(&ctx, &doc));
        assert!(dedup.is_duplicate(&ctx, &doc));
    }

    #[test]
    fn test_metadata_ignored() {
        let dedup = ExactMatchDeduplicator::new();
        let ctx = CallContext::new();
        assert!(!dedup.is_duplicate(&ctx, &Document::new("Tokyo").with_metadata("v", 1)));
        assert!(dedup.is_duplicate(&ctx, &Document::new("Tokyo").with_metadata("v", 2)));
    }
}
