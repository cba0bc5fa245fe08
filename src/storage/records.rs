//! Document records keyed by index id.
//!
//! Content and metadata live in two maps sharing the id space of the
//! [`crate::AnnIndex`]. Records are never updated or removed.

use std::collections::HashMap;

use crate::models::{Document, Metadata};

/// Content and metadata tables.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    contents: HashMap<u32, String>,
    metadata: HashMap<u32, Metadata>,
}

impl RecordStore {
    /// Creates empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates tables pre-sized for `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            contents: HashMap::with_capacity(capacity),
            metadata: HashMap::with_capacity(capacity),
        }
    }

    /// Stores a document's content and metadata under `id`.
    ///
    /// The score field is not stored; scores belong to a query.
    pub fn insert(&mut self, id: u32, document: Document) {
        self.contents.insert(id, document.page_content);
        self.metadata.insert(id, document.metadata);
    }

    /// Rebuilds the document stored under `id` with a zero score.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<Document> {
        let page_content = self.contents.get(&id)?.clone();
        let metadata = self.metadata.get(&id).cloned().unwrap_or_default();
        Some(Document {
            page_content,
            metadata,
            score: 0.0,
        })
    }

    /// Returns true if a record exists for `id`.
    #[must_use]
    pub fn contains(&self, id: u32) -> bool {
        self.contents.contains_key(&id)
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut records = RecordStore::new();
        let mut doc = Document::new("Tokyo").with_metadata("country", "Japan");
        doc.score = 0.7;
        records.insert(1, doc);

        let stored = records.get(1).expect("record");
        assert_eq!(stored.page_content, "Tokyo");
        assert_eq!(stored.metadata_value("country"), Some(&serde_json::json!("Japan")));
        assert!(stored.score.abs() < f32::EPSILON);
        assert!(records.contains(1));
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_missing_record() {
        let records = RecordStore::with_capacity(4);
        assert!(records.is_empty());
        assert!(records.get(0).is_none());
        assert!(!records.contains(3));
    }
}
