//! Document types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Arbitrary key/value metadata attached to a document.
pub type Metadata = HashMap<String, serde_json::Value>;

/// A text document with metadata.
///
/// `score` is only meaningful on documents returned by
/// [`crate::VectorStore::similarity_search`]; it is `0.0` on input documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The text that gets embedded.
    pub page_content: String,
    /// Metadata stored alongside the vector.
    #[serde(default)]
    pub metadata: Metadata,
    /// Similarity score (`1 - cosine distance`).
    #[serde(default)]
    pub score: f32,
}

impl Document {
    /// Creates a document with empty metadata.
    #[must_use]
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: Metadata::new(),
            score: 0.0,
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns a metadata value by key.
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_builder() {
        let doc = Document::new("Tokyo")
            .with_metadata("city", "Tokyo")
            .with_metadata("population", 37_400_000);

        assert_eq!(doc.page_content, "Tokyo");
        assert_eq!(doc.metadata_value("city"), Some(&json!("Tokyo")));
        assert_eq!(doc.metadata_value("population"), Some(&json!(37_400_000)));
        assert!(doc.metadata_value("country").is_none());
        assert!(doc.score.abs() < f32::EPSILON);
    }

    #[test]
    fn test_document_deserialization_defaults() {
        let doc: Document =
            serde_json::from_str(r#"{"page_content":"Paris"}"#).expect("deserialize");
        assert_eq!(doc.page_content, "Paris");
        assert!(doc.metadata.is_empty());
    }
}
