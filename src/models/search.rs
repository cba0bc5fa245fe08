//! Per-call options for inserts and searches.

use std::fmt;
use std::sync::Arc;

use super::Metadata;
use crate::embedding::Embedder;
use crate::services::Deduplicator;
use crate::{Error, Result};

/// Metadata equality filter.
///
/// A document matches when, for every key in the filter, its metadata holds
/// the same key with an equal value. An empty filter matches everything.
///
/// # Example
///
/// ```rust
/// use annstore::{Document, MetadataFilter};
///
/// let filter = MetadataFilter::new().with("city", "Paris");
/// assert!(filter.matches(&Document::new("x").with_metadata("city", "Paris").metadata));
/// assert!(!filter.matches(&Document::new("x").with_metadata("city", "Tokyo").metadata));
/// assert!(!filter.matches(&Document::new("x").metadata));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    conditions: Metadata,
}

impl MetadataFilter {
    /// Creates an empty filter (matches all).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality condition.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.conditions.insert(key.into(), value.into());
        self
    }

    /// Returns true if the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Returns true if `metadata` satisfies every condition.
    #[must_use]
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.conditions
            .iter()
            .all(|(key, expected)| metadata.get(key) == Some(expected))
    }
}

impl From<Metadata> for MetadataFilter {
    fn from(conditions: Metadata) -> Self {
        Self { conditions }
    }
}

/// Options for [`crate::VectorStore::similarity_search`].
#[derive(Clone, Default)]
pub struct SearchOptions {
    /// Metadata equality filter.
    pub filter: Option<MetadataFilter>,
    /// Minimum score (0.0 to 1.0).
    pub score_threshold: Option<f32>,
    /// Embedder used instead of the store's own for this call.
    pub embedder: Option<Arc<dyn Embedder>>,
    /// Partition name; not supported by this store.
    pub namespace: Option<String>,
}

impl SearchOptions {
    /// Creates options with nothing set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the metadata filter.
    #[must_use]
    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets the minimum score threshold.
    #[must_use]
    pub const fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    /// Overrides the embedder for this call.
    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Sets a namespace (rejected at call time).
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Checks the threshold range and namespace before any work is done.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidThreshold`] for thresholds outside `[0, 1]`
    /// (including NaN) and [`Error::UnsupportedOption`] for a namespace.
    pub fn validate(&self) -> Result<()> {
        if let Some(threshold) = self.score_threshold
            && !(0.0..=1.0).contains(&threshold)
        {
            return Err(Error::InvalidThreshold(threshold));
        }
        reject_namespace(self.namespace.as_deref())
    }
}

impl fmt::Debug for SearchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchOptions")
            .field("filter", &self.filter)
            .field("score_threshold", &self.score_threshold)
            .field("embedder", &self.embedder.is_some())
            .field("namespace", &self.namespace)
            .finish()
    }
}

/// Options for [`crate::VectorStore::add_documents`].
#[derive(Clone, Default)]
pub struct AddOptions {
    /// Pre-filter deciding which documents are duplicates.
    pub deduplicator: Option<Arc<dyn Deduplicator>>,
    /// Embedder used instead of the store's own for this call.
    pub embedder: Option<Arc<dyn Embedder>>,
    /// Partition name; not supported by this store.
    pub namespace: Option<String>,
}

impl AddOptions {
    /// Creates options with nothing set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deduplicator.
    #[must_use]
    pub fn with_deduplicator(mut self, deduplicator: Arc<dyn Deduplicator>) -> Self {
        self.deduplicator = Some(deduplicator);
        self
    }

    /// Overrides the embedder for this call.
    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Sets a namespace (rejected at call time).
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Checks for unsupported options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOption`] for a non-empty namespace.
    pub fn validate(&self) -> Result<()> {
        reject_namespace(self.namespace.as_deref())
    }
}

impl fmt::Debug for AddOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddOptions")
            .field("deduplicator", &self.deduplicator.is_some())
            .field("embedder", &self.embedder.is_some())
            .field("namespace", &self.namespace)
            .finish()
    }
}

fn reject_namespace(namespace: Option<&str>) -> Result<()> {
    match namespace {
        Some(ns) if !ns.is_empty() => Err(Error::UnsupportedOption(format!(
            "namespace '{ns}' (in-memory store has no partitions)"
        ))),
        _ => Ok(()),
    }
}
