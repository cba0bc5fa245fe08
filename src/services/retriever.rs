//! Fixed-shape search over a shared store.

use std::sync::Arc;

use super::VectorStore;
use crate::context::CallContext;
use crate::models::{Document, SearchOptions};
use crate::{Error, Result};

/// Runs the same search shape (`k` and options) for every query.
///
/// ```rust
/// use std::sync::Arc;
/// use annstore::{AddOptions, CallContext, Document, Retriever, VectorStore};
/// use annstore::embedding::HashEmbedder;
///
/// let store = Arc::new(
///     VectorStore::builder()
///         .with_dimensions(32)
///         .with_embedder(Arc::new(HashEmbedder::with_dimensions(32)))
///         .build()?,
/// );
/// let ctx = CallContext::new();
/// store.add_documents(&ctx, vec![Document::new("rust borrow checker")], &AddOptions::new())?;
///
/// let retriever = Retriever::new(Arc::clone(&store), 4)?;
/// let docs = retriever.relevant_documents(&ctx, "rust borrow checker")?;
/// assert_eq!(docs[0].page_content, "rust borrow checker");
/// # Ok::<(), annstore::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Retriever {
    store: Arc<VectorStore>,
    k: usize,
    options: SearchOptions,
}

impl Retriever {
    /// Creates a retriever returning up to `k` documents per query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `k` is zero.
    pub fn new(store: Arc<VectorStore>, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidInput(
                "k must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            store,
            k,
            options: SearchOptions::default(),
        })
    }

    /// Sets the options applied to every query.
    ///
    /// # Errors
    ///
    /// Returns the validation error of `options`, if any.
    pub fn with_options(mut self, options: SearchOptions) -> Result<Self> {
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    /// Number of documents requested per query.
    #[must_use]
    pub const fn k(&self) -> usize {
        self.k
    }

    /// Returns documents relevant to `query`, best first.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`VectorStore::similarity_search`].
    pub fn relevant_documents(&self, ctx: &CallContext, query: &str) -> Result<Vec<Document>> {
        self.store
            .similarity_search(ctx, query, self.k, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use crate::models::{AddOptions, MetadataFilter};

    fn store() -> Arc<VectorStore> {
        Arc::new(
            VectorStore::builder()
                .with_dimensions(32)
                .with_embedder(Arc::new(HashEmbedder::with_dimensions(32)))
                .build()
                .expect("store"),
        )
    }

    #[test]
    fn test_zero_k_rejected() {
        assert!(matches!(Retriever::new(store(), 0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let retriever = Retriever::new(store(), 2).expect("retriever");
        let result = retriever.with_options(SearchOptions::new().with_score_threshold(2.0));
        assert!(matches!(result, Err(Error::InvalidThreshold(_))));
    }

    #[test]
    fn test_applies_options() {
        let store = store();
        let ctx = CallContext::new();
        store
            .add_documents(
                &ctx,
                vec![
                    Document::new("red apple").with_metadata("kind", "fruit"),
                    Document::new("red car").with_metadata("kind", "vehicle"),
                ],
                &AddOptions::new(),
            )
            .expect("add");

        let retriever = Retriever::new(Arc::clone(&store), 2)
            .expect("retriever")
            .with_options(
                SearchOptions::new().with_filter(MetadataFilter::new().with("kind", "vehicle")),
            )
            .expect("options");

        let docs = retriever.relevant_documents(&ctx, "red").expect("search");
        assert_eq!(retriever.k(), 2);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].page_content, "red car");
    }
}
