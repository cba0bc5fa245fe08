//! The in-memory vector store.
//!
//! A [`VectorStore`] owns one HNSW graph, the record tables for the
//! documents in it, and a default [`Embedder`]. All mutable state sits behind
//! a single [`RwLock`]:
//!
//! - each embedded vector is inserted in its own write-lock section, so
//!   concurrent batches interleave their id ranges
//! - searches hold the read lock for the graph search and record lookups
//!
//! Embedder calls run outside the lock.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use super::query_pipeline::QueryPipeline;
use crate::config::{HnswParams, StoreConfig};
use crate::context::CallContext;
use crate::embedding::Embedder;
use crate::models::{AddOptions, Document, SearchOptions};
use crate::storage::{AnnIndex, HnswIndex, RecordStore, cosine_distance};
use crate::{Error, Result};

/// Mutable store state, guarded as one unit.
struct StoreState {
    index: Box<dyn AnnIndex>,
    records: RecordStore,
    last_id: u32,
    capacity: usize,
}

/// Embedded approximate nearest-neighbor document store.
///
/// Built with [`VectorStore::builder`]. Append-only: documents are never
/// updated or removed.
pub struct VectorStore {
    state: RwLock<StoreState>,
    embedder: Arc<dyn Embedder>,
    config: StoreConfig,
}

/// Builder for [`VectorStore`].
#[derive(Default)]
pub struct VectorStoreBuilder {
    config: StoreConfig,
    embedder: Option<Arc<dyn Embedder>>,
}

impl VectorStoreBuilder {
    /// Creates a builder with default configuration and no embedder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub const fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the vector dimensionality.
    #[must_use]
    pub const fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.config.dimensions = dimensions;
        self
    }

    /// Sets the initial capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Sets the HNSW parameters.
    #[must_use]
    pub const fn with_hnsw_params(mut self, hnsw: HnswParams) -> Self {
        self.config.hnsw = hnsw;
        self
    }

    /// Sets the default embedder (required).
    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Builds a store over a fresh [`HnswIndex`] with a zero anchor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if no embedder was set or the
    /// configuration is invalid.
    pub fn build(self) -> Result<VectorStore> {
        self.config.validate()?;
        let index = HnswIndex::new(
            self.config.hnsw,
            vec![0.0; self.config.dimensions],
            self.config.capacity,
            cosine_distance,
        )?;
        self.build_with_index(Box::new(index))
    }

    /// Builds a store over a caller-supplied index.
    ///
    /// The index must hold only its anchor and match the configured
    /// dimensionality. Its capacity replaces the configured one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if no embedder was set, the index is
    /// not empty, or the configuration is invalid, and
    /// [`Error::DimensionMismatch`] if the index dimensionality differs.
    pub fn build_with_index(mut self, index: Box<dyn AnnIndex>) -> Result<VectorStore> {
        let embedder = self
            .embedder
            .take()
            .ok_or_else(|| Error::InvalidInput("an embedder is required".to_string()))?;

        if index.dimensions() != self.config.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.config.dimensions,
                actual: index.dimensions(),
            });
        }
        if !index.is_empty() {
            return Err(Error::InvalidInput(format!(
                "index must hold only its anchor, found {} points",
                index.len()
            )));
        }
        self.config.capacity = index.capacity();
        self.config.validate()?;

        if embedder.dimensions() != self.config.dimensions {
            warn!(
                embedder_dimensions = embedder.dimensions(),
                store_dimensions = self.config.dimensions,
                "embedder dimensionality differs from store"
            );
        }

        info!(
            dimensions = self.config.dimensions,
            capacity = self.config.capacity,
            m = self.config.hnsw.m,
            ef_construction = self.config.hnsw.ef_construction,
            ef_search = self.config.hnsw.ef_search,
            "vector store ready"
        );

        Ok(VectorStore {
            state: RwLock::new(StoreState {
                index,
                records: RecordStore::with_capacity(self.config.capacity),
                last_id: 0,
                capacity: self.config.capacity,
            }),
            embedder,
            config: self.config,
        })
    }
}

impl VectorStore {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> VectorStoreBuilder {
        VectorStoreBuilder::new()
    }

    /// Embeds and stores documents, returning their ids.
    ///
    /// Documents flagged by the deduplicator are dropped before embedding and
    /// get no id. All surviving contents are embedded in one
    /// [`Embedder::embed_documents`] call; each resulting vector is then
    /// inserted under the next id, doubling capacity when needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOption`] for a namespace,
    /// [`Error::VectorCountMismatch`] or [`Error::DimensionMismatch`] for bad
    /// embedder output (nothing is inserted in either case), any error the
    /// embedder raises, and [`Error::Cancelled`] / [`Error::DeadlineExceeded`]
    /// when the context is signalled.
    #[instrument(
        name = "annstore.add_documents",
        skip(self, ctx, documents, options),
        fields(operation = "add_documents", documents = documents.len())
    )]
    pub fn add_documents(
        &self,
        ctx: &CallContext,
        documents: Vec<Document>,
        options: &AddOptions,
    ) -> Result<Vec<String>> {
        let start = Instant::now();
        let result = self.add_documents_inner(ctx, documents, options);

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::counter!(
            "annstore_operations_total",
            "operation" => "add_documents",
            "status" => status
        )
        .increment(1);
        metrics::histogram!(
            "annstore_operation_duration_ms",
            "operation" => "add_documents"
        )
        .record(start.elapsed().as_secs_f64() * 1000.0);

        result
    }

    fn add_documents_inner(
        &self,
        ctx: &CallContext,
        mut documents: Vec<Document>,
        options: &AddOptions,
    ) -> Result<Vec<String>> {
        options.validate()?;
        ctx.check()?;

        if let Some(deduplicator) = &options.deduplicator {
            let before = documents.len();
            documents.retain(|doc| !deduplicator.is_duplicate(ctx, doc));
            let skipped = before - documents.len();
            if skipped > 0 {
                debug!(skipped, "dropped duplicate documents");
                metrics::counter!("annstore_documents_deduplicated_total")
                    .increment(skipped as u64);
            }
        }

        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let mut stored = 0;
        let result = self.embed_and_insert(ctx, &mut documents, &mut stored, options);
        if result.is_err()
            && let Some(deduplicator) = &options.deduplicator
        {
            for document in &documents[stored..] {
                deduplicator.release(ctx, document);
            }
            debug!(released = documents.len() - stored, "released unstored documents");
        }
        let ids = result?;

        metrics::counter!("annstore_documents_added_total").increment(ids.len() as u64);
        debug!(added = ids.len(), "documents stored");
        Ok(ids)
    }

    /// Embeds `documents` and inserts them in order.
    ///
    /// Stored documents are taken out of the slice; `stored` counts them, so
    /// on error `documents[*stored..]` is what never reached the index.
    fn embed_and_insert(
        &self,
        ctx: &CallContext,
        documents: &mut [Document],
        stored: &mut usize,
        options: &AddOptions,
    ) -> Result<Vec<String>> {
        let embedder = options.embedder.as_ref().unwrap_or(&self.embedder);
        let texts: Vec<&str> = documents.iter().map(|d| d.page_content.as_str()).collect();
        let vectors = embedder.embed_documents(ctx, &texts)?;
        ctx.check()?;

        if vectors.len() != documents.len() {
            return Err(Error::VectorCountMismatch {
                expected: documents.len(),
                actual: vectors.len(),
            });
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.config.dimensions) {
            return Err(Error::DimensionMismatch {
                expected: self.config.dimensions,
                actual: bad.len(),
            });
        }

        let mut ids = Vec::with_capacity(documents.len());
        for (document, vector) in documents.iter_mut().zip(vectors) {
            let id = self.insert_one(document, vector)?;
            *stored += 1;
            ids.push(id.to_string());
        }
        Ok(ids)
    }

    /// Assigns the next id and stores one vector and its record.
    ///
    /// `document` is moved into the record store only once the index insert
    /// has succeeded.
    fn insert_one(&self, document: &mut Document, vector: Vec<f32>) -> Result<u32> {
        let mut state = self.write_state("add_documents")?;

        let id = state
            .last_id
            .checked_add(1)
            .ok_or_else(|| Error::OperationFailed {
                operation: "add_documents".to_string(),
                cause: "id space exhausted".to_string(),
            })?;

        if id as usize > state.capacity {
            let grown = state.capacity.saturating_mul(2).min(u32::MAX as usize);
            debug!(from = state.capacity, to = grown, "growing index");
            state.index.grow(grown);
            state.capacity = grown;
        }

        state.index.insert(id, vector)?;
        state.last_id = id;
        state.records.insert(id, std::mem::take(document));
        Ok(id)
    }

    /// Returns up to `k` documents closest to `query`, best first.
    ///
    /// Each returned document carries `score = 1 - cosine distance`. The
    /// metadata filter and score threshold apply after the `k` nearest are
    /// chosen, so fewer than `k` documents may come back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidThreshold`], [`Error::UnsupportedOption`], or
    /// [`Error::InvalidInput`] (for `k == 0`) before the embedder is called,
    /// [`Error::DimensionMismatch`] for a query vector of the wrong length,
    /// any error the embedder raises, and [`Error::Cancelled`] /
    /// [`Error::DeadlineExceeded`] when the context is signalled.
    #[instrument(
        name = "annstore.similarity_search",
        skip(self, ctx, query, options),
        fields(operation = "similarity_search", query_len = query.len())
    )]
    pub fn similarity_search(
        &self,
        ctx: &CallContext,
        query: &str,
        k: usize,
        options: &SearchOptions,
    ) -> Result<Vec<Document>> {
        let start = Instant::now();
        let result = self.similarity_search_inner(ctx, query, k, options);

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::counter!(
            "annstore_operations_total",
            "operation" => "similarity_search",
            "status" => status
        )
        .increment(1);
        metrics::histogram!(
            "annstore_operation_duration_ms",
            "operation" => "similarity_search"
        )
        .record(start.elapsed().as_secs_f64() * 1000.0);

        result
    }

    fn similarity_search_inner(
        &self,
        ctx: &CallContext,
        query: &str,
        k: usize,
        options: &SearchOptions,
    ) -> Result<Vec<Document>> {
        if let Err(e) = options.validate() {
            warn!(error = %e, "search rejected");
            return Err(e);
        }
        if k == 0 {
            warn!("search rejected: k is zero");
            return Err(Error::InvalidInput(
                "k must be greater than zero".to_string(),
            ));
        }
        ctx.check()?;

        let embedder = options.embedder.as_ref().unwrap_or(&self.embedder);
        let vector = embedder.embed_query(ctx, query)?;
        ctx.check()?;

        if vector.len() != self.config.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.config.dimensions,
                actual: vector.len(),
            });
        }

        let state = self.read_state("similarity_search")?;
        let hits = state
            .index
            .search(&vector, self.config.hnsw.ef_search, k.saturating_add(1))?;
        let candidates = hits.len();

        let documents = QueryPipeline::new(k)
            .with_filter(options.filter.as_ref())
            .with_score_threshold(options.score_threshold)
            .run(hits, &state.records);
        drop(state);

        debug!(candidates, returned = documents.len(), "search complete");
        Ok(documents)
    }

    /// Number of stored documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read_state("len")?.records.len())
    }

    /// Returns true if no documents are stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Current capacity (initial capacity doubled once per overflow).
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn capacity(&self) -> Result<usize> {
        Ok(self.read_state("capacity")?.capacity)
    }

    /// Vector dimensionality.
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    /// Construction-time configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn read_state(&self, operation: &str) -> Result<RwLockReadGuard<'_, StoreState>> {
        self.state.read().map_err(|_| Error::OperationFailed {
            operation: operation.to_string(),
            cause: "Lock poisoned".to_string(),
        })
    }

    fn write_state(&self, operation: &str) -> Result<RwLockWriteGuard<'_, StoreState>> {
        self.state.write().map_err(|_| Error::OperationFailed {
            operation: operation.to_string(),
            cause: "Lock poisoned".to_string(),
        })
    }
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
