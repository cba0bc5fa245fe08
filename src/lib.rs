//! # annstore
//!
//! An embedded approximate nearest-neighbor document store.
//!
//! Documents are embedded by a pluggable [`Embedder`], stored in a growable
//! HNSW graph, and recalled with top-k similarity search, optional metadata
//! equality filters, score thresholds, and insert-time de-duplication.
//!
//! ## Features
//!
//! - Append-only store with automatic capacity doubling
//! - Cosine distance ranking (`score = 1 - distance`)
//! - Per-vector write locking, shared-lock reads
//! - Cancellation and deadlines through [`CallContext`]
//! - Structured logging via [`observability::init_logging`]
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use annstore::{AddOptions, CallContext, Document, SearchOptions, VectorStore};
//! use annstore::embedding::HashEmbedder;
//!
//! let store = VectorStore::builder()
//!     .with_dimensions(64)
//!     .with_embedder(Arc::new(HashEmbedder::with_dimensions(64)))
//!     .build()?;
//!
//! let ctx = CallContext::new();
//! let ids = store.add_documents(
//!     &ctx,
//!     vec![Document::new("tokyo is the capital of japan")],
//!     &AddOptions::new(),
//! )?;
//! assert_eq!(ids, vec!["1".to_string()]);
//!
//! let hits = store.similarity_search(&ctx, "tokyo is the capital of japan", 1, &SearchOptions::new())?;
//! assert_eq!(hits.len(), 1);
//! # Ok::<(), annstore::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod context;
pub mod embedding;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::{HnswParams, StoreConfig};
pub use context::{CallContext, CancellationToken};
pub use embedding::Embedder;
pub use models::{AddOptions, Document, Metadata, MetadataFilter, SearchOptions};
pub use services::{Deduplicator, ExactMatchDeduplicator, Retriever, VectorStore, VectorStoreBuilder};
pub use storage::{AnnIndex, HnswIndex, RankedNeighbors};

/// Error type for annstore operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidThreshold` | Score threshold outside `[0, 1]` |
/// | `UnsupportedOption` | A namespace is passed to the store |
/// | `InvalidInput` | `k == 0`, invalid config, missing embedder, id beyond capacity |
/// | `DimensionMismatch` | A vector's length differs from the configured dimensions |
/// | `VectorCountMismatch` | The embedder returned a different number of vectors than inputs |
/// | `Embedding` | An embedder failed |
/// | `Cancelled` / `DeadlineExceeded` | The [`CallContext`] was signalled |
/// | `OperationFailed` | Lock poisoning, config file I/O or parsing |
///
/// Both embedder consistency failures map onto a single dimension-mismatch
/// error in other vector store APIs: `VectorCountMismatch` is raised when an
/// embedder returns the wrong number of vectors for a batch, and
/// `DimensionMismatch` when a vector has the wrong length.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A search requests zero results
    /// - A configuration value is out of range
    /// - A store is built without an embedder
    /// - An index insert targets an id beyond the index capacity
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The score threshold is outside `[0, 1]`.
    #[error("score threshold must be between 0 and 1, got {0}")]
    InvalidThreshold(f32),

    /// An option was passed that this store does not support.
    #[error("unsupported option: {0}")]
    UnsupportedOption(String),

    /// A vector did not have the configured dimensionality.
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Configured dimensionality.
        expected: usize,
        /// Length of the offending vector.
        actual: usize,
    },

    /// The embedder returned a different number of vectors than documents.
    ///
    /// This is the batch consistency error: nothing from the batch is stored.
    #[error("embedder returned {actual} vectors for {expected} documents")]
    VectorCountMismatch {
        /// Number of documents submitted.
        expected: usize,
        /// Number of vectors returned.
        actual: usize,
    },

    /// An embedder failed to produce vectors.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// The call was cancelled through its context.
    #[error("operation cancelled")]
    Cancelled,

    /// The call's deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// An operation failed.
    ///
    /// Raised when:
    /// - A store lock is poisoned by a panicking writer
    /// - A configuration file cannot be read or parsed
    /// - Logging has already been initialized
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for annstore operations.
pub type Result<T> = std::result::Result<T, Error>;
