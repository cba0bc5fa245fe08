//! Store services.
//!
//! Services orchestrate the embedder, the index, and the record tables and
//! provide the high-level operations.

pub mod deduplication;
mod query_pipeline;
mod retriever;
mod vector_store;

pub use deduplication::{ContentHasher, Deduplicator, ExactMatchDeduplicator};
pub use query_pipeline::QueryPipeline;
pub use retriever::Retriever;
pub use vector_store::{VectorStore, VectorStoreBuilder};
