//! Embedding generation.
//!
//! The store never computes embeddings itself: it calls an [`Embedder`] once
//! per batch of documents and once per query. [`HashEmbedder`] is a
//! deterministic stand-in for tests and demos; [`BatchedEmbedder`] wraps any
//! embedder to bound batch sizes.

// Allow cast precision loss for hash-based embedding calculations.
#![allow(clippy::cast_precision_loss)]
// Allow cast possible truncation for hash index calculations on 32-bit platforms.
#![allow(clippy::cast_possible_truncation)]

mod batched;
mod hash;

pub use batched::BatchedEmbedder;
pub use hash::HashEmbedder;

use crate::Result;
use crate::context::CallContext;

/// Trait for embedding generators.
///
/// Implementations that do network or other blocking work should call
/// [`CallContext::check`] between units of work and return its error.
pub trait Embedder: Send + Sync {
    /// Returns the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Generates an embedding for a search query.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails or the context is
    /// cancelled.
    fn embed_query(&self, ctx: &CallContext, text: &str) -> Result<Vec<f32>>;

    /// Generates embeddings for documents, one vector per input, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails or the context is
    /// cancelled.
    fn embed_documents(&self, ctx: &CallContext, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| {
                ctx.check()?;
                self.embed_query(ctx, text)
            })
            .collect()
    }
}
