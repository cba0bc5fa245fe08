//! Deterministic hash-based embedder.

use super::Embedder;
use crate::config::DEFAULT_DIMENSIONS;
use crate::context::CallContext;
use crate::{Error, Result};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Embedder producing normalized pseudo-embeddings from word hashes.
///
/// Identical texts map to identical vectors and texts sharing words land
/// closer together, but there is no semantic understanding: "database" and
/// "PostgreSQL" are unrelated. Use it for tests, demos and benchmarks.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    /// Words beyond this count are ignored to bound the work per text.
    const MAX_WORDS: usize = 1000;

    /// Creates an embedder with the default dimensions.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
        }
    }

    /// Creates an embedder with custom dimensions.
    #[must_use]
    pub const fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn pseudo_embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        for (i, word) in text.split_whitespace().take(Self::MAX_WORDS).enumerate() {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            Self::distribute_hash(&mut embedding, hasher.finish(), i);
        }

        Self::normalize(&mut embedding);
        embedding
    }

    fn distribute_hash(embedding: &mut [f32], hash: u64, word_idx: usize) {
        let dimensions = embedding.len();
        for j in 0..8 {
            let idx = ((hash >> (j * 8)) as usize + word_idx) % dimensions;
            let value = ((hash >> (j * 4)) & 0xFF) as f32 / 255.0 - 0.5;
            embedding[idx] += value;
        }
    }

    fn normalize(embedding: &mut [f32]) {
        let norm_sq: f32 = embedding.iter().map(|x| x * x).sum();
        if norm_sq <= 0.0 {
            return;
        }
        let inv_norm = norm_sq.sqrt().recip();
        for v in embedding.iter_mut() {
            *v *= inv_norm;
        }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HashEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_query(&self, ctx: &CallContext, text: &str) -> Result<Vec<f32>> {
        ctx.check()?;
        if self.dimensions == 0 {
            return Err(Error::Embedding(
                "hash embedder configured with zero dimensions".to_string(),
            ));
        }
        if text.trim().is_empty() {
            return Err(Error::Embedding("cannot embed empty text".to_string()));
        }
        Ok(self.pseudo_embed(text))
    }
}
