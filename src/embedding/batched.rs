//! Batch-size limiting wrapper for embedders.

use std::sync::Arc;

use super::Embedder;
use crate::context::CallContext;
use crate::{Error, Result};

/// Default number of texts sent to the inner embedder per call.
pub const DEFAULT_BATCH_SIZE: usize = 512;

/// Embedder wrapper that splits large document batches into chunks.
///
/// Optionally replaces newlines with spaces before delegating, which some
/// hosted models recommend for better embeddings.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use annstore::CallContext;
/// use annstore::embedding::{BatchedEmbedder, Embedder, HashEmbedder};
///
/// let embedder = BatchedEmbedder::new(Arc::new(HashEmbedder::with_dimensions(16)), 2)?
///     .with_strip_newlines(true);
/// let vectors = embedder.embed_documents(&CallContext::new(), &["a", "b", "c"])?;
/// assert_eq!(vectors.len(), 3);
/// # Ok::<(), annstore::Error>(())
/// ```
pub struct BatchedEmbedder {
    inner: Arc<dyn Embedder>,
    batch_size: usize,
    strip_newlines: bool,
}

impl BatchedEmbedder {
    /// Wraps `inner`, sending at most `batch_size` texts per call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `batch_size` is zero.
    pub fn new(inner: Arc<dyn Embedder>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidInput(
                "batch size must be positive".to_string(),
            ));
        }
        Ok(Self {
            inner,
            batch_size,
            strip_newlines: false,
        })
    }

    /// Wraps `inner` with [`DEFAULT_BATCH_SIZE`].
    #[must_use]
    pub fn with_default_batch_size(inner: Arc<dyn Embedder>) -> Self {
        Self {
            inner,
            batch_size: DEFAULT_BATCH_SIZE,
            strip_newlines: false,
        }
    }

    /// Enables or disables newline stripping.
    #[must_use]
    pub const fn with_strip_newlines(mut self, strip: bool) -> Self {
        self.strip_newlines = strip;
        self
    }

    /// Returns the configured batch size.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn prepare<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        if self.strip_newlines && text.contains('\n') {
            std::borrow::Cow::Owned(text.replace('\n', " "))
        } else {
            std::borrow::Cow::Borrowed(text)
        }
    }
}

impl Embedder for BatchedEmbedder {
    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn embed_query(&self, ctx: &CallContext, text: &str) -> Result<Vec<f32>> {
        self.inner.embed_query(ctx, &self.prepare(text))
    }

    fn embed_documents(&self, ctx: &CallContext, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let prepared: Vec<_> = texts.iter().map(|t| self.prepare(t)).collect();
        let mut vectors = Vec::with_capacity(texts.len());

        for chunk in prepared.chunks(self.batch_size) {
            ctx.check()?;
            let refs: Vec<&str> = chunk.iter().map(|t| &**t).collect();
            let batch = self.inner.embed_documents(ctx, &refs)?;
            if batch.len() != refs.len() {
                return Err(Error::VectorCountMismatch {
                    expected: refs.len(),
                    actual: batch.len(),
                });
            }
            vectors.extend(batch);
        }

        tracing::debug!(
            texts = texts.len(),
            batch_size = self.batch_size,
            "embedded documents in batches"
        );
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records the texts of every batch it receives.
    struct RecordingEmbedder {
        batches: Mutex<Vec<Vec<String>>>,
    }

    impl RecordingEmbedder {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
            }
        }
    }

    impl Embedder for RecordingEmbedder {
        fn dimensions(&self) -> usize {
            1
        }

        fn embed_query(&self, _ctx: &CallContext, text: &str) -> Result<Vec<f32>> {
            self.batches
                .lock()
                .expect("lock")
                .push(vec![text.to_string()]);
            Ok(vec![1.0])
        }

        fn embed_documents(&self, _ctx: &CallContext, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            self.batches
                .lock()
                .expect("lock")
                .push(texts.iter().map(ToString::to_string).collect());
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let result = BatchedEmbedder::new(Arc::new(RecordingEmbedder::new()), 0);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_splits_into_chunks() {
        let inner = Arc::new(RecordingEmbedder::new());
        let embedder = BatchedEmbedder::new(inner.clone(), 2).expect("embedder");

        let vectors = embedder
            .embed_documents(&CallContext::new(), &["a", "b", "c", "d", "e"])
            .expect("embed");
        assert_eq!(vectors.len(), 5);

        let batches = inner.batches.lock().expect("lock");
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_strip_newlines() {
        let inner = Arc::new(RecordingEmbedder::new());
        let embedder = BatchedEmbedder::with_default_batch_size(inner.clone())
            .with_strip_newlines(true);
        let ctx = CallContext::new();

        embedder.embed_query(&ctx, "hello\nworld").expect("embed");
        embedder
            .embed_documents(&ctx, &["a\nb", "c"])
            .expect("embed");

        let batches = inner.batches.lock().expect("lock");
        assert_eq!(batches[0], vec!["hello world".to_string()]);
        assert_eq!(batches[1], vec!["a b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_cancelled_before_first_chunk() {
        let inner = Arc::new(RecordingEmbedder::new());
        let embedder = BatchedEmbedder::new(inner.clone(), 2).expect("embedder");
        let ctx = CallContext::new();
        ctx.cancellation_token().cancel();

        let result = embedder.embed_documents(&ctx, &["a", "b"]);
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(inner.batches.lock().expect("lock").is_empty());
    }
}
