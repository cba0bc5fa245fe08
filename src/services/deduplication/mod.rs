//! Insert-time de-duplication.
//!
//! A [`Deduplicator`] is consulted once per document before anything is
//! embedded. Documents it flags are dropped from the call entirely. If the
//! call then fails, documents that passed are handed back through
//! [`Deduplicator::release`] so a retry can store them.
//!
//! Any `Fn(&CallContext, &Document) -> bool` closure is a deduplicator:
//!
//! ```rust
//! use std::sync::Arc;
//! use annstore::{AddOptions, CallContext, Deduplicator, Document};
//!
//! let skip_short = |_: &CallContext, doc: &Document| doc.page_content.len() < 3;
//! assert!(skip_short.is_duplicate(&CallContext::new(), &Document::new("ok")));
//!
//! let options = AddOptions::new().with_deduplicator(Arc::new(skip_short));
//! ```
//!
//! [`ExactMatchDeduplicator`] remembers normalized content hashes across
//! calls and flags repeats.

mod exact_match;
mod hasher;

pub use exact_match::ExactMatchDeduplicator;
pub use hasher::ContentHasher;

use crate::context::CallContext;
use crate::models::Document;

/// Decides whether a document is a duplicate and should be skipped.
///
/// A deduplicator that remembers what it has passed must forget it again in
/// [`release`](Self::release): the store calls it for every passed document
/// that was not stored because the insert failed.
pub trait Deduplicator: Send + Sync {
    /// Returns true to drop `document` from the insert.
    fn is_duplicate(&self, ctx: &CallContext, document: &Document) -> bool;

    /// Forgets a document that passed [`is_duplicate`](Self::is_duplicate)
    /// but was never stored.
    fn release(&self, _ctx: &CallContext, _document: &Document) {}
}

impl<F> Deduplicator for F
where
    F: Fn(&CallContext, &Document) -> bool + Send + Sync,
{
    fn is_duplicate(&self, ctx: &CallContext, document: &Document) -> bool {
        self(ctx, document)
    }
}
