//! Property-based tests for search invariants.
//!
//! Uses proptest to verify, across random corpora and queries:
//! - Every result meets the score threshold
//! - Results are ordered by descending score
//! - At most `k` documents return, all from the stored corpus
//! - Out-of-range thresholds are always rejected
//! - Content hashing ignores case and whitespace layout

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use annstore::embedding::HashEmbedder;
use annstore::services::deduplication::ContentHasher;
use annstore::storage::cosine_distance;
use annstore::{
    AddOptions, AnnIndex, CallContext, Document, Error, HnswIndex, HnswParams, SearchOptions,
    VectorStore,
};
use proptest::prelude::*;

fn store_with(texts: &[String]) -> VectorStore {
    let store = VectorStore::builder()
        .with_dimensions(32)
        .with_capacity(4)
        .with_embedder(Arc::new(HashEmbedder::with_dimensions(32)))
        .build()
        .expect("build");
    let docs = texts.iter().map(Document::new).collect();
    store
        .add_documents(&CallContext::new(), docs, &AddOptions::new())
        .expect("add");
    store
}

fn corpus() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{2,8}( [a-z]{2,8}){0,4}", 1..25)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Property: every returned score is at least the threshold.
    #[test]
    fn prop_threshold_sound(
        texts in corpus(),
        query in "[a-z]{2,8}( [a-z]{2,8}){0,3}",
        threshold in 0.0f32..=1.0,
        k in 1usize..30,
    ) {
        let store = store_with(&texts);
        let options = SearchOptions::new().with_score_threshold(threshold);
        let docs = store
            .similarity_search(&CallContext::new(), &query, k, &options)
            .expect("search");
        prop_assert!(docs.iter().all(|d| d.score >= threshold));
    }

    /// Property: scores never increase down the result list, and the result
    /// count never exceeds `k` or the store size.
    #[test]
    fn prop_descending_and_bounded(
        texts in corpus(),
        query in "[a-z]{2,8}( [a-z]{2,8}){0,3}",
        k in 1usize..40,
    ) {
        let store = store_with(&texts);
        let docs = store
            .similarity_search(&CallContext::new(), &query, k, &SearchOptions::new())
            .expect("search");

        prop_assert!(docs.len() <= k);
        prop_assert!(docs.len() <= texts.len());
        for pair in docs.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
        prop_assert!(docs.iter().all(|d| texts.contains(&d.page_content)));
    }

    /// Property: thresholds outside `[0, 1]` are rejected.
    #[test]
    fn prop_out_of_range_threshold_rejected(
        threshold in prop_oneof![-1000.0f32..-0.0001, 1.0001f32..1000.0],
    ) {
        let store = store_with(&["seed text".to_string()]);
        let options = SearchOptions::new().with_score_threshold(threshold);
        let result = store.similarity_search(&CallContext::new(), "seed", 1, &options);
        prop_assert!(matches!(result, Err(Error::InvalidThreshold(_))));
    }

    /// Property: growing on demand keeps every insert, and `search` returns
    /// at most `k` hits.
    #[test]
    fn prop_index_search_bounded(
        vectors in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 4), 1..40),
        k in 1usize..10,
    ) {
        let mut index = HnswIndex::new(HnswParams::new(4, 16, 16), vec![0.0; 4], 2, cosine_distance)
            .expect("index");
        for (i, vector) in vectors.iter().enumerate() {
            let id = u32::try_from(i + 1).expect("id");
            if id as usize > index.capacity() {
                index.grow(index.capacity() * 2);
            }
            index.insert(id, vector.clone()).expect("insert");
        }
        prop_assert_eq!(index.len(), vectors.len() + 1);

        let hits = index.search(&vectors[0], 16, k).expect("search");
        prop_assert!(hits.len() <= k);
    }

    /// Property: hashing ignores case and whitespace layout.
    #[test]
    fn prop_content_hash_normalized(words in prop::collection::vec("[a-zA-Z]{1,10}", 1..8)) {
        let spaced = words.join("   ");
        let single = words.join(" ").to_lowercase();
        prop_assert_eq!(ContentHasher::hash(&spaced), ContentHasher::hash(&single));
        prop_assert_eq!(ContentHasher::normalize(&ContentHasher::normalize(&spaced)), single);
    }
}
