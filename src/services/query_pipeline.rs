//! Turns ranked index hits into scored documents.
//!
//! Stages, in order:
//!
//! 1. Drain hits farthest first, dropping the anchor (id `0`)
//! 2. Discard the farthest surplus so at most `k` hits remain
//! 3. Look up each record and set `score = 1 - distance`
//! 4. Keep documents matching the metadata filter
//! 5. Keep documents scoring at or above the threshold
//! 6. Reverse to closest first

use crate::models::{Document, MetadataFilter};
use crate::storage::{RankedNeighbors, RecordStore};

/// Post-search assembly for one query.
#[derive(Debug, Clone, Copy)]
pub struct QueryPipeline<'a> {
    k: usize,
    filter: Option<&'a MetadataFilter>,
    score_threshold: Option<f32>,
}

impl<'a> QueryPipeline<'a> {
    /// Creates a pipeline returning at most `k` documents.
    #[must_use]
    pub const fn new(k: usize) -> Self {
        Self {
            k,
            filter: None,
            score_threshold: None,
        }
    }

    /// Sets the metadata filter.
    #[must_use]
    pub const fn with_filter(mut self, filter: Option<&'a MetadataFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the minimum score.
    #[must_use]
    pub const fn with_score_threshold(mut self, threshold: Option<f32>) -> Self {
        self.score_threshold = threshold;
        self
    }

    /// Runs every stage over `hits`, reading records from `records`.
    ///
    /// Hits with no record are skipped.
    #[must_use]
    pub fn run(&self, mut hits: RankedNeighbors, records: &RecordStore) -> Vec<Document> {
        let mut worst_first = Vec::with_capacity(hits.len());
        while let Some(hit) = hits.pop() {
            if hit.id != 0 {
                worst_first.push(hit);
            }
        }
        let surplus = worst_first.len().saturating_sub(self.k);

        let mut documents: Vec<Document> = worst_first
            .into_iter()
            .skip(surplus)
            .filter_map(|hit| {
                records.get(hit.id).map(|mut doc| {
                    doc.score = 1.0 - hit.distance;
                    doc
                })
            })
            .filter(|doc| self.filter.is_none_or(|f| f.matches(&doc.metadata)))
            .filter(|doc| self.score_threshold.is_none_or(|t| doc.score >= t))
            .collect();

        documents.reverse();
        documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Neighbor;

    fn records() -> RecordStore {
        let mut records = RecordStore::new();
        records.insert(1, Document::new("Tokyo").with_metadata("continent", "Asia"));
        records.insert(2, Document::new("Paris").with_metadata("continent", "Europe"));
        records.insert(3, Document::new("London").with_metadata("continent", "Europe"));
        records
    }

    fn hits(pairs: &[(u32, f32)]) -> RankedNeighbors {
        pairs.iter().map(|&(id, d)| Neighbor::new(id, d)).collect()
    }

    fn contents(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.page_content.as_str()).collect()
    }

    #[test]
    fn test_orders_best_first_and_scores() {
        let docs = QueryPipeline::new(3).run(hits(&[(1, 0.4), (2, 0.0), (3, 0.2)]), &records());
        assert_eq!(contents(&docs), vec!["Paris", "London", "Tokyo"]);
        assert!((docs[0].score - 1.0).abs() < 1e-6);
        assert!((docs[2].score - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_anchor_never_returned() {
        let docs = QueryPipeline::new(5).run(hits(&[(0, 0.0), (1, 0.3)]), &records());
        assert_eq!(contents(&docs), vec!["Tokyo"]);
    }

    #[test]
    fn test_surplus_trimmed_before_filters() {
        let filter = MetadataFilter::new().with("continent", "Asia");
        let docs = QueryPipeline::new(2)
            .with_filter(Some(&filter))
            .run(hits(&[(0, 1.0), (1, 0.9), (2, 0.1), (3, 0.2)]), &records());
        assert!(docs.is_empty());
    }

    #[test]
    fn test_filter_excludes_better_mismatch() {
        let filter = MetadataFilter::new().with("continent", "Asia");
        let docs = QueryPipeline::new(3)
            .with_filter(Some(&filter))
            .run(hits(&[(1, 0.5), (2, 0.0), (3, 0.1)]), &records());
        assert_eq!(contents(&docs), vec!["Tokyo"]);
    }

    #[test]
    fn test_threshold_inclusive() {
        let docs = QueryPipeline::new(3)
            .with_score_threshold(Some(0.75))
            .run(hits(&[(1, 0.25), (2, 0.5), (3, 0.0)]), &records());
        assert_eq!(contents(&docs), vec!["London", "Tokyo"]);
    }

    #[test]
    fn test_missing_record_skipped() {
        let docs = QueryPipeline::new(3).run(hits(&[(9, 0.0), (1, 0.1)]), &records());
        assert_eq!(contents(&docs), vec!["Tokyo"]);
    }
}
