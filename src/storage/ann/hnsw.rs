//! Hierarchical navigable small world graph.
//!
//! **Insert**: pick a level for the id, descend greedily from the entry point
//! to that level, then on each layer from there down to 0 run a beam search
//! of width `ef_construction`, link to a diverse subset of the candidates, and
//! add back-links (pruning any neighbor that exceeds its degree bound).
//!
//! **Search**: greedy descent to layer 1, then a beam search of width
//! `max(ef, k)` on layer 0.
//!
//! Levels come from a hash of `(seed, id)` rather than a live RNG, so a graph
//! built from the same inserts has the same shape every time.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use sha2::{Digest, Sha256};
use tracing::trace;

use super::distance::DistanceFn;
use super::node::Node;
use crate::config::HnswParams;
use crate::storage::traits::{AnnIndex, Neighbor, RankedNeighbors};
use crate::{Error, Result};

/// Upper bound on node levels.
const MAX_LEVEL: usize = 16;

/// Seed used when none is set.
const DEFAULT_LEVEL_SEED: u64 = 0x5EED_A11C_E5ED_0001;

/// HNSW index over `u32` ids.
///
/// Id `0` holds the anchor vector passed to [`HnswIndex::new`]; documents use
/// ids from `1` upward. Node storage is a dense vector sized `capacity + 1`.
pub struct HnswIndex {
    nodes: Vec<Option<Node>>,
    count: usize,
    entry_point: u32,
    max_layer: usize,
    m: usize,
    m0: usize,
    ml: f64,
    ef_construction: usize,
    dimensions: usize,
    distance: DistanceFn,
    level_seed: u64,
}

impl HnswIndex {
    /// Creates a graph holding only the anchor.
    ///
    /// # Arguments
    ///
    /// * `params` - Degree and beam widths
    /// * `anchor` - Vector stored at id `0`; its length fixes the dimensionality
    /// * `capacity` - Highest insertable id before [`AnnIndex::grow`]
    /// * `distance` - Distance function used for every comparison
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for invalid params, an empty anchor, or
    /// a capacity outside the `u32` id space.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(
        params: HnswParams,
        anchor: Vec<f32>,
        capacity: usize,
        distance: DistanceFn,
    ) -> Result<Self> {
        params.validate()?;
        if anchor.is_empty() {
            return Err(Error::InvalidInput(
                "anchor vector must not be empty".to_string(),
            ));
        }
        if u32::try_from(capacity).is_err() {
            return Err(Error::InvalidInput(format!(
                "capacity {capacity} exceeds the u32 id space"
            )));
        }

        let dimensions = anchor.len();
        let mut nodes = Vec::with_capacity(capacity + 1);
        nodes.push(Some(Node::new(anchor, 0)));
        nodes.resize_with(capacity + 1, || None);

        Ok(Self {
            nodes,
            count: 1,
            entry_point: 0,
            max_layer: 0,
            m: params.m,
            m0: params.m * 2,
            ml: 1.0 / (params.m as f64).ln(),
            ef_construction: params.ef_construction,
            dimensions,
            distance,
            level_seed: DEFAULT_LEVEL_SEED,
        })
    }

    /// Replaces the seed that level assignment hashes with.
    #[must_use]
    pub const fn with_level_seed(mut self, seed: u64) -> Self {
        self.level_seed = seed;
        self
    }

    /// Returns true if `id` is present (the anchor included).
    #[must_use]
    pub fn contains(&self, id: u32) -> bool {
        self.node(id).is_some()
    }

    /// Highest layer currently in the graph.
    #[must_use]
    pub const fn max_layer(&self) -> usize {
        self.max_layer
    }

    /// Level a given id is placed on.
    ///
    /// Draws `r` in `(0, 1]` from `SHA-256(seed || id)` and returns
    /// `floor(-ln(r) * ml)`, capped at [`MAX_LEVEL`].
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn level_for(&self, id: u32) -> usize {
        let mut hasher = Sha256::new();
        hasher.update(self.level_seed.to_le_bytes());
        hasher.update(id.to_le_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        let bits = u64::from_le_bytes(bytes) >> 11;
        let r = (bits as f64 + 1.0) / (1u64 << 53) as f64;

        let level = (-r.ln() * self.ml).floor();
        (level as usize).min(MAX_LEVEL)
    }

    fn node(&self, id: u32) -> Option<&Node> {
        self.nodes.get(id as usize).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: u32) -> Option<&mut Node> {
        self.nodes.get_mut(id as usize).and_then(Option::as_mut)
    }

    fn distance_to(&self, query: &[f32], id: u32) -> Option<f32> {
        self.node(id).map(|node| (self.distance)(query, &node.vector))
    }

    const fn max_degree(&self, layer: usize) -> usize {
        if layer == 0 { self.m0 } else { self.m }
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() == self.dimensions {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            })
        }
    }

    /// Beam search on one layer. Returns up to `ef` hits, closest first.
    fn search_layer(&self, query: &[f32], entry: u32, ef: usize, layer: usize) -> Vec<Neighbor> {
        let Some(entry_distance) = self.distance_to(query, entry) else {
            return Vec::new();
        };

        let mut visited = HashSet::new();
        visited.insert(entry);

        let start = Neighbor::new(entry, entry_distance);
        let mut candidates = BinaryHeap::from([Reverse(start)]);
        let mut results = BinaryHeap::from([start]);

        while let Some(Reverse(current)) = candidates.pop() {
            if results.len() >= ef
                && results
                    .peek()
                    .is_some_and(|worst: &Neighbor| current.distance > worst.distance)
            {
                break;
            }

            let Some(node) = self.node(current.id) else {
                continue;
            };

            for &id in node.neighbors(layer) {
                if !visited.insert(id) {
                    continue;
                }
                let Some(distance) = self.distance_to(query, id) else {
                    continue;
                };

                let dominated = results.len() >= ef
                    && results
                        .peek()
                        .is_some_and(|worst: &Neighbor| distance > worst.distance);
                if dominated {
                    continue;
                }

                let hit = Neighbor::new(id, distance);
                candidates.push(Reverse(hit));
                results.push(hit);
                if results.len() > ef {
                    results.pop();
                }
            }
        }

        results.into_sorted_vec()
    }

    /// Picks up to `m` links from `candidates` (closest first).
    ///
    /// A candidate is kept only if it is closer to the base point than to
    /// every link already kept; remaining slots are then filled by distance.
    fn select_neighbors(&self, candidates: &[Neighbor], m: usize) -> Vec<u32> {
        let mut selected: Vec<&Neighbor> = Vec::with_capacity(m);

        for candidate in candidates {
            if selected.len() >= m {
                break;
            }
            let Some(candidate_node) = self.node(candidate.id) else {
                continue;
            };
            let diverse = selected.iter().all(|kept| {
                self.distance_to(&candidate_node.vector, kept.id)
                    .is_none_or(|d| d >= candidate.distance)
            });
            if diverse {
                selected.push(candidate);
            }
        }

        for candidate in candidates {
            if selected.len() >= m {
                break;
            }
            if !selected.iter().any(|kept| kept.id == candidate.id) {
                selected.push(candidate);
            }
        }

        selected.iter().map(|n| n.id).collect()
    }

    /// Re-selects the links of `id` on `layer` after it exceeded its bound.
    fn prune(&mut self, id: u32, layer: usize) {
        let Some(node) = self.node(id) else {
            return;
        };
        let mut candidates: Vec<Neighbor> = node
            .neighbors(layer)
            .iter()
            .filter_map(|&n| {
                self.distance_to(&node.vector, n)
                    .map(|d| Neighbor::new(n, d))
            })
            .collect();
        candidates.sort_unstable();

        let kept = self.select_neighbors(&candidates, self.max_degree(layer));
        if let Some(node) = self.node_mut(id) {
            node.set_neighbors(layer, kept);
        }
    }

    /// Greedy walk from the entry point down to `floor + 1`.
    fn descend(&self, query: &[f32], floor: usize) -> u32 {
        let mut current = self.entry_point;
        for layer in (floor + 1..=self.max_layer).rev() {
            if let Some(best) = self.search_layer(query, current, 1, layer).first() {
                current = best.id;
            }
        }
        current
    }
}

impl AnnIndex for HnswIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn capacity(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    fn len(&self) -> usize {
        self.count
    }

    fn insert(&mut self, id: u32, vector: Vec<f32>) -> Result<()> {
        self.check_dimensions(&vector)?;
        let slot = id as usize;
        if slot > self.capacity() {
            return Err(Error::InvalidInput(format!(
                "id {id} exceeds index capacity {}",
                self.capacity()
            )));
        }
        if self.contains(id) {
            return Err(Error::InvalidInput(format!("id {id} already present")));
        }

        let level = self.level_for(id);
        let mut current = self.descend(&vector, level);
        let mut node = Node::new(vector, level);

        let top = level.min(self.max_layer);
        for layer in (0..=top).rev() {
            let candidates = self.search_layer(&node.vector, current, self.ef_construction, layer);
            node.set_neighbors(
                layer,
                self.select_neighbors(&candidates, self.max_degree(layer)),
            );
            if let Some(best) = candidates.first() {
                current = best.id;
            }
        }

        let links: Vec<(usize, Vec<u32>)> = (0..=top)
            .map(|layer| (layer, node.neighbors(layer).to_vec()))
            .collect();
        self.nodes[slot] = Some(node);
        self.count += 1;

        for (layer, neighbors) in links {
            let bound = self.max_degree(layer);
            for neighbor in neighbors {
                let degree = self
                    .node_mut(neighbor)
                    .map_or(0, |n| n.add_neighbor(layer, id));
                if degree > bound {
                    self.prune(neighbor, layer);
                }
            }
        }

        if level > self.max_layer {
            trace!(id, level, "new hnsw entry point");
            self.max_layer = level;
            self.entry_point = id;
        }

        Ok(())
    }

    fn grow(&mut self, capacity: usize) {
        if capacity > self.capacity() {
            self.nodes.resize_with(capacity + 1, || None);
        }
    }

    fn search(&self, query: &[f32], ef: usize, k: usize) -> Result<RankedNeighbors> {
        self.check_dimensions(query)?;
        if k == 0 {
            return Ok(RankedNeighbors::new());
        }

        let entry = self.descend(query, 0);
        Ok(self
            .search_layer(query, entry, ef.max(k), 0)
            .into_iter()
            .take(k)
            .collect())
    }
}

impl std::fmt::Debug for HnswIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswIndex")
            .field("len", &self.count)
            .field("capacity", &self.capacity())
            .field("dimensions", &self.dimensions)
            .field("max_layer", &self.max_layer)
            .field("m", &self.m)
            .field("ef_construction", &self.ef_construction)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ann::cosine_distance;

    fn index(dimensions: usize, capacity: usize) -> HnswIndex {
        HnswIndex::new(
            HnswParams::default(),
            vec![0.0; dimensions],
            capacity,
            cosine_distance,
        )
        .expect("index")
    }

    #[allow(clippy::cast_precision_loss)]
    fn vector(i: u32, dimensions: usize) -> Vec<f32> {
        (0..dimensions)
            .map(|d| ((i as f32 + 1.0) * (d as f32 + 1.0) * 0.618).sin())
            .collect()
    }

    #[test]
    fn test_new_holds_anchor() {
        let index = index(3, 8);
        assert_eq!(index.len(), 1);
        assert!(index.is_empty());
        assert!(index.contains(0));
        assert_eq!(index.capacity(), 8);
        assert_eq!(index.dimensions(), 3);
    }

    #[test]
    fn test_new_rejects_bad_input() {
        let result = HnswIndex::new(HnswParams::default(), Vec::new(), 8, cosine_distance);
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let result = HnswIndex::new(HnswParams::new(1, 8, 8), vec![0.0], 8, cosine_distance);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_insert_and_search_exact() {
        let mut index = index(2, 8);
        index.insert(1, vec![1.0, 0.0]).expect("insert");
        index.insert(2, vec![0.0, 1.0]).expect("insert");
        index.insert(3, vec![-1.0, 0.0]).expect("insert");

        let hits = index.search(&[0.0, 2.0], 16, 1).expect("search");
        let best = hits.into_sorted_vec();
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].id, 2);
        assert!(best[0].distance.abs() < 1e-6);
    }

    #[test]
    fn test_search_may_return_anchor() {
        let mut index = index(2, 8);
        index.insert(1, vec![1.0, 0.0]).expect("insert");

        let ids: Vec<u32> = index
            .search(&[1.0, 0.0], 16, 5)
            .expect("search")
            .into_sorted_vec()
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec![1, 0]);
    }

    #[test]
    fn test_insert_rejects_wrong_dimensions() {
        let mut index = index(3, 8);
        let result = index.insert(1, vec![1.0, 0.0]);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert!(matches!(
            index.search(&[1.0], 4, 1),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_insert_beyond_capacity_then_grow() {
        let mut index = index(2, 2);
        index.insert(1, vec![1.0, 0.0]).expect("insert");
        index.insert(2, vec![0.0, 1.0]).expect("insert");
        assert!(matches!(
            index.insert(3, vec![1.0, 1.0]),
            Err(Error::InvalidInput(_))
        ));

        index.grow(4);
        assert_eq!(index.capacity(), 4);
        index.insert(3, vec![1.0, 1.0]).expect("insert after grow");
        assert_eq!(index.len(), 4);

        index.grow(1);
        assert_eq!(index.capacity(), 4);
    }

    #[test]
    fn test_insert_rejects_duplicate_and_anchor_id() {
        let mut index = index(2, 4);
        index.insert(1, vec![1.0, 0.0]).expect("insert");
        assert!(matches!(
            index.insert(1, vec![0.0, 1.0]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            index.insert(0, vec![0.0, 1.0]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_search_k_zero() {
        let mut index = index(2, 4);
        index.insert(1, vec![1.0, 0.0]).expect("insert");
        assert!(index.search(&[1.0, 0.0], 8, 0).expect("search").is_empty());
    }

    #[test]
    fn test_degree_bounded_after_many_inserts() {
        let params = HnswParams::new(4, 16, 16);
        let mut index = HnswIndex::new(params, vec![0.0; 8], 200, cosine_distance).expect("index");
        for id in 1..=200 {
            index.insert(id, vector(id, 8)).expect("insert");
        }

        for node in index.nodes.iter().flatten() {
            for (layer, links) in node.layers.iter().enumerate() {
                assert!(links.len() <= index.max_degree(layer));
            }
        }
    }

    #[test]
    fn test_recall_against_brute_force() {
        let mut index = index(16, 300);
        for id in 1..=300 {
            index.insert(id, vector(id, 16)).expect("insert");
        }

        let mut found = 0;
        for q in 0..20 {
            let query = vector(1000 + q, 16);
            let truth = (1..=300)
                .map(|id| Neighbor::new(id, cosine_distance(&query, &vector(id, 16))))
                .min()
                .map(|n| n.id);
            let best = index
                .search(&query, 64, 1)
                .expect("search")
                .into_sorted_vec()
                .first()
                .map(|n| n.id);
            if best == truth {
                found += 1;
            }
        }
        assert!(found >= 18, "recall too low: {found}/20");
    }

    #[test]
    fn test_levels_deterministic_per_seed() {
        let a = index(2, 4);
        let b = index(2, 4);
        let levels_a: Vec<usize> = (1..1000).map(|id| a.level_for(id)).collect();
        let levels_b: Vec<usize> = (1..1000).map(|id| b.level_for(id)).collect();
        assert_eq!(levels_a, levels_b);
        assert!(levels_a.iter().all(|&l| l <= MAX_LEVEL));
        assert!(levels_a.iter().any(|&l| l > 0));
        assert!(levels_a.iter().filter(|&&l| l == 0).count() > 800);
    }
}
