//! Approximate nearest-neighbor index trait.
//!
//! The store keeps page content and metadata itself and hands the index only
//! `(id, vector)` pairs. Any graph that can insert by id, grow its id space,
//! and return a ranked neighbor set can stand behind a
//! [`crate::VectorStore`].
//!
//! # Id space
//!
//! Ids are dense `u32` values. Id `0` belongs to the anchor point placed at
//! construction and is never a document; [`AnnIndex::len`] counts it.
//!
//! # Thread safety
//!
//! Implementations need no internal locking. The store serializes
//! [`AnnIndex::insert`] and [`AnnIndex::grow`] behind a write lock and runs
//! [`AnnIndex::search`] under a shared read lock, so `&self` methods must be
//! free of interior mutation.
//!
//! # Usage Example
//!
//! ```rust
//! use annstore::{AnnIndex, HnswIndex, HnswParams};
//! use annstore::storage::cosine_distance;
//!
//! let mut index = HnswIndex::new(HnswParams::default(), vec![0.0, 0.0], 4, cosine_distance)?;
//! index.insert(1, vec![1.0, 0.0])?;
//! index.insert(2, vec![0.0, 1.0])?;
//!
//! let best = index.search(&[0.9, 0.1], 8, 1)?.into_sorted_vec();
//! assert_eq!(best[0].id, 1);
//! # Ok::<(), annstore::Error>(())
//! ```

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::Result;

/// One search hit: an index id and its distance to the query.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    /// Index id (`0` is the anchor).
    pub id: u32,
    /// Distance to the query; smaller is closer.
    pub distance: f32,
}

impl Neighbor {
    /// Creates a neighbor.
    #[must_use]
    pub const fn new(id: u32, distance: f32) -> Self {
        Self { id, distance }
    }
}

impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Neighbor {}

impl Ord for Neighbor {
    // Larger distance sorts greater; ties break on id so ordering is total.
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Search result set that yields its *worst* member first.
///
/// Draining with [`pop`](Self::pop) visits hits from farthest to closest,
/// which is the order the query pipeline assembles documents in before it
/// reverses them.
#[derive(Debug, Clone, Default)]
pub struct RankedNeighbors {
    heap: BinaryHeap<Neighbor>,
}

impl RankedNeighbors {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a hit.
    pub fn push(&mut self, neighbor: Neighbor) {
        self.heap.push(neighbor);
    }

    /// Removes and returns the farthest remaining hit.
    pub fn pop(&mut self) -> Option<Neighbor> {
        self.heap.pop()
    }

    /// Returns the farthest remaining hit without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&Neighbor> {
        self.heap.peek()
    }

    /// Number of hits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if there are no hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Consumes the set, returning hits closest first.
    #[must_use]
    pub fn into_sorted_vec(self) -> Vec<Neighbor> {
        self.heap.into_sorted_vec()
    }
}

impl FromIterator<Neighbor> for RankedNeighbors {
    fn from_iter<I: IntoIterator<Item = Neighbor>>(iter: I) -> Self {
        Self {
            heap: iter.into_iter().collect(),
        }
    }
}

/// Trait for approximate nearest-neighbor indexes.
///
/// # Implementor Notes
///
/// - Ids `1..=capacity()` are insertable; inserting beyond capacity fails
///   until [`grow`](Self::grow) is called
/// - Vectors must have exactly [`dimensions`](Self::dimensions) components
/// - [`search`](Self::search) may return the anchor (id `0`); callers drop it
pub trait AnnIndex: Send + Sync {
    /// Vector dimensionality accepted by this index.
    fn dimensions(&self) -> usize;

    /// Highest id that can be inserted without growing.
    fn capacity(&self) -> usize;

    /// Number of points in the graph, including the anchor.
    fn len(&self) -> usize;

    /// Returns true if the graph holds only the anchor.
    fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Inserts a vector under `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector has the wrong dimensionality, the id is
    /// beyond capacity, or the id is already present.
    fn insert(&mut self, id: u32, vector: Vec<f32>) -> Result<()>;

    /// Raises capacity to at least `capacity`. Never shrinks.
    fn grow(&mut self, capacity: usize);

    /// Finds up to `k` neighbors of `query`, exploring `ef` candidates.
    ///
    /// # Errors
    ///
    /// Returns an error if the query has the wrong dimensionality.
    fn search(&self, query: &[f32], ef: usize, k: usize) -> Result<RankedNeighbors>;
}
