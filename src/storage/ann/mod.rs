//! In-process HNSW graph.
//!
//! ```text
//! Layer 2: o---------------o         (few nodes, long hops)
//!          |               |
//! Layer 1: o-----o---o-----o
//!          |     |   |     |
//! Layer 0: o-o-o-o-o-o-o-o-o-o       (every node)
//! ```

mod distance;
mod hnsw;
mod node;

pub use distance::{DistanceFn, cosine_distance};
pub use hnsw::HnswIndex;
