//! Storage layer.
//!
//! - **Traits**: the [`AnnIndex`] boundary any nearest-neighbor graph must meet
//! - **ANN**: the in-crate [`HnswIndex`] and the cosine distance it ranks by
//! - **Records**: page content and metadata keyed by the same ids as the index

pub mod ann;
pub mod records;
pub mod traits;

pub use ann::{DistanceFn, HnswIndex, cosine_distance};
pub use records::RecordStore;
pub use traits::{AnnIndex, Neighbor, RankedNeighbors};
