//! Storage backend traits.

mod ann;

pub use ann::{AnnIndex, Neighbor, RankedNeighbors};
