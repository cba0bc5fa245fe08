//! Data models for annstore.
//!
//! Documents crossing the store boundary and the per-call option types.

mod document;
mod search;

pub use document::{Document, Metadata};
pub use search::{AddOptions, MetadataFilter, SearchOptions};
