//! Reference embedding providers

pub mod hashing;
pub mod precomputed;

pub use hashing::HashingProvider;
pub use precomputed::{EmbeddingRecord, PrecomputedProvider};
