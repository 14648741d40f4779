//! Application layer for orchestrating alignment runs
//!
//! This module sits between the pure domain kernel and the outside world. It
//! owns the concerns the kernel deliberately ignores:
//!
//! - Talking to an embedding provider and checking what it returns
//! - Batching sentence pairs and fanning them out across threads
//! - Choosing the alignment mode and reassembling results in input order
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use embalign_core::application::{AlignmentEngine, EngineConfig};
//! use embalign_core::application::providers::HashingProvider;
//!
//! let engine = AlignmentEngine::with_config(
//!     Arc::new(HashingProvider::new()),
//!     EngineConfig::precise(),
//! )
//! .unwrap();
//!
//! let aligned = engine
//!     .align_sentences(&["hotel taxi radio"], &["hotel taxi radio"])
//!     .unwrap();
//! assert_eq!(aligned, vec!["0-0 1-1 2-2"]);
//! ```

pub mod config;
pub mod embedding;
pub mod engine;
pub mod pipeline;
pub mod providers;

pub use config::{
    AlignmentMetrics, AlignmentMode, EngineConfig, EngineConfigBuilder, ProcessingError,
    ProcessingResult, TokenType,
};
pub use embedding::{EmbeddingProvider, ProviderError, ProviderResult, TokenizedSentence};
pub use engine::{AlignmentEngine, BatchProgress, EngineOutput};
pub use pipeline::{EmbeddedSentence, PairAlignment};
