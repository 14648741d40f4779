//! Word alignment between parallel sentences from contextual embeddings
//!
//! Given a source sentence and its translation, this crate produces the set of
//! `i-j` links saying which source word corresponds to which target word. It
//! needs no parallel training data: sub-word vectors from an embedding provider
//! are compared with cosine similarity and the resulting matrix is turned into
//! links by one of several matching methods, or by one of the span-level modes
//! that let a phrase on one side align to a phrase on the other.
//!
//! # Architecture
//!
//! - **Domain layer**: similarity, distortion, null alignment, matching and
//!   span aggregation as pure functions over matrices
//! - **Application layer**: embedding providers, per-pair pipelines and the
//!   batching, multi-threaded engine
//! - **API layer**: configuration, input and output types for library users
//!   and the command-line tool
//!
//! # Example
//!
//! ```rust
//! use embalign_core::{Aligner, Config, Input};
//!
//! let aligner = Aligner::with_hashing(Config::precise()).unwrap();
//!
//! let output = aligner
//!     .align(Input::from_pairs([("lemon apple cherry", "lemon apple cherry")]))
//!     .unwrap();
//!
//! assert_eq!(output.alignment_strings(), vec!["0-0 1-1 2-2"]);
//! ```

pub mod api;
pub mod application;
pub mod domain;

pub use api::{
    Aligner, Config, ConfigBuilder, Error as ApiError, Input, MethodAlignment, Output,
    ProcessingMetadata, ProcessingStats, SentenceAlignment,
};

pub use application::providers::{HashingProvider, PrecomputedProvider};
pub use application::{
    AlignmentEngine, AlignmentMode, EmbeddingProvider, EngineConfig, TokenType,
    TokenizedSentence,
};
pub use domain::*;
