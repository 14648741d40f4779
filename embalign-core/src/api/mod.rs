//! Public API for embalign-core
//!
//! This module provides a small, stable interface for word alignment that
//! hides the engine's internals and is shared by the CLI and library users.

mod aligner;
mod config;
mod error;
mod input;
mod output;


pub use aligner::Aligner;
pub use config::{defaults, Config, ConfigBuilder};
pub use error::{Error, Result};
pub use input::{Input, PARALLEL_SEPARATOR};
pub use output::{MethodAlignment, Output, ProcessingMetadata, ProcessingStats, SentenceAlignment};
