//! Output formatting module

use anyhow::Result;
use embalign_core::{ProcessingMetadata, SentenceAlignment};

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Format and output the links of one sentence pair
    fn format_pair(&mut self, pair: &SentenceAlignment) -> Result<()>;

    /// Finalize output (e.g., write the JSON document)
    fn finish(&mut self, metadata: &ProcessingMetadata) -> Result<()>;
}

pub mod json;
pub mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;
