//! Output types for the alignment API

use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::application::{AlignmentMode, EngineOutput, TokenType};
use crate::domain::aggregate::AlignmentLink;
use crate::domain::matching::MatchingMethod;

/// Alignment output with metadata
#[derive(Debug, Clone, Serialize)]
pub struct Output {
    /// One entry per sentence pair, in input order
    pub alignments: Vec<SentenceAlignment>,
    /// Processing metadata
    pub metadata: ProcessingMetadata,
}

/// Links for one sentence pair
#[derive(Debug, Clone, Serialize)]
pub struct SentenceAlignment {
    /// Zero-based position in the input
    pub index: usize,
    pub source_words: usize,
    pub target_words: usize,
    /// Space-separated `i-j` links
    pub alignment: String,
    /// The same links with their similarity scores
    pub links: Vec<AlignmentLink>,
    /// Direct mode: every configured method
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub by_method: Vec<MethodAlignment>,
}

/// Alignment produced by one matching method
#[derive(Debug, Clone, Serialize)]
pub struct MethodAlignment {
    pub method: MatchingMethod,
    pub alignment: String,
}

/// Metadata about the processing
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingMetadata {
    /// Total processing duration
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
    pub mode: AlignmentMode,
    pub token_type: TokenType,
    pub methods: Vec<MatchingMethod>,
    /// Embedding provider name
    pub provider: String,
    pub batches: usize,
    pub threads: usize,
    /// Additional statistics
    pub stats: ProcessingStats,
}

/// Additional processing statistics
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingStats {
    pub pair_count: usize,
    /// Pairs with an empty side
    pub empty_pairs: usize,
    pub link_count: usize,
    pub avg_links_per_pair: f32,
    /// Time spent in the embedding provider
    #[serde(rename = "embedding_ms", serialize_with = "as_millis")]
    pub embedding_time: Duration,
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

impl Output {
    /// Create output from an engine run
    pub(crate) fn from_engine(
        result: EngineOutput,
        token_type: TokenType,
        methods: &[MatchingMethod],
        provider: &str,
        duration: Duration,
    ) -> Self {
        let metrics = result.metrics;
        let alignments: Vec<SentenceAlignment> = result
            .pairs
            .into_iter()
            .enumerate()
            .map(|(index, pair)| SentenceAlignment {
                index,
                source_words: pair.source_words,
                target_words: pair.target_words,
                alignment: pair.links.to_string(),
                links: pair.links.links(),
                by_method: pair
                    .by_method
                    .iter()
                    .map(|(method, links)| MethodAlignment {
                        method: *method,
                        alignment: links.to_string(),
                    })
                    .collect(),
            })
            .collect();

        let avg_links_per_pair = if alignments.is_empty() {
            0.0
        } else {
            metrics.link_count as f32 / alignments.len() as f32
        };

        // Span modes ignore the method list
        let methods = if result.mode.is_span_based() {
            Vec::new()
        } else {
            methods.to_vec()
        };

        Self {
            alignments,
            metadata: ProcessingMetadata {
                duration,
                mode: result.mode,
                token_type,
                methods,
                provider: provider.to_string(),
                batches: metrics.batch_count,
                threads: metrics.thread_count,
                stats: ProcessingStats {
                    pair_count: metrics.pair_count,
                    empty_pairs: metrics.empty_pairs,
                    link_count: metrics.link_count,
                    avg_links_per_pair,
                    embedding_time: Duration::from_micros(metrics.embedding_time_us),
                },
            },
        }
    }

    /// Alignment strings in input order
    pub fn alignment_strings(&self) -> Vec<&str> {
        self.alignments.iter().map(|a| a.alignment.as_str()).collect()
    }
}
