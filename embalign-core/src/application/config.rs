//! Configuration and error handling for the application layer
//!
//! This module provides the engine configuration, the alignment mode and
//! granularity selectors, and the error types raised while aligning a corpus.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::embedding::ProviderError;
use crate::domain::matching::itermax::DEFAULT_MAX_ROUNDS;
use crate::domain::matching::MatchingMethod;
use crate::domain::span::MAX_SPAN_LEN;

/// Unit over which direct-mode similarity is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenType {
    /// Sub-word vectors are mean-pooled into one vector per word
    Word,
    /// Sub-words are matched directly and links are folded back onto words
    #[default]
    #[serde(alias = "subword")]
    Bpe,
}

impl TokenType {
    pub const ALL: [TokenType; 2] = [TokenType::Word, TokenType::Bpe];

    pub fn key(&self) -> &'static str {
        match self {
            TokenType::Word => "word",
            TokenType::Bpe => "bpe",
        }
    }
}

impl FromStr for TokenType {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "word" | "words" => Ok(TokenType::Word),
            "bpe" | "subword" | "sub-word" => Ok(TokenType::Bpe),
            other => Err(ProcessingError::InvalidConfig {
                reason: format!("unknown token type '{other}' (expected word or bpe)"),
            }),
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Top-level alignment strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignmentMode {
    /// One similarity matrix per pair, one or more matching methods
    #[default]
    Direct,
    /// Greedy conflict-free matching over word spans
    SpanIter,
    /// Span votes spread over words, kept when fully covered
    SpanFreq,
    /// Source-anchored and target-anchored span passes, intersected
    SpanBidir,
}

impl AlignmentMode {
    pub const ALL: [AlignmentMode; 4] = [
        AlignmentMode::Direct,
        AlignmentMode::SpanIter,
        AlignmentMode::SpanFreq,
        AlignmentMode::SpanBidir,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            AlignmentMode::Direct => "direct",
            AlignmentMode::SpanIter => "span-iter",
            AlignmentMode::SpanFreq => "span-freq",
            AlignmentMode::SpanBidir => "span-bidir",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AlignmentMode::Direct => "word or sub-word similarity with the configured matching methods",
            AlignmentMode::SpanIter => "greedy non-overlapping matching of 1-3 word spans",
            AlignmentMode::SpanFreq => "span votes distributed over words, fully covered pairs kept",
            AlignmentMode::SpanBidir => "span matching in both directions, intersected",
        }
    }

    /// Whether this mode compares word spans rather than single units
    pub fn is_span_based(&self) -> bool {
        !matches!(self, AlignmentMode::Direct)
    }
}

impl FromStr for AlignmentMode {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "direct" | "sentences" => Ok(AlignmentMode::Direct),
            "span-iter" | "spans-iter" => Ok(AlignmentMode::SpanIter),
            "span-freq" | "spans-freq" => Ok(AlignmentMode::SpanFreq),
            "span-bidir" | "spans-bidir" | "span-bidirection" => Ok(AlignmentMode::SpanBidir),
            other => Err(ProcessingError::InvalidConfig {
                reason: format!(
                    "unknown alignment mode '{other}' (expected direct, span-iter, span-freq or span-bidir)"
                ),
            }),
        }
    }
}

impl fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Configuration options for the alignment engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Granularity of direct-mode similarity
    pub token_type: TokenType,

    /// Matching methods for direct mode; the first one is primary
    pub methods: Vec<MatchingMethod>,

    /// Strength of the diagonal prior in `[0, 1]`
    pub distortion: f64,

    /// Entropy threshold in `[0, 1]`; `1.0` disables null filtering
    pub null_align_ratio: f64,

    /// Longest span considered by span modes
    pub max_span_len: usize,

    /// Total itermax rounds including the first
    pub itermax_rounds: usize,

    /// Sentence pairs sent to the embedding provider at once
    pub batch_size: usize,

    /// Maximum number of threads to use (None = use all available)
    pub max_threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            token_type: TokenType::Bpe,
            methods: vec![
                MatchingMethod::MaxWeight,
                MatchingMethod::Intersection,
                MatchingMethod::IterMax,
            ],
            distortion: 0.0,
            null_align_ratio: 1.0,
            max_span_len: MAX_SPAN_LEN,
            itermax_rounds: DEFAULT_MAX_ROUNDS,
            batch_size: 100,
            max_threads: None,
        }
    }
}

impl EngineConfig {
    /// Creates a new builder for EngineConfig
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Mutual-best word links only
    pub fn precise() -> Self {
        Self {
            token_type: TokenType::Word,
            methods: vec![MatchingMethod::Intersection],
            ..Default::default()
        }
    }

    /// Iterative matching over sub-words, recovering more links
    pub fn recall() -> Self {
        Self {
            token_type: TokenType::Bpe,
            methods: vec![MatchingMethod::IterMax],
            ..Default::default()
        }
    }

    /// Method whose alignment is reported as the pair's result in direct mode
    pub fn primary_method(&self) -> Option<MatchingMethod> {
        self.methods.first().copied()
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ProcessingError> {
        check_ratio("distortion", self.distortion)?;
        check_ratio("null_align_ratio", self.null_align_ratio)?;

        if self.methods.is_empty() {
            return Err(ProcessingError::InvalidConfig {
                reason: "At least one matching method is required".to_string(),
            });
        }

        if !(1..=MAX_SPAN_LEN).contains(&self.max_span_len) {
            return Err(ProcessingError::InvalidConfig {
                reason: format!("max_span_len must be between 1 and {MAX_SPAN_LEN}"),
            });
        }

        if self.itermax_rounds == 0 {
            return Err(ProcessingError::InvalidConfig {
                reason: "itermax_rounds must be greater than 0".to_string(),
            });
        }

        if self.batch_size == 0 {
            return Err(ProcessingError::InvalidConfig {
                reason: "Batch size must be greater than 0".to_string(),
            });
        }

        if let Some(threads) = self.max_threads {
            if threads == 0 {
                return Err(ProcessingError::InvalidConfig {
                    reason: "Max threads must be greater than 0".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Thread count actually used for a run
    pub fn thread_count(&self) -> usize {
        #[cfg(feature = "parallel")]
        {
            self.max_threads.unwrap_or_else(num_cpus::get).max(1)
        }
        #[cfg(not(feature = "parallel"))]
        {
            1
        }
    }
}

fn check_ratio(name: &str, value: f64) -> Result<(), ProcessingError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ProcessingError::InvalidConfig {
            reason: format!("{name} must be within [0, 1], got {value}"),
        })
    }
}

/// Errors that can occur while aligning a corpus
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Invalid configuration parameters
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Source and target corpora differ in length
    #[error("Source and target sentence counts differ: {sources} vs {targets}")]
    LengthMismatch { sources: usize, targets: usize },

    /// The provider returned embeddings that do not fit the tokenization
    #[error("Embedding check failed for sentence pair {pair}: {reason}")]
    Embedding { pair: usize, reason: String },

    /// The embedding provider failed
    #[error("Embedding provider failed: {0}")]
    Provider(#[from] ProviderError),

    /// Error during parallel processing
    #[error("Parallel processing failed")]
    ParallelError {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for processing operations
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Builder for EngineConfig with fluent API
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn token_type(mut self, token_type: TokenType) -> Self {
        self.config.token_type = token_type;
        self
    }

    pub fn methods(mut self, methods: Vec<MatchingMethod>) -> Self {
        self.config.methods = methods;
        self
    }

    pub fn distortion(mut self, ratio: f64) -> Self {
        self.config.distortion = ratio;
        self
    }

    pub fn null_align_ratio(mut self, ratio: f64) -> Self {
        self.config.null_align_ratio = ratio;
        self
    }

    pub fn max_span_len(mut self, len: usize) -> Self {
        self.config.max_span_len = len;
        self
    }

    pub fn itermax_rounds(mut self, rounds: usize) -> Self {
        self.config.itermax_rounds = rounds;
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Sets the maximum number of threads
    pub fn max_threads(mut self, threads: Option<usize>) -> Self {
        self.config.max_threads = threads;
        self
    }

    /// Builds the configuration, validating parameters
    pub fn build(self) -> ProcessingResult<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Builds the configuration without validation (for testing)
    pub fn build_unchecked(self) -> EngineConfig {
        self.config
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Timing and volume figures collected during a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignmentMetrics {
    /// Total processing time in microseconds
    pub total_time_us: u64,

    /// Time spent in tokenization and embedding
    pub embedding_time_us: u64,

    /// Time spent building matrices and matching
    pub alignment_time_us: u64,

    /// Number of batches sent to the provider
    pub batch_count: usize,

    /// Number of threads used
    pub thread_count: usize,

    /// Sentence pairs processed
    pub pair_count: usize,

    /// Pairs with an empty side, answered without embeddings
    pub empty_pairs: usize,

    /// Links produced across all pairs (primary alignment only)
    pub link_count: usize,
}

impl AlignmentMetrics {
    /// Sentence pairs per second
    pub fn pairs_per_second(&self) -> f64 {
        if self.total_time_us == 0 {
            return 0.0;
        }
        self.pair_count as f64 / (self.total_time_us as f64 / 1_000_000.0)
    }

    /// Share of total time spent in the embedding provider (0.0 to 1.0)
    pub fn embedding_share(&self) -> f64 {
        if self.total_time_us == 0 {
            return 0.0;
        }
        (self.embedding_time_us as f64 / self.total_time_us as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.token_type, TokenType::Bpe);
        assert_eq!(config.primary_method(), Some(MatchingMethod::MaxWeight));
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.null_align_ratio, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = EngineConfig {
            distortion: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            null_align_ratio: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            methods: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            max_span_len: 4,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            max_threads: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_preset_configs() {
        let precise = EngineConfig::precise();
        assert_eq!(precise.token_type, TokenType::Word);
        assert_eq!(precise.methods, vec![MatchingMethod::Intersection]);

        let recall = EngineConfig::recall();
        assert_eq!(recall.primary_method(), Some(MatchingMethod::IterMax));
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::builder()
            .token_type(TokenType::Word)
            .distortion(0.5)
            .batch_size(8)
            .max_threads(Some(2))
            .build()
            .unwrap();
        assert_eq!(config.distortion, 0.5);
        assert_eq!(config.thread_count(), 2);

        assert!(EngineConfig::builder().batch_size(0).build().is_err());
        assert_eq!(EngineConfig::builder().batch_size(0).build_unchecked().batch_size, 0);
    }

    #[test]
    fn test_mode_and_token_type_keys() {
        for mode in AlignmentMode::ALL {
            assert_eq!(mode.key().parse::<AlignmentMode>().unwrap(), mode);
        }
        assert_eq!("span_bidir".parse::<AlignmentMode>().unwrap(), AlignmentMode::SpanBidir);
        assert!("spans".parse::<AlignmentMode>().is_err());

        assert_eq!("subword".parse::<TokenType>().unwrap(), TokenType::Bpe);
        assert_eq!("WORD".parse::<TokenType>().unwrap(), TokenType::Word);
        assert!("char".parse::<TokenType>().is_err());
    }

    #[test]
    fn test_alignment_metrics() {
        let metrics = AlignmentMetrics {
            pair_count: 500,
            total_time_us: 2_000_000,
            embedding_time_us: 1_500_000,
            ..Default::default()
        };

        assert_eq!(metrics.pairs_per_second(), 250.0);
        assert_eq!(metrics.embedding_share(), 0.75);
        assert_eq!(AlignmentMetrics::default().pairs_per_second(), 0.0);
    }
}
