//! Configuration module
//!
//! The TOML file mirrors the command-line flags; flags given on the command
//! line override values read from the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use embalign_core::api::defaults;
use embalign_core::application::providers::hashing::DEFAULT_DIM;
use embalign_core::domain::matching::itermax::DEFAULT_MAX_ROUNDS;
use embalign_core::domain::span::MAX_SPAN_LEN;
use embalign_core::Config;
use serde::{Deserialize, Serialize};

use crate::error::CliError;
use crate::input::FileReader;

/// CLI configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Alignment configuration
    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Performance configuration
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// Alignment-related configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlignmentConfig {
    /// `direct`, `span-iter`, `span-freq` or `span-bidir`
    pub mode: String,

    /// `bpe` or `word`
    pub token_type: String,

    /// Matching methods for direct mode, as keys or compact codes
    pub methods: String,

    /// Positional prior strength in `[0, 1]`
    pub distortion: f64,

    /// Entropy threshold in `[0, 1]`; 1.0 disables null filtering
    pub null_align: f64,

    /// Longest span in words for the span modes
    pub max_span_len: usize,

    /// Round budget of the itermax method
    pub itermax_rounds: usize,

    /// Precomputed embeddings (JSON Lines); the hashing provider is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<PathBuf>,

    /// Vector width of the hashing provider
    pub hash_dim: usize,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            mode: "direct".to_string(),
            token_type: "bpe".to_string(),
            methods: defaults::METHODS.to_string(),
            distortion: defaults::DISTORTION,
            null_align: defaults::NULL_ALIGN,
            max_span_len: MAX_SPAN_LEN,
            itermax_rounds: DEFAULT_MAX_ROUNDS,
            embeddings: None,
            hash_dim: DEFAULT_DIM,
        }
    }
}

/// Output-related configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Default output format
    pub format: String,

    /// Append mean similarity to each link in text output
    pub include_scores: bool,

    /// Print one line per matching method in text output
    pub show_methods: bool,

    /// Pretty print JSON output
    pub pretty_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            include_scores: false,
            show_methods: false,
            pretty_json: true,
        }
    }
}

/// Performance-related configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PerformanceConfig {
    /// Sentence pairs per provider call
    pub batch_size: usize,

    /// Number of worker threads (0 = auto)
    pub worker_threads: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::BATCH_SIZE,
            worker_threads: 0,
        }
    }
}

impl CliConfig {
    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = FileReader::read_text(path)?;
        Self::from_toml(&text)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Library configuration for these settings
    pub fn core_config(&self) -> Result<Config> {
        let alignment = &self.alignment;
        let threads = match self.performance.worker_threads {
            0 => None,
            n => Some(n),
        };

        let config = Config::builder()
            .mode(&alignment.mode)
            .and_then(|b| b.token_type(&alignment.token_type))
            .and_then(|b| b.methods(&alignment.methods))
            .and_then(|b| {
                b.distortion(alignment.distortion)
                    .null_align(alignment.null_align)
                    .max_span_len(alignment.max_span_len)
                    .itermax_rounds(alignment.itermax_rounds)
                    .batch_size(self.performance.batch_size)
                    .threads(threads)
                    .build()
            })
            .map_err(|e| CliError::ConfigError(e.to_string()))?;

        if alignment.hash_dim == 0 {
            return Err(CliError::ConfigError("hash_dim must be positive".to_string()).into());
        }
        if !matches!(self.output.format.to_lowercase().as_str(), "text" | "json") {
            return Err(CliError::ConfigError(format!(
                "unknown output format '{}'",
                self.output.format
            ))
            .into());
        }

        Ok(config)
    }
}
