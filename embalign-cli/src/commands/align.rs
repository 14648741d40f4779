//! Align command implementation

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use embalign_core::application::providers::HashingProvider;
use embalign_core::{Aligner, AlignmentMode, EmbeddingProvider, PrecomputedProvider, TokenType};

use crate::config::CliConfig;
use crate::error::CliError;
use crate::input::resolve_input;
use crate::output::{JsonFormatter, OutputFormatter, TextFormatter};
use crate::progress::ProgressReporter;

/// Arguments for the align command
#[derive(Debug, Args)]
pub struct AlignArgs {
    /// Source sentences, one per line
    #[arg(short, long, value_name = "FILE", requires = "target", conflicts_with = "parallel")]
    pub source: Option<PathBuf>,

    /// Target sentences, one per line
    #[arg(short, long, value_name = "FILE", requires = "source")]
    pub target: Option<PathBuf>,

    /// Parallel file with `source ||| target` lines
    #[arg(short, long, value_name = "FILE", required_unless_present = "source")]
    pub parallel: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Alignment mode
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Matching methods for direct mode, e.g. `mai` or `inter,itermax`
    #[arg(short, long, value_name = "METHODS")]
    pub methods: Option<String>,

    /// Token granularity for direct mode
    #[arg(long, value_enum)]
    pub token_type: Option<TokenKind>,

    /// Positional prior strength in [0, 1]
    #[arg(long, value_name = "RATIO")]
    pub distortion: Option<f64>,

    /// Entropy threshold for null alignment in [0, 1]
    #[arg(long, value_name = "RATIO")]
    pub null_align: Option<f64>,

    /// Precomputed embeddings in JSON Lines format
    #[arg(long, value_name = "FILE")]
    pub embeddings: Option<PathBuf>,

    /// Vector width of the built-in hashing provider
    #[arg(long, value_name = "DIM")]
    pub hash_dim: Option<usize>,

    /// Number of worker threads (default: all cores)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Sentence pairs per provider call
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Append the mean similarity to each link in text output
    #[arg(long)]
    pub scores: bool,

    /// Print every configured method in text output
    #[arg(long)]
    pub all_methods: bool,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One line of `i-j` links per sentence pair
    Text,
    /// JSON document with links, scores and metadata
    Json,
}

impl OutputFormat {
    fn from_key(key: &str) -> Result<Self> {
        match key.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(CliError::ConfigError(format!("unknown output format '{other}'")).into()),
        }
    }
}

/// Alignment modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Word or sub-word similarity with the configured methods
    Direct,
    /// Greedy non-overlapping span matching
    SpanIter,
    /// Span votes kept when fully covered
    SpanFreq,
    /// Span matching in both directions, intersected
    SpanBidir,
}

impl From<Mode> for AlignmentMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Direct => AlignmentMode::Direct,
            Mode::SpanIter => AlignmentMode::SpanIter,
            Mode::SpanFreq => AlignmentMode::SpanFreq,
            Mode::SpanBidir => AlignmentMode::SpanBidir,
        }
    }
}

/// Token granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TokenKind {
    /// Sub-word vectors pooled into words
    Word,
    /// Sub-word vectors, links folded to words
    Bpe,
}

impl From<TokenKind> for TokenType {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Word => TokenType::Word,
            TokenKind::Bpe => TokenType::Bpe,
        }
    }
}

impl AlignArgs {
    /// Execute the align command
    pub fn execute(&self) -> Result<()> {
        self.init_logging()?;

        log::info!("Starting alignment");
        log::debug!("Arguments: {:?}", self);

        let settings = self.settings()?;
        let config = settings.core_config()?;
        let provider = Self::provider(&settings)?;
        log::info!(
            "mode {}, provider {}, methods {:?}",
            config.mode(),
            provider.name(),
            config.methods()
        );
        let aligner = Aligner::with_config(config, provider)
            .map_err(|e| CliError::ConfigError(e.to_string()))?;

        let input = resolve_input(
            self.source.as_deref(),
            self.target.as_deref(),
            self.parallel.as_deref(),
        )?;

        let reporter = ProgressReporter::new(self.quiet);
        let output = aligner
            .align_with_progress(input, &|progress| reporter.batch_completed(progress))
            .map_err(|e| CliError::ProcessingError(e.to_string()))?;
        reporter.finish();

        let mut formatter = self.formatter(&settings)?;
        for pair in &output.alignments {
            formatter.format_pair(pair)?;
        }
        formatter.finish(&output.metadata)?;

        log::info!(
            "aligned {} pairs ({} links) in {:.2?}",
            output.metadata.stats.pair_count,
            output.metadata.stats.link_count,
            output.metadata.duration
        );
        Ok(())
    }

    /// Configuration file values with command-line overrides applied
    pub fn settings(&self) -> Result<CliConfig> {
        let mut settings = match &self.config {
            Some(path) => CliConfig::from_file(path)?,
            None => CliConfig::default(),
        };

        let alignment = &mut settings.alignment;
        if let Some(mode) = self.mode {
            alignment.mode = AlignmentMode::from(mode).key().to_string();
        }
        if let Some(kind) = self.token_type {
            alignment.token_type = TokenType::from(kind).key().to_string();
        }
        if let Some(methods) = &self.methods {
            alignment.methods = methods.clone();
        }
        if let Some(ratio) = self.distortion {
            alignment.distortion = ratio;
        }
        if let Some(ratio) = self.null_align {
            alignment.null_align = ratio;
        }
        if let Some(path) = &self.embeddings {
            alignment.embeddings = Some(path.clone());
        }
        if let Some(dim) = self.hash_dim {
            alignment.hash_dim = dim;
        }

        if let Some(threads) = self.threads {
            settings.performance.worker_threads = threads;
        }
        if let Some(size) = self.batch_size {
            settings.performance.batch_size = size;
        }

        if let Some(format) = self.format {
            settings.output.format = match format {
                OutputFormat::Text => "text",
                OutputFormat::Json => "json",
            }
            .to_string();
        }
        settings.output.include_scores |= self.scores;
        settings.output.show_methods |= self.all_methods;

        Ok(settings)
    }

    fn provider(settings: &CliConfig) -> Result<Arc<dyn EmbeddingProvider>> {
        match &settings.alignment.embeddings {
            Some(path) => {
                let provider = PrecomputedProvider::from_path(path).with_context(|| {
                    format!("Failed to load embeddings from {}", path.display())
                })?;
                log::info!("loaded {} precomputed sentences", provider.len());
                Ok(Arc::new(provider))
            }
            None => {
                let provider = HashingProvider::with_dim(settings.alignment.hash_dim)
                    .map_err(|e| CliError::ConfigError(e.to_string()))?;
                Ok(Arc::new(provider))
            }
        }
    }

    fn formatter(&self, settings: &CliConfig) -> Result<Box<dyn OutputFormatter>> {
        let writer: Box<dyn Write + Send + Sync> = match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create output file: {}", path.display()))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(io::stdout()),
        };

        let output = &settings.output;
        let formatter: Box<dyn OutputFormatter> = match OutputFormat::from_key(&output.format)? {
            OutputFormat::Text => Box::new(
                TextFormatter::new(writer)
                    .with_scores(output.include_scores)
                    .with_methods(output.show_methods),
            ),
            OutputFormat::Json => Box::new(JsonFormatter::new(writer).pretty(output.pretty_json)),
        };
        Ok(formatter)
    }

    /// Initialize logging based on verbosity level
    fn init_logging(&self) -> Result<()> {
        let log_level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        if !self.quiet {
            // A logger may already be installed when running under a test harness
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(log_level),
            )
            .try_init();
        }

        Ok(())
    }
}
