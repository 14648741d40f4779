//! Configuration API for alignment

use std::str::FromStr;

use crate::api::Error;
use crate::application::config::{AlignmentMode, EngineConfig, ProcessingError, TokenType};
use crate::domain::matching::MatchingMethod;

/// Default configuration constants
pub mod defaults {
    /// Sentence pairs per provider call
    pub const BATCH_SIZE: usize = 100;

    /// Compact code of the default matching methods: max-weight, intersection, itermax
    pub const METHODS: &str = "mai";

    /// Distortion ratio (no positional prior)
    pub const DISTORTION: f64 = 0.0;

    /// Null-alignment ratio (no entropy filtering)
    pub const NULL_ALIGN: f64 = 1.0;
}

/// Alignment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub(crate) mode: AlignmentMode,
    pub(crate) engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: AlignmentMode::Direct,
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    /// Create a configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Word-level intersection: fewest, most reliable links
    pub fn precise() -> Self {
        Self {
            mode: AlignmentMode::Direct,
            engine: EngineConfig::precise(),
        }
    }

    /// Sub-word itermax: recovers more links at some cost in precision
    pub fn recall() -> Self {
        Self {
            mode: AlignmentMode::Direct,
            engine: EngineConfig::recall(),
        }
    }

    pub fn mode(&self) -> AlignmentMode {
        self.mode
    }

    pub fn token_type(&self) -> TokenType {
        self.engine.token_type
    }

    pub fn methods(&self) -> &[MatchingMethod] {
        &self.engine.methods
    }

    pub fn distortion(&self) -> f64 {
        self.engine.distortion
    }

    pub fn null_align(&self) -> f64 {
        self.engine.null_align_ratio
    }

    pub fn batch_size(&self) -> usize {
        self.engine.batch_size
    }

    pub fn threads(&self) -> Option<usize> {
        self.engine.max_threads
    }

    /// Engine settings behind this configuration
    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    /// Validate the configuration
    pub(crate) fn validate(&self) -> Result<(), Error> {
        self.engine.validate().map_err(configuration_error)
    }
}

fn configuration_error(err: ProcessingError) -> Error {
    match err {
        ProcessingError::InvalidConfig { reason } => Error::Configuration(reason),
        other => Error::Processing(other),
    }
}

/// Fluent builder for configuration
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    mode: Option<AlignmentMode>,
    token_type: Option<TokenType>,
    methods: Option<Vec<MatchingMethod>>,
    distortion: Option<f64>,
    null_align: Option<f64>,
    max_span_len: Option<usize>,
    itermax_rounds: Option<usize>,
    batch_size: Option<usize>,
    threads: Option<usize>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the alignment mode by key (`direct`, `span-iter`, `span-freq`, `span-bidir`)
    pub fn mode(mut self, key: impl AsRef<str>) -> Result<Self, Error> {
        self.mode = Some(AlignmentMode::from_str(key.as_ref()).map_err(configuration_error)?);
        Ok(self)
    }

    /// Set the alignment mode
    pub fn alignment_mode(mut self, mode: AlignmentMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the token granularity by key (`word`, `bpe`)
    pub fn token_type(mut self, key: impl AsRef<str>) -> Result<Self, Error> {
        self.token_type = Some(TokenType::from_str(key.as_ref()).map_err(configuration_error)?);
        Ok(self)
    }

    /// Set the matching methods from a key list (`"inter,itermax"`) or codes (`"mai"`)
    pub fn methods(mut self, spec: impl AsRef<str>) -> Result<Self, Error> {
        let methods = MatchingMethod::parse_list(spec.as_ref())
            .map_err(|e| Error::Configuration(e.to_string()))?;
        self.methods = Some(methods);
        Ok(self)
    }

    /// Set the matching methods directly
    pub fn matching_methods(mut self, methods: Vec<MatchingMethod>) -> Self {
        self.methods = Some(methods);
        self
    }

    pub fn distortion(mut self, ratio: f64) -> Self {
        self.distortion = Some(ratio);
        self
    }

    pub fn null_align(mut self, ratio: f64) -> Self {
        self.null_align = Some(ratio);
        self
    }

    pub fn max_span_len(mut self, len: usize) -> Self {
        self.max_span_len = Some(len);
        self
    }

    pub fn itermax_rounds(mut self, rounds: usize) -> Self {
        self.itermax_rounds = Some(rounds);
        self
    }

    /// Set the number of sentence pairs per provider call
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Set the number of threads (None = all available)
    pub fn threads(mut self, count: Option<usize>) -> Self {
        self.threads = count;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config, Error> {
        let mut config = Config::default();

        if let Some(mode) = self.mode {
            config.mode = mode;
        }

        let engine = &mut config.engine;
        if let Some(token_type) = self.token_type {
            engine.token_type = token_type;
        }
        if let Some(methods) = self.methods {
            engine.methods = methods;
        }
        if let Some(ratio) = self.distortion {
            engine.distortion = ratio;
        }
        if let Some(ratio) = self.null_align {
            engine.null_align_ratio = ratio;
        }
        if let Some(len) = self.max_span_len {
            engine.max_span_len = len;
        }
        if let Some(rounds) = self.itermax_rounds {
            engine.itermax_rounds = rounds;
        }
        if let Some(size) = self.batch_size {
            engine.batch_size = size;
        }
        if self.threads.is_some() {
            engine.max_threads = self.threads;
        }

        config.validate()?;
        Ok(config)
    }
}
