//! Main aligner implementation

use std::sync::Arc;
use std::time::Instant;

use crate::api::{Config, Error, Input, Output};
use crate::application::providers::HashingProvider;
use crate::application::{AlignmentEngine, AlignmentMode, BatchProgress, EmbeddingProvider};
use crate::domain::aggregate::AlignmentSet;
use crate::domain::matching::MatchingMethod;

/// Word aligner with a clean API
#[derive(Debug)]
pub struct Aligner {
    engine: AlignmentEngine,
    config: Config,
}

impl Aligner {
    /// Create an aligner with the default configuration and the hashing provider
    pub fn new() -> Self {
        let config = Config::default();
        let engine = AlignmentEngine::new(Arc::new(HashingProvider::new()));
        Self { engine, config }
    }

    /// Create an aligner with custom configuration and embedding provider
    pub fn with_config(config: Config, provider: Arc<dyn EmbeddingProvider>) -> Result<Self, Error> {
        config.validate()?;
        let engine = AlignmentEngine::with_config(provider, config.engine.clone())?;
        Ok(Self { engine, config })
    }

    /// Create an aligner with custom configuration and the hashing provider
    pub fn with_hashing(config: Config) -> Result<Self, Error> {
        Self::with_config(config, Arc::new(HashingProvider::new()))
    }

    /// Align a parallel corpus in the configured mode
    pub fn align(&self, input: Input) -> Result<Output, Error> {
        self.align_with_progress(input, &|_| {})
    }

    /// Align a parallel corpus, reporting after each batch
    pub fn align_with_progress(
        &self,
        input: Input,
        on_batch: &(dyn Fn(BatchProgress) + Sync),
    ) -> Result<Output, Error> {
        let start = Instant::now();

        let (source, target) = input.into_corpus()?;
        let result = self
            .engine
            .run_with_progress(&source, &target, self.config.mode, on_batch)?;

        Ok(Output::from_engine(
            result,
            self.config.token_type(),
            self.config.methods(),
            self.engine.provider_name(),
            start.elapsed(),
        ))
    }

    /// Primary alignment string per pair, using the first configured method
    pub fn align_sentences<S: AsRef<str> + Sync>(
        &self,
        sources: &[S],
        targets: &[S],
    ) -> Result<Vec<String>, Error> {
        Ok(self.engine.align_sentences(sources, targets)?)
    }

    /// Alignment string per configured method for every pair
    pub fn align_sentences_all<S: AsRef<str> + Sync>(
        &self,
        sources: &[S],
        targets: &[S],
    ) -> Result<Vec<Vec<(MatchingMethod, AlignmentSet)>>, Error> {
        Ok(self.engine.align_sentences_all(sources, targets)?)
    }

    /// Greedy conflict-free span alignment per pair
    pub fn align_spans_iter<S: AsRef<str> + Sync>(
        &self,
        sources: &[S],
        targets: &[S],
    ) -> Result<Vec<String>, Error> {
        Ok(self.engine.align_spans_iter(sources, targets)?)
    }

    /// Frequency-filtered span alignment per pair
    pub fn align_spans_freq<S: AsRef<str> + Sync>(
        &self,
        sources: &[S],
        targets: &[S],
    ) -> Result<Vec<String>, Error> {
        Ok(self.engine.align_spans_freq(sources, targets)?)
    }

    /// Bidirectionally intersected span alignment per pair
    pub fn align_spans_bidirection<S: AsRef<str> + Sync>(
        &self,
        sources: &[S],
        targets: &[S],
    ) -> Result<Vec<String>, Error> {
        Ok(self.engine.align_spans_bidirection(sources, targets)?)
    }

    /// Alignment strings for a corpus in an explicit mode
    pub fn align_in_mode<S: AsRef<str> + Sync>(
        &self,
        sources: &[S],
        targets: &[S],
        mode: AlignmentMode,
    ) -> Result<Vec<String>, Error> {
        let output = self.engine.run(sources, targets, mode)?;
        Ok(output.pairs.iter().map(|p| p.links.to_string()).collect())
    }

    /// Get the current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for Aligner {
    fn default() -> Self {
        Self::new()
    }
}
