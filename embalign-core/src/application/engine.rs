//! Alignment engine: batching, embedding, and parallel per-pair alignment
//!
//! A run walks the corpus in batches of `batch_size` pairs. For each batch the
//! provider is asked to tokenize and embed both sides once; the pairs of the
//! batch are then aligned independently (on a rayon pool when more than one
//! thread is configured) and collected back in input order.

use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::application::config::{
    AlignmentMetrics, AlignmentMode, EngineConfig, ProcessingError, ProcessingResult,
};
use crate::application::embedding::{check_embeddings, EmbeddingProvider, TokenizedSentence};
use crate::application::pipeline::{align_pair, EmbeddedSentence, PairAlignment};
use crate::domain::aggregate::AlignmentSet;
use crate::domain::matching::{HungarianMatching, MatchingMethod, WeightedMatching};

/// Alignments for a whole corpus, in input order
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub pairs: Vec<PairAlignment>,
    pub mode: AlignmentMode,
    pub metrics: AlignmentMetrics,
}

/// Progress notification sent after each batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Zero-based index of the batch just finished
    pub batch: usize,
    pub batch_count: usize,
    pub pairs_done: usize,
    pub pairs_total: usize,
}

/// Aligns parallel corpora using an embedding provider
pub struct AlignmentEngine {
    provider: Arc<dyn EmbeddingProvider>,
    solver: Arc<dyn WeightedMatching>,
    config: EngineConfig,
}

impl std::fmt::Debug for AlignmentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignmentEngine")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish()
    }
}

impl AlignmentEngine {
    /// Creates an engine with the default configuration
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            solver: Arc::new(HungarianMatching),
            config: EngineConfig::default(),
        }
    }

    /// Creates an engine with a custom configuration
    pub fn with_config(
        provider: Arc<dyn EmbeddingProvider>,
        config: EngineConfig,
    ) -> ProcessingResult<Self> {
        config.validate()?;
        Ok(Self {
            provider,
            solver: Arc::new(HungarianMatching),
            config,
        })
    }

    /// Replaces the maximum-weight matching solver
    pub fn with_solver(mut self, solver: Arc<dyn WeightedMatching>) -> Self {
        self.solver = solver;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Aligns every pair of the corpus in the given mode
    pub fn run<S: AsRef<str> + Sync>(
        &self,
        sources: &[S],
        targets: &[S],
        mode: AlignmentMode,
    ) -> ProcessingResult<EngineOutput> {
        self.run_with_progress(sources, targets, mode, &|_| {})
    }

    /// Aligns every pair of the corpus, reporting after each batch
    pub fn run_with_progress<S: AsRef<str> + Sync>(
        &self,
        sources: &[S],
        targets: &[S],
        mode: AlignmentMode,
        on_batch: &(dyn Fn(BatchProgress) + Sync),
    ) -> ProcessingResult<EngineOutput> {
        let start_time = Instant::now();
        if sources.len() != targets.len() {
            return Err(ProcessingError::LengthMismatch {
                sources: sources.len(),
                targets: targets.len(),
            });
        }

        let mut metrics = AlignmentMetrics {
            thread_count: self.config.thread_count(),
            pair_count: sources.len(),
            ..Default::default()
        };
        let executor = Executor::new(metrics.thread_count)?;

        let batch_size = self.config.batch_size;
        let batch_count = sources.len().div_ceil(batch_size);
        let mut pairs = Vec::with_capacity(sources.len());

        for (batch, (src_batch, tgt_batch)) in sources
            .chunks(batch_size)
            .zip(targets.chunks(batch_size))
            .enumerate()
        {
            let offset = batch * batch_size;

            let embed_start = Instant::now();
            let embedded = self.embed_batch(src_batch, tgt_batch, offset)?;
            metrics.embedding_time_us += embed_start.elapsed().as_micros() as u64;

            let align_start = Instant::now();
            let aligned = executor.align_all(&embedded, |source, target| {
                align_pair(source, target, mode, &self.config, self.solver.as_ref())
            });
            metrics.alignment_time_us += align_start.elapsed().as_micros() as u64;

            metrics.empty_pairs += embedded.iter().filter(|slot| slot.is_empty()).count();
            pairs.extend(aligned);

            log::info!(
                "aligned batch {}/{} ({} pairs)",
                batch + 1,
                batch_count,
                pairs.len()
            );
            on_batch(BatchProgress {
                batch,
                batch_count,
                pairs_done: pairs.len(),
                pairs_total: sources.len(),
            });
        }

        metrics.batch_count = batch_count;
        metrics.link_count = pairs.iter().map(|p| p.links.len()).sum();
        metrics.total_time_us = start_time.elapsed().as_micros() as u64;

        Ok(EngineOutput {
            pairs,
            mode,
            metrics,
        })
    }

    /// Tokenizes and embeds one batch, both sides.
    ///
    /// Pairs with an empty side are answered without involving the provider.
    fn embed_batch<S: AsRef<str>>(
        &self,
        sources: &[S],
        targets: &[S],
        offset: usize,
    ) -> ProcessingResult<Vec<PairSlot>> {
        let mut slots = Vec::with_capacity(sources.len());
        let mut src_batch = Vec::new();
        let mut tgt_batch = Vec::new();

        for (idx, (source, target)) in sources.iter().zip(targets).enumerate() {
            let src_words = split_words(source.as_ref());
            let tgt_words = split_words(target.as_ref());
            if src_words.is_empty() || tgt_words.is_empty() {
                slots.push(PairSlot::Empty(src_words.len(), tgt_words.len()));
                continue;
            }

            let src = self.tokenize(src_words, offset + idx)?;
            let tgt = self.tokenize(tgt_words, offset + idx)?;
            slots.push(PairSlot::Pending(src_batch.len()));
            src_batch.push(src);
            tgt_batch.push(tgt);
        }

        if src_batch.is_empty() {
            return Ok(slots);
        }

        let src_vectors = self.embed(&src_batch, &slots, offset)?;
        let tgt_vectors = self.embed(&tgt_batch, &slots, offset)?;

        let mut embedded: Vec<Option<(EmbeddedSentence, EmbeddedSentence)>> = src_batch
            .into_iter()
            .zip(src_vectors)
            .zip(tgt_batch.into_iter().zip(tgt_vectors))
            .map(|((src, sv), (tgt, tv))| {
                Some((EmbeddedSentence::new(src, sv), EmbeddedSentence::new(tgt, tv)))
            })
            .collect();

        for (idx, slot) in slots.iter_mut().enumerate() {
            if let PairSlot::Pending(position) = *slot {
                let (source, target) = embedded[position].take().ok_or_else(|| {
                    ProcessingError::Embedding {
                        pair: offset + idx,
                        reason: "embedding slot consumed twice".to_string(),
                    }
                })?;
                if source.vectors.ncols() != target.vectors.ncols() {
                    return Err(ProcessingError::Embedding {
                        pair: offset + idx,
                        reason: format!(
                            "source vectors have dimension {}, target vectors {}",
                            source.vectors.ncols(),
                            target.vectors.ncols()
                        ),
                    });
                }
                *slot = PairSlot::Ready(Box::new((source, target)));
            }
        }

        Ok(slots)
    }

    fn tokenize(&self, words: Vec<String>, pair: usize) -> ProcessingResult<TokenizedSentence> {
        let subwords = self.provider.tokenize(&words)?;
        let sentence = TokenizedSentence::new(words, subwords);
        sentence
            .check()
            .map_err(|reason| ProcessingError::Embedding { pair, reason })?;
        Ok(sentence)
    }

    fn embed(
        &self,
        batch: &[TokenizedSentence],
        slots: &[PairSlot],
        offset: usize,
    ) -> ProcessingResult<Vec<ndarray::Array2<f32>>> {
        let vectors = self.provider.embed(batch)?;
        check_embeddings(batch, &vectors).map_err(|(position, reason)| {
            // Report the corpus index of the pair, not its position in the provider batch
            let pair = slots
                .iter()
                .position(|slot| matches!(slot, PairSlot::Pending(p) if *p == position))
                .map_or(offset, |idx| offset + idx);
            ProcessingError::Embedding { pair, reason }
        })?;
        Ok(vectors)
    }

    /// Primary alignment string per pair.
    ///
    /// Uses the first configured matching method.
    pub fn align_sentences<S: AsRef<str> + Sync>(
        &self,
        sources: &[S],
        targets: &[S],
    ) -> ProcessingResult<Vec<String>> {
        self.strings(sources, targets, AlignmentMode::Direct)
    }

    /// Alignment per configured method for every pair, in configuration order
    pub fn align_sentences_all<S: AsRef<str> + Sync>(
        &self,
        sources: &[S],
        targets: &[S],
    ) -> ProcessingResult<Vec<Vec<(MatchingMethod, AlignmentSet)>>> {
        let output = self.run(sources, targets, AlignmentMode::Direct)?;
        Ok(output
            .pairs
            .into_iter()
            .map(|pair| {
                if pair.by_method.is_empty() {
                    // Empty pairs still report every method
                    self.config
                        .methods
                        .iter()
                        .map(|&m| (m, AlignmentSet::new()))
                        .collect()
                } else {
                    pair.by_method
                }
            })
            .collect())
    }

    /// Greedy conflict-free span alignment per pair
    pub fn align_spans_iter<S: AsRef<str> + Sync>(
        &self,
        sources: &[S],
        targets: &[S],
    ) -> ProcessingResult<Vec<String>> {
        self.strings(sources, targets, AlignmentMode::SpanIter)
    }

    /// Frequency-filtered span alignment per pair
    pub fn align_spans_freq<S: AsRef<str> + Sync>(
        &self,
        sources: &[S],
        targets: &[S],
    ) -> ProcessingResult<Vec<String>> {
        self.strings(sources, targets, AlignmentMode::SpanFreq)
    }

    /// Bidirectionally intersected span alignment per pair
    pub fn align_spans_bidirection<S: AsRef<str> + Sync>(
        &self,
        sources: &[S],
        targets: &[S],
    ) -> ProcessingResult<Vec<String>> {
        self.strings(sources, targets, AlignmentMode::SpanBidir)
    }

    fn strings<S: AsRef<str> + Sync>(
        &self,
        sources: &[S],
        targets: &[S],
        mode: AlignmentMode,
    ) -> ProcessingResult<Vec<String>> {
        let output = self.run(sources, targets, mode)?;
        Ok(output.pairs.iter().map(|p| p.links.to_string()).collect())
    }
}

fn split_words(sentence: &str) -> Vec<String> {
    sentence.split_whitespace().map(String::from).collect()
}

/// A pair of the current batch on its way through the engine
enum PairSlot {
    /// Word counts of a pair with an empty side
    Empty(usize, usize),
    /// Position in the provider batch, before embedding
    Pending(usize),
    Ready(Box<(EmbeddedSentence, EmbeddedSentence)>),
}

impl PairSlot {
    fn is_empty(&self) -> bool {
        matches!(self, PairSlot::Empty(..))
    }
}

/// Runs per-pair work sequentially or on a dedicated rayon pool
struct Executor {
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl Executor {
    fn new(thread_count: usize) -> ProcessingResult<Self> {
        #[cfg(feature = "parallel")]
        {
            let pool = if thread_count > 1 {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(thread_count)
                    .thread_name(|idx| format!("embalign-worker-{idx}"))
                    .build()
                    .map_err(|e| ProcessingError::ParallelError {
                        source: Box::new(e),
                    })?;
                Some(pool)
            } else {
                None
            };
            Ok(Self { pool })
        }
        #[cfg(not(feature = "parallel"))]
        {
            let _ = thread_count;
            Ok(Self {})
        }
    }

    fn align_all<F>(&self, slots: &[PairSlot], align: F) -> Vec<PairAlignment>
    where
        F: Fn(&EmbeddedSentence, &EmbeddedSentence) -> PairAlignment + Sync,
    {
        let run_one = |slot: &PairSlot| match slot {
            PairSlot::Ready(pair) => align(&pair.0, &pair.1),
            PairSlot::Empty(src, tgt) => PairAlignment::empty(*src, *tgt),
            PairSlot::Pending(_) => PairAlignment::default(),
        };

        #[cfg(feature = "parallel")]
        {
            if let Some(pool) = &self.pool {
                return pool.install(|| slots.par_iter().map(run_one).collect());
            }
        }

        slots.iter().map(run_one).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::TokenType;
    use crate::application::embedding::{ProviderError, ProviderResult};
    use crate::application::providers::HashingProvider;
    use ndarray::Array2;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts embed calls and returns one fewer vector than asked when `short`
    struct CountingProvider {
        inner: HashingProvider,
        embed_calls: AtomicUsize,
        short: bool,
    }

    impl CountingProvider {
        fn new(short: bool) -> Self {
            Self {
                inner: HashingProvider::new(),
                embed_calls: AtomicUsize::new(0),
                short,
            }
        }
    }

    impl EmbeddingProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn tokenize(&self, words: &[String]) -> ProviderResult<Vec<Vec<String>>> {
            self.inner.tokenize(words)
        }

        fn embed(&self, batch: &[TokenizedSentence]) -> ProviderResult<Vec<Array2<f32>>> {
            self.embed_calls.fetch_add(1, Ordering::SeqCst);
            let mut vectors = self.inner.embed(batch)?;
            if self.short {
                if let Some(first) = vectors.first_mut() {
                    let rows = first.nrows().saturating_sub(1);
                    *first = first.slice(ndarray::s![..rows, ..]).to_owned();
                }
            }
            Ok(vectors)
        }
    }

    struct FailingProvider;

    impl EmbeddingProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn tokenize(&self, words: &[String]) -> ProviderResult<Vec<Vec<String>>> {
            Err(ProviderError::MissingSentence {
                sentence: words.join(" "),
            })
        }

        fn embed(&self, _batch: &[TokenizedSentence]) -> ProviderResult<Vec<Array2<f32>>> {
            Ok(Vec::new())
        }
    }

    fn engine(config: EngineConfig) -> AlignmentEngine {
        AlignmentEngine::with_config(Arc::new(HashingProvider::new()), config).unwrap()
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let err = engine(EngineConfig::default())
            .align_sentences(&["a b"], &["a b", "c"])
            .unwrap_err();

        assert!(matches!(
            err,
            ProcessingError::LengthMismatch {
                sources: 1,
                targets: 2
            }
        ));
    }

    #[test]
    fn test_identical_sentences_align_diagonally() {
        let engine = engine(EngineConfig::precise());
        let sentences = ["alpha beta gamma delta"];

        let aligned = engine.align_sentences(&sentences, &sentences).unwrap();

        assert_eq!(aligned, vec!["0-0 1-1 2-2 3-3"]);
    }

    #[test]
    fn test_batches_preserve_order_and_call_provider_per_side() {
        let provider = Arc::new(CountingProvider::new(false));
        let config = EngineConfig {
            batch_size: 2,
            max_threads: Some(3),
            methods: vec![MatchingMethod::Intersection],
            ..Default::default()
        };
        let engine = AlignmentEngine::with_config(provider.clone(), config).unwrap();
        let sources = ["one two", "three", "four five six", "", "seven"];
        let targets = ["one two", "three", "four five six", "x", "seven"];

        let output = engine.run(&sources, &targets, AlignmentMode::Direct).unwrap();

        let strings: Vec<String> = output.pairs.iter().map(|p| p.links.to_string()).collect();
        assert_eq!(strings, vec!["0-0 1-1", "0-0", "0-0 1-1 2-2", "", "0-0"]);
        assert_eq!(output.metrics.batch_count, 3);
        assert_eq!(output.metrics.empty_pairs, 1);
        // Two sides for each of three batches
        assert_eq!(provider.embed_calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let sources = ["the quick brown fox", "jumps over", "the lazy dog today"];
        let targets = ["quick the fox brown", "over jumps", "dog lazy the today"];
        let config = EngineConfig {
            token_type: TokenType::Word,
            methods: vec![MatchingMethod::IterMax],
            ..Default::default()
        };

        let seq = engine(EngineConfig {
            max_threads: Some(1),
            ..config.clone()
        });
        let par = engine(EngineConfig {
            max_threads: Some(4),
            ..config
        });

        for mode in AlignmentMode::ALL {
            let a = seq.run(&sources, &targets, mode).unwrap();
            let b = par.run(&sources, &targets, mode).unwrap();
            assert_eq!(a.pairs, b.pairs, "{mode}");
        }
    }

    #[test]
    fn test_embedding_count_mismatch_is_an_error() {
        let engine = AlignmentEngine::with_config(
            Arc::new(CountingProvider::new(true)),
            EngineConfig::precise(),
        )
        .unwrap();

        let err = engine.align_sentences(&["", "a b"], &["x", "c d"]).unwrap_err();

        match err {
            ProcessingError::Embedding { pair, reason } => {
                assert_eq!(pair, 1);
                assert!(reason.contains("sub-word vectors"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_provider_errors_propagate() {
        let engine = AlignmentEngine::new(Arc::new(FailingProvider));
        let err = engine.align_spans_freq(&["a"], &["b"]).unwrap_err();
        assert!(matches!(err, ProcessingError::Provider(_)));
    }

    #[test]
    fn test_all_methods_reported_per_pair() {
        let engine = engine(EngineConfig::default());

        let all = engine.align_sentences_all(&["a b c", ""], &["a b c", "z"]).unwrap();

        assert_eq!(all.len(), 2);
        let methods: Vec<MatchingMethod> = all[0].iter().map(|(m, _)| *m).collect();
        assert_eq!(methods, engine.config().methods);
        assert!(all[1].iter().all(|(_, links)| links.is_empty()));
    }

    #[test]
    fn test_progress_reports_every_batch() {
        let engine = engine(EngineConfig {
            batch_size: 1,
            ..EngineConfig::precise()
        });
        let seen = std::sync::Mutex::new(Vec::new());

        engine
            .run_with_progress(&["a", "b", "c"], &["a", "b", "c"], AlignmentMode::Direct, &|p| {
                seen.lock().unwrap().push(p.pairs_done)
            })
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(AlignmentEngine::with_config(Arc::new(HashingProvider::new()), config).is_err());
    }
}
