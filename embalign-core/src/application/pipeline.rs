//! Per-pair alignment pipelines
//!
//! Each function here takes the embedded source and target of one sentence
//! pair and produces its links. They share nothing between calls, so the
//! engine can run them on any thread in any order.

use ndarray::{Array2, ArrayView2};

use crate::application::config::{AlignmentMode, EngineConfig, TokenType};
use crate::application::embedding::TokenizedSentence;
use crate::domain::aggregate::{
    aggregate_direct, aggregate_span_frequency, aggregate_span_pairs, matched_cells,
    span_iter_matrix, AlignmentSet,
};
use crate::domain::distortion::apply_distortion;
use crate::domain::matching::itermax::IterMax;
use crate::domain::matching::{backward, forward_backward_average, MatchingMethod, WeightedMatching};
use crate::domain::null_align::percentile_null_mask;
use crate::domain::similarity::{l2_normalize_rows, similarity, similarity_normalized};
use crate::domain::span::{
    average_over_words, map_span_pair_to_subwords, pool_over_spans, spans_for, Span, SubwordMap,
};

/// A tokenized sentence together with its sub-word vectors
#[derive(Debug, Clone)]
pub struct EmbeddedSentence {
    pub tokens: TokenizedSentence,
    pub map: SubwordMap,
    /// One row per sub-word
    pub vectors: Array2<f64>,
}

impl EmbeddedSentence {
    pub fn new(tokens: TokenizedSentence, vectors: Array2<f32>) -> Self {
        let map = tokens.subword_map();
        Self {
            tokens,
            map,
            vectors: vectors.mapv(f64::from),
        }
    }

    pub fn word_count(&self) -> usize {
        self.tokens.word_count()
    }

    /// Sub-word vectors scaled to unit length
    fn unit_vectors(&self) -> Array2<f64> {
        l2_normalize_rows(self.vectors.view())
    }
}

/// Links for one sentence pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairAlignment {
    pub source_words: usize,
    pub target_words: usize,
    /// Primary alignment: the first configured method, or the span mode's result
    pub links: AlignmentSet,
    /// Direct mode only: every configured method in configuration order
    pub by_method: Vec<(MatchingMethod, AlignmentSet)>,
}

impl PairAlignment {
    /// Alignment of a pair with an empty side
    pub fn empty(source_words: usize, target_words: usize) -> Self {
        Self {
            source_words,
            target_words,
            ..Default::default()
        }
    }
}

/// Similarity matrix used by direct mode at the configured granularity.
pub fn direct_similarity(
    source: &EmbeddedSentence,
    target: &EmbeddedSentence,
    token_type: TokenType,
) -> Array2<f64> {
    match token_type {
        TokenType::Word => {
            let src = average_over_words(source.vectors.view(), &source.map);
            let tgt = average_over_words(target.vectors.view(), &target.map);
            similarity(src.view(), tgt.view())
        }
        TokenType::Bpe => similarity(source.vectors.view(), target.vectors.view()),
    }
}

/// Runs every configured matching method over a similarity matrix.
///
/// Distortion is applied first; with `null_align_ratio < 1` each alignment is
/// then masked by [`percentile_null_mask`]. Returns the distorted similarity
/// and one alignment matrix per method, in configuration order.
pub fn align_similarity(
    sim: ArrayView2<f64>,
    config: &EngineConfig,
    solver: &dyn WeightedMatching,
) -> (Array2<f64>, Vec<(MatchingMethod, Array2<f64>)>) {
    let sim = apply_distortion(sim, config.distortion);
    let iter_max = IterMax::new(config.itermax_rounds);
    let null_mask = (config.null_align_ratio < 1.0)
        .then(|| percentile_null_mask(sim.view(), config.null_align_ratio));

    let alignments = config
        .methods
        .iter()
        .map(|&method| {
            let mut matrix = method.apply_with(sim.view(), solver, &iter_max);
            if let Some(mask) = &null_mask {
                matrix *= mask;
            }
            (method, matrix)
        })
        .collect();

    (sim, alignments)
}

/// Direct mode: one alignment per configured method.
pub fn align_direct(
    source: &EmbeddedSentence,
    target: &EmbeddedSentence,
    config: &EngineConfig,
    solver: &dyn WeightedMatching,
) -> Vec<(MatchingMethod, AlignmentSet)> {
    let raw = direct_similarity(source, target, config.token_type);
    let (sim, alignments) = align_similarity(raw.view(), config, solver);

    let maps = match config.token_type {
        TokenType::Bpe => Some((&source.map, &target.map)),
        TokenType::Word => None,
    };

    alignments
        .into_iter()
        .map(|(method, matrix)| {
            if method == MatchingMethod::Intersection && maps.is_some() {
                log_subword_links(source, target, matrix.view());
            }
            (method, aggregate_direct(matrix.view(), sim.view(), maps))
        })
        .collect()
}

fn log_subword_links(source: &EmbeddedSentence, target: &EmbeddedSentence, matrix: ArrayView2<f64>) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let src: Vec<&str> = source.tokens.flat_subwords().collect();
    let tgt: Vec<&str> = target.tokens.flat_subwords().collect();
    let links: Vec<String> = matched_cells(matrix)
        .into_iter()
        .map(|(i, j)| format!("{i}-{j}:({}, {})", src[i], tgt[j]))
        .collect();
    log::debug!("sub-word intersection: {}", links.join(" "));
}

/// Span vectors for both axes of a span matrix.
///
/// With `reverse`, rows are target spans and columns source spans.
fn span_vectors(
    source: &EmbeddedSentence,
    target: &EmbeddedSentence,
    rows: &[Span],
    cols: &[Span],
    reverse: bool,
) -> (Array2<f64>, Array2<f64>) {
    let (row_ranges, col_ranges) =
        map_span_pair_to_subwords(&source.map, &target.map, rows, cols, reverse);
    let (row_side, col_side) = if reverse {
        (target, source)
    } else {
        (source, target)
    };
    (
        pool_over_spans(row_side.unit_vectors().view(), &row_ranges),
        pool_over_spans(col_side.unit_vectors().view(), &col_ranges),
    )
}

/// Greedy conflict-free matching over all spans; every committed pair is kept.
pub fn align_span_iter(
    source: &EmbeddedSentence,
    target: &EmbeddedSentence,
    max_span_len: usize,
) -> AlignmentSet {
    let rows = spans_for(source.word_count(), max_span_len);
    let cols = spans_for(target.word_count(), max_span_len);
    if rows.is_empty() || cols.is_empty() {
        return AlignmentSet::new();
    }

    let (src, tgt) = span_vectors(source, target, &rows, &cols, false);
    let sim = similarity_normalized(src.view(), tgt.view());
    let alignment = span_iter_matrix(sim.view(), &rows, &cols);
    aggregate_span_pairs(alignment.view(), sim.view(), &rows, &cols, false)
}

/// Averaged forward/backward votes over all spans, kept when fully covered.
pub fn align_span_freq(
    source: &EmbeddedSentence,
    target: &EmbeddedSentence,
    max_span_len: usize,
) -> AlignmentSet {
    let rows = spans_for(source.word_count(), max_span_len);
    let cols = spans_for(target.word_count(), max_span_len);
    if rows.is_empty() || cols.is_empty() {
        return AlignmentSet::new();
    }

    let (src, tgt) = span_vectors(source, target, &rows, &cols, false);
    let sim = similarity(src.view(), tgt.view());
    let alignment = forward_backward_average(sim.view());
    aggregate_span_frequency(alignment.view(), sim.view(), &rows, &cols)
}

/// One anchored pass: every single word on the column side picks its best span.
fn anchored_pass(
    source: &EmbeddedSentence,
    target: &EmbeddedSentence,
    max_span_len: usize,
    reverse: bool,
) -> AlignmentSet {
    let (span_side, word_side) = if reverse {
        (target.word_count(), source.word_count())
    } else {
        (source.word_count(), target.word_count())
    };
    let rows = spans_for(span_side, max_span_len);
    let cols = spans_for(word_side, 1);
    if rows.is_empty() || cols.is_empty() {
        return AlignmentSet::new();
    }

    let (row_vectors, col_vectors) = span_vectors(source, target, &rows, &cols, reverse);
    let sim = similarity(row_vectors.view(), col_vectors.view());
    let alignment = backward(sim.view());
    aggregate_span_pairs(alignment.view(), sim.view(), &rows, &cols, reverse)
}

/// Source-anchored and target-anchored span passes, intersected.
pub fn align_span_bidir(
    source: &EmbeddedSentence,
    target: &EmbeddedSentence,
    max_span_len: usize,
) -> AlignmentSet {
    let source_to_target = anchored_pass(source, target, max_span_len, false);
    let target_to_source = anchored_pass(source, target, max_span_len, true);
    source_to_target.intersection(&target_to_source)
}

/// Aligns one pair in the requested mode
pub fn align_pair(
    source: &EmbeddedSentence,
    target: &EmbeddedSentence,
    mode: AlignmentMode,
    config: &EngineConfig,
    solver: &dyn WeightedMatching,
) -> PairAlignment {
    let mut result = PairAlignment::empty(source.word_count(), target.word_count());
    if source.word_count() == 0 || target.word_count() == 0 {
        return result;
    }

    match mode {
        AlignmentMode::Direct => {
            let by_method = align_direct(source, target, config, solver);
            if let Some((_, primary)) = by_method.first() {
                result.links = primary.clone();
            }
            result.by_method = by_method;
        }
        AlignmentMode::SpanIter => {
            result.links = align_span_iter(source, target, config.max_span_len);
        }
        AlignmentMode::SpanFreq => {
            result.links = align_span_freq(source, target, config.max_span_len);
        }
        AlignmentMode::SpanBidir => {
            result.links = align_span_bidir(source, target, config.max_span_len);
        }
    }
    result
}
