//! Contiguous word spans and their sub-word ranges
//!
//! Span modes compare every window of one to three words on one side with
//! every window on the other. The embedding provider only knows sub-words, so
//! each word span is translated into the contiguous range of sub-word rows
//! that covers it before vectors are pooled.

use std::fmt;
use std::ops::Range;

use ndarray::{Array2, ArrayView2, Axis};

/// Longest span enumerated by default
pub const MAX_SPAN_LEN: usize = 3;

/// A contiguous run of word indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    /// Index of the first word
    pub start: usize,
    /// Number of words, at least one
    pub len: usize,
}

impl Span {
    pub fn new(start: usize, len: usize) -> Self {
        debug_assert!(len > 0, "spans cover at least one word");
        Self { start, len }
    }

    /// Single-word span
    pub fn word(index: usize) -> Self {
        Self::new(index, 1)
    }

    pub fn first(&self) -> usize {
        self.start
    }

    pub fn last(&self) -> usize {
        self.start + self.len - 1
    }

    /// One past the last word
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Word indices covered by the span
    pub fn indices(&self) -> Range<usize> {
        self.start..self.end()
    }

    pub fn contains(&self, word: usize) -> bool {
        self.indices().contains(&word)
    }

    /// Whether two spans share at least one word
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len == 1 {
            write!(f, "[{}]", self.start)
        } else {
            write!(f, "[{}..{}]", self.start, self.last())
        }
    }
}

/// All spans over a sentence of `word_count` words, up to `max_len` words long.
///
/// Ordered by length first, then by start index.
pub fn spans_for(word_count: usize, max_len: usize) -> Vec<Span> {
    (1..=max_len)
        .filter(|&len| len <= word_count)
        .flat_map(|len| (0..=word_count - len).map(move |start| Span::new(start, len)))
        .collect()
}

/// Span lists for every sentence of two parallel corpora.
///
/// Sentences are split on whitespace. Returns `(source_spans, target_spans)`,
/// one list per sentence.
pub fn span_index<S: AsRef<str>>(
    sources: &[S],
    targets: &[S],
    max_len: usize,
) -> (Vec<Vec<Span>>, Vec<Vec<Span>>) {
    let index = |sentences: &[S]| -> Vec<Vec<Span>> {
        sentences
            .iter()
            .map(|s| spans_for(s.as_ref().split_whitespace().count(), max_len))
            .collect()
    };
    (index(sources), index(targets))
}

/// Ownership of sub-word tokens by words.
///
/// Built from the tokenizer's per-word sub-word lists; sub-words are numbered
/// consecutively in sentence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubwordMap {
    /// Word index for each sub-word
    owners: Vec<usize>,
    /// First sub-word of each word
    starts: Vec<usize>,
}

impl SubwordMap {
    /// Build the map from the number of sub-words in each word
    pub fn from_word_lengths(lengths: &[usize]) -> Self {
        let mut owners = Vec::with_capacity(lengths.iter().sum());
        let mut starts = Vec::with_capacity(lengths.len());
        for (word, &count) in lengths.iter().enumerate() {
            starts.push(owners.len());
            owners.extend(std::iter::repeat(word).take(count));
        }
        Self { owners, starts }
    }

    /// Build the map from per-word token lists
    pub fn from_tokens<T>(tokens: &[Vec<T>]) -> Self {
        let lengths: Vec<usize> = tokens.iter().map(Vec::len).collect();
        Self::from_word_lengths(&lengths)
    }

    /// Identity map: every word is a single sub-word
    pub fn identity(word_count: usize) -> Self {
        Self::from_word_lengths(&vec![1; word_count])
    }

    /// Word that owns a sub-word
    pub fn word_of(&self, subword: usize) -> Option<usize> {
        self.owners.get(subword).copied()
    }

    /// First sub-word of a word, `None` for words without sub-words or past the end
    pub fn start_of(&self, word: usize) -> Option<usize> {
        let start = *self.starts.get(word)?;
        (start < self.owners.len() && self.owners[start] == word).then_some(start)
    }

    /// Sub-word range of a single word
    pub fn word_range(&self, word: usize) -> Range<usize> {
        let start = self.starts.get(word).copied().unwrap_or(self.len());
        let end = self.starts.get(word + 1).copied().unwrap_or(self.len());
        start..end
    }

    /// Number of sub-words
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Number of words
    pub fn word_count(&self) -> usize {
        self.starts.len()
    }

    /// Sub-word to word table
    pub fn owners(&self) -> &[usize] {
        &self.owners
    }
}

/// Sub-word range covering each word span.
///
/// A span runs from the first sub-word of its first word up to the first
/// sub-word of the word after it, or to the end of the sentence when the span
/// ends on the last word.
pub fn map_word_spans_to_subwords(map: &SubwordMap, spans: &[Span]) -> Vec<Range<usize>> {
    spans
        .iter()
        .map(|span| {
            let start = map.start_of(span.first()).unwrap_or(map.len());
            let end = map.start_of(span.end()).unwrap_or(map.len());
            start..end.max(start)
        })
        .collect()
}

/// Sub-word ranges for a row/column span pair.
///
/// Rows are mapped against the source map and columns against the target map;
/// with `reverse` the roles swap, which is how the target-anchored pass of the
/// bidirectional mode reads its matrices.
pub fn map_span_pair_to_subwords(
    source_map: &SubwordMap,
    target_map: &SubwordMap,
    rows: &[Span],
    cols: &[Span],
    reverse: bool,
) -> (Vec<Range<usize>>, Vec<Range<usize>>) {
    let (row_map, col_map) = if reverse {
        (target_map, source_map)
    } else {
        (source_map, target_map)
    };
    (
        map_word_spans_to_subwords(row_map, rows),
        map_word_spans_to_subwords(col_map, cols),
    )
}

/// Mean of the vectors in each range, one output row per range.
///
/// An empty range pools to a zero vector.
pub fn pool_over_spans(vectors: ArrayView2<f64>, ranges: &[Range<usize>]) -> Array2<f64> {
    let dim = vectors.ncols();
    let mut pooled = Array2::zeros((ranges.len(), dim));
    for (mut row, range) in pooled.axis_iter_mut(Axis(0)).zip(ranges) {
        let end = range.end.min(vectors.nrows());
        if range.start >= end {
            continue;
        }
        if let Some(mean) = vectors.slice(ndarray::s![range.start..end, ..]).mean_axis(Axis(0)) {
            row.assign(&mean);
        }
    }
    pooled
}

/// Mean sub-word vector of each word
pub fn average_over_words(vectors: ArrayView2<f64>, map: &SubwordMap) -> Array2<f64> {
    let ranges: Vec<Range<usize>> = (0..map.word_count()).map(|w| map.word_range(w)).collect();
    pool_over_spans(vectors, &ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn test_span_geometry() {
        let span = Span::new(2, 3);
        assert_eq!(span.first(), 2);
        assert_eq!(span.last(), 4);
        assert_eq!(span.indices().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert!(span.contains(4));
        assert!(!span.contains(5));
        assert!(span.overlaps(&Span::word(4)));
        assert!(!span.overlaps(&Span::new(5, 2)));
        assert_eq!(span.to_string(), "[2..4]");
        assert_eq!(Span::word(7).to_string(), "[7]");
    }

    #[test]
    fn test_spans_are_grouped_by_length() {
        let spans = spans_for(4, 3);
        let rendered: Vec<Vec<usize>> = spans.iter().map(|s| s.indices().collect()).collect();
        assert_eq!(
            rendered,
            vec![
                vec![0],
                vec![1],
                vec![2],
                vec![3],
                vec![0, 1],
                vec![1, 2],
                vec![2, 3],
                vec![0, 1, 2],
                vec![1, 2, 3],
            ]
        );
    }

    #[test]
    fn test_short_sentences_have_fewer_spans() {
        assert_eq!(spans_for(0, 3).len(), 0);
        assert_eq!(spans_for(1, 3).len(), 1);
        assert_eq!(spans_for(2, 3).len(), 3);
    }

    #[test]
    fn test_span_index_per_sentence() {
        let (src, tgt) = span_index(&["a b c", "a"], &["x y", "x y z w"], MAX_SPAN_LEN);
        assert_eq!(src[0].len(), 6);
        assert_eq!(src[1].len(), 1);
        assert_eq!(tgt[0].len(), 3);
        assert_eq!(tgt[1].len(), 9);
    }

    #[test]
    fn test_subword_map_lookup() {
        // "unbelievable story" -> [un, believ, able] [story]
        let map = SubwordMap::from_word_lengths(&[3, 1]);
        assert_eq!(map.len(), 4);
        assert_eq!(map.word_count(), 2);
        assert_eq!(map.owners(), &[0, 0, 0, 1]);
        assert_eq!(map.word_of(2), Some(0));
        assert_eq!(map.word_of(4), None);
        assert_eq!(map.start_of(1), Some(3));
        assert_eq!(map.start_of(2), None);
        assert_eq!(map.word_range(0), 0..3);
        assert_eq!(map.word_range(1), 3..4);
    }

    #[test]
    fn test_word_spans_to_subword_ranges() {
        let map = SubwordMap::from_word_lengths(&[2, 1, 3]);
        let spans = vec![Span::word(0), Span::new(0, 2), Span::new(1, 2), Span::word(2)];

        let ranges = map_word_spans_to_subwords(&map, &spans);

        // The last word runs to the end of the sub-word sequence
        assert_eq!(ranges, vec![0..2, 0..3, 2..6, 3..6]);
    }

    #[test]
    fn test_reverse_swaps_maps() {
        let source = SubwordMap::from_word_lengths(&[2, 2]);
        let target = SubwordMap::identity(2);
        let rows = vec![Span::word(1)];
        let cols = vec![Span::word(1)];

        let (r, c) = map_span_pair_to_subwords(&source, &target, &rows, &cols, false);
        assert_eq!((r, c), (vec![2..4], vec![1..2]));

        let (r, c) = map_span_pair_to_subwords(&source, &target, &rows, &cols, true);
        assert_eq!((r, c), (vec![1..2], vec![2..4]));
    }

    #[test]
    fn test_pooling_means_and_empty_ranges() {
        let vectors = array![[1.0, 0.0], [3.0, 2.0], [5.0, 4.0]];

        let pooled = pool_over_spans(vectors.view(), &[0..2, 2..3, 3..3]);

        assert_eq!(pooled, array![[2.0, 1.0], [5.0, 4.0], [0.0, 0.0]]);
    }

    #[test]
    fn test_average_over_words() {
        let vectors = array![[1.0, 1.0], [3.0, 3.0], [0.0, 2.0]];
        let map = SubwordMap::from_word_lengths(&[2, 1]);

        assert_eq!(
            average_over_words(vectors.view(), &map),
            array![[2.0, 2.0], [0.0, 2.0]]
        );
    }

    proptest! {
        #[test]
        fn prop_span_count(words in 0usize..40) {
            let expected: usize = (1..=MAX_SPAN_LEN)
                .filter(|&d| d <= words)
                .map(|d| words - d + 1)
                .sum();
            prop_assert_eq!(spans_for(words, MAX_SPAN_LEN).len(), expected);
        }

        #[test]
        fn prop_ranges_cover_owned_subwords(lengths in proptest::collection::vec(1usize..4, 1..12)) {
            let map = SubwordMap::from_word_lengths(&lengths);
            let spans = spans_for(lengths.len(), MAX_SPAN_LEN);
            for (span, range) in spans.iter().zip(map_word_spans_to_subwords(&map, &spans)) {
                for subword in range {
                    let owner = map.word_of(subword).unwrap();
                    prop_assert!(span.contains(owner));
                }
            }
        }
    }
}
