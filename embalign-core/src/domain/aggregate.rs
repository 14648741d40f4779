//! From alignment matrices to sorted index links

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::span::{Span, SubwordMap};

/// Minimum accumulated coverage a word pair needs in frequency aggregation
pub const FREQUENCY_THRESHOLD: f64 = 1.0;

/// Absolute slack on [`FREQUENCY_THRESHOLD`] so that exact fractional covers count
const FREQUENCY_TOLERANCE: f64 = 1e-9;

/// One source-target link and the similarity scores that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentLink {
    pub source: usize,
    pub target: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scores: Vec<f64>,
}

impl AlignmentLink {
    /// Average contributing score, `None` when the link carries no scores
    pub fn mean_score(&self) -> Option<f64> {
        if self.scores.is_empty() {
            None
        } else {
            Some(self.scores.iter().sum::<f64>() / self.scores.len() as f64)
        }
    }
}

impl fmt::Display for AlignmentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

/// Error parsing an `"i-j i-j ..."` alignment string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAlignmentError {
    pub token: String,
}

impl fmt::Display for ParseAlignmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid alignment link '{}', expected '<source>-<target>'", self.token)
    }
}

impl std::error::Error for ParseAlignmentError {}

/// Unique links of one sentence pair, ordered by `(source, target)`.
///
/// Each key maps to the list of scores recorded for it. Reading a key that was
/// never recorded yields an empty slice; nothing is materialized on read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignmentSet {
    links: BTreeMap<(usize, usize), Vec<f64>>,
}

impl AlignmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a score to a link, creating the link if needed
    pub fn record(&mut self, source: usize, target: usize, score: f64) {
        self.links.entry((source, target)).or_default().push(score);
    }

    /// Add a link without a score
    pub fn insert(&mut self, source: usize, target: usize) {
        self.links.entry((source, target)).or_default();
    }

    pub fn contains(&self, source: usize, target: usize) -> bool {
        self.links.contains_key(&(source, target))
    }

    /// Scores recorded for a link; empty when the link is absent
    pub fn scores(&self, source: usize, target: usize) -> &[f64] {
        self.links
            .get(&(source, target))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Link keys in ascending order
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.links.keys().copied()
    }

    /// Links with their scores, in ascending order
    pub fn links(&self) -> Vec<AlignmentLink> {
        self.links
            .iter()
            .map(|(&(source, target), scores)| AlignmentLink {
                source,
                target,
                scores: scores.clone(),
            })
            .collect()
    }

    /// Links present in both sets; scores from both sides are kept
    pub fn intersection(&self, other: &AlignmentSet) -> AlignmentSet {
        let links = self
            .links
            .iter()
            .filter_map(|(key, scores)| {
                other.links.get(key).map(|theirs| {
                    let mut merged = scores.clone();
                    merged.extend_from_slice(theirs);
                    (*key, merged)
                })
            })
            .collect();
        AlignmentSet { links }
    }
}

impl FromIterator<(usize, usize)> for AlignmentSet {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        let mut set = AlignmentSet::new();
        for (source, target) in iter {
            set.insert(source, target);
        }
        set
    }
}

impl fmt::Display for AlignmentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (source, target)) in self.pairs().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{source}-{target}")?;
        }
        Ok(())
    }
}

impl FromStr for AlignmentSet {
    type Err = ParseAlignmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace()
            .map(|token| -> Result<(usize, usize), ParseAlignmentError> {
                let invalid = || ParseAlignmentError {
                    token: token.to_string(),
                };
                let (source, target) = token.split_once('-').ok_or_else(invalid)?;
                Ok((
                    source.parse().map_err(|_| invalid())?,
                    target.parse().map_err(|_| invalid())?,
                ))
            })
            .collect()
    }
}

/// Non-zero cells of an alignment matrix, row-major
pub fn matched_cells(alignment: ArrayView2<f64>) -> Vec<(usize, usize)> {
    alignment
        .indexed_iter()
        .filter(|(_, &weight)| weight > 0.0)
        .map(|(cell, _)| cell)
        .collect()
}

/// Links for a word- or sub-word-level alignment matrix.
///
/// With `word_maps`, matrix indices are sub-words and are folded onto the words
/// that own them; several sub-word links may collapse into one word link,
/// whose score list then holds every contributing similarity.
pub fn aggregate_direct(
    alignment: ArrayView2<f64>,
    sim: ArrayView2<f64>,
    word_maps: Option<(&SubwordMap, &SubwordMap)>,
) -> AlignmentSet {
    let mut set = AlignmentSet::new();
    for (i, j) in matched_cells(alignment) {
        let (source, target) = match word_maps {
            Some((src_map, tgt_map)) => match (src_map.word_of(i), tgt_map.word_of(j)) {
                (Some(source), Some(target)) => (source, target),
                _ => continue,
            },
            None => (i, j),
        };
        set.record(source, target, sim[[i, j]]);
    }
    set
}

/// One greedy step of conflict-free span matching.
///
/// Takes the remaining candidate matrix by value, commits its largest positive
/// cell (first in row-major order on ties), and returns the matrix with every
/// row whose span shares a word with the committed row span, and every column
/// whose span shares a word with the committed column span, set to zero.
/// Returns `None` once no positive cell is left.
pub fn greedy_span_step(
    mut remaining: Array2<f64>,
    rows: &[Span],
    cols: &[Span],
) -> (Array2<f64>, Option<(usize, usize)>) {
    let mut best: Option<((usize, usize), f64)> = None;
    for (cell, &value) in remaining.indexed_iter() {
        let better = match best {
            Some((_, current)) => value > current,
            None => value > 0.0,
        };
        if better {
            best = Some((cell, value));
        }
    }

    let Some(((x, y), _)) = best else {
        return (remaining, None);
    };

    remaining[[x, y]] = 0.0;
    for (row, span) in rows.iter().enumerate() {
        if span.overlaps(&rows[x]) {
            remaining.row_mut(row).fill(0.0);
        }
    }
    for (col, span) in cols.iter().enumerate() {
        if span.overlaps(&cols[y]) {
            remaining.column_mut(col).fill(0.0);
        }
    }

    (remaining, Some((x, y)))
}

/// Binary matrix of span pairs chosen by repeated [`greedy_span_step`].
///
/// Works on a private copy of `sim`.
pub fn span_iter_matrix(sim: ArrayView2<f64>, rows: &[Span], cols: &[Span]) -> Array2<f64> {
    let mut alignment = Array2::zeros(sim.raw_dim());
    let mut remaining = sim.to_owned();
    loop {
        let (next, committed) = greedy_span_step(remaining, rows, cols);
        match committed {
            Some((x, y)) => alignment[[x, y]] = 1.0,
            None => break,
        }
        remaining = next;
    }
    alignment
}

/// Expand matched span cells into word links.
///
/// Every word of the row span is linked to every word of the column span and
/// the cell's similarity is recorded on each link. With `flip`, rows are
/// target spans and columns source words, so each link is emitted as
/// `(column word, row word)`.
pub fn aggregate_span_pairs(
    alignment: ArrayView2<f64>,
    sim: ArrayView2<f64>,
    rows: &[Span],
    cols: &[Span],
    flip: bool,
) -> AlignmentSet {
    let mut set = AlignmentSet::new();
    for (i, j) in matched_cells(alignment) {
        let score = sim[[i, j]];
        for x in rows[i].indices() {
            for y in cols[j].indices() {
                if flip {
                    set.record(y, x, score);
                } else {
                    set.record(x, y, score);
                }
            }
        }
    }
    set
}

/// Word links whose fractional span coverage reaches [`FREQUENCY_THRESHOLD`].
///
/// Each matched span cell spreads its alignment weight evenly across the
/// `|row span| x |column span|` word pairs it covers. Kept links carry the
/// similarities of the span cells that covered them.
pub fn aggregate_span_frequency(
    alignment: ArrayView2<f64>,
    sim: ArrayView2<f64>,
    rows: &[Span],
    cols: &[Span],
) -> AlignmentSet {
    let mut coverage: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    let mut contributions = AlignmentSet::new();

    for (i, j) in matched_cells(alignment) {
        let share = alignment[[i, j]] / (rows[i].len * cols[j].len) as f64;
        for x in rows[i].indices() {
            for y in cols[j].indices() {
                *coverage.entry((x, y)).or_insert(0.0) += share;
                contributions.record(x, y, sim[[i, j]]);
            }
        }
    }

    let mut set = AlignmentSet::new();
    for ((x, y), total) in coverage {
        if total >= FREQUENCY_THRESHOLD - FREQUENCY_TOLERANCE {
            for &score in contributions.scores(x, y) {
                set.record(x, y, score);
            }
        }
    }
    set
}
