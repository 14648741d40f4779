//! End-to-end alignment through the engine and the public API

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use embalign_core::application::embedding::{ProviderError, ProviderResult};
use embalign_core::application::{AlignmentEngine, ProcessingError};
use embalign_core::domain::span::span_index;
use embalign_core::{
    Aligner, AlignmentMode, AlignmentSet, ApiError, Config, EmbeddingProvider, EngineConfig,
    Input, MatchingMethod, TokenType, TokenizedSentence,
};
use ndarray::Array2;

/// Provider with hand-written vectors: each word maps to a list of pieces
/// sharing one basis vector
struct TableProvider {
    dim: usize,
    words: HashMap<&'static str, (usize, usize)>,
    drop_last_vector: bool,
}

impl TableProvider {
    /// `entries` are (word, basis axis, piece count)
    fn new(dim: usize, entries: &[(&'static str, usize, usize)]) -> Self {
        Self {
            dim,
            words: entries
                .iter()
                .map(|&(word, axis, pieces)| (word, (axis, pieces)))
                .collect(),
            drop_last_vector: false,
        }
    }

    fn bilingual() -> Self {
        Self::new(
            4,
            &[
                ("the", 0, 1),
                ("le", 0, 1),
                ("black", 1, 1),
                ("noir", 1, 1),
                ("cat", 2, 1),
                ("chat", 2, 2),
                ("sat", 3, 1),
                ("assis", 3, 2),
            ],
        )
    }

    fn lookup(&self, word: &str) -> ProviderResult<(usize, usize)> {
        self.words
            .get(word)
            .copied()
            .ok_or_else(|| ProviderError::MissingSentence {
                sentence: word.to_string(),
            })
    }
}

impl EmbeddingProvider for TableProvider {
    fn name(&self) -> &str {
        "table"
    }

    fn tokenize(&self, words: &[String]) -> ProviderResult<Vec<Vec<String>>> {
        words
            .iter()
            .map(|word| {
                let (_, pieces) = self.lookup(word)?;
                Ok((0..pieces).map(|p| format!("{word}#{p}")).collect())
            })
            .collect()
    }

    fn embed(&self, batch: &[TokenizedSentence]) -> ProviderResult<Vec<Array2<f32>>> {
        batch
            .iter()
            .map(|sentence| {
                let mut rows = Vec::new();
                for (word, pieces) in sentence.words.iter().zip(&sentence.subwords) {
                    let (axis, _) = self.lookup(word)?;
                    for _ in pieces {
                        let mut row = vec![0.0f32; self.dim];
                        row[axis] = 1.0;
                        rows.push(row);
                    }
                }
                if self.drop_last_vector {
                    rows.pop();
                }
                let count = rows.len();
                Ok(Array2::from_shape_vec((count, self.dim), rows.concat())
                    .expect("rows have the provider dimension"))
            })
            .collect()
    }
}

fn aligner(config: Config) -> Aligner {
    Aligner::with_config(config, Arc::new(TableProvider::bilingual())).unwrap()
}

/// Source word to target words
fn targets_by_source(links: &AlignmentSet) -> BTreeMap<usize, BTreeSet<usize>> {
    let mut map: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for (i, j) in links.pairs() {
        map.entry(i).or_default().insert(j);
    }
    map
}

#[test]
fn test_identity_translation_aligns_diagonally() {
    let aligner = aligner(Config::default());

    let aligned = aligner
        .align_sentences(&["the cat sat"], &["le chat assis"])
        .unwrap();

    assert_eq!(aligned, vec!["0-0 1-1 2-2"]);
}

#[test]
fn test_reordering_is_recovered_by_every_method() {
    for method in MatchingMethod::ALL {
        for token_type in TokenType::ALL {
            let config = Config::builder()
                .matching_methods(vec![method])
                .token_type(token_type.key())
                .unwrap()
                .build()
                .unwrap();

            let aligned = aligner(config)
                .align_sentences(&["the black cat"], &["le chat noir"])
                .unwrap();

            assert_eq!(aligned, vec!["0-0 1-2 2-1"], "{method} / {token_type}");
        }
    }
}

#[test]
fn test_all_methods_in_configuration_order() {
    let config = Config::builder().methods("i,a").unwrap().build().unwrap();

    let all = aligner(config)
        .align_sentences_all(&["the cat sat"], &["le chat assis"])
        .unwrap();

    assert_eq!(all.len(), 1);
    assert_eq!(all[0][0].0, MatchingMethod::IterMax);
    assert_eq!(all[0][1].0, MatchingMethod::Intersection);
    for (_, links) in &all[0] {
        assert_eq!(links.to_string(), "0-0 1-1 2-2");
    }
}

#[test]
fn test_bidirectional_spans_on_one_to_one_vectors() {
    let aligned = aligner(Config::default())
        .align_spans_bidirection(&["the black cat sat"], &["le chat noir assis"])
        .unwrap();

    assert_eq!(aligned, vec!["0-0 1-2 2-1 3-3"]);
}

#[test]
fn test_span_iter_commits_non_overlapping_spans() {
    let hashing = Aligner::with_hashing(
        Config::builder()
            .alignment_mode(AlignmentMode::SpanIter)
            .build()
            .unwrap(),
    )
    .unwrap();
    let sources = [
        "the committee approved the annual budget yesterday",
        "a quick brown fox",
    ];
    let targets = [
        "le comité a approuvé hier le budget annuel",
        "un renard brun rapide",
    ];

    let aligned = hashing.align_spans_iter(&sources, &targets).unwrap();

    for links in &aligned {
        let set: AlignmentSet = links.parse().unwrap();
        assert!(!set.is_empty());
        let by_source = targets_by_source(&set);
        for (a, targets_a) in &by_source {
            // Each source word sits in one committed span, linked to one contiguous target span
            let first = *targets_a.iter().next().unwrap();
            let last = *targets_a.iter().next_back().unwrap();
            assert_eq!(targets_a.len(), last - first + 1);
            for (b, targets_b) in &by_source {
                if a != b && !targets_a.is_disjoint(targets_b) {
                    assert_eq!(targets_a, targets_b);
                }
            }
        }
    }
}

#[test]
fn test_span_counts() {
    let (sources, targets) = span_index(&["a b c d e"], &["x y"], 3);

    // Five single words, four bigrams, three trigrams
    assert_eq!(sources[0].len(), 12);
    assert_eq!(targets[0].len(), 3);
}

#[test]
fn test_span_modes_link_only_existing_words() {
    let aligner = Aligner::with_hashing(Config::default()).unwrap();
    let sources = ["she reads old books", "rain"];
    let targets = ["elle lit de vieux livres", "pluie"];

    for mode in AlignmentMode::ALL {
        let aligned = aligner.align_in_mode(&sources, &targets, mode).unwrap();
        for ((links, src), tgt) in aligned.iter().zip(&sources).zip(&targets) {
            let set: AlignmentSet = links.parse().unwrap();
            let (m, n) = (src.split_whitespace().count(), tgt.split_whitespace().count());
            assert!(set.pairs().all(|(i, j)| i < m && j < n), "{mode}: {links}");
        }
    }
}

#[test]
fn test_empty_sentences_yield_empty_links() {
    let aligner = aligner(Config::default());

    for mode in AlignmentMode::ALL {
        let aligned = aligner
            .align_in_mode(&["", "the cat", "   "], &["le", "", "chat"], mode)
            .unwrap();
        assert_eq!(aligned, vec!["", "", ""], "{mode}");
    }
}

#[test]
fn test_length_mismatch() {
    let err = aligner(Config::default())
        .align_sentences(&["the cat", "sat"], &["le chat"])
        .unwrap_err();

    assert!(matches!(
        err,
        ApiError::Processing(ProcessingError::LengthMismatch {
            sources: 2,
            targets: 1
        })
    ));
}

#[test]
fn test_provider_vector_count_mismatch() {
    let mut provider = TableProvider::bilingual();
    provider.drop_last_vector = true;
    let engine = AlignmentEngine::with_config(Arc::new(provider), EngineConfig::default()).unwrap();

    let err = engine
        .align_sentences(&["the cat"], &["le chat"])
        .unwrap_err();

    match err {
        ProcessingError::Embedding { pair, reason } => {
            assert_eq!(pair, 0);
            assert!(reason.contains("sub-word vectors"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_word_is_a_provider_error() {
    let err = aligner(Config::default())
        .align(Input::from_pairs([("the dog", "le chien")]))
        .unwrap_err();

    assert!(matches!(
        err,
        ApiError::Processing(ProcessingError::Provider(_))
    ));
}

#[test]
fn test_thread_count_does_not_change_results() {
    let sources = ["the cat sat", "the black cat", "sat the cat black"];
    let targets = ["le chat assis", "le chat noir", "assis le noir chat"];

    let single = aligner(Config::builder().threads(Some(1)).build().unwrap());
    let many = aligner(
        Config::builder()
            .threads(Some(4))
            .batch_size(2)
            .build()
            .unwrap(),
    );

    for mode in AlignmentMode::ALL {
        assert_eq!(
            single.align_in_mode(&sources, &targets, mode).unwrap(),
            many.align_in_mode(&sources, &targets, mode).unwrap(),
            "{mode}"
        );
    }
}
