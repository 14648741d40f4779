//! Embeddings loaded from a JSON Lines file
//!
//! Each line holds one sentence produced offline by a real encoder:
//!
//! ```json
//! {"sentence": "the cat", "subwords": [["the"], ["c", "##at"]], "vectors": [[0.1, 0.2], [0.3, 0.1], [0.0, 0.9]]}
//! ```
//!
//! Records are keyed by the sentence text with whitespace normalized.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::application::embedding::{
    EmbeddingProvider, ProviderError, ProviderResult, TokenizedSentence,
};

/// One stored sentence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub sentence: String,
    pub subwords: Vec<Vec<String>>,
    pub vectors: Vec<Vec<f32>>,
}

#[derive(Debug, Clone)]
struct StoredSentence {
    subwords: Vec<Vec<String>>,
    vectors: Array2<f32>,
}

/// Provider answering from a table of precomputed sentence embeddings
#[derive(Debug, Clone, Default)]
pub struct PrecomputedProvider {
    sentences: HashMap<String, StoredSentence>,
    dim: Option<usize>,
}

fn normalize_key(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl PrecomputedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load records from a JSON Lines file
    pub fn from_path(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load records from any buffered reader; blank lines are skipped
    pub fn from_reader(reader: impl BufRead) -> ProviderResult<Self> {
        let mut provider = Self::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: EmbeddingRecord =
                serde_json::from_str(&line).map_err(|e| ProviderError::Parse {
                    line: idx + 1,
                    reason: e.to_string(),
                })?;
            provider.insert_at(record, idx + 1)?;
        }
        log::debug!(
            "loaded {} precomputed sentences (dim {:?})",
            provider.len(),
            provider.dim
        );
        Ok(provider)
    }

    /// Add one record; a later record for the same sentence replaces the earlier one
    pub fn insert(&mut self, record: EmbeddingRecord) -> ProviderResult<()> {
        self.insert_at(record, 0)
    }

    fn insert_at(&mut self, record: EmbeddingRecord, line: usize) -> ProviderResult<()> {
        let parse_error = |reason: String| ProviderError::Parse { line, reason };

        let words = record.sentence.split_whitespace().count();
        if record.subwords.len() != words {
            return Err(parse_error(format!(
                "{} sub-word lists for {} words",
                record.subwords.len(),
                words
            )));
        }

        let rows = record.vectors.len();
        let expected_rows: usize = record.subwords.iter().map(Vec::len).sum();
        if rows != expected_rows {
            return Err(parse_error(format!(
                "{rows} vectors for {expected_rows} sub-words"
            )));
        }

        // An empty sentence says nothing about the width
        let expected_dim = match (self.dim, record.vectors.first()) {
            (Some(dim), _) => dim,
            (None, Some(first)) => *self.dim.insert(first.len()),
            (None, None) => 0,
        };
        if let Some(bad) = record.vectors.iter().find(|v| v.len() != expected_dim) {
            return Err(ProviderError::Dimension {
                expected: expected_dim,
                found: bad.len(),
            });
        }

        let flat: Vec<f32> = record.vectors.into_iter().flatten().collect();
        let vectors = Array2::from_shape_vec((rows, expected_dim), flat)
            .map_err(|e| parse_error(e.to_string()))?;

        self.sentences.insert(
            normalize_key(&record.sentence),
            StoredSentence {
                subwords: record.subwords,
                vectors,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Vector width shared by all records, once one is loaded
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    fn lookup(&self, text: &str) -> ProviderResult<&StoredSentence> {
        self.sentences
            .get(&normalize_key(text))
            .ok_or_else(|| ProviderError::MissingSentence {
                sentence: text.to_string(),
            })
    }
}

impl EmbeddingProvider for PrecomputedProvider {
    fn name(&self) -> &str {
        "precomputed"
    }

    fn tokenize(&self, words: &[String]) -> ProviderResult<Vec<Vec<String>>> {
        Ok(self.lookup(&words.join(" "))?.subwords.clone())
    }

    fn embed(&self, batch: &[TokenizedSentence]) -> ProviderResult<Vec<Array2<f32>>> {
        batch
            .iter()
            .map(|sentence| Ok(self.lookup(&sentence.text())?.vectors.clone()))
            .collect()
    }
}
