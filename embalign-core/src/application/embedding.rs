//! Embedding provider boundary
//!
//! The engine never looks inside a language model. It asks a provider to split
//! words into sub-words and to return one vector per sub-word, then checks that
//! the answer has the shape it asked for before any matrix is built.

use ndarray::Array2;
use thiserror::Error;

use crate::domain::span::SubwordMap;

/// Errors raised by an embedding provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider has no embeddings for a sentence
    #[error("No embeddings available for sentence: {sentence:?}")]
    MissingSentence { sentence: String },

    /// A stored embedding record could not be read
    #[error("Malformed embedding record at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// I/O error while loading embeddings
    #[error("I/O operation failed")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Vectors of the wrong width
    #[error("Embedding dimension mismatch: expected {expected}, found {found}")]
    Dimension { expected: usize, found: usize },
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A sentence split into words and sub-words
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenizedSentence {
    /// Whitespace-delimited words
    pub words: Vec<String>,
    /// Sub-word tokens of each word, in order
    pub subwords: Vec<Vec<String>>,
}

impl TokenizedSentence {
    pub fn new(words: Vec<String>, subwords: Vec<Vec<String>>) -> Self {
        Self { words, subwords }
    }

    /// Sentence text with single spaces between words
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Total number of sub-word tokens
    pub fn subword_count(&self) -> usize {
        self.subwords.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Sub-word tokens flattened in sentence order
    pub fn flat_subwords(&self) -> impl Iterator<Item = &str> {
        self.subwords.iter().flatten().map(String::as_str)
    }

    /// Sub-word ownership map
    pub fn subword_map(&self) -> SubwordMap {
        SubwordMap::from_tokens(&self.subwords)
    }

    /// Checks that every word has at least one sub-word
    pub(crate) fn check(&self) -> Result<(), String> {
        if self.subwords.len() != self.words.len() {
            return Err(format!(
                "tokenizer returned {} sub-word lists for {} words",
                self.subwords.len(),
                self.words.len()
            ));
        }
        if let Some(word) = self.subwords.iter().position(Vec::is_empty) {
            return Err(format!(
                "tokenizer produced no sub-words for word {word} ({:?})",
                self.words[word]
            ));
        }
        Ok(())
    }
}

/// Source of contextual sub-word embeddings
///
/// Implementations must be deterministic for a given input and safe to share
/// across threads. Vectors must exclude sentence-boundary marker tokens and
/// line up one-to-one with the flattened sub-word sequence from [`tokenize`].
///
/// [`tokenize`]: EmbeddingProvider::tokenize
pub trait EmbeddingProvider: Send + Sync {
    /// Short identifier for logs and output metadata
    fn name(&self) -> &str;

    /// Splits each word of one sentence into sub-word tokens
    fn tokenize(&self, words: &[String]) -> ProviderResult<Vec<Vec<String>>>;

    /// One `subwords x dim` matrix per sentence of the batch
    fn embed(&self, batch: &[TokenizedSentence]) -> ProviderResult<Vec<Array2<f32>>>;
}

/// Checks a provider's answer against the batch it was given.
///
/// Returns the offending position in the batch and the reason on failure.
pub(crate) fn check_embeddings(
    batch: &[TokenizedSentence],
    vectors: &[Array2<f32>],
) -> Result<(), (usize, String)> {
    if vectors.len() != batch.len() {
        return Err((
            0,
            format!(
                "provider returned {} embedding matrices for {} sentences",
                vectors.len(),
                batch.len()
            ),
        ));
    }

    for (idx, (sentence, matrix)) in batch.iter().zip(vectors).enumerate() {
        let expected = sentence.subword_count();
        if matrix.nrows() != expected {
            return Err((
                idx,
                format!(
                    "expected {expected} sub-word vectors, got {}",
                    matrix.nrows()
                ),
            ));
        }
        if matrix.ncols() == 0 {
            return Err((idx, "embedding vectors have zero dimension".to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence() -> TokenizedSentence {
        TokenizedSentence::new(
            vec!["walking".into(), "home".into()],
            vec![vec!["walk".into(), "##ing".into()], vec!["home".into()]],
        )
    }

    #[test]
    fn test_tokenized_sentence_accessors() {
        let s = sentence();
        assert_eq!(s.text(), "walking home");
        assert_eq!(s.word_count(), 2);
        assert_eq!(s.subword_count(), 3);
        assert_eq!(s.flat_subwords().collect::<Vec<_>>(), vec!["walk", "##ing", "home"]);
        assert_eq!(s.subword_map().owners(), &[0, 0, 1]);
        assert!(s.check().is_ok());
    }

    #[test]
    fn test_check_rejects_bad_tokenization() {
        let mut s = sentence();
        s.subwords[1].clear();
        assert!(s.check().unwrap_err().contains("word 1"));

        s.subwords.pop();
        assert!(s.check().is_err());
    }

    #[test]
    fn test_check_embeddings() {
        let batch = vec![sentence()];

        assert!(check_embeddings(&batch, &[Array2::zeros((3, 4))]).is_ok());

        let (idx, reason) = check_embeddings(&batch, &[Array2::zeros((2, 4))]).unwrap_err();
        assert_eq!(idx, 0);
        assert!(reason.contains("expected 3"));

        assert!(check_embeddings(&batch, &[]).is_err());
        assert!(check_embeddings(&batch, &[Array2::zeros((3, 0))]).is_err());
    }
}
