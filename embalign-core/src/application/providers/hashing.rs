//! Deterministic character n-gram embeddings
//!
//! No model, no vocabulary: words are cut into short pieces and each piece is
//! embedded by hashing its character n-grams into a fixed number of signed
//! buckets. Identical and near-identical spellings land close together, which
//! is enough for demos, cognate-heavy language pairs, and tests.

use ndarray::Array2;

use crate::application::embedding::{
    EmbeddingProvider, ProviderError, ProviderResult, TokenizedSentence,
};

/// Default vector width
pub const DEFAULT_DIM: usize = 256;

/// Default maximum characters per sub-word piece
pub const DEFAULT_PIECE_LEN: usize = 4;

/// Weight of the whole-word component mixed into every piece
const WORD_WEIGHT: f32 = 0.5;

/// Prefix marking a piece that continues a word
const CONTINUATION: &str = "##";

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Embedding provider built on feature hashing
#[derive(Debug, Clone)]
pub struct HashingProvider {
    dim: usize,
    piece_len: usize,
}

impl Default for HashingProvider {
    fn default() -> Self {
        Self {
            dim: DEFAULT_DIM,
            piece_len: DEFAULT_PIECE_LEN,
        }
    }
}

impl HashingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider with a custom vector width
    pub fn with_dim(dim: usize) -> ProviderResult<Self> {
        if dim == 0 {
            return Err(ProviderError::Dimension {
                expected: 1,
                found: 0,
            });
        }
        Ok(Self {
            dim,
            ..Default::default()
        })
    }

    /// Sets the maximum characters per piece (at least one)
    pub fn piece_len(mut self, chars: usize) -> Self {
        self.piece_len = chars.max(1);
        self
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn split_word(&self, word: &str) -> Vec<String> {
        let chars: Vec<char> = word.to_lowercase().chars().collect();
        if chars.is_empty() {
            return vec![String::new()];
        }
        chars
            .chunks(self.piece_len)
            .enumerate()
            .map(|(idx, chunk)| {
                let piece: String = chunk.iter().collect();
                if idx == 0 {
                    piece
                } else {
                    format!("{CONTINUATION}{piece}")
                }
            })
            .collect()
    }

    /// Adds the signed n-gram features of `text` into `out`
    fn add_ngrams(&self, text: &str, weight: f32, out: &mut [f32]) {
        let padded: Vec<char> = std::iter::once('<')
            .chain(text.chars())
            .chain(std::iter::once('>'))
            .collect();

        for n in 1..=3 {
            for window in padded.windows(n) {
                let gram: String = window.iter().collect();
                let hash = fnv1a(gram.as_bytes()) ^ (n as u64);
                let bucket = (hash % self.dim as u64) as usize;
                let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
                out[bucket] += sign * weight;
            }
        }
    }

    fn embed_piece(&self, piece: &str, word: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        self.add_ngrams(piece.trim_start_matches(CONTINUATION), 1.0, &mut vector);
        self.add_ngrams(&word.to_lowercase(), WORD_WEIGHT, &mut vector);

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

impl EmbeddingProvider for HashingProvider {
    fn name(&self) -> &str {
        "hashing"
    }

    fn tokenize(&self, words: &[String]) -> ProviderResult<Vec<Vec<String>>> {
        Ok(words.iter().map(|word| self.split_word(word)).collect())
    }

    fn embed(&self, batch: &[TokenizedSentence]) -> ProviderResult<Vec<Array2<f32>>> {
        batch
            .iter()
            .map(|sentence| {
                let mut flat = Vec::with_capacity(sentence.subword_count() * self.dim);
                for (word, pieces) in sentence.words.iter().zip(&sentence.subwords) {
                    for piece in pieces {
                        flat.extend(self.embed_piece(piece, word));
                    }
                }
                let rows = flat.len() / self.dim;
                Array2::from_shape_vec((rows, self.dim), flat).map_err(|e| {
                    ProviderError::Parse {
                        line: 0,
                        reason: e.to_string(),
                    }
                })
            })
            .collect()
    }
}
