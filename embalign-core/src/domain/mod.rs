//! Domain layer: the alignment-matching kernel
//!
//! Everything in this module is a pure function of its inputs. Matrices are
//! created per sentence pair, consumed and dropped; nothing here retains state
//! between calls, which is what lets the application layer fan sentence pairs
//! out across threads freely.
//!
//! Data flows downward:
//! - [`similarity`] and [`span`] are leaves
//! - [`distortion`] and [`null_align`] reshape a similarity matrix
//! - [`matching`] turns a similarity matrix into an alignment matrix
//! - [`aggregate`] turns an alignment matrix into sorted index links

pub mod aggregate;
pub mod distortion;
pub mod matching;
pub mod null_align;
pub mod similarity;
pub mod span;

use ndarray::Array2;

/// Pairwise affinity between source units (rows) and target units (columns).
pub type SimilarityMatrix = Array2<f64>;

/// Binary or accumulated-weight alignment over the same shape as a similarity matrix.
pub type AlignmentMatrix = Array2<f64>;

pub use aggregate::{AlignmentLink, AlignmentSet};
pub use distortion::apply_distortion;
pub use matching::{MatchingMethod, WeightedMatching};
pub use null_align::{gather_null_aligns, percentile_null_mask};
pub use similarity::{similarity, similarity_normalized};
pub use span::{Span, SubwordMap};
