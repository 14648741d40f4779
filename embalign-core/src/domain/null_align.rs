//! Entropy-based null-alignment detection
//!
//! A row (or column) whose similarity mass is spread evenly has high
//! normalized entropy: the unit is about equally close to everything, which
//! usually means it has no real counterpart.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// Normalized Shannon entropy of one L1-normalized distribution.
///
/// Returns 0 for an all-zero distribution or a single outcome.
fn normalized_entropy(values: ArrayView1<f64>) -> f64 {
    let outcomes = values.len();
    let mass: f64 = values.iter().map(|v| v.abs()).sum();
    if outcomes < 2 || mass <= 0.0 {
        return 0.0;
    }

    let entropy: f64 = values
        .iter()
        .map(|v| v.abs() / mass)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.ln())
        .sum();

    (entropy / (outcomes as f64).ln()).clamp(0.0, 1.0)
}

/// Per-row and per-column normalized entropies of a similarity matrix.
pub fn axis_entropies(sim: ArrayView2<f64>) -> (Vec<f64>, Vec<f64>) {
    let rows = sim.axis_iter(Axis(0)).map(normalized_entropy).collect();
    let cols = sim.axis_iter(Axis(1)).map(normalized_entropy).collect();
    (rows, cols)
}

fn too_small(sim: &ArrayView2<f64>) -> bool {
    let (m, n) = sim.dim();
    m.min(n) <= 2
}

/// Entropy scores of matched cells, for calibrating a null threshold.
///
/// For every cell with `alignment[[i, j]] > 0`, yields
/// `alignment[[i, j]] * min(row_entropy[i], col_entropy[j])`, so half votes
/// from an itermax matrix count half. Zero scores are skipped and values come
/// out in row-major order. Empty when either side has two units or fewer.
pub fn gather_null_aligns(sim: ArrayView2<f64>, alignment: ArrayView2<f64>) -> Vec<f64> {
    if too_small(&sim) {
        return Vec::new();
    }

    let (row_entropy, col_entropy) = axis_entropies(sim);
    alignment
        .indexed_iter()
        .filter(|(_, &weight)| weight > 0.0)
        .map(|((i, j), &weight)| weight * row_entropy[i].min(col_entropy[j]))
        .filter(|&score| score > 0.0)
        .collect()
}

/// Mask that zeroes cells whose row or column is too ambiguous.
///
/// A cell is suppressed when `min(row_entropy[i], col_entropy[j]) > ratio`.
/// All ones when either side has two units or fewer.
pub fn percentile_null_mask(sim: ArrayView2<f64>, ratio: f64) -> Array2<f64> {
    if too_small(&sim) {
        return Array2::ones(sim.raw_dim());
    }

    let (row_entropy, col_entropy) = axis_entropies(sim);
    Array2::from_shape_fn(sim.raw_dim(), |(i, j)| {
        if row_entropy[i].min(col_entropy[j]) > ratio {
            0.0
        } else {
            1.0
        }
    })
}
