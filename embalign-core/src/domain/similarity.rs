//! Similarity computation between two sets of vectors

use ndarray::{Array2, ArrayView2, Axis};

/// Range below which a min-max rescale is treated as collapsed.
const DEGENERATE_RANGE: f64 = 1e-12;

/// Returns a copy of `vectors` with every row scaled to unit L2 norm.
///
/// Rows with zero norm are left as they are, so their cosine with anything is 0.
pub fn l2_normalize_rows(vectors: ArrayView2<f64>) -> Array2<f64> {
    let mut out = vectors.to_owned();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row /= norm;
        }
    }
    out
}

/// Raw cosine similarity between every row of `x` and every row of `y`.
///
/// # Panics
///
/// Panics if `x` and `y` do not share the same vector dimension. The
/// application layer checks dimensions before any matrix is built.
pub fn cosine(x: ArrayView2<f64>, y: ArrayView2<f64>) -> Array2<f64> {
    let x = l2_normalize_rows(x);
    let y = l2_normalize_rows(y);
    x.dot(&y.t())
}

/// Cosine similarity mapped from `[-1, 1]` onto `[0, 1]`.
pub fn similarity(x: ArrayView2<f64>, y: ArrayView2<f64>) -> Array2<f64> {
    cosine(x, y).mapv_into(|c| (c + 1.0) / 2.0)
}

/// Cosine similarity min-max rescaled across the whole matrix.
///
/// When every cell holds the same value there is no range to rescale over and
/// an all-zero matrix is returned instead of non-finite values.
pub fn similarity_normalized(x: ArrayView2<f64>, y: ArrayView2<f64>) -> Array2<f64> {
    let raw = cosine(x, y);
    if raw.is_empty() {
        return raw;
    }

    let (min, max) = raw
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;

    if !range.is_finite() || range <= DEGENERATE_RANGE {
        log::debug!(
            "similarity range collapsed ({}x{}, value {:.6}); returning zero matrix",
            raw.nrows(),
            raw.ncols(),
            min
        );
        return Array2::zeros(raw.raw_dim());
    }

    raw.mapv_into(|v| (v - min) / range)
}
