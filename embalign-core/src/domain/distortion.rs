//! Positional distortion prior

use ndarray::{Array2, ArrayView2};

/// Penalizes cells far from the diagonal.
///
/// Each cell is scaled by `1 - ratio * (i/(m-1) - j/(n-1))²`, so relative
/// positions that agree keep their full similarity. Returns an unchanged copy
/// when `ratio` is zero or either side has fewer than two units.
pub fn apply_distortion(sim: ArrayView2<f64>, ratio: f64) -> Array2<f64> {
    let (m, n) = sim.dim();
    if m < 2 || n < 2 || ratio == 0.0 {
        return sim.to_owned();
    }

    let mask = distortion_mask(m, n, ratio);
    &sim * &mask
}

fn distortion_mask(m: usize, n: usize, ratio: f64) -> Array2<f64> {
    let row_scale = (m - 1) as f64;
    let col_scale = (n - 1) as f64;
    Array2::from_shape_fn((m, n), |(i, j)| {
        let offset = i as f64 / row_scale - j as f64 / col_scale;
        1.0 - ratio * offset * offset
    })
}
