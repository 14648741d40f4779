//! One-hot argmax matchers and their intersection

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// Index of the largest value, earliest index on ties.
pub(crate) fn argmax(values: ArrayView1<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &value) in values.iter().enumerate() {
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// One `1` per row, at the row's maximum.
pub fn forward(sim: ArrayView2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros(sim.raw_dim());
    for (i, row) in sim.axis_iter(Axis(0)).enumerate() {
        if let Some(j) = argmax(row) {
            out[[i, j]] = 1.0;
        }
    }
    out
}

/// One `1` per column, at the column's maximum.
pub fn backward(sim: ArrayView2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros(sim.raw_dim());
    for (j, column) in sim.axis_iter(Axis(1)).enumerate() {
        if let Some(i) = argmax(column) {
            out[[i, j]] = 1.0;
        }
    }
    out
}

/// Cells that are the maximum of both their row and their column.
pub fn intersection(sim: ArrayView2<f64>) -> Array2<f64> {
    forward(sim) * backward(sim)
}

/// Forward and backward votes averaged: 1.0 for mutual best, 0.5 for one-sided.
pub fn forward_backward_average(sim: ArrayView2<f64>) -> Array2<f64> {
    forward(sim) * 0.5 + backward(sim) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn test_ties_resolve_to_first_index() {
        let sim = array![[0.5, 0.5, 0.1], [0.2, 0.2, 0.2]];

        let fwd = forward(sim.view());
        assert_eq!(fwd, array![[1.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);

        let bwd = backward(sim.view());
        assert_eq!(bwd, array![[1.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
    }

    #[test]
    fn test_intersection_keeps_mutual_best_only() {
        let sim = array![[0.9, 0.1, 0.2], [0.8, 0.3, 0.1], [0.1, 0.7, 0.6]];

        let inter = intersection(sim.view());

        // Row 1 prefers column 0, which prefers row 0
        assert_eq!(
            inter,
            array![[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
        );
    }

    #[test]
    fn test_average_marks_one_sided_votes_with_half() {
        let sim = array![[0.9, 0.1], [0.8, 0.3]];

        let avg = forward_backward_average(sim.view());

        assert_eq!(avg[[0, 0]], 1.0);
        assert_eq!(avg[[1, 0]], 0.5);
        assert_eq!(avg[[1, 1]], 0.5);
        assert_eq!(avg[[0, 1]], 0.0);
    }

    #[test]
    fn test_empty_matrix() {
        let sim = Array2::<f64>::zeros((0, 4));
        assert_eq!(forward(sim.view()).dim(), (0, 4));
        assert_eq!(backward(sim.view()).sum(), 0.0);
    }

    fn matrix_strategy() -> impl Strategy<Value = Array2<f64>> {
        (1usize..7, 1usize..7).prop_flat_map(|(m, n)| {
            proptest::collection::vec(0.0f64..1.0, m * n)
                .prop_map(move |v| Array2::from_shape_vec((m, n), v).unwrap())
        })
    }

    proptest! {
        #[test]
        fn prop_forward_one_hot_per_row(sim in matrix_strategy()) {
            let fwd = forward(sim.view());
            for row in fwd.axis_iter(Axis(0)) {
                prop_assert_eq!(row.sum(), 1.0);
            }
        }

        #[test]
        fn prop_backward_one_hot_per_column(sim in matrix_strategy()) {
            let bwd = backward(sim.view());
            for column in bwd.axis_iter(Axis(1)) {
                prop_assert_eq!(column.sum(), 1.0);
            }
        }

        #[test]
        fn prop_intersection_is_subset_of_both(sim in matrix_strategy()) {
            let fwd = forward(sim.view());
            let bwd = backward(sim.view());
            let inter = intersection(sim.view());
            for ((&a, &f), &b) in inter.iter().zip(fwd.iter()).zip(bwd.iter()) {
                if a == 1.0 {
                    prop_assert_eq!(f, 1.0);
                    prop_assert_eq!(b, 1.0);
                }
            }
        }
    }
}
