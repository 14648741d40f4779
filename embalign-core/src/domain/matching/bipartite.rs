//! Maximum-weight bipartite matching
//!
//! The matching capability is a trait so callers can swap in another solver;
//! [`HungarianMatching`] is the reference implementation used by
//! [`MatchingMethod::MaxWeight`](super::MatchingMethod::MaxWeight).

use ndarray::{Array2, ArrayView2};

/// Solver for maximum-weight matchings on a complete bipartite graph.
///
/// Rows are one side of the graph, columns the other, and `weights[[i, j]]`
/// is the weight of edge `(i, j)`. A zero weight means there is no edge.
/// Among matchings of maximum cardinality, the one with the largest total
/// weight is returned. Each row and each column appears at most once.
pub trait WeightedMatching: Send + Sync {
    /// Returns matched `(row, column)` pairs sorted by row.
    fn match_pairs(&self, weights: ArrayView2<f64>) -> Vec<(usize, usize)>;

    /// Returns the matching as a binary matrix of the same shape as `weights`.
    fn match_matrix(&self, weights: ArrayView2<f64>) -> Array2<f64> {
        let mut out = Array2::zeros(weights.raw_dim());
        for (i, j) in self.match_pairs(weights) {
            out[[i, j]] = 1.0;
        }
        out
    }
}

/// Kuhn-Munkres assignment with dual potentials, `O(k² · K)` for a `k × K` graph.
///
/// Missing edges are priced above the total weight of all real edges, so the
/// solver only routes an assignment through one when no larger matching
/// exists; such assignments are dropped from the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct HungarianMatching;

impl HungarianMatching {
    /// Create the solver
    pub fn new() -> Self {
        Self
    }
}

fn is_edge(weight: f64) -> bool {
    weight != 0.0 && weight.is_finite()
}

impl WeightedMatching for HungarianMatching {
    fn match_pairs(&self, weights: ArrayView2<f64>) -> Vec<(usize, usize)> {
        let (m, n) = weights.dim();
        if m == 0 || n == 0 {
            return Vec::new();
        }

        // The solver wants rows <= columns
        let transposed = m > n;
        let view = if transposed { weights.reversed_axes() } else { weights };

        let missing_edge_cost = 1.0 + view
            .iter()
            .filter(|w| is_edge(**w))
            .map(|w| w.abs())
            .sum::<f64>();
        let cost = view.mapv(|w| if is_edge(w) { -w } else { missing_edge_cost });

        let assignment = solve_assignment(&cost);

        let mut pairs: Vec<(usize, usize)> = assignment
            .into_iter()
            .enumerate()
            .filter(|&(row, col)| is_edge(view[[row, col]]))
            .map(|(row, col)| if transposed { (col, row) } else { (row, col) })
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

/// Minimum-cost assignment of every row to a distinct column.
///
/// Requires `rows <= cols`. Returns the column chosen for each row.
fn solve_assignment(cost: &Array2<f64>) -> Vec<usize> {
    let (rows, cols) = cost.dim();
    debug_assert!(rows <= cols);

    // 1-based bookkeeping; index 0 is the virtual root
    let mut u = vec![0.0f64; rows + 1];
    let mut v = vec![0.0f64; cols + 1];
    let mut owner = vec![0usize; cols + 1];
    let mut way = vec![0usize; cols + 1];

    for row in 1..=rows {
        owner[0] = row;
        let mut col0 = 0usize;
        let mut min_slack = vec![f64::INFINITY; cols + 1];
        let mut used = vec![false; cols + 1];

        loop {
            used[col0] = true;
            let row0 = owner[col0];
            let mut delta = f64::INFINITY;
            let mut col1 = 0usize;

            for col in 1..=cols {
                if used[col] {
                    continue;
                }
                let slack = cost[[row0 - 1, col - 1]] - u[row0] - v[col];
                if slack < min_slack[col] {
                    min_slack[col] = slack;
                    way[col] = col0;
                }
                if min_slack[col] < delta {
                    delta = min_slack[col];
                    col1 = col;
                }
            }

            for col in 0..=cols {
                if used[col] {
                    u[owner[col]] += delta;
                    v[col] -= delta;
                } else {
                    min_slack[col] -= delta;
                }
            }

            col0 = col1;
            if owner[col0] == 0 {
                break;
            }
        }

        // Augment along the alternating path
        loop {
            let prev = way[col0];
            owner[col0] = owner[prev];
            col0 = prev;
            if col0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; rows];
    for col in 1..=cols {
        if owner[col] != 0 {
            assignment[owner[col] - 1] = col - 1;
        }
    }
    assignment
}
