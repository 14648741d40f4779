//! Iterative mutual-best matching
//!
//! Round one votes with forward and backward argmax (`0.5` each). Every later
//! round masks out rows and columns that already carry a full vote, re-runs
//! both argmaxes on the damped remainder and keeps cells that win in both
//! directions. Earlier votes are never revoked.

use ndarray::{Array2, ArrayView2, Axis};

use super::argmax::{backward, forward, forward_backward_average};

/// Default total number of rounds, including the first.
pub const DEFAULT_MAX_ROUNDS: usize = 2;

/// Damping applied to rows/columns that are only partly reserved.
pub const DEFAULT_ALPHA: f64 = 0.9;

/// Iterative mutual-max matcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterMax {
    /// Total rounds including the first one
    pub max_rounds: usize,
    /// Damping factor for partially reserved rows/columns
    pub alpha: f64,
}

impl Default for IterMax {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            alpha: DEFAULT_ALPHA,
        }
    }
}

/// Accumulated matrix plus the matched-cell count after each completed round.
#[derive(Debug, Clone)]
pub struct IterMaxTrace {
    /// Final accumulated alignment weights
    pub matrix: Array2<f64>,
    /// Number of non-zero cells after each round, first round included
    pub matched_cells: Vec<usize>,
}

impl IterMax {
    /// Create a matcher with a round budget
    pub fn new(max_rounds: usize) -> Self {
        Self {
            max_rounds,
            ..Default::default()
        }
    }

    /// Run the matcher and return the accumulated alignment weights
    pub fn align(&self, sim: ArrayView2<f64>) -> Array2<f64> {
        self.align_traced(sim).matrix
    }

    /// Run the matcher, recording how the matched set grows per round
    pub fn align_traced(&self, sim: ArrayView2<f64>) -> IterMaxTrace {
        let (m, n) = sim.dim();
        let mut inter = forward_backward_average(sim);
        let mut matched_cells = vec![count_matched(&inter)];

        if m.min(n) <= 2 {
            return IterMaxTrace {
                matrix: inter,
                matched_cells,
            };
        }

        let mut round = 1;
        while round < self.max_rounds {
            let new_inter = self.next_round(sim, &inter);
            if new_inter.iter().all(|&v| v == 0.0) {
                break;
            }
            inter = inter + new_inter;
            matched_cells.push(count_matched(&inter));
            round += 1;
        }

        IterMaxTrace {
            matrix: inter,
            matched_cells,
        }
    }

    /// Mutual-best cells among rows and columns not yet fully reserved.
    fn next_round(&self, sim: ArrayView2<f64>, inter: &Array2<f64>) -> Array2<f64> {
        let (m, n) = sim.dim();
        let row_free = inter
            .sum_axis(Axis(1))
            .mapv(|s| 1.0 - s.clamp(0.0, 1.0));
        let col_free = inter
            .sum_axis(Axis(0))
            .mapv(|s| 1.0 - s.clamp(0.0, 1.0));

        // Each sum counts every cell of its broadcast mask
        let exhausted = row_free.sum() * (n as f64) < 1.0 || col_free.sum() * (m as f64) < 1.0;
        if exhausted {
            return Array2::zeros((m, n));
        }

        let mask = Array2::from_shape_fn((m, n), |(i, j)| {
            (self.alpha * row_free[i] + self.alpha * col_free[j]).clamp(0.0, 1.0)
        });
        let open = Array2::from_shape_fn((m, n), |(i, j)| {
            1.0 - (1.0 - row_free[i]) * (1.0 - col_free[j])
        });

        let damped = &sim * &mask;
        let fwd = forward(damped.view()) * &open;
        let bwd = backward(damped.view()) * &open;
        fwd * bwd
    }
}

fn count_matched(matrix: &Array2<f64>) -> usize {
    matrix.iter().filter(|&&v| v > 0.0).count()
}
