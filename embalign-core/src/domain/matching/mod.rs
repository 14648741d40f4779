//! Matching strategies over a similarity matrix
//!
//! Strategies form a closed set, [`MatchingMethod`], so an unknown key is
//! rejected when the configuration is parsed instead of when the first
//! matrix reaches the dispatcher.

pub mod argmax;
pub mod bipartite;
pub mod itermax;

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

pub use argmax::{backward, forward, forward_backward_average, intersection};
pub use bipartite::{HungarianMatching, WeightedMatching};
pub use itermax::{IterMax, IterMaxTrace};

/// Matching strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchingMethod {
    /// Row-wise argmax: every source unit picks its best target
    Forward,
    /// Column-wise argmax: every target unit picks its best source
    Backward,
    /// Cells that win both forward and backward
    Intersection,
    /// Maximum-weight bipartite matching
    MaxWeight,
    /// Iterative mutual-max over progressively reserved rows and columns
    IterMax,
}

/// Error returned when a matching-method key is not recognized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown matching method '{}' (expected one of: fwd, rev, inter, mwmf, itermax)",
            self.0
        )
    }
}

impl std::error::Error for UnknownMethod {}

impl MatchingMethod {
    /// Every method, in dispatch-table order
    pub const ALL: [MatchingMethod; 5] = [
        MatchingMethod::Forward,
        MatchingMethod::Backward,
        MatchingMethod::Intersection,
        MatchingMethod::MaxWeight,
        MatchingMethod::IterMax,
    ];

    /// Canonical key
    pub fn key(&self) -> &'static str {
        match self {
            MatchingMethod::Forward => "fwd",
            MatchingMethod::Backward => "rev",
            MatchingMethod::Intersection => "inter",
            MatchingMethod::MaxWeight => "mwmf",
            MatchingMethod::IterMax => "itermax",
        }
    }

    /// Single-letter code used in compact method strings such as `"mai"`
    pub fn code(&self) -> char {
        match self {
            MatchingMethod::Forward => 'f',
            MatchingMethod::Backward => 'r',
            MatchingMethod::Intersection => 'a',
            MatchingMethod::MaxWeight => 'm',
            MatchingMethod::IterMax => 'i',
        }
    }

    /// One-line description for listings
    pub fn description(&self) -> &'static str {
        match self {
            MatchingMethod::Forward => "each source unit aligns to its most similar target",
            MatchingMethod::Backward => "each target unit aligns to its most similar source",
            MatchingMethod::Intersection => "mutual best matches only (highest precision)",
            MatchingMethod::MaxWeight => "maximum-weight bipartite matching",
            MatchingMethod::IterMax => "iterative mutual-max (recovers extra links)",
        }
    }

    /// Look up a method by its single-letter code
    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.code() == code.to_ascii_lowercase())
    }

    /// Parse a method list.
    ///
    /// Accepts comma- or whitespace-separated keys (`"inter, itermax"`) or a
    /// compact code string (`"mai"`). Duplicates are dropped, first occurrence
    /// keeps its position.
    pub fn parse_list(input: &str) -> Result<Vec<Self>, UnknownMethod> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(UnknownMethod(input.to_string()));
        }

        let tokens: Vec<&str> = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();

        let mut methods = Vec::new();
        let mut push = |method: MatchingMethod| {
            if !methods.contains(&method) {
                methods.push(method);
            }
        };

        for token in tokens {
            match token.parse::<MatchingMethod>() {
                Ok(method) => push(method),
                Err(err) => {
                    // A run of codes like "mai"
                    let codes: Option<Vec<_>> = token.chars().map(Self::from_code).collect();
                    match codes {
                        Some(codes) if token.chars().count() > 1 => codes.into_iter().for_each(&mut push),
                        _ => return Err(err),
                    }
                }
            }
        }

        Ok(methods)
    }

    /// Run this strategy with the default solvers.
    pub fn apply(&self, sim: ArrayView2<f64>) -> Array2<f64> {
        self.apply_with(sim, &HungarianMatching, &IterMax::default())
    }

    /// Run this strategy with an explicit weighted-matching solver and itermax settings.
    ///
    /// The solver is only consulted for [`MatchingMethod::MaxWeight`].
    pub fn apply_with(
        &self,
        sim: ArrayView2<f64>,
        solver: &dyn WeightedMatching,
        iter_max: &IterMax,
    ) -> Array2<f64> {
        match self {
            MatchingMethod::Forward => forward(sim),
            MatchingMethod::Backward => backward(sim),
            MatchingMethod::Intersection => intersection(sim),
            MatchingMethod::MaxWeight => solver.match_matrix(sim),
            MatchingMethod::IterMax => iter_max.align(sim),
        }
    }
}

impl FromStr for MatchingMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "f" | "fwd" | "forward" => Ok(MatchingMethod::Forward),
            "r" | "rev" | "reverse" | "backward" => Ok(MatchingMethod::Backward),
            "a" | "inter" | "intersection" => Ok(MatchingMethod::Intersection),
            "m" | "mwmf" | "max-weight" | "max-weight-match" => Ok(MatchingMethod::MaxWeight),
            "i" | "itermax" | "iterative-max" => Ok(MatchingMethod::IterMax),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for MatchingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
