//! Assembly of the dual inequality constraints `A a >= b`.
//!
//! The system has one lower-bound row per pair followed by two budget rows
//! per judgment:
//!
//! ```text
//!   a_i >= 0                          (rows 0..N, one per pair)
//!   sum_{i in J_j} a_i >= 0           (row N + 2j)
//!  -sum_{i in J_j} a_i >= -C          (row N + 2j + 1)
//! ```
//!
//! where `J_j` are the pairs of judgment `j`. For a precise judgment the
//! budget rows reduce to the plain upper box bound on its single weight.
//! For a group judgment the pairs share one `[0, C]` budget instead of
//! being bounded independently, and a pair stated by several judgments
//! appears in each of their budget rows.

use ndarray::{Array1, Array2};

use crate::error::InvalidInput;
use crate::model::PreferencePair;

/// Inequality constraints of the dual problem, row-oriented (`A a >= b`).
#[derive(Debug, Clone)]
pub struct ConstraintMatrix {
    values: Array2<f64>,
    constraints: Array1<f64>,
    n_pairs: usize,
    n_judgments: usize,
}

impl ConstraintMatrix {
    /// Build the (N + 2J) x N constraint system for `n_judgments` judgments
    /// over the canonical pair list.
    pub fn new(
        pairs: &[PreferencePair],
        n_judgments: usize,
        penalty: f64,
    ) -> Result<Self, InvalidInput> {
        if pairs.is_empty() || n_judgments == 0 {
            return Err(InvalidInput::EmptyTrainingSet);
        }
        if !(penalty > 0.0) {
            return Err(InvalidInput::NonPositivePenalty(penalty));
        }

        let n = pairs.len();
        let mut values = Array2::zeros((n + 2 * n_judgments, n));
        let mut constraints = Array1::zeros(n + 2 * n_judgments);

        for i in 0..n {
            values[[i, i]] = 1.0;
        }
        for (index, pair) in pairs.iter().enumerate() {
            for &j in &pair.judgment_indices {
                values[[n + 2 * j, index]] = 1.0;
                values[[n + 2 * j + 1, index]] = -1.0;
            }
        }
        for j in 0..n_judgments {
            constraints[n + 2 * j] = 0.0;
            constraints[n + 2 * j + 1] = -penalty;
        }

        Ok(Self {
            values,
            constraints,
            n_pairs: n,
            n_judgments,
        })
    }

    /// The constraint rows `A` ((N + 2J) x N).
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// The right-hand side `b` (N + 2J).
    pub fn constraints(&self) -> &Array1<f64> {
        &self.constraints
    }

    pub fn n_pairs(&self) -> usize {
        self.n_pairs
    }

    pub fn n_judgments(&self) -> usize {
        self.n_judgments
    }

    /// Consume the matrix into its `(A, b)` parts.
    pub fn into_parts(self) -> (Array2<f64>, Array1<f64>) {
        (self.values, self.constraints)
    }

    /// The per-pair lower-bound rows (and right-hand sides).
    pub fn bound_rows(&self) -> (Array2<f64>, Array1<f64>) {
        let rows = self.values.slice(ndarray::s![..self.n_pairs, ..]);
        let rhs = self.constraints.slice(ndarray::s![..self.n_pairs]);
        (rows.to_owned(), rhs.to_owned())
    }

    /// The two budget rows (and right-hand sides) belonging to judgment `j`.
    ///
    /// Stacking [`bound_rows`](Self::bound_rows) and these over all
    /// judgments in training-set order reproduces
    /// [`values`](Self::values) / [`constraints`](Self::constraints)
    /// exactly.
    pub fn for_judgment(&self, j: usize) -> (Array2<f64>, Array1<f64>) {
        let start = self.n_pairs + 2 * j;
        let rows = self.values.slice(ndarray::s![start..start + 2, ..]);
        let rhs = self.constraints.slice(ndarray::s![start..start + 2]);
        (rows.to_owned(), rhs.to_owned())
    }
}
