//! Dual active-set quadratic programming.
//!
//! This module solves the strictly convex QP
//!
//! ```text
//! min  1/2 x' D x - d' x    subject to    A x >= b
//! ```
//!
//! with the Goldfarb–Idnani dual method, a structured re-implementation of
//! the classic `quadprog` Fortran routine (`solve.QP` / `qpgen2`): the
//! 1-indexed goto flow of the original becomes an explicit step enum, and
//! the LINPACK factorization kernels it calls live in [`cholesky`].
//!
//! # Key Components
//!
//! - `QpProblem` / `QpSolution`: dense problem statement and result
//! - `QpSolver`: the solver contract (implementable by alternative backends)
//! - `ActiveSetQpSolver`: the production Goldfarb–Idnani implementation

pub mod active_set;
pub mod cholesky;

use ndarray::{Array1, Array2};

use crate::error::QpError;

pub use active_set::ActiveSetQpSolver;

/// A dense strictly convex quadratic program.
///
/// `amat` is row-oriented: row `i` is the normal of constraint
/// `amat.row(i) . x >= bvec[i]`.
#[derive(Debug, Clone)]
pub struct QpProblem {
    pub dmat: Array2<f64>,
    pub dvec: Array1<f64>,
    pub amat: Array2<f64>,
    pub bvec: Array1<f64>,
}

impl QpProblem {
    pub fn new(
        dmat: Array2<f64>,
        dvec: Array1<f64>,
        amat: Array2<f64>,
        bvec: Array1<f64>,
    ) -> Result<Self, QpError> {
        let n = dmat.nrows();
        if dmat.ncols() != n {
            return Err(QpError::DimensionMismatch {
                context: "D must be square",
                expected: n,
                actual: dmat.ncols(),
            });
        }
        if dvec.len() != n {
            return Err(QpError::DimensionMismatch {
                context: "d must match the dimension of D",
                expected: n,
                actual: dvec.len(),
            });
        }
        if amat.ncols() != n {
            return Err(QpError::DimensionMismatch {
                context: "constraint rows must match the dimension of D",
                expected: n,
                actual: amat.ncols(),
            });
        }
        if bvec.len() != amat.nrows() {
            return Err(QpError::DimensionMismatch {
                context: "b must have one entry per constraint row",
                expected: amat.nrows(),
                actual: bvec.len(),
            });
        }
        Ok(Self {
            dmat,
            dvec,
            amat,
            bvec,
        })
    }

    /// Problem dimension (number of variables).
    pub fn dim(&self) -> usize {
        self.dmat.nrows()
    }

    /// Number of constraints.
    pub fn n_constraints(&self) -> usize {
        self.amat.nrows()
    }
}

/// Result of a successful solve.
#[derive(Debug, Clone)]
pub struct QpSolution {
    /// The minimizer x.
    pub solution: Array1<f64>,
    /// Lagrange multiplier per constraint (zero for inactive constraints).
    pub lagrangian: Array1<f64>,
    /// Objective value at the minimizer.
    pub value: f64,
    /// Constraints added to the active set over the run.
    pub additions: usize,
    /// Constraints dropped from the active set over the run.
    pub deletions: usize,
}

/// Solver contract consumed by the optimizer.
///
/// The production implementation is [`ActiveSetQpSolver`]; delegating
/// backends can implement the same contract.
pub trait QpSolver {
    fn solve(&self, problem: &QpProblem) -> Result<QpSolution, QpError>;
}
