//! Error types for the ranking SVM engine.
//!
//! Solver-level failures propagate up unmodified as causes; the classifier
//! facade never substitutes a default answer for a failed computation.

use thiserror::Error;

/// Rejected input data or parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInput {
    #[error("training set contains no judgments")]
    EmptyTrainingSet,

    #[error("judgment has an empty {side} side")]
    EmptyJudgmentSide { side: &'static str },

    #[error("item `{id}` appears on both sides of a judgment")]
    OverlappingSides { id: String },

    #[error("item `{id}` does not match the training parameter schema (expected `{expected}`, got `{actual}`)")]
    SchemaMismatch {
        id: String,
        expected: String,
        actual: String,
    },

    #[error("kernel bandwidth sigma must be positive, got {0}")]
    NonPositiveSigma(f64),

    #[error("penalty parameter must be positive, got {0}")]
    NonPositivePenalty(f64),
}

/// Failure modes of the quadratic-programming solver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QpError {
    /// No point satisfies all constraints.
    #[error("constraints are inconsistent, no feasible solution exists")]
    Infeasible,

    /// Cholesky factorization of the quadratic term failed. For this crate
    /// that indicates a degenerate or duplicated training configuration.
    #[error("matrix D is not positive definite (leading minor of order {order} is not positive)")]
    NotPositiveDefinite { order: usize },

    /// Safety valve against cycling on pathological input; active-set theory
    /// bounds well-posed problems far below this.
    #[error("active-set iteration limit of {limit} exceeded")]
    IterationLimit { limit: usize },

    #[error("dimension mismatch: {context} (expected {expected}, got {actual})")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Failure of a single training optimization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizationError {
    #[error("invalid optimization input: {0}")]
    InvalidInput(#[from] InvalidInput),

    #[error("quadratic programming failed: {0}")]
    Solver(#[from] QpError),
}

/// Facade-level training failure, carrying the underlying cause.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainingError {
    #[error("invalid training input: {0}")]
    InvalidInput(#[from] InvalidInput),

    #[error("optimization failed: {0}")]
    Optimization(#[from] OptimizationError),
}

/// Facade-level classification failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassificationError {
    /// `classify` was invoked before any successful `train`.
    #[error("classifier has not been trained")]
    NotTrained,

    #[error("invalid classification input: {0}")]
    InvalidInput(#[from] InvalidInput),
}
