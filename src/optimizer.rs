//! Training optimizer: assembles the dual QP from a training set and maps
//! the solved multipliers back onto preference pairs.
//!
//! The pair list enumerated here is the same one the objective and the
//! constraints were built from, so re-association is a positional zip; no
//! bookkeeping beyond the canonical order is needed.

use std::collections::HashMap;

use log::debug;

use crate::constraints::ConstraintMatrix;
use crate::error::{InvalidInput, OptimizationError};
use crate::kernel::{KernelFunction, MercerKernel};
use crate::model::{PreferencePair, TrainingSet};
use crate::objective::{QuadraticFunctionMatrix, QuadraticFunctionVector};
use crate::qp::{ActiveSetQpSolver, QpProblem, QpSolver};

/// The learned multipliers, one per unique preference pair, in canonical
/// order.
///
/// A (preferable, inferior) item combination stated by several judgments is
/// a single optimization variable and therefore a single entry here.
#[derive(Debug, Clone)]
pub struct TrainedWeights {
    pairs: Vec<PreferencePair>,
    alphas: Vec<f64>,
}

impl TrainedWeights {
    fn new(pairs: Vec<PreferencePair>, alphas: Vec<f64>) -> Self {
        debug_assert_eq!(pairs.len(), alphas.len());
        Self { pairs, alphas }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate pairs with their weights in canonical order.
    pub fn entries(&self) -> impl Iterator<Item = (&PreferencePair, f64)> {
        self.pairs.iter().zip(self.alphas.iter().copied())
    }

    /// Weight of the given item pair, if it was part of the training set.
    pub fn weight(&self, preferable_id: &str, inferior_id: &str) -> Option<f64> {
        self.entries()
            .find(|(pair, _)| {
                pair.preferable_id == preferable_id && pair.inferior_id == inferior_id
            })
            .map(|(_, alpha)| alpha)
    }

    /// Id-keyed map view of the weights.
    pub fn as_map(&self) -> HashMap<(String, String), f64> {
        self.entries()
            .map(|(pair, alpha)| {
                (
                    (pair.preferable_id.clone(), pair.inferior_id.clone()),
                    alpha,
                )
            })
            .collect()
    }
}

/// Orchestrates matrix assembly and the QP solve for one training run.
#[derive(Debug, Clone, Default)]
pub struct Optimizer<S: QpSolver = ActiveSetQpSolver> {
    solver: S,
}

impl Optimizer<ActiveSetQpSolver> {
    pub fn new() -> Self {
        Self {
            solver: ActiveSetQpSolver::new(),
        }
    }
}

impl<S: QpSolver> Optimizer<S> {
    /// Use a custom solver backend behind the same contract.
    pub fn with_solver(solver: S) -> Self {
        Self { solver }
    }

    /// Learn one weight per (preferable, inferior) pair of the training set.
    ///
    /// Builds the Cartesian-product pair list, assembles `D`, `d`, `A`, `b`,
    /// solves the dual QP and re-associates the flat multiplier vector back
    /// to its pairs using the same deterministic ordering.
    pub fn optimize<K: KernelFunction + Sync>(
        &self,
        training: &TrainingSet,
        kernel: &MercerKernel<K>,
        penalty: f64,
    ) -> Result<TrainedWeights, OptimizationError> {
        if !(penalty > 0.0) {
            return Err(InvalidInput::NonPositivePenalty(penalty).into());
        }

        let schema = training.schema()?;
        let pairs = training.enumerate_pairs(&schema)?;
        debug!(
            "optimizing {} pairs from {} judgments (penalty = {penalty})",
            pairs.len(),
            training.len()
        );

        let dmat = QuadraticFunctionMatrix::new(&pairs, kernel)?;
        let dvec = QuadraticFunctionVector::new(pairs.len())?;
        let (amat, bvec) = ConstraintMatrix::new(&pairs, training.len(), penalty)?.into_parts();

        let problem = QpProblem::new(dmat.into_inner(), dvec.into_inner(), amat, bvec)?;
        let solution = self.solver.solve(&problem)?;

        Ok(TrainedWeights::new(pairs, solution.solution.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::GaussianKernel;
    use crate::model::{Item, Judgment};
    use approx::assert_relative_eq;

    fn item(id: &str, value: f64) -> Item {
        Item::scalar(id, value)
    }

    fn mercer(sigma: f64) -> MercerKernel<GaussianKernel> {
        MercerKernel::new(GaussianKernel::new(sigma).unwrap())
    }

    fn precise_set() -> TrainingSet {
        TrainingSet::new(vec![
            Judgment::precise(item("x1", 11.0), item("z1", 1.0)).unwrap(),
            Judgment::precise(item("x2", 12.0), item("z2", 2.0)).unwrap(),
        ])
    }

    #[test]
    fn test_precise_example_weights() {
        // Two precise judgments x1 > z1, x2 > z2 with sigma = 0.5, C = 0.5:
        // both weights come out at ~0.4404 (interior solution).
        let weights = Optimizer::new()
            .optimize(&precise_set(), &mercer(0.5), 0.5)
            .unwrap();

        assert_eq!(weights.len(), 2);
        assert_relative_eq!(weights.weight("x1", "z1").unwrap(), 0.4404, epsilon = 0.001);
        assert_relative_eq!(weights.weight("x2", "z2").unwrap(), 0.4404, epsilon = 0.001);
    }

    #[test]
    fn test_weights_respect_box_bounds() {
        for penalty in [0.1, 0.5, 2.0] {
            let weights = Optimizer::new()
                .optimize(&precise_set(), &mercer(0.5), penalty)
                .unwrap();
            for (pair, alpha) in weights.entries() {
                assert!(
                    alpha >= -1e-9 && alpha <= penalty + 1e-9,
                    "weight {alpha} for ({}, {}) outside [0, {penalty}]",
                    pair.preferable_id,
                    pair.inferior_id
                );
            }
        }
    }

    #[test]
    fn test_optimization_is_deterministic() {
        let optimizer = Optimizer::new();
        let kernel = mercer(0.5);
        let first = optimizer.optimize(&precise_set(), &kernel, 0.5).unwrap();
        let second = optimizer.optimize(&precise_set(), &kernel, 0.5).unwrap();

        for ((p1, a1), (p2, a2)) in first.entries().zip(second.entries()) {
            assert_eq!(p1, p2);
            assert_eq!(a1, a2, "repeated solves must agree bit-for-bit");
        }
    }

    #[test]
    fn test_empty_training_set_is_rejected() {
        let err = Optimizer::new()
            .optimize(&TrainingSet::default(), &mercer(0.5), 0.5)
            .unwrap_err();
        assert_eq!(
            err,
            OptimizationError::InvalidInput(InvalidInput::EmptyTrainingSet)
        );
    }

    #[test]
    fn test_non_positive_penalty_is_rejected() {
        let err = Optimizer::new()
            .optimize(&precise_set(), &mercer(0.5), 0.0)
            .unwrap_err();
        assert_eq!(
            err,
            OptimizationError::InvalidInput(InvalidInput::NonPositivePenalty(0.0))
        );
    }

    #[test]
    fn test_pair_stated_by_two_judgments_is_one_variable() {
        // x1 > z1 stated twice: one QP variable bounded by both judgments'
        // budgets, so its weight stays within [0, C].
        let set = TrainingSet::new(vec![
            Judgment::precise(item("x1", 11.0), item("z1", 1.0)).unwrap(),
            Judgment::precise(item("x1", 11.0), item("z1", 1.0)).unwrap(),
        ]);
        let weights = Optimizer::new().optimize(&set, &mercer(0.5), 0.5).unwrap();

        assert_eq!(weights.len(), 1);
        assert_eq!(weights.as_map().len(), 1);
        let alpha = weights.weight("x1", "z1").unwrap();
        assert!(alpha >= -1e-9 && alpha <= 0.5 + 1e-9);
    }
}
