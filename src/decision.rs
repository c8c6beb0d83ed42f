//! Decision function: ranks two candidate items with the learned weights.

use crate::error::ClassificationError;
use crate::kernel::{KernelFunction, MercerKernel};
use crate::model::{Item, ParameterSchema};
use crate::optimizer::TrainedWeights;

/// Evaluates the learned kernel expansion for a candidate pair.
///
/// The score of `(a, b)` is the weighted sum over all trained pairs
/// `(x, z)` of `k(x,a) + k(z,b) - k(x,b) - k(z,a)`: how much closer `a`
/// sits to the preferred side of the margin than `b` does. A positive score
/// ranks `a` above `b`.
#[derive(Debug, Clone)]
pub struct DecisionFunction<K: KernelFunction> {
    weights: TrainedWeights,
    kernel: MercerKernel<K>,
    schema: ParameterSchema,
}

impl<K: KernelFunction> DecisionFunction<K> {
    pub fn new(weights: TrainedWeights, kernel: MercerKernel<K>, schema: ParameterSchema) -> Self {
        Self {
            weights,
            kernel,
            schema,
        }
    }

    pub fn weights(&self) -> &TrainedWeights {
        &self.weights
    }

    /// Signed ranking score of `a` against `b`.
    pub fn score(&self, a: &Item, b: &Item) -> Result<f64, ClassificationError> {
        let a = self.schema.encode(a)?;
        let b = self.schema.encode(b)?;
        Ok(self
            .weights
            .entries()
            .map(|(pair, alpha)| alpha * self.kernel.compare(pair, &a, &b))
            .sum())
    }

    /// Whether `a` should be ranked above `b`.
    pub fn is_preferable(&self, a: &Item, b: &Item) -> Result<bool, ClassificationError> {
        Ok(self.score(a, b)? > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::GaussianKernel;
    use crate::model::{Judgment, TrainingSet};
    use crate::optimizer::Optimizer;
    use approx::assert_relative_eq;

    fn trained() -> DecisionFunction<GaussianKernel> {
        let set = TrainingSet::new(vec![
            Judgment::precise(Item::scalar("x1", 11.0), Item::scalar("z1", 1.0)).unwrap(),
            Judgment::precise(Item::scalar("x2", 12.0), Item::scalar("z2", 2.0)).unwrap(),
        ]);
        let kernel = MercerKernel::new(GaussianKernel::new(0.5).unwrap());
        let schema = set.schema().unwrap();
        let weights = Optimizer::new().optimize(&set, &kernel, 0.5).unwrap();
        DecisionFunction::new(weights, kernel, schema)
    }

    #[test]
    fn test_score_is_antisymmetric() {
        let decision = trained();
        let a = Item::scalar("a", 11.5);
        let b = Item::scalar("b", 1.5);

        let forward = decision.score(&a, &b).unwrap();
        let backward = decision.score(&b, &a).unwrap();
        assert_relative_eq!(forward, -backward, epsilon = 1e-12);
        assert!(forward > 0.0);
    }

    #[test]
    fn test_training_pairs_rank_in_judged_direction() {
        let decision = trained();
        assert!(decision
            .is_preferable(&Item::scalar("a", 11.0), &Item::scalar("b", 1.0))
            .unwrap());
        assert!(!decision
            .is_preferable(&Item::scalar("a", 1.0), &Item::scalar("b", 11.0))
            .unwrap());
    }

    #[test]
    fn test_schema_mismatch_is_reported() {
        let decision = trained();
        let wrong = Item::new("w", [("weight", 1.0), ("height", 2.0)]);
        let err = decision
            .score(&wrong, &Item::scalar("b", 1.0))
            .unwrap_err();
        assert!(matches!(
            err,
            ClassificationError::InvalidInput(crate::error::InvalidInput::SchemaMismatch { .. })
        ));
    }
}
