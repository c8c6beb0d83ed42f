//! Public facade: train a ranking classifier, then rank candidate pairs.

use log::debug;

use crate::decision::DecisionFunction;
use crate::error::{ClassificationError, TrainingError};
use crate::interval::IntervalJudgmentTransformer;
use crate::kernel::{GaussianKernel, MercerKernel};
use crate::model::{Item, TrainingSet};
use crate::optimizer::Optimizer;

/// Hyperparameters of one training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingParams {
    /// Soft-margin cost C; upper bound on each learned weight.
    pub penalty: f64,
    /// Gaussian kernel bandwidth.
    pub sigma: f64,
}

/// How group (interval) judgments enter the optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupHandling {
    /// Feed the full Cartesian pair expansion to the constraint encoder,
    /// which ties each judgment's pairs into one `[0, C]` budget.
    #[default]
    GroupConstraints,
    /// Collapse group judgments to precise ones first (for kernels that
    /// cannot consume groups directly).
    HausdorffTransform,
}

/// Pairwise ranking classifier learned from preference judgments.
///
/// `train` rebuilds all learned state; `classify` only reads it. One
/// instance must not be trained concurrently, but independent instances
/// are independent (a cross-validation harness can run many in parallel).
#[derive(Debug, Clone, Default)]
pub struct RankingClassifier {
    group_handling: GroupHandling,
    decision: Option<DecisionFunction<GaussianKernel>>,
}

impl RankingClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group_handling(group_handling: GroupHandling) -> Self {
        Self {
            group_handling,
            decision: None,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.decision.is_some()
    }

    /// The current decision function, if trained.
    pub fn decision_function(&self) -> Option<&DecisionFunction<GaussianKernel>> {
        self.decision.as_ref()
    }

    /// Learn a new weight map from the training set.
    ///
    /// Previous state is replaced only on success; a failed training leaves
    /// the classifier as it was.
    pub fn train(
        &mut self,
        training: &TrainingSet,
        params: &TrainingParams,
    ) -> Result<(), TrainingError> {
        let kernel = GaussianKernel::new(params.sigma)?;
        let mercer = MercerKernel::new(kernel);

        let transformed;
        let training = match self.group_handling {
            GroupHandling::HausdorffTransform if training.has_group_judgments() => {
                transformed = IntervalJudgmentTransformer::new().transform(training)?;
                &transformed
            }
            _ => training,
        };

        let schema = training.schema()?;
        let weights = Optimizer::new().optimize(training, &mercer, params.penalty)?;
        debug!(
            "trained on {} judgments: {} weighted pairs",
            training.len(),
            weights.len()
        );
        self.decision = Some(DecisionFunction::new(weights, mercer, schema));
        Ok(())
    }

    /// Whether `a` should be ranked above `b` under the learned weights.
    pub fn classify(&self, a: &Item, b: &Item) -> Result<bool, ClassificationError> {
        self.decision
            .as_ref()
            .ok_or(ClassificationError::NotTrained)?
            .is_preferable(a, b)
    }
}
