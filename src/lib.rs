//! Kernel ranking SVM with a dual active-set quadratic-programming core.
//!
//! Learns a pairwise preference function from expert judgments: each
//! judgment states that every item on its preferable side outranks every
//! item on its inferior side. Training expands the judgments into
//! preference pairs, assembles the dual soft-margin problem over a Mercer
//! pairwise-comparison kernel, and solves it with a Goldfarb–Idnani
//! active-set solver (a port of the `qpgen2` routine from the `quadprog`
//! package). The learned weights drive a decision function that ranks any
//! two candidate items.
//!
//! # Key components
//!
//! - [`model`]: items, judgments, training sets and canonical pair
//!   enumeration
//! - [`kernel`]: the [`KernelFunction`] trait, the Gaussian kernel and the
//!   Mercer pairwise-comparison kernel built on top of it
//! - [`objective`] / [`constraints`]: assembly of the dual QP matrices
//! - [`qp`]: the active-set solver behind the [`qp::QpSolver`] trait
//! - [`optimizer`]: one training run, mapping solved multipliers back onto
//!   preference pairs
//! - [`decision`]: scoring of candidate pairs with the learned weights
//! - [`interval`]: optional Hausdorff collapse of group judgments into
//!   precise ones
//! - [`classifier`]: the train/classify facade
//!
//! # Example
//!
//! ```
//! use ranksvm::{Item, Judgment, RankingClassifier, TrainingParams, TrainingSet};
//!
//! let training = TrainingSet::new(vec![
//!     Judgment::precise(Item::scalar("x1", 11.0), Item::scalar("z1", 1.0))?,
//!     Judgment::precise(Item::scalar("x2", 12.0), Item::scalar("z2", 2.0))?,
//! ]);
//!
//! let mut classifier = RankingClassifier::new();
//! classifier.train(&training, &TrainingParams { penalty: 0.5, sigma: 0.5 })?;
//! assert!(classifier.classify(&Item::scalar("a", 11.5), &Item::scalar("b", 1.5))?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod classifier;
pub mod constraints;
pub mod decision;
pub mod error;
pub mod interval;
pub mod kernel;
pub mod model;
pub mod objective;
pub mod optimizer;
pub mod qp;
pub mod utils;

pub use classifier::{GroupHandling, RankingClassifier, TrainingParams};
pub use decision::DecisionFunction;
pub use error::{
    ClassificationError, InvalidInput, OptimizationError, QpError, TrainingError,
};
pub use interval::IntervalJudgmentTransformer;
pub use kernel::{GaussianKernel, KernelFunction, MercerKernel};
pub use model::{Item, Judgment, ParameterSchema, PreferencePair, TrainingSet};
pub use optimizer::{Optimizer, TrainedWeights};
pub use qp::{ActiveSetQpSolver, QpProblem, QpSolution, QpSolver};
