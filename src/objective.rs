//! Assembly of the dual objective `min 1/2 a' D a - d' a`.
//!
//! `D` is the Gram matrix of the Mercer pairwise-comparison kernel over the
//! enumerated preference pairs; `d` is the all-ones vector (the linear term
//! of the max-margin dual is the plain sum of the multipliers).

use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::error::InvalidInput;
use crate::kernel::{KernelFunction, MercerKernel};
use crate::model::PreferencePair;

/// Added to every diagonal entry of `D` before factorization.
///
/// The diagonal is a squared feature-space distance and therefore >= 0 in
/// exact arithmetic, but duplicate or near-duplicate pairs leave the Gram
/// matrix on the edge of positive semi-definiteness in floating point.
pub const DIAGONAL_FIX: f64 = 1e-12;

/// Quadratic term of the dual objective.
#[derive(Debug, Clone)]
pub struct QuadraticFunctionMatrix {
    values: Array2<f64>,
}

impl QuadraticFunctionMatrix {
    /// Build the N x N kernel Gram matrix over the pair list.
    ///
    /// `D[i][j] = K(pair_i, pair_j)`, symmetric by construction, with
    /// [`DIAGONAL_FIX`] added on the diagonal. Rows are assembled in
    /// parallel; every entry depends only on its own pair of indices, so
    /// the result is deterministic.
    pub fn new<K: KernelFunction + Sync>(
        pairs: &[PreferencePair],
        kernel: &MercerKernel<K>,
    ) -> Result<Self, InvalidInput> {
        if pairs.is_empty() {
            return Err(InvalidInput::EmptyTrainingSet);
        }
        let n = pairs.len();
        let entries: Vec<f64> = (0..n)
            .into_par_iter()
            .flat_map_iter(|i| {
                let row: Vec<f64> = (0..n)
                    .map(|j| {
                        let value = kernel.compute(&pairs[i], &pairs[j]);
                        if i == j {
                            value + DIAGONAL_FIX
                        } else {
                            value
                        }
                    })
                    .collect();
                row
            })
            .collect();
        let values = Array2::from_shape_vec((n, n), entries)
            .expect("row-major kernel buffer has n * n entries");
        Ok(Self { values })
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.values
    }
}

/// Linear term of the dual objective: a vector of ones, one per pair.
#[derive(Debug, Clone)]
pub struct QuadraticFunctionVector {
    values: Array1<f64>,
}

impl QuadraticFunctionVector {
    pub fn new(n_pairs: usize) -> Result<Self, InvalidInput> {
        if n_pairs == 0 {
            return Err(InvalidInput::EmptyTrainingSet);
        }
        Ok(Self {
            values: Array1::ones(n_pairs),
        })
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn into_inner(self) -> Array1<f64> {
        self.values
    }
}
