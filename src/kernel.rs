//! Kernel functions for the ranking SVM.
//!
//! `GaussianKernel` is the default similarity between two parameter vectors.
//! `MercerKernel` lifts any such kernel to the 4-term pairwise-comparison
//! kernel used by ranking SVMs: the inner product of two preference pairs
//! in the implicit difference feature space, which is exactly the entry the
//! quadratic term of the dual problem needs.

use crate::error::InvalidInput;
use crate::model::PreferencePair;
use crate::utils::squared_distance;

/// Scalar similarity between two real-valued parameter vectors.
///
/// Implementations must be Mercer kernels (symmetric, positive
/// semi-definite) for the resulting QP to stay convex.
pub trait KernelFunction {
    fn compute(&self, a: &[f64], b: &[f64]) -> f64;
}

/// Gaussian (RBF) kernel `exp(-||a - b||^2 / (2 sigma^2))`.
#[derive(Debug, Clone)]
pub struct GaussianKernel {
    sigma: f64,
}

impl GaussianKernel {
    /// Create a Gaussian kernel with bandwidth `sigma` (must be positive).
    pub fn new(sigma: f64) -> Result<Self, InvalidInput> {
        if !(sigma > 0.0) {
            return Err(InvalidInput::NonPositiveSigma(sigma));
        }
        Ok(Self { sigma })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl KernelFunction for GaussianKernel {
    fn compute(&self, a: &[f64], b: &[f64]) -> f64 {
        (-squared_distance(a, b) / (2.0 * self.sigma * self.sigma)).exp()
    }
}

/// Pairwise-comparison kernel over preference pairs.
///
/// For pairs `p1 = (x1, z1)` ("x1 preferred over z1") and `p2 = (x2, z2)`:
///
/// ```text
/// K(p1, p2) = k(x1,x2) - k(x1,z2) - k(z1,x2) + k(z1,z2)
/// ```
///
/// On the diagonal this reduces to `k(x,x) - 2 k(x,z) + k(z,z)`, a squared
/// distance in feature space, hence always >= 0.
#[derive(Debug, Clone)]
pub struct MercerKernel<K: KernelFunction> {
    kernel: K,
}

impl<K: KernelFunction> MercerKernel<K> {
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }

    pub fn inner(&self) -> &K {
        &self.kernel
    }

    pub fn compute(&self, p1: &PreferencePair, p2: &PreferencePair) -> f64 {
        self.kernel.compute(&p1.preferable, &p2.preferable)
            - self.kernel.compute(&p1.preferable, &p2.inferior)
            - self.kernel.compute(&p1.inferior, &p2.preferable)
            + self.kernel.compute(&p1.inferior, &p2.inferior)
    }

    /// Kernel expansion of a trained pair against a candidate pair (a, b):
    /// `k(x,a) + k(z,b) - k(x,b) - k(z,a)`.
    ///
    /// This is `compute` with the candidate pair spelled out, used by the
    /// decision function.
    pub fn compare(&self, trained: &PreferencePair, a: &[f64], b: &[f64]) -> f64 {
        self.kernel.compute(&trained.preferable, a) + self.kernel.compute(&trained.inferior, b)
            - self.kernel.compute(&trained.preferable, b)
            - self.kernel.compute(&trained.inferior, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pair(x: Vec<f64>, z: Vec<f64>) -> PreferencePair {
        PreferencePair {
            judgment_indices: vec![0],
            preferable_id: "x".to_string(),
            inferior_id: "z".to_string(),
            preferable: x,
            inferior: z,
        }
    }

    #[test]
    fn test_gaussian_kernel_identity_and_symmetry() {
        let kernel = GaussianKernel::new(0.5).unwrap();
        assert_relative_eq!(kernel.compute(&[11.0], &[11.0]), 1.0);
        assert_relative_eq!(
            kernel.compute(&[11.0], &[12.0]),
            kernel.compute(&[12.0], &[11.0])
        );
    }

    #[test]
    fn test_gaussian_kernel_known_value() {
        // sigma = 0.5, distance 1 => exp(-1 / (2 * 0.25)) = exp(-2)
        let kernel = GaussianKernel::new(0.5).unwrap();
        assert_relative_eq!(
            kernel.compute(&[11.0], &[12.0]),
            (-2.0f64).exp(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_gaussian_kernel_rejects_non_positive_sigma() {
        assert_eq!(
            GaussianKernel::new(0.0).unwrap_err(),
            InvalidInput::NonPositiveSigma(0.0)
        );
        assert!(GaussianKernel::new(-1.0).is_err());
    }

    #[test]
    fn test_mercer_kernel_four_term_identity() {
        let kernel = GaussianKernel::new(0.5).unwrap();
        let mercer = MercerKernel::new(kernel.clone());

        let p1 = pair(vec![11.0], vec![1.0]);
        let p2 = pair(vec![12.0], vec![2.0]);

        let expected = kernel.compute(&[11.0], &[12.0]) - kernel.compute(&[11.0], &[2.0])
            - kernel.compute(&[1.0], &[12.0])
            + kernel.compute(&[1.0], &[2.0]);
        assert_relative_eq!(mercer.compute(&p1, &p2), expected, epsilon = 1e-15);

        // Symmetric in its arguments.
        assert_relative_eq!(
            mercer.compute(&p1, &p2),
            mercer.compute(&p2, &p1),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_mercer_kernel_diagonal_is_nonnegative() {
        let mercer = MercerKernel::new(GaussianKernel::new(0.5).unwrap());
        for (x, z) in [(11.0, 1.0), (0.1, 0.2), (3.0, 3.0)] {
            let p = pair(vec![x], vec![z]);
            let diag = mercer.compute(&p, &p);
            assert!(diag >= 0.0, "diagonal entry {diag} must be >= 0");
        }
    }

    #[test]
    fn test_compare_matches_compute_on_candidate_pair() {
        let mercer = MercerKernel::new(GaussianKernel::new(0.5).unwrap());
        let trained = pair(vec![11.0], vec![1.0]);
        let candidate = pair(vec![12.0], vec![2.0]);

        assert_relative_eq!(
            mercer.compare(&trained, &[12.0], &[2.0]),
            mercer.compute(&trained, &candidate),
            epsilon = 1e-15
        );
    }
}
