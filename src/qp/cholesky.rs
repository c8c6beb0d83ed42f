//! Cholesky kernels for the dual active-set solver.
//!
//! Ports of the LINPACK routines the reference implementation relies on,
//! kept under their original names: `dpofa` (factor A = R'R), `dposl`
//! (solve A x = b given the factor) and `dpori` (invert the triangular
//! factor in place). All three work on the upper triangle of a square
//! matrix; the lower triangle is never referenced.

use ndarray::{Array1, Array2};

/// Factor a symmetric positive definite matrix as `A = R' R` in place.
///
/// Only the upper triangle of `a` is read and written; on success it holds
/// the upper-triangular factor `R`.
///
/// # Errors
/// Returns the order of the first leading minor found not to be positive
/// (1-based, mirroring the LINPACK `info` convention).
pub fn dpofa(a: &mut Array2<f64>) -> Result<(), usize> {
    let n = a.nrows();
    for j in 0..n {
        let mut s = 0.0;
        for k in 0..j {
            let mut t = a[[k, j]];
            for i in 0..k {
                t -= a[[i, k]] * a[[i, j]];
            }
            t /= a[[k, k]];
            a[[k, j]] = t;
            s += t * t;
        }
        let s = a[[j, j]] - s;
        if s <= 0.0 {
            return Err(j + 1);
        }
        a[[j, j]] = s.sqrt();
    }
    Ok(())
}

/// Solve `A x = b` in place given the `dpofa` factor of `A`.
///
/// Forward-substitutes `R' y = b`, then back-substitutes `R x = y`.
pub fn dposl(a: &Array2<f64>, b: &mut Array1<f64>) {
    let n = a.nrows();
    for k in 0..n {
        let mut t = 0.0;
        for i in 0..k {
            t += a[[i, k]] * b[i];
        }
        b[k] = (b[k] - t) / a[[k, k]];
    }
    for k in (0..n).rev() {
        b[k] /= a[[k, k]];
        for i in 0..k {
            b[i] -= b[k] * a[[i, k]];
        }
    }
}

/// Invert the upper-triangular `dpofa` factor in place.
///
/// Afterwards the upper triangle of `a` holds `R^-1`, which the solver uses
/// for repeated back-substitution as constraints enter and leave the active
/// set.
pub fn dpori(a: &mut Array2<f64>) {
    let n = a.nrows();
    for k in 0..n {
        a[[k, k]] = 1.0 / a[[k, k]];
        let t = -a[[k, k]];
        for i in 0..k {
            a[[i, k]] *= t;
        }
        for j in (k + 1)..n {
            let t = a[[k, j]];
            a[[k, j]] = 0.0;
            for i in 0..=k {
                a[[i, j]] += t * a[[i, k]];
            }
        }
    }
}
