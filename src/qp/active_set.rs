//! Goldfarb–Idnani dual active-set QP solver.
//!
//! Re-implementation of the `qpgen2` routine from the `quadprog` package:
//! start at the unconstrained minimum (dual-feasible by construction), then
//! repeatedly pull the most violated primal constraint into the active set,
//! dropping active constraints whose multipliers would go negative along
//! the way. The original's 1-indexed arrays and goto flow are replaced by
//! 0-indexed storage and an explicit [`Step`] enum; the numeric behavior is
//! unchanged, including the first-match scan on equally violated
//! constraints.

use log::{debug, trace};
use ndarray::Array1;

use crate::error::QpError;
use crate::qp::cholesky::{dpofa, dpori, dposl};
use crate::qp::{QpProblem, QpSolution, QpSolver};

/// Control flow of the main loop, replacing the reference gotos
/// (50 -> SelectViolated, 55 -> ComputeStep, 700 -> DropConstraint).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    SelectViolated,
    ComputeStep,
    DropConstraint,
}

/// Determine the smallest double for which `1 + 0.1 * vsmall > 1` and
/// `1 + 0.2 * vsmall > 1` both hold, the reference routine's notion of
/// "effectively zero".
pub fn machine_vsmall() -> f64 {
    let mut vsmall = 1.0e-60_f64;
    loop {
        vsmall += vsmall;
        let tmpa = 1.0 + 0.1 * vsmall;
        let tmpb = 1.0 + 0.2 * vsmall;
        if tmpa > 1.0 && tmpb > 1.0 {
            return vsmall;
        }
    }
}

/// Goldfarb–Idnani dual active-set solver for strictly convex QPs.
///
/// Solves `min 1/2 x' D x - d' x` subject to `A x >= b`, where the first
/// `n_equality` constraint rows are treated as equalities (sign-normalized
/// on first encounter, always eligible for the active set). The ranking
/// classifier only emits inequalities; `n_equality` stays 0 there.
#[derive(Debug, Clone)]
pub struct ActiveSetQpSolver {
    /// Number of leading constraint rows treated as equalities.
    n_equality: usize,
    /// Hard cap on active-set changes; `None` picks `50 * (n + q)`.
    max_iterations: Option<usize>,
    /// "Effectively zero" tolerance guarding every comparison in the loop.
    vsmall: f64,
}

impl Default for ActiveSetQpSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveSetQpSolver {
    pub fn new() -> Self {
        Self {
            n_equality: 0,
            max_iterations: None,
            vsmall: machine_vsmall(),
        }
    }

    pub fn with_equality_count(mut self, n_equality: usize) -> Self {
        self.n_equality = n_equality;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn vsmall(&self) -> f64 {
        self.vsmall
    }

    fn iteration_limit(&self, n: usize, q: usize) -> usize {
        self.max_iterations.unwrap_or(50 * (n + q))
    }
}

impl QpSolver for ActiveSetQpSolver {
    fn solve(&self, problem: &QpProblem) -> Result<QpSolution, QpError> {
        let n = problem.dim();
        let q = problem.n_constraints();
        let r = n.min(q);
        let vsmall = self.vsmall;

        // Working copies. `amat` is transposed to column-per-constraint so
        // the inner loops walk contiguously like the reference routine;
        // equality sign normalization mutates it in place.
        let mut dmat = problem.dmat.clone();
        let mut amat = problem.amat.t().to_owned();
        let mut bvec = problem.bvec.clone();
        let mut sol = problem.dvec.clone();

        // Factor D, solve the unconstrained problem, then invert the factor
        // so adding and removing constraints only needs back-substitution.
        dpofa(&mut dmat).map_err(|order| QpError::NotPositiveDefinite { order })?;
        dposl(&dmat, &mut sol);
        dpori(&mut dmat);
        for i in 0..n {
            for j in 0..i {
                dmat[[i, j]] = 0.0;
            }
        }
        // From here `dmat` holds J with J' D J = I; its first `nact` columns
        // span the space of active constraint normals.

        let mut crval = -0.5 * problem.dvec.dot(&sol);
        debug!(
            "active-set solve: n = {n}, q = {q}, unconstrained objective = {crval:.6}"
        );

        // Constraint norms for scale-free violation comparison.
        let nbv: Vec<f64> = (0..q)
            .map(|i| (0..n).map(|j| amat[[j, i]] * amat[[j, i]]).sum::<f64>().sqrt())
            .collect();

        let mut iact: Vec<usize> = Vec::with_capacity(r);
        let mut lagr = Array1::zeros(q);
        // d = J' n+ for the incoming constraint normal n+.
        let mut dwork = vec![0.0; n];
        // z: primal step direction in the null space of the active set.
        let mut zv = vec![0.0; n];
        // rv = R^-1 d1: dual step direction over the active multipliers.
        let mut rv = vec![0.0; r];
        // Active multipliers, plus one slot for the incoming constraint.
        let mut uv = vec![0.0; r + 1];
        // R of the QR factorization of the active normals in J-coordinates,
        // packed upper-triangular by columns.
        let mut rmat = vec![0.0; r * (r + 1) / 2];
        // Current slack of every constraint.
        let mut sv = vec![0.0; q];

        let r_index = |i: usize, j: usize| j * (j + 1) / 2 + i;

        let limit = self.iteration_limit(n, q);
        let mut iterations = 0usize;
        let mut additions = 0usize;
        let mut deletions = 0usize;

        let mut nvl = 0usize; // constraint currently being added
        let mut it1 = 0usize; // active-set position about to be dropped
        let mut step = Step::SelectViolated;

        loop {
            iterations += 1;
            if iterations > limit {
                return Err(QpError::IterationLimit { limit });
            }

            match step {
                Step::SelectViolated => {
                    for i in 0..q {
                        let mut sum = -bvec[i];
                        for j in 0..n {
                            sum += amat[[j, i]] * sol[j];
                        }
                        if sum.abs() < vsmall {
                            sum = 0.0;
                        }
                        if i >= self.n_equality {
                            sv[i] = sum;
                        } else {
                            // Equality rows stay candidates from both sides;
                            // flip the stored normal so the violated side
                            // looks like an ordinary >= constraint.
                            sv[i] = -sum.abs();
                            if sum > 0.0 {
                                for j in 0..n {
                                    amat[[j, i]] = -amat[[j, i]];
                                }
                                bvec[i] = -bvec[i];
                            }
                        }
                    }
                    for &active in &iact {
                        sv[active] = 0.0;
                    }

                    // Most violated constraint by normalized violation;
                    // strict comparison keeps the first match on ties.
                    let mut chosen = None;
                    let mut worst = 0.0;
                    for i in 0..q {
                        if sv[i] < worst * nbv[i] {
                            chosen = Some(i);
                            worst = sv[i] / nbv[i];
                        }
                    }

                    match chosen {
                        None => {
                            for (pos, &active) in iact.iter().enumerate() {
                                lagr[active] = uv[pos];
                            }
                            debug!(
                                "active-set solve converged: {} active constraints, \
                                 {additions} additions, {deletions} deletions, objective = {crval:.6}",
                                iact.len()
                            );
                            return Ok(QpSolution {
                                solution: sol,
                                lagrangian: lagr,
                                value: crval,
                                additions,
                                deletions,
                            });
                        }
                        Some(i) => {
                            trace!("violated constraint {i}: slack = {}", sv[i]);
                            nvl = i;
                            step = Step::ComputeStep;
                        }
                    }
                }

                Step::ComputeStep => {
                    let nact = iact.len();

                    // d = J' n+
                    for i in 0..n {
                        let mut sum = 0.0;
                        for j in 0..n {
                            sum += dmat[[j, i]] * amat[[j, nvl]];
                        }
                        dwork[i] = sum;
                    }

                    // z = J2 d2: the primal direction that moves the new
                    // constraint toward feasibility without disturbing the
                    // active ones.
                    for entry in zv.iter_mut() {
                        *entry = 0.0;
                    }
                    for j in nact..n {
                        for i in 0..n {
                            zv[i] += dmat[[i, j]] * dwork[j];
                        }
                    }

                    // rv = R^-1 d1 by back-substitution, remembering the
                    // inequality row whose multiplier hits zero first.
                    let mut t1inf = true;
                    for i in (0..nact).rev() {
                        let mut sum = dwork[i];
                        for j in (i + 1)..nact {
                            sum -= rmat[r_index(i, j)] * rv[j];
                        }
                        sum /= rmat[r_index(i, i)];
                        rv[i] = sum;
                        if iact[i] < self.n_equality {
                            continue;
                        }
                        if sum <= 0.0 {
                            continue;
                        }
                        t1inf = false;
                        it1 = i;
                    }

                    // t1: maximum dual step before an active multiplier
                    // turns negative.
                    let mut t1 = 0.0;
                    if !t1inf {
                        t1 = uv[it1] / rv[it1];
                        for i in 0..nact {
                            if iact[i] < self.n_equality || rv[i] <= 0.0 {
                                continue;
                            }
                            let bound = uv[i] / rv[i];
                            if bound < t1 {
                                t1 = bound;
                                it1 = i;
                            }
                        }
                    }

                    let znorm2: f64 = zv.iter().map(|&x| x * x).sum();
                    if znorm2.abs() <= vsmall {
                        // No movement possible in primal space.
                        if t1inf {
                            debug!("no primal direction and no dual bound: infeasible");
                            return Err(QpError::Infeasible);
                        }
                        // Step in dual space only, then drop the blocking
                        // constraint and retry with the same nvl.
                        for i in 0..nact {
                            uv[i] -= t1 * rv[i];
                        }
                        uv[nact] += t1;
                        step = Step::DropConstraint;
                        continue;
                    }

                    // t2: primal step that makes the new constraint exactly
                    // satisfied.
                    let mut zta = 0.0;
                    for i in 0..n {
                        zta += zv[i] * amat[[i, nvl]];
                    }
                    let t2 = -sv[nvl] / zta;
                    let mut full_step = true;
                    let mut tt = t2;
                    if !t1inf && t1 < t2 {
                        tt = t1;
                        full_step = false;
                    }

                    for i in 0..n {
                        sol[i] += tt * zv[i];
                    }
                    crval += tt * zta * (tt / 2.0 + uv[nact]);
                    for i in 0..nact {
                        uv[i] -= tt * rv[i];
                    }
                    uv[nact] += tt;

                    if full_step {
                        // Add nvl to the active set: rotate the trailing
                        // components of d to zero and extend R by a column.
                        iact.push(nvl);
                        let nact = iact.len();
                        for k in ((nact)..n).rev() {
                            let a = dwork[k - 1];
                            let b = dwork[k];
                            if b == 0.0 {
                                continue;
                            }
                            let (gc, gs, rho) = givens(a, b);
                            if gc == 1.0 {
                                continue;
                            }
                            if gc == 0.0 {
                                dwork[k - 1] = gs * rho;
                                for i in 0..n {
                                    let t = dmat[[i, k - 1]];
                                    dmat[[i, k - 1]] = dmat[[i, k]];
                                    dmat[[i, k]] = t;
                                }
                            } else {
                                dwork[k - 1] = rho;
                                let nu = gs / (1.0 + gc);
                                for i in 0..n {
                                    let t = gc * dmat[[i, k - 1]] + gs * dmat[[i, k]];
                                    dmat[[i, k]] = nu * (dmat[[i, k - 1]] + t) - dmat[[i, k]];
                                    dmat[[i, k - 1]] = t;
                                }
                            }
                        }
                        let new_col = nact - 1;
                        for i in 0..nact {
                            rmat[r_index(i, new_col)] = dwork[i];
                        }
                        additions += 1;
                        trace!("added constraint {nvl}, active set size {nact}");
                        step = Step::SelectViolated;
                    } else {
                        // Partial step: refresh the slack of nvl, drop the
                        // blocking constraint, then retry the same nvl.
                        let mut sum = -bvec[nvl];
                        for j in 0..n {
                            sum += sol[j] * amat[[j, nvl]];
                        }
                        if nvl >= self.n_equality {
                            sv[nvl] = sum;
                        } else {
                            sv[nvl] = -sum.abs();
                            if sum > 0.0 {
                                for j in 0..n {
                                    amat[[j, nvl]] = -amat[[j, nvl]];
                                }
                                bvec[nvl] = -bvec[nvl];
                            }
                        }
                        step = Step::DropConstraint;
                    }
                }

                Step::DropConstraint => {
                    let nact = iact.len();
                    let mut t = it1;
                    // Walk the dropped position to the end of the active
                    // set, restoring R's triangularity with Givens
                    // rotations as columns shift left.
                    while t + 1 < nact {
                        let below = rmat[r_index(t + 1, t + 1)];
                        if below != 0.0 {
                            let a = rmat[r_index(t, t + 1)];
                            let (gc, gs, _rho) = givens(a, below);
                            if gc == 0.0 {
                                for j in (t + 1)..nact {
                                    rmat.swap(r_index(t, j), r_index(t + 1, j));
                                }
                                for i in 0..n {
                                    let tmp = dmat[[i, t]];
                                    dmat[[i, t]] = dmat[[i, t + 1]];
                                    dmat[[i, t + 1]] = tmp;
                                }
                            } else if gc != 1.0 {
                                let nu = gs / (1.0 + gc);
                                for j in (t + 1)..nact {
                                    let x = rmat[r_index(t, j)];
                                    let y = rmat[r_index(t + 1, j)];
                                    let tmp = gc * x + gs * y;
                                    rmat[r_index(t + 1, j)] = nu * (x + tmp) - y;
                                    rmat[r_index(t, j)] = tmp;
                                }
                                for i in 0..n {
                                    let x = dmat[[i, t]];
                                    let y = dmat[[i, t + 1]];
                                    let tmp = gc * x + gs * y;
                                    dmat[[i, t + 1]] = nu * (x + tmp) - y;
                                    dmat[[i, t]] = tmp;
                                }
                            }
                        }
                        for i in 0..=t {
                            rmat[r_index(i, t)] = rmat[r_index(i, t + 1)];
                        }
                        uv[t] = uv[t + 1];
                        iact[t] = iact[t + 1];
                        t += 1;
                    }
                    uv[nact - 1] = uv[nact];
                    uv[nact] = 0.0;
                    iact.pop();
                    deletions += 1;
                    trace!("dropped active constraint, active set size {}", iact.len());
                    step = Step::ComputeStep;
                }
            }
        }
    }
}

/// Givens rotation zeroing `b` against `a`, computed the way the reference
/// routine does (hypot via the larger magnitude, sign carried by `a`).
/// Caller guarantees `b != 0`.
fn givens(a: f64, b: f64) -> (f64, f64, f64) {
    let big = a.abs().max(b.abs());
    let small = a.abs().min(b.abs());
    let mut rho = big * (1.0 + (small / big) * (small / big)).sqrt();
    if a < 0.0 {
        rho = -rho;
    }
    (a / rho, b / rho, rho)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2, Array2};

    fn solve(problem: &QpProblem) -> Result<QpSolution, QpError> {
        ActiveSetQpSolver::new().solve(problem)
    }

    #[test]
    fn test_vsmall_is_effectively_zero_but_representable() {
        let vsmall = machine_vsmall();
        assert!(vsmall > 0.0);
        assert!(vsmall < 1e-12);
        assert!(1.0 + 0.1 * vsmall > 1.0);
        assert!(1.0 + 0.2 * vsmall > 1.0);
    }

    #[test]
    fn test_unconstrained_minimum_when_no_constraint_binds() {
        // min 1/2 x'x - d'x with slack constraints => x = d.
        let problem = QpProblem::new(
            Array2::eye(2),
            arr1(&[1.0, 2.0]),
            arr2(&[[1.0, 0.0], [0.0, 1.0]]),
            arr1(&[-10.0, -10.0]),
        )
        .unwrap();

        let solution = solve(&problem).unwrap();
        assert_relative_eq!(solution.solution[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(solution.solution[1], 2.0, epsilon = 1e-10);
        assert_eq!(solution.additions, 0);
        assert_relative_eq!(solution.lagrangian[0], 0.0);
    }

    #[test]
    fn test_single_binding_constraint() {
        // min 1/2 x'x subject to x0 >= 1 => x = (1, 0), multiplier 1.
        let problem = QpProblem::new(
            Array2::eye(2),
            arr1(&[0.0, 0.0]),
            arr2(&[[1.0, 0.0]]),
            arr1(&[1.0]),
        )
        .unwrap();

        let solution = solve(&problem).unwrap();
        assert_relative_eq!(solution.solution[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(solution.solution[1], 0.0, epsilon = 1e-10);
        assert_relative_eq!(solution.lagrangian[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(solution.value, 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_quadprog_reference_example() {
        // The example from the quadprog documentation:
        // D = I3, d = (0, 5, 0), constraints
        //   -4 x0 - 3 x1        >= -8
        //    2 x0 +   x1        >=  2
        //          - 2 x1 + x2  >=  0
        // Known solution (0.476190, 1.047619, 2.095238).
        let problem = QpProblem::new(
            Array2::eye(3),
            arr1(&[0.0, 5.0, 0.0]),
            arr2(&[
                [-4.0, -3.0, 0.0],
                [2.0, 1.0, 0.0],
                [0.0, -2.0, 1.0],
            ]),
            arr1(&[-8.0, 2.0, 0.0]),
        )
        .unwrap();

        let solution = solve(&problem).unwrap();
        assert_relative_eq!(solution.solution[0], 0.4761905, epsilon = 1e-6);
        assert_relative_eq!(solution.solution[1], 1.0476190, epsilon = 1e-6);
        assert_relative_eq!(solution.solution[2], 2.0952381, epsilon = 1e-6);
    }

    #[test]
    fn test_multipliers_satisfy_stationarity() {
        // At the optimum: D x - d = A' lambda, lambda >= 0.
        let amat = arr2(&[[-4.0, -3.0, 0.0], [2.0, 1.0, 0.0], [0.0, -2.0, 1.0]]);
        let problem = QpProblem::new(
            Array2::eye(3),
            arr1(&[0.0, 5.0, 0.0]),
            amat.clone(),
            arr1(&[-8.0, 2.0, 0.0]),
        )
        .unwrap();

        let solution = solve(&problem).unwrap();
        let residual =
            problem.dmat.dot(&solution.solution) - &problem.dvec - amat.t().dot(&solution.lagrangian);
        for i in 0..3 {
            assert_relative_eq!(residual[i], 0.0, epsilon = 1e-8);
        }
        for &l in &solution.lagrangian {
            assert!(l >= -1e-10);
        }
    }

    #[test]
    fn test_infeasible_constraints_are_reported() {
        // x >= 1 and -x >= 0 cannot both hold.
        let problem = QpProblem::new(
            Array2::eye(1),
            arr1(&[0.0]),
            arr2(&[[1.0], [-1.0]]),
            arr1(&[1.0, 0.0]),
        )
        .unwrap();

        assert_eq!(solve(&problem).unwrap_err(), QpError::Infeasible);
    }

    #[test]
    fn test_indefinite_matrix_is_rejected() {
        let problem = QpProblem::new(
            arr2(&[[1.0, 2.0], [2.0, 1.0]]),
            arr1(&[0.0, 0.0]),
            arr2(&[[1.0, 0.0]]),
            arr1(&[0.0]),
        )
        .unwrap();

        assert_eq!(
            solve(&problem).unwrap_err(),
            QpError::NotPositiveDefinite { order: 2 }
        );
    }

    #[test]
    fn test_equality_constraint_binds_from_either_side() {
        // min 1/2 x'x - d'x subject to x0 + x1 == 1 (row sign-normalized
        // internally). Unconstrained optimum (2, 2) violates from above.
        let problem = QpProblem::new(
            Array2::eye(2),
            arr1(&[2.0, 2.0]),
            arr2(&[[1.0, 1.0]]),
            arr1(&[1.0]),
        )
        .unwrap();

        let solution = ActiveSetQpSolver::new()
            .with_equality_count(1)
            .solve(&problem)
            .unwrap();
        assert_relative_eq!(
            solution.solution[0] + solution.solution[1],
            1.0,
            epsilon = 1e-10
        );
        assert_relative_eq!(solution.solution[0], 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_iteration_cap_raises_dedicated_error() {
        let problem = QpProblem::new(
            Array2::eye(2),
            arr1(&[0.0, 0.0]),
            arr2(&[[1.0, 0.0], [0.0, 1.0]]),
            arr1(&[1.0, 1.0]),
        )
        .unwrap();

        let err = ActiveSetQpSolver::new()
            .with_max_iterations(1)
            .solve(&problem)
            .unwrap_err();
        assert_eq!(err, QpError::IterationLimit { limit: 1 });
    }

    #[test]
    fn test_solver_is_deterministic() {
        let problem = QpProblem::new(
            arr2(&[[2.0, 0.3], [0.3, 1.5]]),
            arr1(&[1.0, 1.0]),
            arr2(&[[1.0, 0.0], [0.0, 1.0], [-1.0, -1.0]]),
            arr1(&[0.0, 0.0, -1.2]),
        )
        .unwrap();

        let first = solve(&problem).unwrap();
        let second = solve(&problem).unwrap();
        assert_eq!(first.solution, second.solution);
        assert_eq!(first.lagrangian, second.lagrangian);
        assert_eq!(first.value, second.value);
    }

    #[test]
    fn test_multiple_binding_constraints() {
        // min 1/2 ||x||^2 with x0 + x1 >= 2, x0 - x1 >= 0, x0 >= 1.5;
        // optimum (1.5, 0.5) with the first and third rows active.
        let problem = QpProblem::new(
            Array2::eye(2),
            arr1(&[0.0, 0.0]),
            arr2(&[[1.0, 1.0], [1.0, -1.0], [1.0, 0.0]]),
            arr1(&[2.0, 0.0, 1.5]),
        )
        .unwrap();

        let solution = solve(&problem).unwrap();
        assert_relative_eq!(solution.solution[0], 1.5, epsilon = 1e-10);
        assert_relative_eq!(solution.solution[1], 0.5, epsilon = 1e-10);
        let slack = problem.amat.dot(&solution.solution) - &problem.bvec;
        for i in 0..3 {
            assert!(slack[i] >= -1e-8, "constraint {i} violated: {}", slack[i]);
        }
    }
}
