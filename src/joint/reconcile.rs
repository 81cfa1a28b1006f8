//! joint::reconcile — biproportional fusion of two directional estimates.
//!
//! Purpose
//! -------
//! Fuse the X→Y and (transposed) Y→X candidate matrices into one joint
//! probability table. Each directional estimate respects only one
//! attribute's marginal structure; alternately rescaling both toward their
//! shared midpoint drives them toward a common table that approximately
//! respects both.
//!
//! Key behaviors
//! -------------
//! - [`normalize_rows`] rescales each row of a matrix to the row total of a
//!   target matrix, preserving within-row proportions.
//! - [`normalize_all`] divides a matrix by its grand total.
//! - [`reconcile`] runs the fixed-point loop:
//!   1. `Z = (A + B) / 2`;
//!   2. `A ← normalize_rows(Aᵀ, Zᵀ)ᵀ` (column totals of `Z`),
//!      `B ← normalize_rows(B, Z)` (row totals of `Z`);
//!   3. `A ← A / ΣA`, `B ← B / ΣB`;
//!   4. `diff = Σ|A − B|`;
//!   5. stop once `diff < epsilon` or after `max_iterations` iterations.
//!
//!   The midpoint `Z` of the last completed iteration is returned.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs share one non-empty shape and are finite and non-negative;
//!   this is checked up front.
//! - Zero-mass rows or columns are left at zero; no division by zero can
//!   produce NaN or ±∞ in the output.
//! - The returned matrix is divided by its grand total whenever that total
//!   is positive, so it sums to 1 even if the loop stopped on its first
//!   iteration with un-normalized inputs. All-zero inputs give an all-zero
//!   result.
//! - Hitting the iteration cap is a diagnostic outcome
//!   (`converged == false`), never an error.
//!
//! Conventions
//! -----------
//! - Matrices are oriented `m_y × m_x` (rows: Y categories), the orientation
//!   of the X→Y estimate.
//! - Diagnostics go to the supplied `slog::Logger`: per-iteration `diff` at
//!   trace, the final `diff`/`iterations` at debug, non-convergence at warn.
//!
//! Testing notes
//! -------------
//! - Identical inputs converge after one iteration with `diff == 0`.
//! - Zero rows/columns stay zero and never leak NaN.
//! - The iteration cap is honored and reported.
//! - `diff` is non-increasing across iterations on a positive example.
use crate::{
    joint::{
        core::{options::JointOptions, validation::validate_candidates},
        errors::JointResult,
    },
    logging,
};
use ndarray::{Array2, ArrayView2, Zip};
use slog::{debug, trace, warn, Logger};

/// Reconciliation — fused joint table plus loop diagnostics.
///
/// Fields
/// ------
/// - `joint`: `Array2<f64>` — fused table, same shape as the inputs.
/// - `diff`: `f64` — `Σ|A − B|` after the last iteration.
/// - `iterations`: `usize` — completed iterations (`1 ..= max_iterations`).
/// - `converged`: `bool` — `diff < epsilon`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub joint: Array2<f64>,
    pub diff: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Rescale every row of `m` to the corresponding row total of `target`.
///
/// Row `r` is multiplied by `Σ target[r] / Σ m[r]`. A row of `m` with zero
/// total has no mass to redistribute and is returned unchanged (zeros).
///
/// Panics
/// ------
/// - If `m` and `target` have different shapes.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use rust_ecoinference::joint::reconcile::normalize_rows;
/// let m = array![[1.0, 3.0], [0.0, 0.0]];
/// let t = array![[2.0, 2.0], [1.0, 1.0]];
/// let out = normalize_rows(m.view(), t.view());
/// assert_eq!(out, array![[1.0, 3.0], [0.0, 0.0]]);
/// ```
pub fn normalize_rows(m: ArrayView2<f64>, target: ArrayView2<f64>) -> Array2<f64> {
    assert_eq!(m.dim(), target.dim(), "normalize_rows: shape mismatch");
    let mut out = m.to_owned();
    for (mut row, target_row) in out.rows_mut().into_iter().zip(target.rows()) {
        let mass = row.sum();
        if mass > 0.0 {
            let k = target_row.sum() / mass;
            row.mapv_inplace(|v| v * k);
        }
    }
    out
}

/// Divide `m` by its grand total; a zero total leaves `m` unchanged.
pub fn normalize_all(m: ArrayView2<f64>) -> Array2<f64> {
    let total = m.sum();
    if total > 0.0 {
        m.mapv(|v| v / total)
    } else {
        m.to_owned()
    }
}

/// Total absolute difference `Σ|a − b|` over all cells.
pub fn total_abs_diff(a: ArrayView2<f64>, b: ArrayView2<f64>) -> f64 {
    Zip::from(&a).and(&b).fold(0.0, |acc, &x, &y| acc + (x - y).abs())
}

/// Fuse two candidate joint matrices; see the module docs for the loop.
///
/// Errors
/// ------
/// - Any error from [`JointOptions::validate`], e.g. a zero iteration cap.
/// - `JointError::MatrixShapeMismatch` when shapes differ or are empty.
/// - `JointError::InvalidMatrixEntry` for negative or non-finite entries.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use rust_ecoinference::joint::{core::options::JointOptions, reconcile::reconcile};
/// let a = array![[0.5, 0.0], [0.0, 0.5]];
/// let out = reconcile(a.view(), a.view(), &JointOptions::default()).unwrap();
/// assert!(out.converged);
/// assert_eq!(out.iterations, 1);
/// assert_eq!(out.joint, a);
/// ```
pub fn reconcile(
    a: ArrayView2<f64>, b: ArrayView2<f64>, opts: &JointOptions,
) -> JointResult<Reconciliation> {
    reconcile_logged(a, b, opts, &logging::discard())
}

/// [`reconcile`] with diagnostics sent to `log`.
pub fn reconcile_logged(
    a: ArrayView2<f64>, b: ArrayView2<f64>, opts: &JointOptions, log: &Logger,
) -> JointResult<Reconciliation> {
    opts.validate()?;
    validate_candidates(a, b)?;

    let mut a = a.to_owned();
    let mut b = b.to_owned();
    let mut z = Array2::<f64>::zeros(a.dim());
    let mut diff = f64::INFINITY;
    let mut iterations = 0;

    while iterations < opts.max_iterations {
        iterations += 1;

        z = (&a + &b) * 0.5;
        let a_cols = normalize_rows(a.t(), z.t()).reversed_axes();
        let b_rows = normalize_rows(b.view(), z.view());
        a = normalize_all(a_cols.view());
        b = normalize_all(b_rows.view());

        diff = total_abs_diff(a.view(), b.view());
        trace!(log, "reconcile step"; "iteration" => iterations, "diff" => diff);

        if diff < opts.epsilon {
            break;
        }
    }

    let converged = diff < opts.epsilon;
    if converged {
        debug!(log, "reconciled"; "diff" => diff, "iterations" => iterations);
    } else {
        warn!(log, "reconciliation hit iteration cap";
            "diff" => diff, "iterations" => iterations, "epsilon" => opts.epsilon);
    }

    let joint = normalize_all(z.view());
    Ok(Reconciliation { joint, diff, iterations, converged })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::errors::JointError;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Row/global normalization helpers including zero-mass rows.
    // - One-iteration convergence on identical inputs.
    // - Zero rows and all-zero inputs (no NaN leakage).
    // - Iteration cap reporting and monotone `diff` on a positive pair.
    // - Input validation, including options built without `new`.
    // -------------------------------------------------------------------------

    fn opts_with_cap(cap: usize) -> JointOptions {
        JointOptions::new(1e-6, cap, 0.0005).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Rows are rescaled to the target's row totals; proportions survive.
    fn normalize_rows_matches_target_row_totals() {
        // Arrange
        let m = array![[1.0, 1.0], [1.0, 3.0]];
        let t = array![[0.5, 0.5], [2.0, 6.0]];

        // Act
        let out = normalize_rows(m.view(), t.view());

        // Assert
        assert_eq!(out, array![[0.5, 0.5], [2.0, 6.0]]);
    }

    #[test]
    // Purpose
    // -------
    // A zero row in the source stays zero instead of becoming NaN.
    fn normalize_rows_zero_row_stays_zero() {
        let m = array![[0.0, 0.0], [1.0, 1.0]];
        let t = array![[1.0, 1.0], [1.0, 1.0]];

        let out = normalize_rows(m.view(), t.view());

        assert_eq!(out.row(0).to_vec(), vec![0.0, 0.0]);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    // Purpose
    // -------
    // Global normalization sums to one; zero matrices pass through.
    fn normalize_all_handles_positive_and_zero_mass() {
        let out = normalize_all(array![[1.0, 3.0]].view());
        assert_eq!(out, array![[0.25, 0.75]]);

        let zeros = Array2::<f64>::zeros((2, 2));
        assert_eq!(normalize_all(zeros.view()), zeros);
    }

    #[test]
    // Purpose
    // -------
    // Identical inputs agree after one iteration with zero difference.
    //
    // Given
    // -----
    // - A = B, un-normalized (sum 4).
    //
    // Expect
    // ------
    // - iterations == 1, diff == 0, converged.
    // - joint == A / 4.
    fn reconcile_identical_inputs_converge_in_one_iteration() {
        let a = array![[2.0, 0.0], [1.0, 1.0]];

        let out = reconcile(a.view(), a.view(), &JointOptions::default()).unwrap();

        assert_eq!(out.iterations, 1);
        assert_eq!(out.diff, 0.0);
        assert!(out.converged);
        assert_eq!(out.joint, array![[0.5, 0.0], [0.25, 0.25]]);
    }

    #[test]
    // Purpose
    // -------
    // A row with no mass in either candidate remains zero and the result
    // still sums to one without NaN.
    //
    // Given
    // -----
    // - A = [[1,0],[0,0]], B = [[0.5,0.5],[0,0]].
    //
    // Expect
    // ------
    // - joint = [[0.75, 0.25], [0, 0]]; loop runs to the cap (diff = 1).
    fn reconcile_zero_row_is_left_at_zero() {
        let a = array![[1.0, 0.0], [0.0, 0.0]];
        let b = array![[0.5, 0.5], [0.0, 0.0]];

        let out = reconcile(a.view(), b.view(), &JointOptions::default()).unwrap();

        assert!(out.joint.iter().all(|v| v.is_finite()));
        assert_abs_diff_eq!(out.joint[[0, 0]], 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(out.joint[[0, 1]], 0.25, epsilon = 1e-12);
        assert_eq!(out.joint.row(1).to_vec(), vec![0.0, 0.0]);
        assert!(!out.converged);
        assert_eq!(out.iterations, 100);
        assert_abs_diff_eq!(out.diff, 1.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // All-zero candidates produce an all-zero joint, not NaN.
    fn reconcile_all_zero_inputs_return_zeros() {
        let zeros = Array2::<f64>::zeros((2, 3));

        let out = reconcile(zeros.view(), zeros.view(), &JointOptions::default()).unwrap();

        assert_eq!(out.joint, zeros);
        assert_eq!(out.diff, 0.0);
        assert!(out.converged);
    }

    #[test]
    // Purpose
    // -------
    // The cap is honored and non-convergence is reported, not raised.
    fn reconcile_iteration_cap_is_reported() {
        let a = array![[0.4, 0.1], [0.2, 0.3]];
        let b = array![[0.3, 0.3], [0.1, 0.3]];

        let out = reconcile(a.view(), b.view(), &opts_with_cap(3)).unwrap();

        assert_eq!(out.iterations, 3);
        assert!(!out.converged);
        assert!(out.diff >= 1e-6);
        assert_abs_diff_eq!(out.joint.sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // `diff` never grows from one iteration to the next on a positive pair.
    //
    // Given
    // -----
    // - Two strictly positive 2×2 candidates.
    //
    // Expect
    // ------
    // - diff(k + 1) <= diff(k) for k = 1..30 (re-running with growing caps).
    fn reconcile_diff_is_non_increasing() {
        let a = array![[0.4, 0.1], [0.2, 0.3]];
        let b = array![[0.3, 0.3], [0.1, 0.3]];

        let diffs: Vec<f64> = (1..=30)
            .map(|cap| reconcile(a.view(), b.view(), &opts_with_cap(cap)).unwrap().diff)
            .collect();

        for pair in diffs.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-15, "diff increased: {pair:?}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Structural input problems are errors.
    fn reconcile_rejects_bad_candidates() {
        let a = array![[0.5, 0.5]];
        let b = array![[0.5], [0.5]];
        assert!(matches!(
            reconcile(a.view(), b.view(), &JointOptions::default()),
            Err(JointError::MatrixShapeMismatch { .. })
        ));

        let nan = array![[f64::NAN, 0.5]];
        assert!(matches!(
            reconcile(a.view(), nan.view(), &JointOptions::default()),
            Err(JointError::InvalidMatrixEntry { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Options built by struct literal with a zero cap are rejected instead of
    // returning an all-zero table with an infinite diff.
    fn reconcile_rejects_zero_iteration_cap_from_literal() {
        let a = array![[0.2, 0.3], [0.1, 0.4]];
        let opts = JointOptions { max_iterations: 0, ..JointOptions::default() };

        let result = reconcile(a.view(), a.view(), &opts);

        assert_eq!(result, Err(JointError::InvalidMaxIterations { value: 0 }));
    }
}
