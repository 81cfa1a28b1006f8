//! regression::nnls — weighted non-negative least squares (Lawson–Hanson).
//!
//! Purpose
//! -------
//! Solve `min_c ‖A c − b‖₂²` subject to `c ≥ 0` with no intercept, optionally
//! with per-row weights. This is the regression kernel behind the
//! directional joint estimator: each target category share is fitted as a
//! non-negative combination of predictor category shares.
//!
//! Key behaviors
//! -------------
//! - [`nnls`] runs the Lawson–Hanson active-set method on an unweighted
//!   design.
//! - [`WeightedDesign`] scales the design rows by `√wₙ` once so that many
//!   targets can be fitted against the same weighted predictors;
//!   [`nnls_weighted`] is the one-shot convenience wrapper.
//! - The passive-set subproblem is solved through an SVD (`nalgebra`), which
//!   yields the minimum-norm solution on rank-deficient subsets.
//! - One predictor enters the passive set per step (largest gradient). A
//!   predictor whose entry would give it a non-positive coefficient is set
//!   aside until the next successful step, so near-tied gradients cannot
//!   make the active set cycle.
//! - Once optimal, the solution is re-solved over the support plus every
//!   zero-gradient predictor, so exchangeable predictors receive a
//!   symmetric minimum-norm split instead of a winner-takes-all assignment.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are finite; weights are `≥ 0`. Violations are reported as
//!   [`NnlsError`], never as panics.
//! - Degenerate but well-formed systems (all-zero rows, zero weights,
//!   collinear predictors) are solved without error; unidentified
//!   coefficients resolve to zero.
//! - Reaching the iteration cap is not an error: the current iterate is
//!   returned with `converged == false`.
//!
//! Conventions
//! -----------
//! - Public entry points take `ndarray` views and return owned `Array1`
//!   coefficients; `nalgebra` is used internally for the SVD only.
//! - The default gradient tolerance is `10 · ε · ‖A‖₁ · max(rows, cols)`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover exact recovery, clipping of negative unconstrained
//!   solutions, weighting, zero weights, tie handling, and input errors.
use crate::regression::errors::{NnlsError, NnlsOutcome};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Relative band (against `max|Aᵀb|`) within which a gradient counts as zero
/// when spreading mass over exchangeable predictors.
pub const TIE_RTOL: f64 = 1e-12;

/// NnlsConfig — optional overrides for the Lawson–Hanson solver.
///
/// Fields
/// ------
/// - `max_iter`: `Option<usize>`
///   Cap on active-set changes. `None` uses `3 · n_cols` (at least 1).
/// - `tol`: `Option<f64>`
///   Gradient tolerance deciding optimality. `None` uses the scaled machine
///   epsilon described in the module docs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NnlsConfig {
    pub max_iter: Option<usize>,
    pub tol: Option<f64>,
}

impl NnlsConfig {
    /// Build a validated configuration.
    ///
    /// Errors
    /// ------
    /// - `NnlsError::InvalidMaxIter` when `max_iter == Some(0)`.
    /// - `NnlsError::InvalidTolerance` when `tol` is negative or non-finite.
    pub fn new(max_iter: Option<usize>, tol: Option<f64>) -> NnlsOutcome<Self> {
        if max_iter == Some(0) {
            return Err(NnlsError::InvalidMaxIter);
        }
        if let Some(t) = tol {
            if !t.is_finite() || t < 0.0 {
                return Err(NnlsError::InvalidTolerance { tol: t });
            }
        }
        Ok(NnlsConfig { max_iter, tol })
    }
}

/// NnlsResult — fitted coefficients plus solver diagnostics.
///
/// Fields
/// ------
/// - `coef`: `Array1<f64>`
///   Non-negative coefficient vector, one entry per design column.
/// - `residual_norm`: `f64`
///   `‖A c − b‖₂` on the (weighted) system that was solved.
/// - `iterations`: `usize`
///   Number of active-set updates performed.
/// - `converged`: `bool`
///   `true` when the optimality check passed before the iteration cap.
#[derive(Debug, Clone, PartialEq)]
pub struct NnlsResult {
    pub coef: Array1<f64>,
    pub residual_norm: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// WeightedDesign — predictor matrix pre-scaled by `√w` for repeated fits.
///
/// Purpose
/// -------
/// The directional estimator fits every target category against the same
/// predictors and weights. Scaling the design once and reusing it for each
/// target keeps the per-target cost to the active-set iterations alone.
///
/// Invariants
/// ----------
/// - `design` is `N × m` with `N ≥ 1`, `m ≥ 1`, all entries finite.
/// - `sqrt_w` has length `N` with finite, non-negative entries.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedDesign {
    design: Array2<f64>,
    sqrt_w: Array1<f64>,
}

impl WeightedDesign {
    /// Validate `x` and `w` and pre-scale the design rows.
    ///
    /// Errors
    /// ------
    /// - `NnlsError::EmptyDesign` when `x` has no rows or no columns.
    /// - `NnlsError::DimMismatch` when `w.len() != x.nrows()`.
    /// - `NnlsError::NonFiniteInput` for NaN/±∞ in `x` or `w`.
    /// - `NnlsError::NegativeWeight` for any `w[n] < 0`.
    pub fn new(x: ArrayView2<f64>, w: ArrayView1<f64>) -> NnlsOutcome<Self> {
        validate_design(x)?;
        if w.len() != x.nrows() {
            return Err(NnlsError::DimMismatch {
                what: "weights",
                expected: x.nrows(),
                found: w.len(),
            });
        }
        for (index, &value) in w.iter().enumerate() {
            if !value.is_finite() {
                return Err(NnlsError::NonFiniteInput { what: "weight", index, value });
            }
            if value < 0.0 {
                return Err(NnlsError::NegativeWeight { index, value });
            }
        }

        let sqrt_w = w.mapv(f64::sqrt);
        let design = &x * &sqrt_w.view().insert_axis(Axis(1));
        Ok(WeightedDesign { design, sqrt_w })
    }

    pub fn nrows(&self) -> usize {
        self.design.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.design.ncols()
    }

    /// Fit one target column against the weighted design.
    ///
    /// Errors
    /// ------
    /// - `NnlsError::DimMismatch` when `y.len() != self.nrows()`.
    /// - `NnlsError::NonFiniteInput` for NaN/±∞ in `y`.
    /// - Any error from the passive-set solve.
    pub fn fit(&self, y: ArrayView1<f64>, cfg: &NnlsConfig) -> NnlsOutcome<NnlsResult> {
        validate_target(y, self.nrows())?;
        let target = &y * &self.sqrt_w;
        solve_active_set(self.design.view(), target.view(), cfg)
    }
}

/// Solve `min ‖A c − b‖₂` subject to `c ≥ 0`.
///
/// Parameters
/// ----------
/// - `a`: `ArrayView2<f64>`
///   Design matrix, `rows × cols`, finite, non-empty.
/// - `b`: `ArrayView1<f64>`
///   Target of length `rows`, finite.
/// - `cfg`: `&NnlsConfig`
///   Iteration cap and tolerance overrides.
///
/// Returns
/// -------
/// `NnlsOutcome<NnlsResult>` with non-negative coefficients.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use rust_ecoinference::regression::nnls::{nnls, NnlsConfig};
/// let a = array![[1.0, 0.0], [0.0, 1.0]];
/// let b = array![1.0, -1.0];
/// let fit = nnls(a.view(), b.view(), &NnlsConfig::default()).unwrap();
/// assert!((fit.coef[0] - 1.0).abs() < 1e-12);
/// assert_eq!(fit.coef[1], 0.0);
/// ```
pub fn nnls(a: ArrayView2<f64>, b: ArrayView1<f64>, cfg: &NnlsConfig) -> NnlsOutcome<NnlsResult> {
    validate_design(a)?;
    validate_target(b, a.nrows())?;
    solve_active_set(a, b, cfg)
}

/// Weighted NNLS: minimize `Σₙ wₙ (xₙ·c − yₙ)²` subject to `c ≥ 0`.
pub fn nnls_weighted(
    x: ArrayView2<f64>, y: ArrayView1<f64>, w: ArrayView1<f64>, cfg: &NnlsConfig,
) -> NnlsOutcome<NnlsResult> {
    WeightedDesign::new(x, w)?.fit(y, cfg)
}

// ---- Helper methods ----

fn validate_design(a: ArrayView2<f64>) -> NnlsOutcome<()> {
    if a.nrows() == 0 || a.ncols() == 0 {
        return Err(NnlsError::EmptyDesign);
    }
    for (index, &value) in a.iter().enumerate() {
        if !value.is_finite() {
            return Err(NnlsError::NonFiniteInput { what: "design", index, value });
        }
    }
    Ok(())
}

fn validate_target(b: ArrayView1<f64>, rows: usize) -> NnlsOutcome<()> {
    if b.len() != rows {
        return Err(NnlsError::DimMismatch { what: "target", expected: rows, found: b.len() });
    }
    for (index, &value) in b.iter().enumerate() {
        if !value.is_finite() {
            return Err(NnlsError::NonFiniteInput { what: "target", index, value });
        }
    }
    Ok(())
}

/// `10 · ε · ‖A‖₁ · max(rows, cols)`, with `‖A‖₁` the maximum absolute column sum.
fn default_tolerance(a: ArrayView2<f64>) -> f64 {
    let norm1 = a
        .map_axis(Axis(0), |col| col.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0_f64, |acc, &v| acc.max(v));
    10.0 * f64::EPSILON * norm1 * a.nrows().max(a.ncols()) as f64
}

/// Lawson–Hanson active-set iterations on a validated system.
///
/// One column enters per outer step. A column whose own coefficient comes
/// back non-positive on entry is marked rejected until the next successful
/// step, which stops the solver from cycling on near-degenerate gradients.
fn solve_active_set(
    a: ArrayView2<f64>, b: ArrayView1<f64>, cfg: &NnlsConfig,
) -> NnlsOutcome<NnlsResult> {
    let cols = a.ncols();
    let max_iter = cfg.max_iter.unwrap_or((3 * cols).max(1));
    let tol = cfg.tol.unwrap_or_else(|| default_tolerance(a));

    let mut coef = Array1::<f64>::zeros(cols);
    let mut passive = vec![false; cols];
    let mut rejected = vec![false; cols];
    let mut iterations = 0;
    let mut converged = false;

    'outer: loop {
        let grad = a.t().dot(&(&b - &a.dot(&coef)));

        let entering = (0..cols)
            .filter(|&j| !passive[j] && !rejected[j])
            .fold(None, |best: Option<usize>, j| match best {
                Some(t) if grad[t] >= grad[j] => Some(t),
                _ => Some(j),
            });
        let t = match entering {
            Some(t) if grad[t] > tol => t,
            _ => {
                converged = true;
                break;
            }
        };
        if iterations >= max_iter {
            break;
        }
        iterations += 1;
        passive[t] = true;

        let mut first_pass = true;
        loop {
            let candidate = passive_least_squares(a, b, &passive)?;
            if first_pass && candidate[t] <= 0.0 {
                passive[t] = false;
                rejected[t] = true;
                continue 'outer;
            }
            first_pass = false;

            let feasible = (0..cols).filter(|&j| passive[j]).all(|j| candidate[j] > 0.0);
            if feasible {
                coef = candidate;
                rejected.iter_mut().for_each(|r| *r = false);
                break;
            }

            // Step from the current iterate toward the candidate until the
            // first passive coefficient hits zero; that column leaves.
            let mut alpha = 1.0_f64;
            let mut blocking = None;
            for j in (0..cols).filter(|&j| passive[j] && candidate[j] <= 0.0) {
                let denom = coef[j] - candidate[j];
                let ratio = if denom > 0.0 { coef[j] / denom } else { 0.0 };
                if blocking.is_none() || ratio < alpha {
                    alpha = ratio;
                    blocking = Some(j);
                }
            }
            coef = &coef + &((&candidate - &coef) * alpha);

            let scale = coef.iter().fold(1.0_f64, |acc, &v| acc.max(v.abs()));
            for j in 0..cols {
                if passive[j] && (Some(j) == blocking || coef[j] <= f64::EPSILON * scale) {
                    passive[j] = false;
                    coef[j] = 0.0;
                }
            }

            iterations += 1;
            if iterations >= max_iter {
                break 'outer;
            }
        }
    }

    coef.mapv_inplace(|v| v.max(0.0));
    if converged {
        coef = spread_over_flat_columns(a, b, coef, tol)?;
    }
    let residual = &b - &a.dot(&coef);
    let residual_norm = residual.dot(&residual).sqrt();
    Ok(NnlsResult { coef, residual_norm, iterations, converged })
}

/// Re-solve an optimal point over every column with a zero gradient.
///
/// Columns outside the support whose gradient vanishes (within
/// `max(tol, TIE_RTOL · max|Aᵀb|)`) can take mass without changing the
/// objective. The minimum-norm solve over support plus those columns splits
/// the mass symmetrically between exchangeable predictors. The result is
/// kept only if it stays non-negative and does not worsen the objective.
fn spread_over_flat_columns(
    a: ArrayView2<f64>, b: ArrayView1<f64>, coef: Array1<f64>, tol: f64,
) -> NnlsOutcome<Array1<f64>> {
    let grad = a.t().dot(&(&b - &a.dot(&coef)));
    let atb_max = a.t().dot(&b).iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()));
    let band = tol.max(TIE_RTOL * atb_max);

    let free: Vec<bool> =
        (0..coef.len()).map(|j| coef[j] > 0.0 || grad[j].abs() <= band).collect();
    if !(0..coef.len()).any(|j| free[j] && coef[j] == 0.0) {
        return Ok(coef);
    }

    let candidate = passive_least_squares(a, b, &free)?;
    let scale = candidate.iter().fold(1.0_f64, |acc, &v| acc.max(v.abs()));
    if candidate.iter().any(|&v| v < -TIE_RTOL * scale) {
        return Ok(coef);
    }
    let candidate = candidate.mapv(|v| v.max(0.0));

    let objective = |c: &Array1<f64>| {
        let r = &b - &a.dot(c);
        r.dot(&r)
    };
    if objective(&candidate) <= objective(&coef) * (1.0 + 1e-9) + 1e-15 {
        Ok(candidate)
    } else {
        Ok(coef)
    }
}

/// Minimum-norm least squares restricted to the passive columns; zero elsewhere.
fn passive_least_squares(
    a: ArrayView2<f64>, b: ArrayView1<f64>, passive: &[bool],
) -> NnlsOutcome<Array1<f64>> {
    let active_cols: Vec<usize> = (0..passive.len()).filter(|&j| passive[j]).collect();
    let mut full = Array1::<f64>::zeros(passive.len());
    if active_cols.is_empty() {
        return Ok(full);
    }

    let rows = a.nrows();
    let a_p = DMatrix::<f64>::from_fn(rows, active_cols.len(), |i, k| a[[i, active_cols[k]]]);
    let rhs = DVector::<f64>::from_iterator(rows, b.iter().copied());

    let svd = a_p.svd(true, true);
    let sigma_max = svd.singular_values.iter().fold(0.0_f64, |acc, &s| acc.max(s));
    let cutoff = sigma_max * rows.max(active_cols.len()) as f64 * f64::EPSILON;
    let solution =
        svd.solve(&rhs, cutoff).map_err(|text| NnlsError::LeastSquares { text: text.to_string() })?;

    for (k, &j) in active_cols.iter().enumerate() {
        full[j] = solution[k];
    }
    Ok(full)
}
