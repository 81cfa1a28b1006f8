//! joint::directional — directional joint estimates via weighted NNLS.
//!
//! Purpose
//! -------
//! Approximate the joint table from one direction: each Y category's
//! per-unit share is fitted as a non-negative, zero-intercept, weighted
//! linear combination of the X category shares. Stacking the `m_y`
//! coefficient vectors as rows gives an `m_y × m_x` matrix whose entry
//! `(i, j)` is the contribution of X category `j` to Y category `i`.
//!
//! Key behaviors
//! -------------
//! - [`joint_xy`] fits every target column against one pre-weighted design
//!   and counts the fits that stopped at the iteration cap.
//! - [`directional_pair`] runs the fit in both directions and transposes
//!   the Y→X estimate so that both candidates are `m_y × m_x`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs come from a validated `UnitBatch` (aligned, finite,
//!   non-negative); the raw-view entry point re-validates through the
//!   regression backend.
//! - Rank deficiency and all-zero weights are not errors: unidentified
//!   coefficients resolve to zero, exchangeable predictors split evenly.
//! - Output entries are always `≥ 0`.
//! - A fit that hits the regression iteration cap still contributes its
//!   last iterate; it is counted in [`DirectionalEstimate::unconverged`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover exact recovery on perfectly associated data, output
//!   shape, the swap/transpose relation of `directional_pair`, the
//!   zero-weight boundary, and the unconverged-fit count.
use crate::{
    joint::{core::data::UnitBatch, errors::JointResult},
    regression::nnls::{NnlsConfig, WeightedDesign},
};
use ndarray::{Array2, ArrayView1, ArrayView2};

/// DirectionalEstimate — one directional candidate plus fit diagnostics.
///
/// Fields
/// ------
/// - `joint`: `Array2<f64>` — the candidate table.
/// - `unconverged`: `usize` — number of per-category fits that reached the
///   regression iteration cap before the optimality check passed.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalEstimate {
    pub joint: Array2<f64>,
    pub unconverged: usize,
}

/// Directional estimate with predictors `x` and targets `y`.
///
/// Parameters
/// ----------
/// - `x`: `ArrayView2<f64>` — `N × m_x` predictor shares.
/// - `y`: `ArrayView2<f64>` — `N × m_y` target shares.
/// - `w`: `ArrayView1<f64>` — length-`N` non-negative weights.
/// - `cfg`: `&NnlsConfig` — regression backend overrides.
///
/// Returns
/// -------
/// `JointResult<DirectionalEstimate>` whose table is `m_y × m_x`; row `i`
/// minimizes `Σₙ wₙ (xₙ·c − yₙᵢ)²` over `c ≥ 0`.
///
/// Errors
/// ------
/// - `JointError::Regression` for mismatched lengths or non-finite input.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use rust_ecoinference::joint::directional::joint_xy;
/// # use rust_ecoinference::regression::nnls::NnlsConfig;
/// let x = array![[1.0, 0.0], [0.0, 1.0]];
/// let y = array![[0.2, 0.8], [0.6, 0.4]];
/// let est = joint_xy(x.view(), y.view(), array![1.0, 1.0].view(), &NnlsConfig::default())
///     .unwrap();
/// assert_eq!(est.joint.dim(), (2, 2));
/// assert!((est.joint[[0, 1]] - 0.6).abs() < 1e-12);
/// assert_eq!(est.unconverged, 0);
/// ```
pub fn joint_xy(
    x: ArrayView2<f64>, y: ArrayView2<f64>, w: ArrayView1<f64>, cfg: &NnlsConfig,
) -> JointResult<DirectionalEstimate> {
    let design = WeightedDesign::new(x, w)?;
    let mut joint = Array2::<f64>::zeros((y.ncols(), x.ncols()));
    let mut unconverged = 0;
    for (target, mut row) in y.columns().into_iter().zip(joint.rows_mut()) {
        let fit = design.fit(target, cfg)?;
        if !fit.converged {
            unconverged += 1;
        }
        row.assign(&fit.coef);
    }
    Ok(DirectionalEstimate { joint, unconverged })
}

/// Both directional candidates for a batch, aligned to `m_y × m_x`.
///
/// Returns `(xy, yx_t)` where `xy = joint_xy(X, Y)` and
/// `yx_t = joint_xy(Y, X)` with its table transposed. Each keeps its own
/// unconverged-fit count.
pub fn directional_pair(
    batch: &UnitBatch, cfg: &NnlsConfig,
) -> JointResult<(DirectionalEstimate, DirectionalEstimate)> {
    let xy = joint_xy(batch.x(), batch.y(), batch.weights(), cfg)?;
    let yx = joint_xy(batch.y(), batch.x(), batch.weights(), cfg)?;
    let yx_t = DirectionalEstimate { joint: yx.joint.reversed_axes(), unconverged: yx.unconverged };
    Ok((xy, yx_t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Perfect co-occurrence yields the identity in both directions.
    //
    // Given
    // -----
    // - x = y = [[1,0],[0,1],[0.5,0.5]], equal weights.
    //
    // Expect
    // ------
    // - Both candidates ≈ I₂.
    fn directional_pair_recovers_identity_on_perfect_association() {
        // Arrange
        let shares = array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]];
        let batch = UnitBatch::new(shares.clone(), shares, array![10.0, 10.0, 10.0]).unwrap();

        // Act
        let (xy, yx_t) = directional_pair(&batch, &NnlsConfig::default()).unwrap();

        // Assert
        let eye = Array2::<f64>::eye(2);
        for ((i, j), &v) in eye.indexed_iter() {
            assert_abs_diff_eq!(xy.joint[[i, j]], v, epsilon = 1e-10);
            assert_abs_diff_eq!(yx_t.joint[[i, j]], v, epsilon = 1e-10);
        }
        assert_eq!((xy.unconverged, yx_t.unconverged), (0, 0));
    }

    #[test]
    // Purpose
    // -------
    // Output orientation is m_y × m_x for both candidates.
    fn directional_pair_aligns_orientation() {
        let x = array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let y = array![[0.9, 0.1], [0.2, 0.8], [0.5, 0.5]];
        let batch = UnitBatch::new(x, y, array![1.0, 2.0, 3.0]).unwrap();

        let (xy, yx_t) = directional_pair(&batch, &NnlsConfig::default()).unwrap();

        assert_eq!(xy.joint.dim(), (2, 3));
        assert_eq!(yx_t.joint.dim(), (2, 3));
        // With one-hot predictors each coefficient is the matching unit's share.
        assert_abs_diff_eq!(xy.joint[[0, 1]], 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(xy.joint[[1, 2]], 0.5, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A single zero-weight unit degrades to all-zero coefficients.
    fn joint_xy_zero_weight_unit_gives_zero_matrix() {
        let x = array![[0.3, 0.7]];
        let y = array![[0.6, 0.4]];

        let est =
            joint_xy(x.view(), y.view(), array![0.0].view(), &NnlsConfig::default()).unwrap();

        assert!(est.joint.iter().all(|&v| v == 0.0), "got {:?}", est.joint);
        assert_eq!(est.unconverged, 0);
    }

    #[test]
    // Purpose
    // -------
    // Coefficients are non-negative even when the data push them below zero.
    fn joint_xy_coefficients_are_nonnegative() {
        let x = array![[0.9, 0.1], [0.1, 0.9], [0.5, 0.5], [0.7, 0.3]];
        let y = array![[0.1, 0.9], [0.95, 0.05], [0.4, 0.6], [0.2, 0.8]];

        let w = array![5.0, 1.0, 2.0, 3.0];

        let est = joint_xy(x.view(), y.view(), w.view(), &NnlsConfig::default()).unwrap();

        assert!(est.joint.iter().all(|&v| v >= 0.0), "got {:?}", est.joint);
    }

    #[test]
    // Purpose
    // -------
    // A target reached exactly by a combination of non-leading predictor
    // categories is recovered instead of collapsing to zero.
    //
    // Given
    // -----
    // - Four units over three X categories; the second Y share equals
    //   x·[0, 1/3, 2/3] on every unit.
    //
    // Expect
    // ------
    // - Row 1 of the estimate ≈ [0, 1/3, 2/3]; every fit converged.
    fn joint_xy_recovers_exact_share_combination() {
        // Arrange
        let third = 1.0 / 3.0;
        let x = array![
            [third, third, third],
            [3.0 / 7.0, 1.0 / 7.0, 3.0 / 7.0],
            [0.5, 0.0, 0.5],
            [1.0, 0.0, 0.0]
        ];
        let y = array![[2.0 / 3.0, third], [2.0 / 3.0, third], [2.0 / 3.0, third], [1.0, 0.0]];
        let w = array![1.0, 1.0, 1.0, 1.0];

        // Act
        let est = joint_xy(x.view(), y.view(), w.view(), &NnlsConfig::default()).unwrap();

        // Assert
        assert_eq!(est.unconverged, 0);
        assert_abs_diff_eq!(est.joint[[1, 0]], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(est.joint[[1, 1]], third, epsilon = 1e-9);
        assert_abs_diff_eq!(est.joint[[1, 2]], 2.0 * third, epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Fits stopped by the regression iteration cap are counted, not hidden.
    //
    // Given
    // -----
    // - A one-iteration cap on a system whose optimum needs two columns.
    //
    // Expect
    // ------
    // - Every target column is reported unconverged; output stays ≥ 0.
    fn joint_xy_counts_fits_stopped_by_iteration_cap() {
        let x = array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]];
        let y = array![[0.6, 0.4], [0.3, 0.7], [0.45, 0.55]];
        let w = array![1.0, 1.0, 1.0];
        let cfg = NnlsConfig::new(Some(1), None).unwrap();

        let est = joint_xy(x.view(), y.view(), w.view(), &cfg).unwrap();

        assert_eq!(est.unconverged, 2);
        assert!(est.joint.iter().all(|&v| v >= 0.0));
    }

    #[test]
    // Purpose
    // -------
    // The Y→X candidate of a batch equals the transposed X→Y candidate of
    // the swapped batch, so the two directions are the same fit read from
    // opposite sides.
    fn directional_pair_on_swapped_batch_exchanges_candidates() {
        // Arrange
        let x = array![[0.7, 0.2, 0.1], [0.1, 0.8, 0.1], [0.3, 0.3, 0.4], [0.5, 0.1, 0.4]];
        let y = array![[0.8, 0.2], [0.15, 0.85], [0.45, 0.55], [0.6, 0.4]];
        let batch = UnitBatch::new(x, y, array![3.0, 2.0, 1.0, 4.0]).unwrap();
        let cfg = NnlsConfig::default();

        // Act
        let (xy, yx_t) = directional_pair(&batch, &cfg).unwrap();
        let (sw_xy, sw_yx_t) = directional_pair(&batch.swapped(), &cfg).unwrap();

        // Assert
        assert_eq!(sw_xy.joint.dim(), (3, 2));
        for ((i, j), &v) in yx_t.joint.indexed_iter() {
            assert_abs_diff_eq!(v, sw_xy.joint[[j, i]], epsilon = 1e-12);
        }
        for ((i, j), &v) in xy.joint.indexed_iter() {
            assert_abs_diff_eq!(v, sw_yx_t.joint[[j, i]], epsilon = 1e-12);
        }
    }
}
