//! joint::core::validation — shared input guards for batches and candidate matrices.
//!
//! Purpose
//! -------
//! Centralize the structural checks that make a run fail fast: batch
//! alignment, share/weight sanity, and the shape and sign of the two
//! candidate matrices handed to the reconciler. Everything downstream of
//! these guards may assume aligned, finite, non-negative inputs.
//!
//! Conventions
//! -----------
//! - Checks stop at the first offending entry and report its position.
//! - Nothing here allocates beyond error construction.
use crate::joint::errors::{Attribute, JointError, JointResult};
use ndarray::{ArrayView1, ArrayView2};

/// Validate a batch of per-unit share matrices and weights.
///
/// Parameters
/// ----------
/// - `x`: `ArrayView2<f64>` — `N × m_x` X shares, one row per unit.
/// - `y`: `ArrayView2<f64>` — `N × m_y` Y shares.
/// - `weights`: `ArrayView1<f64>` — length-`N` unit weights.
///
/// Errors
/// ------
/// - `JointError::BatchLengthMismatch` when the three lengths disagree.
/// - `JointError::EmptyBatch` when `N == 0`.
/// - `JointError::NoCategories` when `m_x == 0` or `m_y == 0`.
/// - `JointError::InvalidShare` for a NaN, ±∞, or negative share.
/// - `JointError::InvalidWeight` for a NaN, ±∞, or negative weight.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use rust_ecoinference::joint::core::validation::validate_batch;
/// # use rust_ecoinference::joint::errors::JointError;
/// let x = array![[0.5, 0.5]];
/// let y = array![[1.0, 0.0]];
/// assert!(validate_batch(x.view(), y.view(), array![10.0].view()).is_ok());
///
/// let err = validate_batch(x.view(), y.view(), array![10.0, 2.0].view()).unwrap_err();
/// assert!(matches!(err, JointError::BatchLengthMismatch { .. }));
/// ```
pub fn validate_batch(
    x: ArrayView2<f64>, y: ArrayView2<f64>, weights: ArrayView1<f64>,
) -> JointResult<()> {
    if x.nrows() != y.nrows() || x.nrows() != weights.len() {
        return Err(JointError::BatchLengthMismatch {
            x_units: x.nrows(),
            y_units: y.nrows(),
            weights: weights.len(),
        });
    }
    if x.nrows() == 0 {
        return Err(JointError::EmptyBatch);
    }
    if x.ncols() == 0 {
        return Err(JointError::NoCategories { attr: Attribute::X });
    }
    if y.ncols() == 0 {
        return Err(JointError::NoCategories { attr: Attribute::Y });
    }

    validate_shares(x, Attribute::X)?;
    validate_shares(y, Attribute::Y)?;

    for (unit, &value) in weights.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(JointError::InvalidWeight { unit, value });
        }
    }
    Ok(())
}

/// Validate the two candidate matrices handed to the reconciler.
///
/// Both must share one non-empty shape and hold finite, non-negative
/// entries.
pub fn validate_candidates(a: ArrayView2<f64>, b: ArrayView2<f64>) -> JointResult<()> {
    if a.dim() != b.dim() || a.is_empty() {
        return Err(JointError::MatrixShapeMismatch { left: a.dim(), right: b.dim() });
    }
    validate_entries(a)?;
    validate_entries(b)
}

fn validate_entries(m: ArrayView2<f64>) -> JointResult<()> {
    for ((row, col), &value) in m.indexed_iter() {
        if !value.is_finite() || value < 0.0 {
            return Err(JointError::InvalidMatrixEntry { row, col, value });
        }
    }
    Ok(())
}

fn validate_shares(shares: ArrayView2<f64>, attr: Attribute) -> JointResult<()> {
    for ((unit, category), &value) in shares.indexed_iter() {
        if !value.is_finite() || value < 0.0 {
            return Err(JointError::InvalidShare { attr, unit, category, value });
        }
    }
    Ok(())
}
