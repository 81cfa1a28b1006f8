//! Unit observations and validated estimation batches.
//!
//! Purpose
//! -------
//! Provide the input containers of the joint estimator: one
//! [`UnitObservation`] per geographic or logical unit, and a [`UnitBatch`]
//! that stacks all units into aligned share matrices plus a weight vector.
//!
//! Key behaviors
//! -------------
//! - [`UnitObservation::new`] checks one unit's share vectors and weight.
//! - [`UnitBatch::new`] validates matrices supplied directly;
//!   [`UnitBatch::from_observations`] additionally checks that every unit has
//!   the same number of X and Y categories.
//! - [`UnitBatch::swapped`] exchanges the roles of X and Y, giving the batch
//!   of the transposed problem (estimating `P(Y, X)` instead of `P(X, Y)`).
//!   The Y→X directional fit does not use it; it reads the views directly.
//!
//! Invariants & assumptions
//! ------------------------
//! - `N ≥ 1` units, `m_x ≥ 1` and `m_y ≥ 1` categories.
//! - Every share is finite and `≥ 0`; every weight is finite and `≥ 0`.
//! - Shares are *expected* to sum to roughly 1 per unit, but this is not
//!   enforced.
//! - Batches are immutable after construction.
//!
//! Conventions
//! -----------
//! - Row `n` of `x`, `y` and entry `n` of `weights` describe the same unit.
//! - Category order is positional and fixed by the caller (see
//!   `joint::core::categories`).
//!
//! Testing notes
//! -------------
//! - Unit tests cover construction from matrices and observations, width
//!   mismatches, and the swap.
use crate::joint::{
    core::validation::validate_batch,
    errors::{Attribute, JointError, JointResult},
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// UnitObservation — share vectors and weight of a single unit.
///
/// Fields
/// ------
/// - `x_shares`: `Array1<f64>` — one share per X category.
/// - `y_shares`: `Array1<f64>` — one share per Y category.
/// - `weight`: `f64` — unit weight (e.g. population).
#[derive(Debug, Clone, PartialEq)]
pub struct UnitObservation {
    pub x_shares: Array1<f64>,
    pub y_shares: Array1<f64>,
    pub weight: f64,
}

impl UnitObservation {
    /// Construct a validated observation.
    ///
    /// Errors
    /// ------
    /// - `JointError::NoCategories` when either share vector is empty.
    /// - `JointError::InvalidShare` for a non-finite or negative share
    ///   (reported with `unit = 0`).
    /// - `JointError::InvalidWeight` for a non-finite or negative weight.
    pub fn new(x_shares: Array1<f64>, y_shares: Array1<f64>, weight: f64) -> JointResult<Self> {
        for (shares, attr) in [(&x_shares, Attribute::X), (&y_shares, Attribute::Y)] {
            if shares.is_empty() {
                return Err(JointError::NoCategories { attr });
            }
            for (category, &value) in shares.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(JointError::InvalidShare { attr, unit: 0, category, value });
                }
            }
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(JointError::InvalidWeight { unit: 0, value: weight });
        }
        Ok(UnitObservation { x_shares, y_shares, weight })
    }
}

/// UnitBatch — aligned share matrices and weights for one estimation run.
///
/// Purpose
/// -------
/// Hold the full input of the estimator in the layout the regression step
/// consumes: units as rows, categories as columns.
///
/// Fields
/// ------
/// - `x`: `Array2<f64>` — `N × m_x` X shares.
/// - `y`: `Array2<f64>` — `N × m_y` Y shares.
/// - `weights`: `Array1<f64>` — length-`N` weights.
///
/// Invariants
/// ----------
/// - All invariants listed in the module docs hold for every constructed
///   value; fields are private so they cannot be broken afterwards.
///
/// Performance
/// -----------
/// - Validation is a single O(N · (m_x + m_y)) scan.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitBatch {
    x: Array2<f64>,
    y: Array2<f64>,
    weights: Array1<f64>,
}

impl UnitBatch {
    /// Construct a batch from pre-assembled matrices.
    ///
    /// Errors
    /// ------
    /// - Any error from [`validate_batch`].
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use ndarray::array;
    /// # use rust_ecoinference::joint::core::data::UnitBatch;
    /// let batch = UnitBatch::new(
    ///     array![[1.0, 0.0], [0.0, 1.0]],
    ///     array![[0.7, 0.3], [0.1, 0.9]],
    ///     array![100.0, 250.0],
    /// )
    /// .unwrap();
    /// assert_eq!((batch.n_units(), batch.m_x(), batch.m_y()), (2, 2, 2));
    /// ```
    pub fn new(x: Array2<f64>, y: Array2<f64>, weights: Array1<f64>) -> JointResult<Self> {
        validate_batch(x.view(), y.view(), weights.view())?;
        Ok(UnitBatch { x, y, weights })
    }

    /// Stack validated observations into a batch.
    ///
    /// Errors
    /// ------
    /// - `JointError::EmptyBatch` when `units` is empty.
    /// - `JointError::ShareWidthMismatch` when a unit's X or Y width differs
    ///   from the first unit's.
    pub fn from_observations(units: &[UnitObservation]) -> JointResult<Self> {
        let first = units.first().ok_or(JointError::EmptyBatch)?;
        let (m_x, m_y) = (first.x_shares.len(), first.y_shares.len());

        let mut x = Array2::<f64>::zeros((units.len(), m_x));
        let mut y = Array2::<f64>::zeros((units.len(), m_y));
        let mut weights = Array1::<f64>::zeros(units.len());

        for (unit, obs) in units.iter().enumerate() {
            if obs.x_shares.len() != m_x {
                return Err(JointError::ShareWidthMismatch {
                    attr: Attribute::X,
                    unit,
                    expected: m_x,
                    found: obs.x_shares.len(),
                });
            }
            if obs.y_shares.len() != m_y {
                return Err(JointError::ShareWidthMismatch {
                    attr: Attribute::Y,
                    unit,
                    expected: m_y,
                    found: obs.y_shares.len(),
                });
            }
            x.row_mut(unit).assign(&obs.x_shares);
            y.row_mut(unit).assign(&obs.y_shares);
            weights[unit] = obs.weight;
        }

        UnitBatch::new(x, y, weights)
    }

    /// The same units with X and Y exchanged.
    pub fn swapped(&self) -> UnitBatch {
        UnitBatch { x: self.y.clone(), y: self.x.clone(), weights: self.weights.clone() }
    }

    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    pub fn y(&self) -> ArrayView2<'_, f64> {
        self.y.view()
    }

    pub fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    pub fn n_units(&self) -> usize {
        self.weights.len()
    }

    /// Number of X categories.
    pub fn m_x(&self) -> usize {
        self.x.ncols()
    }

    /// Number of Y categories.
    pub fn m_y(&self) -> usize {
        self.y.ncols()
    }
}
