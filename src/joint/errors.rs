//! joint::errors — error surface for joint-distribution estimation.
//!
//! Purpose
//! -------
//! Provide a single error enum and result alias for batch construction,
//! configuration, directional estimation, and reconciliation, plus the
//! conversion layer to Python exceptions used by the PyO3 bindings.
//!
//! Key behaviors
//! -------------
//! - Define [`JointResult`] and [`JointError`] as the canonical result and
//!   error types of the `joint` subtree.
//! - Wrap regression backend failures (`NnlsError`) without losing their
//!   message.
//! - Implement `From<JointError> for PyErr` (behind `python-bindings`),
//!   mapping every variant to `PyValueError` with the `Display` message.
//!
//! Invariants & assumptions
//! ------------------------
//! - Only structurally invalid input or configuration produces an error.
//!   Degenerate regressions, zero-mass rescales, and non-convergence of the
//!   reconciliation loop are reported through diagnostics instead.
//!
//! Conventions
//! -----------
//! - Messages are phrased as constraints ("must be non-negative", "must
//!   match") so they read well at the Python boundary.
//!
//! Testing notes
//! -------------
//! - Unit tests check that `Display` messages embed their payloads and that
//!   regression errors convert via `From`.
use crate::regression::errors::NnlsError;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, PyErr};

pub type JointResult<T> = Result<T, JointError>;

/// Which attribute a share-vector error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    X,
    Y,
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attribute::X => write!(f, "X"),
            Attribute::Y => write!(f, "Y"),
        }
    }
}

/// JointError — failures of joint-distribution estimation.
///
/// Variants
/// --------
/// - Batch shape: `EmptyBatch`, `BatchLengthMismatch`, `ShareWidthMismatch`,
///   `NoCategories`.
/// - Batch values: `InvalidShare`, `InvalidWeight`.
/// - Reconciler inputs: `MatrixShapeMismatch`, `InvalidMatrixEntry`.
/// - Configuration: `InvalidEpsilon`, `InvalidMaxIterations`,
///   `InvalidDisplayThreshold`, `EmptyCategoryKeys`, `DuplicateCategory`,
///   `KeyCountMismatch`.
/// - Backend: `Regression(NnlsError)`.
#[derive(Debug, Clone, PartialEq)]
pub enum JointError {
    // ---- Batch shape ----
    /// No unit survived into the batch.
    EmptyBatch,
    /// X rows, Y rows, and weights disagree on the number of units.
    BatchLengthMismatch { x_units: usize, y_units: usize, weights: usize },
    /// A unit's share vector has a different width than the first unit's.
    ShareWidthMismatch { attr: Attribute, unit: usize, expected: usize, found: usize },
    /// An attribute has zero categories.
    NoCategories { attr: Attribute },

    // ---- Batch values ----
    /// Share entries must be finite and non-negative.
    InvalidShare { attr: Attribute, unit: usize, category: usize, value: f64 },
    /// Weights must be finite and non-negative.
    InvalidWeight { unit: usize, value: f64 },

    // ---- Reconciler inputs ----
    /// The two candidate matrices differ in shape (or are empty).
    MatrixShapeMismatch { left: (usize, usize), right: (usize, usize) },
    /// Candidate matrix entries must be finite and non-negative.
    InvalidMatrixEntry { row: usize, col: usize, value: f64 },

    // ---- Configuration ----
    InvalidEpsilon { value: f64, reason: &'static str },
    InvalidMaxIterations { value: usize },
    InvalidDisplayThreshold { value: f64, reason: &'static str },
    EmptyCategoryKeys,
    DuplicateCategory { key: String },
    /// Attached category labels do not match the batch widths.
    KeyCountMismatch { attr: Attribute, keys: usize, categories: usize },

    // ---- Backend ----
    Regression(NnlsError),
}

impl std::error::Error for JointError {}

impl std::fmt::Display for JointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JointError::EmptyBatch => write!(f, "Batch must contain at least one unit."),
            JointError::BatchLengthMismatch { x_units, y_units, weights } => write!(
                f,
                "Batch lengths must match: {x_units} X rows, {y_units} Y rows, {weights} weights."
            ),
            JointError::ShareWidthMismatch { attr, unit, expected, found } => write!(
                f,
                "Unit {unit} has {found} {attr} categories; expected {expected} for every unit."
            ),
            JointError::NoCategories { attr } => {
                write!(f, "Attribute {attr} must have at least one category.")
            }
            JointError::InvalidShare { attr, unit, category, value } => write!(
                f,
                "Invalid {attr} share {value} at unit {unit}, category {category}. \
                 Must be finite and non-negative."
            ),
            JointError::InvalidWeight { unit, value } => {
                write!(f, "Invalid weight {value} at unit {unit}. Must be finite and non-negative.")
            }
            JointError::MatrixShapeMismatch { left, right } => write!(
                f,
                "Candidate matrices must share a non-empty shape: {}x{} vs {}x{}.",
                left.0, left.1, right.0, right.1
            ),
            JointError::InvalidMatrixEntry { row, col, value } => write!(
                f,
                "Invalid matrix entry {value} at ({row}, {col}). Must be finite and non-negative."
            ),
            JointError::InvalidEpsilon { value, reason } => {
                write!(f, "Invalid epsilon {value}: {reason}")
            }
            JointError::InvalidMaxIterations { value } => {
                write!(f, "Invalid max_iterations {value}. Must be at least 1.")
            }
            JointError::InvalidDisplayThreshold { value, reason } => {
                write!(f, "Invalid display threshold {value}: {reason}")
            }
            JointError::EmptyCategoryKeys => {
                write!(f, "Category keys must contain at least one key.")
            }
            JointError::DuplicateCategory { key } => {
                write!(f, "Category key '{key}' appears more than once.")
            }
            JointError::KeyCountMismatch { attr, keys, categories } => write!(
                f,
                "{keys} {attr} category keys supplied for {categories} {attr} categories."
            ),
            JointError::Regression(err) => write!(f, "Regression failed: {err}"),
        }
    }
}

impl From<NnlsError> for JointError {
    fn from(err: NnlsError) -> Self {
        JointError::Regression(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<JointError> for PyErr {
    fn from(err: JointError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
