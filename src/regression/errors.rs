//! regression::errors — error surface for the non-negative least-squares backend.
//!
//! Purpose
//! -------
//! Give the NNLS solver a small, cloneable error enum so that malformed
//! regression inputs are reported as values instead of panics. Degenerate
//! but well-formed problems (rank deficiency, all-zero weights) are *not*
//! errors; the solver resolves them by driving coefficients to zero.
//!
//! Conventions
//! -----------
//! - Messages are phrased in terms of the regression inputs (rows, columns,
//!   weights) rather than solver internals.
//! - Higher layers wrap these values in `JointError::Regression`.

/// Result alias for NNLS routines.
pub type NnlsOutcome<T> = Result<T, NnlsError>;

/// NnlsError — failure conditions of the NNLS backend.
///
/// Variants
/// --------
/// - `EmptyDesign`
///   The design matrix has zero rows or zero columns.
/// - `DimMismatch { what, expected, found }`
///   A target or weight vector does not match the number of design rows.
/// - `NonFiniteInput { what, index, value }`
///   A design, target, or weight entry is NaN or ±∞.
/// - `NegativeWeight { index, value }`
///   A regression weight is below zero.
/// - `InvalidTolerance { tol }`
///   A user-supplied tolerance is negative or non-finite.
/// - `InvalidMaxIter`
///   A user-supplied iteration cap is zero.
/// - `LeastSquares { text }`
///   The passive-set least-squares subproblem could not be solved.
#[derive(Debug, Clone, PartialEq)]
pub enum NnlsError {
    EmptyDesign,
    DimMismatch { what: &'static str, expected: usize, found: usize },
    NonFiniteInput { what: &'static str, index: usize, value: f64 },
    NegativeWeight { index: usize, value: f64 },
    InvalidTolerance { tol: f64 },
    InvalidMaxIter,
    LeastSquares { text: String },
}

impl std::error::Error for NnlsError {}

impl std::fmt::Display for NnlsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NnlsError::EmptyDesign => {
                write!(f, "Design matrix must have at least one row and one column.")
            }
            NnlsError::DimMismatch { what, expected, found } => {
                write!(f, "Length of {what} ({found}) does not match design rows ({expected}).")
            }
            NnlsError::NonFiniteInput { what, index, value } => {
                write!(f, "Non-finite {what} value {value} at index {index}.")
            }
            NnlsError::NegativeWeight { index, value } => {
                write!(f, "Weight at index {index} is negative ({value}); weights must be >= 0.")
            }
            NnlsError::InvalidTolerance { tol } => {
                write!(f, "Invalid NNLS tolerance: {tol}. Must be finite and >= 0.")
            }
            NnlsError::InvalidMaxIter => {
                write!(f, "NNLS iteration cap must be at least 1.")
            }
            NnlsError::LeastSquares { text } => {
                write!(f, "Passive-set least-squares solve failed: {text}")
            }
        }
    }
}
