//! regression — non-negative least squares with observation weights.
//!
//! Purpose
//! -------
//! Provide the constrained regression backend used by the directional
//! estimator: minimize `‖√W (A x − b)‖²` subject to `x ≥ 0`.
//!
//! Key behaviors
//! -------------
//! - [`nnls`] implements a Lawson–Hanson active-set solver on `nalgebra`
//!   with SVD-based passive-set solves, so rank-deficient designs give the
//!   minimum-norm solution instead of failing.
//! - [`WeightedDesign`] pre-scales a design by `√w` once and fits many
//!   targets against it.
//! - [`errors`] defines [`NnlsError`] / [`NnlsOutcome`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs must be finite; weights must be non-negative.
//! - Returned coefficients are always `≥ 0`. Reaching the iteration cap is
//!   reported as `converged == false`, not as an error.
pub mod errors;
pub mod nnls;

pub use self::errors::{NnlsError, NnlsOutcome};
pub use self::nnls::{nnls, nnls_weighted, NnlsConfig, NnlsResult, WeightedDesign};
