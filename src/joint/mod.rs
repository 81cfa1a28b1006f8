//! joint — joint distribution of two categorical attributes from marginals.
//!
//! Purpose
//! -------
//! Estimate the joint probability table `P(X = i, Y = j)` of two categorical
//! attributes when only per-unit marginal shares of each attribute are
//! observed (ecological inference). Each unit (for example a polling
//! division) reports the share of its population in every X category and
//! every Y category, plus a non-negative weight.
//!
//! Key behaviors
//! -------------
//! - [`directional`] fits one attribute's shares as a non-negative weighted
//!   linear combination of the other's, in both directions.
//! - [`reconcile`] fuses the two directional estimates with an alternating
//!   biproportional scaling loop into one table summing to 1.
//! - [`estimator`] composes the pipeline and memoizes the result per
//!   [`JointEstimator`] instance.
//! - [`render`] formats tables as tab-separated percentages for diagnostics.
//! - [`errors`] defines [`JointError`] / [`JointResult`].
//!
//! Invariants & assumptions
//! ------------------------
//! - The public joint table is `m_x × m_y` (rows: X categories, columns:
//!   Y categories); the intermediate candidates are `m_y × m_x`.
//! - Swapping X and Y transposes the joint table exactly.
//! - Every entry of every returned matrix is finite and `≥ 0`.
//!
//! Conventions
//! -----------
//! - Invalid input is rejected at construction with a typed error; numeric
//!   degeneracy (rank deficiency, zero weights, non-convergence) is never an
//!   error and is reported through outcome flags and the logger.
pub mod core;
pub mod directional;
pub mod errors;
pub mod estimator;
pub mod reconcile;
pub mod render;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{BatchBuilder, CategoryKeys, JointOptions, UnitBatch, UnitObservation};
pub use self::directional::{directional_pair, joint_xy, DirectionalEstimate};
pub use self::errors::{Attribute, JointError, JointResult};
pub use self::estimator::{estimate_joint, JointEstimator, JointOutcome};
pub use self::reconcile::{reconcile, Reconciliation};
pub use self::render::{render_matrix, JointTable};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_ecoinference::joint::prelude::*;
//
// to import the main estimation surface in a single line.

pub mod prelude {
    pub use super::{
        estimate_joint, BatchBuilder, CategoryKeys, JointError, JointEstimator, JointOptions,
        JointOutcome, JointResult, UnitBatch, UnitObservation,
    };
}
