//! joint::core — validated inputs and configuration for joint estimation.
//!
//! Purpose
//! -------
//! Hold the building blocks shared by the estimation pipeline: the per-unit
//! share data, category key handling for count-based input, tunable options,
//! and the validation helpers that guard every entry point.
//!
//! Key behaviors
//! -------------
//! - [`data`]: [`UnitObservation`] and the column-aligned [`UnitBatch`].
//! - [`categories`]: [`CategoryKeys`], [`shares_from_counts`], and the
//!   fail-soft [`BatchBuilder`].
//! - [`options`]: [`JointOptions`] and its defaults.
//! - [`validation`]: shape and finiteness checks for batches and
//!   candidate matrices.
//!
//! Invariants & assumptions
//! ------------------------
//! - A constructed `UnitBatch` is aligned (`N` rows in both share matrices
//!   and `N` weights), non-empty, finite and non-negative.
//! - Shares are not required to sum to one per unit.
pub mod categories;
pub mod data;
pub mod options;
pub mod validation;

pub use self::categories::{shares_from_counts, shares_from_tables, BatchBuilder, CategoryKeys};
pub use self::data::{UnitBatch, UnitObservation};
pub use self::options::{
    JointOptions, DEFAULT_DISPLAY_THRESHOLD, DEFAULT_EPSILON, DEFAULT_MAX_ITERATIONS,
};
pub use self::validation::{validate_batch, validate_candidates};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_ecoinference::joint::core::prelude::*;
//
// to import the core input surface in a single line.

pub mod prelude {
    pub use super::categories::{BatchBuilder, CategoryKeys};
    pub use super::data::{UnitBatch, UnitObservation};
    pub use super::options::JointOptions;
}
