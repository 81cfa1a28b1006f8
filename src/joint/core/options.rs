//! Joint options — tolerances and caps for estimation and rendering.
//!
//! Purpose
//! -------
//! Collect the numeric design parameters of a run in one validated value
//! instead of scattering literals through the reconciliation loop and the
//! renderer.
//!
//! Key behaviors
//! -------------
//! - [`JointOptions::new`] validates the convergence threshold, the
//!   iteration cap, and the display cutoff.
//! - [`JointOptions::default`] uses [`DEFAULT_EPSILON`],
//!   [`DEFAULT_MAX_ITERATIONS`] and [`DEFAULT_DISPLAY_THRESHOLD`].
//! - [`JointOptions::with_nnls`] overrides the regression backend settings.
//! - [`JointOptions::validate`] re-checks options built by struct literal;
//!   the reconciler calls it before iterating.
//!
//! Invariants & assumptions
//! ------------------------
//! - `epsilon` is finite and `> 0`.
//! - `max_iterations ≥ 1`.
//! - `display_threshold` is finite and `≥ 0`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the defaults, each rejection branch, and literal
//!   construction caught by `validate`.
use crate::{
    joint::errors::{JointError, JointResult},
    regression::nnls::NnlsConfig,
};

/// Convergence threshold on `Σ|A − B|` for the reconciliation loop.
pub const DEFAULT_EPSILON: f64 = 1e-6;
/// Hard cap on reconciliation iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;
/// Cells at or below this probability (0.05 %) render as `-`.
pub const DEFAULT_DISPLAY_THRESHOLD: f64 = 0.0005;

/// JointOptions — configuration of one estimation run.
///
/// Fields
/// ------
/// - `epsilon`: `f64`
///   The loop stops once the total absolute difference between the two
///   rescaled candidates drops below this value.
/// - `max_iterations`: `usize`
///   Hard cap on loop iterations; reaching it is reported, not raised.
/// - `display_threshold`: `f64`
///   Rendering cutoff used by the diagnostic table.
/// - `nnls`: [`NnlsConfig`]
///   Overrides for the non-negative regression backend.
///
/// Performance
/// -----------
/// - Small and `Copy`; pass by value freely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointOptions {
    pub epsilon: f64,
    pub max_iterations: usize,
    pub display_threshold: f64,
    pub nnls: NnlsConfig,
}

impl JointOptions {
    /// Construct validated options with the default regression backend.
    ///
    /// Errors
    /// ------
    /// - `JointError::InvalidEpsilon` when `epsilon` is non-finite or `≤ 0`.
    /// - `JointError::InvalidMaxIterations` when `max_iterations == 0`.
    /// - `JointError::InvalidDisplayThreshold` when `display_threshold` is
    ///   non-finite or negative.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use rust_ecoinference::joint::core::options::JointOptions;
    /// let opts = JointOptions::new(1e-8, 500, 0.001).unwrap();
    /// assert_eq!(opts.max_iterations, 500);
    /// assert!(JointOptions::new(0.0, 100, 0.001).is_err());
    /// ```
    pub fn new(epsilon: f64, max_iterations: usize, display_threshold: f64) -> JointResult<Self> {
        let nnls = NnlsConfig::default();
        let opts = JointOptions { epsilon, max_iterations, display_threshold, nnls };
        opts.validate()?;
        Ok(opts)
    }

    /// Re-check every field.
    ///
    /// The fields are public, so values assembled by struct literal or
    /// mutated after construction are checked again before a run.
    ///
    /// Errors
    /// ------
    /// - The same errors as [`JointOptions::new`].
    /// - `JointError::Regression` when the `nnls` overrides are invalid.
    pub fn validate(&self) -> JointResult<()> {
        if !self.epsilon.is_finite() {
            return Err(JointError::InvalidEpsilon {
                value: self.epsilon,
                reason: "Epsilon must be finite.",
            });
        }
        if self.epsilon <= 0.0 {
            return Err(JointError::InvalidEpsilon {
                value: self.epsilon,
                reason: "Epsilon must be strictly positive.",
            });
        }
        if self.max_iterations == 0 {
            return Err(JointError::InvalidMaxIterations { value: self.max_iterations });
        }
        if !self.display_threshold.is_finite() || self.display_threshold < 0.0 {
            return Err(JointError::InvalidDisplayThreshold {
                value: self.display_threshold,
                reason: "Display threshold must be finite and non-negative.",
            });
        }
        NnlsConfig::new(self.nnls.max_iter, self.nnls.tol)?;
        Ok(())
    }

    pub fn with_nnls(mut self, nnls: NnlsConfig) -> Self {
        self.nnls = nnls;
        self
    }
}

impl Default for JointOptions {
    fn default() -> Self {
        JointOptions {
            epsilon: DEFAULT_EPSILON,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            display_threshold: DEFAULT_DISPLAY_THRESHOLD,
            nnls: NnlsConfig::default(),
        }
    }
}
