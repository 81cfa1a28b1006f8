//! joint::estimator — end-to-end joint estimation with a memoized result.
//!
//! Purpose
//! -------
//! Compose the pure pipeline (directional fit in both directions, then
//! biproportional reconciliation) and offer it through an estimator object
//! that computes the joint table lazily on first access and caches it for
//! the lifetime of the instance.
//!
//! Key behaviors
//! -------------
//! - [`estimate_joint`] is the stateless pipeline: `UnitBatch` →
//!   [`JointOutcome`].
//! - [`JointEstimator`] owns a batch, options, optional category keys and a
//!   logger; [`JointEstimator::outcome`] runs the pipeline once and returns
//!   the cached outcome thereafter.
//! - The joint table is exposed as `m_x × m_y` (rows: X categories,
//!   columns: Y categories).
//!
//! Invariants & assumptions
//! ------------------------
//! - The cache lives in a per-instance `OnceLock`; constructing a new
//!   estimator is the only way to recompute. There is no global cache.
//! - The pipeline is deterministic: equal batches and options give
//!   bit-identical tables.
//! - `JointEstimator` is `Send + Sync`, so independent runs (e.g. different
//!   attribute pairs) can be evaluated on separate threads without
//!   coordination.
//!
//! Downstream usage
//! ----------------
//! ```rust
//! # use ndarray::array;
//! # use rust_ecoinference::joint::{core::data::UnitBatch, estimator::JointEstimator};
//! let batch = UnitBatch::new(
//!     array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]],
//!     array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]],
//!     array![10.0, 10.0, 10.0],
//! )
//! .unwrap();
//! let est = JointEstimator::new(batch, Default::default());
//! let joint = est.joint().unwrap();
//! assert!(joint[[0, 0]] > 0.49 && joint[[0, 1]] < 1e-9);
//! ```
//!
//! Testing notes
//! -------------
//! - Unit tests cover caching, key attachment, and rendering; the end-to-end
//!   scenarios (diagonal dominance, uniform inputs, symmetry, zero weight)
//!   live in `tests/integration_joint_pipeline.rs`.
use crate::{
    joint::{
        core::{
            categories::{BatchBuilder, CategoryKeys},
            data::UnitBatch,
            options::JointOptions,
        },
        directional::directional_pair,
        errors::{Attribute, JointError, JointResult},
        reconcile::reconcile_logged,
        render::JointTable,
    },
    logging,
};
use ndarray::Array2;
use slog::{debug, info, o, warn, Logger};
use std::sync::OnceLock;

/// JointOutcome — fused joint table plus the intermediate estimates.
///
/// Fields
/// ------
/// - `joint`: `Array2<f64>` — `m_x × m_y` joint probability table.
/// - `xy`: `Array2<f64>` — X→Y directional estimate, `m_y × m_x`.
/// - `yx`: `Array2<f64>` — Y→X directional estimate transposed to `m_y × m_x`.
/// - `diff`: `f64` — final `Σ|A − B|` of the reconciliation loop.
/// - `iterations`: `usize` — reconciliation iterations performed.
/// - `converged`: `bool` — whether `diff < epsilon` was reached.
/// - `xy_unconverged`, `yx_unconverged`: `usize` — per-direction count of
///   category fits that hit the regression iteration cap.
#[derive(Debug, Clone, PartialEq)]
pub struct JointOutcome {
    pub joint: Array2<f64>,
    pub xy: Array2<f64>,
    pub yx: Array2<f64>,
    pub diff: f64,
    pub iterations: usize,
    pub converged: bool,
    pub xy_unconverged: usize,
    pub yx_unconverged: usize,
}

/// Run the full pipeline on `batch`.
///
/// Errors
/// ------
/// - `JointError::Regression` if the regression backend rejects the batch.
/// - Reconciler input errors cannot occur for validated batches but are
///   propagated if they do.
pub fn estimate_joint(
    batch: &UnitBatch, opts: &JointOptions, log: &Logger,
) -> JointResult<JointOutcome> {
    info!(log, "estimating joint";
        "units" => batch.n_units(), "m_x" => batch.m_x(), "m_y" => batch.m_y());

    let (xy, yx) = directional_pair(batch, &opts.nnls)?;
    debug!(log, "directional estimates";
        "xy_mass" => xy.joint.sum(), "yx_mass" => yx.joint.sum());
    if xy.unconverged > 0 || yx.unconverged > 0 {
        warn!(log, "regression fits stopped at the iteration cap";
            "xy_unconverged" => xy.unconverged, "yx_unconverged" => yx.unconverged);
    }

    let rec = reconcile_logged(xy.joint.view(), yx.joint.view(), opts, log)?;
    let joint = rec.joint.t().as_standard_layout().into_owned();

    Ok(JointOutcome {
        joint,
        xy: xy.joint,
        yx: yx.joint,
        diff: rec.diff,
        iterations: rec.iterations,
        converged: rec.converged,
        xy_unconverged: xy.unconverged,
        yx_unconverged: yx.unconverged,
    })
}

/// JointEstimator — batch-bound estimator with a lazily computed result.
///
/// Purpose
/// -------
/// Hold one estimation problem and its configuration, computing the joint
/// table on first request and serving the cached value afterwards.
///
/// Fields
/// ------
/// - `batch`: [`UnitBatch`] — validated input.
/// - `opts`: [`JointOptions`] — tolerances and rendering cutoff.
/// - `keys`: optional `(x_keys, y_keys)` used for labeled rendering.
/// - `logger`: `slog::Logger` for diagnostics (discard by default).
/// - `cache`: `OnceLock<JointOutcome>` — the memoized outcome.
#[derive(Debug)]
pub struct JointEstimator {
    batch: UnitBatch,
    opts: JointOptions,
    keys: Option<(CategoryKeys, CategoryKeys)>,
    logger: Logger,
    cache: OnceLock<JointOutcome>,
}

impl JointEstimator {
    pub fn new(batch: UnitBatch, opts: JointOptions) -> Self {
        JointEstimator {
            batch,
            opts,
            keys: None,
            logger: logging::discard(),
            cache: OnceLock::new(),
        }
    }

    /// Build from a [`BatchBuilder`], attaching its category keys.
    ///
    /// Errors
    /// ------
    /// - `JointError::EmptyBatch` when the builder accepted no unit.
    pub fn from_builder(builder: &BatchBuilder, opts: JointOptions) -> JointResult<Self> {
        let batch = builder.build()?;
        JointEstimator::new(batch, opts)
            .with_keys(builder.x_keys().clone(), builder.y_keys().clone())
    }

    pub fn with_logger(mut self, logger: &Logger) -> Self {
        self.logger = logger.new(o!("component" => "joint_estimator"));
        self
    }

    /// Attach category labels for rendering.
    ///
    /// Errors
    /// ------
    /// - `JointError::KeyCountMismatch` when a key list does not match the
    ///   batch's category count for that attribute.
    pub fn with_keys(mut self, x_keys: CategoryKeys, y_keys: CategoryKeys) -> JointResult<Self> {
        if x_keys.len() != self.batch.m_x() {
            return Err(JointError::KeyCountMismatch {
                attr: Attribute::X,
                keys: x_keys.len(),
                categories: self.batch.m_x(),
            });
        }
        if y_keys.len() != self.batch.m_y() {
            return Err(JointError::KeyCountMismatch {
                attr: Attribute::Y,
                keys: y_keys.len(),
                categories: self.batch.m_y(),
            });
        }
        self.keys = Some((x_keys, y_keys));
        Ok(self)
    }

    pub fn batch(&self) -> &UnitBatch {
        &self.batch
    }

    pub fn options(&self) -> &JointOptions {
        &self.opts
    }

    pub fn keys(&self) -> Option<(&CategoryKeys, &CategoryKeys)> {
        self.keys.as_ref().map(|(x, y)| (x, y))
    }

    /// Whether the outcome has already been computed.
    pub fn is_computed(&self) -> bool {
        self.cache.get().is_some()
    }

    /// The full outcome, computed on first call and cached afterwards.
    pub fn outcome(&self) -> JointResult<&JointOutcome> {
        if let Some(outcome) = self.cache.get() {
            return Ok(outcome);
        }
        let computed = estimate_joint(&self.batch, &self.opts, &self.logger)?;
        // A concurrent caller may have won the race; both results are identical.
        Ok(self.cache.get_or_init(|| computed))
    }

    /// The `m_x × m_y` joint probability table.
    pub fn joint(&self) -> JointResult<&Array2<f64>> {
        Ok(&self.outcome()?.joint)
    }

    /// Diagnostic table of the joint, labeled when keys are attached.
    pub fn render(&self) -> JointResult<String> {
        let joint = self.joint()?;
        let table = JointTable::new(joint.view()).threshold(self.opts.display_threshold);
        let table = match &self.keys {
            Some((x_keys, y_keys)) => table.labels(x_keys.as_slice(), y_keys.as_slice()),
            None => table,
        };
        Ok(table.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::nnls::NnlsConfig;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use std::collections::HashMap;

    fn diagonal_batch() -> UnitBatch {
        let shares = array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]];
        UnitBatch::new(shares.clone(), shares, array![10.0, 10.0, 10.0]).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // The outcome is computed lazily and the same allocation is served on
    // every later call.
    fn outcome_is_lazy_and_memoized() {
        // Arrange
        let est = JointEstimator::new(diagonal_batch(), JointOptions::default());
        assert!(!est.is_computed());

        // Act
        let first = est.outcome().unwrap() as *const JointOutcome;
        let second = est.outcome().unwrap() as *const JointOutcome;

        // Assert
        assert!(est.is_computed());
        assert_eq!(first, second);
    }

    #[test]
    // Purpose
    // -------
    // The diagonal scenario fuses to I/2 and reports convergence.
    fn estimate_joint_diagonal_scenario() {
        let out = estimate_joint(&diagonal_batch(), &JointOptions::default(), &logging::discard())
            .unwrap();

        assert!(out.converged);
        assert_eq!((out.xy_unconverged, out.yx_unconverged), (0, 0));
        assert_abs_diff_eq!(out.joint[[0, 0]], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(out.joint[[1, 1]], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(out.joint[[0, 1]], 0.0, epsilon = 1e-9);
        assert_eq!(out.xy.dim(), (2, 2));
    }

    #[test]
    // Purpose
    // -------
    // Regression fits stopped by a tight iteration cap are reported per
    // direction while the table stays a valid distribution.
    //
    // Given
    // -----
    // - X→Y fits need both predictor columns; Y→X fits need only one.
    // - NNLS cap of 1.
    //
    // Expect
    // ------
    // - Two unconverged X→Y fits, none for Y→X; the joint sums to 1.
    fn estimate_joint_reports_unconverged_fits() {
        // Arrange
        let x = array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]];
        let y = array![[0.6, 0.4], [0.3, 0.7], [0.45, 0.55]];
        let batch = UnitBatch::new(x, y, array![1.0, 1.0, 1.0]).unwrap();
        let nnls = NnlsConfig::new(Some(1), None).unwrap();
        let opts = JointOptions::default().with_nnls(nnls);

        // Act
        let out = estimate_joint(&batch, &opts, &logging::discard()).unwrap();

        // Assert
        assert_eq!(out.xy_unconverged, 2);
        assert_eq!(out.yx_unconverged, 0);
        assert_abs_diff_eq!(out.joint.sum(), 1.0, epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Keys must match the category counts of the batch.
    fn with_keys_checks_counts() {
        let est = JointEstimator::new(diagonal_batch(), JointOptions::default());

        let result = est.with_keys(
            CategoryKeys::new(["a", "b", "c"]).unwrap(),
            CategoryKeys::new(["x", "y"]).unwrap(),
        );

        assert!(matches!(
            result,
            Err(JointError::KeyCountMismatch { attr: Attribute::X, keys: 3, categories: 2 })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Building from counts attaches keys and renders a labeled table.
    fn from_builder_renders_labeled_table() {
        // Arrange
        let x_keys = CategoryKeys::new(["buddhist", "hindu"]).unwrap();
        let y_keys = CategoryKeys::new(["sinhalese", "tamil"]).unwrap();
        let mut builder = BatchBuilder::new(x_keys, y_keys);
        let counts = |k1: &str, a: f64, k2: &str, b: f64| {
            HashMap::from([(k1.to_string(), a), (k2.to_string(), b)])
        };
        let unit = |a, b| counts("buddhist", a, "hindu", b);
        let ethn = |a, b| counts("sinhalese", a, "tamil", b);
        builder.push(&unit(10.0, 0.0), &ethn(10.0, 0.0), 10.0);
        builder.push(&unit(0.0, 10.0), &ethn(0.0, 10.0), 10.0);
        builder.push(&unit(5.0, 5.0), &ethn(5.0, 5.0), 10.0);

        // Act
        let est = JointEstimator::from_builder(&builder, JointOptions::default()).unwrap();
        let rendered = est.render().unwrap();

        // Assert
        assert_eq!(
            rendered,
            "--------\n\tsinhalese\ttamil\t\nbuddhist\t50.0%\t-\t\nhindu\t-\t50.0%\t\n--------\n"
        );
    }
}
