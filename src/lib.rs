//! rust_ecoinference — ecological inference of joint categorical distributions.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the joint-distribution estimator to Python via the `_rust_ecoinference`
//! extension module. Given per-unit marginal shares of two categorical
//! attributes (e.g. religion and ethnicity per polling division) and per-unit
//! weights, the crate estimates the joint table `P(X = i, Y = j)`.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`joint`, `regression`, `logging`) as the
//!   public crate surface.
//! - Define the `Joint` `#[pyclass]` wrapper and the `#[pymodule]` initializer
//!   for the `_rust_ecoinference` Python extension.
//! - Create and register the `joint` Python submodule under
//!   `rust_ecoinference` so that dot-notation imports work as expected.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work is implemented in the inner Rust modules; this file
//!   performs only FFI glue, input conversion, and error mapping.
//! - Python inputs are validated by the same constructors Rust callers use,
//!   so the invariants documented in `joint::core` hold on both surfaces.
//!
//! Conventions
//! -----------
//! - The joint table is `m_x × m_y` (rows: X categories, columns: Y
//!   categories); directional estimates are `m_y × m_x`.
//! - Errors from core Rust code are propagated as [`joint::JointError`]
//!   internally and converted to `ValueError` at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend on [`joint::JointEstimator`] or the pure
//!   [`joint::estimate_joint`] pipeline and can ignore the PyO3 items guarded
//!   by the `python-bindings` feature.
//! - The Python packaging layer imports `_rust_ecoinference.joint` and wraps
//!   `Joint` in a user-facing API.
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by
//!   `tests/integration_joint_pipeline.rs`.

pub mod joint;
pub mod logging;
pub mod regression;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::{PyArray2, PyReadonlyArray2, ToPyArray};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    joint::{
        core::{data::UnitBatch, options::DEFAULT_DISPLAY_THRESHOLD},
        errors::JointError,
        estimator::{JointEstimator, JointOutcome},
        render::render_matrix,
    },
    utils::{extract_f64_matrix, extract_f64_vector, extract_joint_options},
};

/// Joint — Python-facing wrapper for the joint-distribution estimator.
///
/// Purpose
/// -------
/// Expose [`JointEstimator`] to Python callers. The joint table is computed
/// on first access of any result property and cached for the lifetime of the
/// object.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `Joint(x, y, w, epsilon=1e-6, max_iterations=100, display_threshold=0.0005)`:
/// - `x`: `N × m_x` array-like of X category shares per unit.
/// - `y`: `N × m_y` array-like of Y category shares per unit.
/// - `w`: length-`N` array-like of non-negative unit weights.
/// - `epsilon`, `max_iterations`: reconciliation stopping rule.
/// - `display_threshold`: cutoff below which `pretty()` prints `-`.
///
/// Fields
/// ------
/// - `inner`: [`JointEstimator`] owning the validated batch and the cache.
///
/// Notes
/// -----
/// - Shape or value errors raise `ValueError` at construction, not on first
///   access.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_ecoinference.joint")]
pub struct Joint {
    inner: JointEstimator,
}

#[cfg(feature = "python-bindings")]
impl Joint {
    fn outcome(&self) -> PyResult<&JointOutcome> {
        self.inner.outcome().map_err(PyErr::from)
    }
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl Joint {
    #[new]
    #[pyo3(
        signature = (x, y, w, epsilon = None, max_iterations = None, display_threshold = None),
        text_signature = "(x, y, w, /, epsilon=1e-6, max_iterations=100, display_threshold=0.0005)"
    )]
    pub fn new<'py>(
        py: Python<'py>, x: &Bound<'py, PyAny>, y: &Bound<'py, PyAny>, w: &Bound<'py, PyAny>,
        epsilon: Option<f64>, max_iterations: Option<usize>, display_threshold: Option<f64>,
    ) -> PyResult<Self> {
        let x = extract_f64_matrix(x)?;
        let y = extract_f64_matrix(y)?;
        let w = extract_f64_vector(py, w)?;
        let opts = extract_joint_options(epsilon, max_iterations, display_threshold)?;
        let batch = UnitBatch::new(x, y, w)?;
        Ok(Joint { inner: JointEstimator::new(batch, opts) })
    }

    /// Fused `m_x × m_y` joint probability table.
    #[getter]
    pub fn joint<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        Ok(self.outcome()?.joint.to_pyarray(py))
    }

    /// X→Y directional estimate (`m_y × m_x`).
    #[getter]
    pub fn joint_xy<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        Ok(self.outcome()?.xy.to_pyarray(py))
    }

    /// Y→X directional estimate, transposed to `m_y × m_x`.
    #[getter]
    pub fn joint_yx<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        Ok(self.outcome()?.yx.to_pyarray(py))
    }

    #[getter]
    pub fn diff(&self) -> PyResult<f64> {
        Ok(self.outcome()?.diff)
    }

    #[getter]
    pub fn iterations(&self) -> PyResult<usize> {
        Ok(self.outcome()?.iterations)
    }

    #[getter]
    pub fn converged(&self) -> PyResult<bool> {
        Ok(self.outcome()?.converged)
    }

    /// `(xy, yx)` counts of category fits that hit the regression cap.
    #[getter]
    pub fn unconverged_fits(&self) -> PyResult<(usize, usize)> {
        let out = self.outcome()?;
        Ok((out.xy_unconverged, out.yx_unconverged))
    }

    /// Percentage table of the joint for quick inspection.
    pub fn pretty(&self) -> PyResult<String> {
        self.inner.render().map_err(PyErr::from)
    }

    /// Render any 2-D float matrix in the same percentage format.
    #[staticmethod]
    #[pyo3(
        signature = (matrix, threshold = DEFAULT_DISPLAY_THRESHOLD),
        text_signature = "(matrix, /, threshold=0.0005)"
    )]
    pub fn pretty_print(matrix: PyReadonlyArray2<'_, f64>, threshold: f64) -> PyResult<String> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(JointError::InvalidDisplayThreshold {
                value: threshold,
                reason: "Display threshold must be finite and non-negative.",
            }
            .into());
        }
        Ok(render_matrix(matrix.as_array(), threshold))
    }

    fn __repr__(&self) -> String {
        let batch = self.inner.batch();
        format!("Joint(units={}, m_x={}, m_y={})", batch.n_units(), batch.m_x(), batch.m_y())
    }
}

/// _rust_ecoinference — PyO3 module initializer for the Python extension.
///
/// Purpose
/// -------
/// Define the `_rust_ecoinference` Python module and register the `joint`
/// submodule used by the public `rust_ecoinference` package.
///
/// Errors
/// ------
/// - `PyErr`
///   If creating the submodule or manipulating `sys.modules` fails.
///
/// Notes
/// -----
/// - Invoked automatically by Python when importing the compiled extension.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_ecoinference<'py>(py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let joint_mod = PyModule::new(py, "joint")?;
    joint_mod.add_class::<Joint>()?;
    m.add_submodule(&joint_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    py.import("sys")?.getattr("modules")?.set_item("rust_ecoinference.joint", joint_mod)?;
    Ok(())
}
