//! Property tests for the non-negative least-squares backend and the
//! estimator built on it.
//!
//! Purpose
//! -------
//! - Check optimality of the NNLS solver on many random systems instead of
//!   a handful of hand-picked ones, with emphasis on the degenerate shapes
//!   the estimator produces (collinear and duplicated share columns).
//!
//! Coverage
//! --------
//! - `regression::nnls::nnls`: objective matches an exhaustive search over
//!   column subsets on small integer systems.
//! - `regression::nnls::nnls_weighted`: KKT conditions on weighted
//!   share-like systems with a duplicated predictor.
//! - `joint::estimator::estimate_joint`: random batches always give a
//!   non-negative table that sums to 1, with every regression converged.
//!
//! CI runs 256 cases per property; set `PROPTEST_CASES` for longer soaks.
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use proptest::prelude::*;
use rust_ecoinference::{
    joint::{core::data::UnitBatch, core::options::JointOptions, estimator::estimate_joint},
    logging,
    regression::nnls::{nnls, nnls_weighted, NnlsConfig},
};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES").ok().and_then(|s| s.parse().ok()).unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn objective(a: &Array2<f64>, b: &Array1<f64>, c: &Array1<f64>) -> f64 {
    let r = b - &a.dot(c);
    r.dot(&r)
}

/// Best objective over every column subset whose least-squares solution is
/// non-negative. Some optimum always has linearly independent support, so
/// this is the exact NNLS optimum.
fn exhaustive_optimum(a: &Array2<f64>, b: &Array1<f64>) -> f64 {
    let (rows, cols) = a.dim();
    let rhs = DVector::from_iterator(rows, b.iter().copied());
    let mut best = b.dot(b);
    for mask in 1u32..(1 << cols) {
        let support: Vec<usize> = (0..cols).filter(|j| mask & (1 << j) != 0).collect();
        let sub = DMatrix::from_fn(rows, support.len(), |i, k| a[[i, support[k]]]);
        let Ok(sol) = sub.svd(true, true).solve(&rhs, 1e-10) else { continue };
        if sol.iter().any(|&v| v < -1e-12) {
            continue;
        }
        let mut c = Array1::<f64>::zeros(cols);
        for (k, &j) in support.iter().enumerate() {
            c[j] = sol[k].max(0.0);
        }
        best = best.min(objective(a, b, &c));
    }
    best
}

/// Row-normalized shares from positive raw masses.
fn shares(raw: &[f64], rows: usize, cols: usize) -> Array2<f64> {
    let mut m = Array2::from_shape_vec((rows, cols), raw.to_vec()).unwrap();
    for mut row in m.rows_mut() {
        let total = row.sum();
        row /= total;
    }
    m
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Small integer systems: many exact ties and collinear columns.
fn arb_integer_system() -> impl Strategy<Value = (Array2<f64>, Array1<f64>)> {
    (prop::collection::vec(0u8..=3, 12), prop::collection::vec(-1i8..=2, 4)).prop_map(
        |(a, b)| {
            let a = Array2::from_shape_vec((4, 3), a.into_iter().map(f64::from).collect()).unwrap();
            let b = Array1::from(b.into_iter().map(f64::from).collect::<Vec<_>>());
            (a, b)
        },
    )
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn nnls_matches_exhaustive_optimum_on_integer_systems((a, b) in arb_integer_system()) {
        let fit = nnls(a.view(), b.view(), &NnlsConfig::default()).unwrap();

        prop_assert!(fit.converged, "not converged: {:?}", fit);
        prop_assert!(fit.coef.iter().all(|&c| c >= 0.0));
        let found = objective(&a, &b, &fit.coef);
        let best = exhaustive_optimum(&a, &b);
        prop_assert!(found <= best + 1e-8, "objective {found} above optimum {best}");
    }

    #[test]
    fn nnls_weighted_satisfies_kkt_on_share_systems(
        raw_x in prop::collection::vec(0.05f64..1.0, 18),
        raw_y in prop::collection::vec(0.05f64..1.0, 12),
        w in prop::collection::vec(0.0f64..10.0, 6),
    ) {
        // Three share columns plus an exact copy of the first one.
        let base = shares(&raw_x, 6, 3);
        let mut x = Array2::<f64>::zeros((6, 4));
        x.slice_mut(ndarray::s![.., ..3]).assign(&base);
        x.column_mut(3).assign(&base.column(0));
        let y = shares(&raw_y, 6, 2);
        let w = Array1::from(w);

        for target in y.columns() {
            let fit = nnls_weighted(x.view(), target, w.view(), &NnlsConfig::default()).unwrap();
            prop_assert!(fit.converged, "not converged: {:?}", fit);

            let residual = &target - &x.dot(&fit.coef);
            let grad = x.t().dot(&(&residual * &w));
            let tol = 1e-8 * (1.0 + w.sum());
            for j in 0..4 {
                prop_assert!(fit.coef[j] >= 0.0);
                if fit.coef[j] > 0.0 {
                    prop_assert!(grad[j].abs() <= tol, "grad[{j}] = {} on support", grad[j]);
                } else {
                    prop_assert!(grad[j] <= tol, "grad[{j}] = {} at bound", grad[j]);
                }
            }
        }
    }

    #[test]
    fn estimate_joint_yields_probability_table(
        raw_x in prop::collection::vec(0.01f64..1.0, 15),
        raw_y in prop::collection::vec(0.01f64..1.0, 10),
        w in prop::collection::vec(0.1f64..100.0, 5),
    ) {
        let batch = UnitBatch::new(shares(&raw_x, 5, 3), shares(&raw_y, 5, 2), Array1::from(w))
            .unwrap();

        let out = estimate_joint(&batch, &JointOptions::default(), &logging::discard()).unwrap();

        prop_assert_eq!(out.joint.dim(), (3, 2));
        prop_assert!(out.joint.iter().all(|&v| v.is_finite() && v >= 0.0));
        prop_assert!((out.joint.sum() - 1.0).abs() < 1e-9, "sum = {}", out.joint.sum());
        prop_assert_eq!((out.xy_unconverged, out.yx_unconverged), (0, 0));
    }
}
