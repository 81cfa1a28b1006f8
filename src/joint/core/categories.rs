//! Category keys and fail-soft batch assembly from per-unit counts.
//!
//! Purpose
//! -------
//! Bridge between count-style aggregates (category name → count, per unit)
//! and the positional share vectors the estimator consumes. Category order
//! is fixed once from a reference aggregate so that every unit's vector
//! lines up column by column.
//!
//! Key behaviors
//! -------------
//! - [`CategoryKeys`] holds an ordered, duplicate-free key list;
//!   [`CategoryKeys::from_reference`] derives it from a reference aggregate
//!   (e.g. national totals), keeping categories with positive totals.
//! - [`shares_from_counts`] turns one unit's counts into a share vector, or
//!   `None` when the unit cannot be expressed over the fixed keys.
//! - [`shares_from_tables`] does the same for an attribute described by
//!   several count tables (e.g. religion and caste), normalizing each
//!   table by its own total and concatenating the results.
//! - [`BatchBuilder`] accumulates units, silently dropping those whose
//!   shares cannot be computed, and builds a validated [`UnitBatch`].
//!
//! Invariants & assumptions
//! ------------------------
//! - A unit is dropped (never aborting the batch) when any required key is
//!   missing, any keyed count is negative or non-finite, a table's keyed
//!   total is not positive, or its weight is negative or non-finite.
//! - Shares are `count[key] / Σ_keys count`. Categories outside the key
//!   list are ignored, so one table's shares sum to 1.
//! - Across the tables of one attribute the keys must be distinct; the
//!   combined key list is their concatenation in table order.
//! - Invalid/meta categories ("electors", "rejected", …) and remapping into
//!   "other" are the caller's concern and must happen before counts arrive
//!   here.
//!
//! Testing notes
//! -------------
//! - Unit tests cover key validation, reference ordering, each drop
//!   condition, multi-table concatenation, and that a fully filtered
//!   builder reports `EmptyBatch`.
use crate::{
    joint::{
        core::data::UnitBatch,
        errors::{JointError, JointResult},
    },
    logging,
};
use ndarray::{Array1, Array2};
use slog::{debug, o, Logger};
use std::collections::{HashMap, HashSet};

/// CategoryKeys — ordered category names for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryKeys {
    keys: Vec<String>,
}

impl CategoryKeys {
    /// Build from an explicit ordered list.
    ///
    /// Errors
    /// ------
    /// - `JointError::EmptyCategoryKeys` when `keys` is empty.
    /// - `JointError::DuplicateCategory` on the first repeated key.
    pub fn new<I, S>(keys: I) -> JointResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Err(JointError::EmptyCategoryKeys);
        }
        let mut seen = HashSet::with_capacity(keys.len());
        for key in &keys {
            if !seen.insert(key.as_str()) {
                return Err(JointError::DuplicateCategory { key: key.clone() });
            }
        }
        Ok(CategoryKeys { keys })
    }

    /// Derive keys from an ordered reference aggregate.
    ///
    /// Entries with a non-positive or non-finite total are skipped; the
    /// remaining keys keep their reference order.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use rust_ecoinference::joint::core::categories::CategoryKeys;
    /// let national = [("buddhist", 14.2e6), ("hindu", 2.5e6), ("bahai", 0.0)];
    /// let keys = CategoryKeys::from_reference(national).unwrap();
    /// assert_eq!(keys.as_slice(), ["buddhist", "hindu"]);
    /// ```
    pub fn from_reference<I, S>(reference: I) -> JointResult<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        CategoryKeys::new(
            reference
                .into_iter()
                .filter(|(_, total)| total.is_finite() && *total > 0.0)
                .map(|(key, _)| key),
        )
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.keys
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

/// Share vector of one unit over `keys`, or `None` if the unit must be dropped.
///
/// Examples
/// --------
/// ```rust
/// # use std::collections::HashMap;
/// # use rust_ecoinference::joint::core::categories::{shares_from_counts, CategoryKeys};
/// let keys = CategoryKeys::new(["a", "b"]).unwrap();
/// let counts = HashMap::from([("a".to_string(), 30.0), ("b".to_string(), 10.0)]);
/// let shares = shares_from_counts(&keys, &counts).unwrap();
/// assert_eq!(shares.to_vec(), vec![0.75, 0.25]);
///
/// let partial = HashMap::from([("a".to_string(), 30.0)]);
/// assert!(shares_from_counts(&keys, &partial).is_none());
/// ```
pub fn shares_from_counts(
    keys: &CategoryKeys, counts: &HashMap<String, f64>,
) -> Option<Array1<f64>> {
    let mut shares = Array1::<f64>::zeros(keys.len());
    for (i, key) in keys.iter().enumerate() {
        let value = *counts.get(key)?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        shares[i] = value;
    }
    let total = shares.sum();
    if !(total > 0.0) {
        return None;
    }
    shares /= total;
    Some(shares)
}

/// Concatenated shares of one unit over several count tables.
///
/// Table `k` is normalized over `groups[k]` alone; the unit is dropped
/// (`None`) if any table fails [`shares_from_counts`] or the number of
/// tables differs from the number of key groups.
///
/// Examples
/// --------
/// ```rust
/// # use std::collections::HashMap;
/// # use rust_ecoinference::joint::core::categories::{shares_from_tables, CategoryKeys};
/// let groups = [CategoryKeys::new(["a", "b"]).unwrap(), CategoryKeys::new(["c"]).unwrap()];
/// let first = HashMap::from([("a".to_string(), 3.0), ("b".to_string(), 1.0)]);
/// let second = HashMap::from([("c".to_string(), 7.0)]);
/// let shares = shares_from_tables(&groups, &[&first, &second]).unwrap();
/// assert_eq!(shares.to_vec(), vec![0.75, 0.25, 1.0]);
/// ```
pub fn shares_from_tables(
    groups: &[CategoryKeys], tables: &[&HashMap<String, f64>],
) -> Option<Array1<f64>> {
    if groups.len() != tables.len() {
        return None;
    }
    let mut shares = Vec::with_capacity(groups.iter().map(CategoryKeys::len).sum());
    for (keys, counts) in groups.iter().zip(tables) {
        shares.extend(shares_from_counts(keys, counts)?.iter().copied());
    }
    Some(Array1::from(shares))
}

/// BatchBuilder — fail-soft accumulator of units keyed by category name.
///
/// Purpose
/// -------
/// Let data-preparation code push every candidate unit without
/// pre-filtering; units that cannot be expressed over the fixed keys are
/// counted and logged, never raised.
///
/// Fields
/// ------
/// - `x_groups`, `y_groups`: key list per count table of each attribute.
/// - `x_keys`, `y_keys`: the concatenated category order per attribute.
/// - `x_rows`, `y_rows`, `weights`: accepted units.
/// - `dropped`: number of rejected units.
/// - `logger`: receives a debug record per dropped unit.
#[derive(Debug, Clone)]
pub struct BatchBuilder {
    x_groups: Vec<CategoryKeys>,
    y_groups: Vec<CategoryKeys>,
    x_keys: CategoryKeys,
    y_keys: CategoryKeys,
    x_rows: Vec<Array1<f64>>,
    y_rows: Vec<Array1<f64>>,
    weights: Vec<f64>,
    dropped: usize,
    logger: Logger,
}

impl BatchBuilder {
    /// Builder with one count table per attribute.
    pub fn new(x_keys: CategoryKeys, y_keys: CategoryKeys) -> Self {
        BatchBuilder {
            x_groups: vec![x_keys.clone()],
            y_groups: vec![y_keys.clone()],
            x_keys,
            y_keys,
            x_rows: Vec::new(),
            y_rows: Vec::new(),
            weights: Vec::new(),
            dropped: 0,
            logger: logging::discard(),
        }
    }

    /// Builder where each attribute is described by several count tables.
    ///
    /// Errors
    /// ------
    /// - `JointError::EmptyCategoryKeys` when an attribute has no table.
    /// - `JointError::DuplicateCategory` when a key appears in two tables of
    ///   the same attribute.
    pub fn from_groups(
        x_groups: Vec<CategoryKeys>, y_groups: Vec<CategoryKeys>,
    ) -> JointResult<Self> {
        let x_keys = CategoryKeys::new(x_groups.iter().flat_map(CategoryKeys::iter))?;
        let y_keys = CategoryKeys::new(y_groups.iter().flat_map(CategoryKeys::iter))?;
        Ok(BatchBuilder {
            x_groups,
            y_groups,
            x_keys,
            y_keys,
            x_rows: Vec::new(),
            y_rows: Vec::new(),
            weights: Vec::new(),
            dropped: 0,
            logger: logging::discard(),
        })
    }

    pub fn with_logger(mut self, logger: &Logger) -> Self {
        self.logger = logger.new(o!("component" => "batch_builder"));
        self
    }

    /// Offer one unit with a single count table per attribute; returns
    /// `true` if it was accepted.
    pub fn push(
        &mut self, x_counts: &HashMap<String, f64>, y_counts: &HashMap<String, f64>, weight: f64,
    ) -> bool {
        self.push_tables(&[x_counts], &[y_counts], weight)
    }

    /// Offer one unit with one count table per key group of each attribute.
    pub fn push_tables(
        &mut self, x_tables: &[&HashMap<String, f64>], y_tables: &[&HashMap<String, f64>],
        weight: f64,
    ) -> bool {
        let candidate = match (
            shares_from_tables(&self.x_groups, x_tables),
            shares_from_tables(&self.y_groups, y_tables),
        ) {
            (Some(x), Some(y)) if weight.is_finite() && weight >= 0.0 => Some((x, y)),
            _ => None,
        };

        match candidate {
            Some((x, y)) => {
                self.x_rows.push(x);
                self.y_rows.push(y);
                self.weights.push(weight);
                true
            }
            None => {
                self.dropped += 1;
                debug!(self.logger, "dropping unit";
                    "offered" => self.accepted() + self.dropped, "weight" => weight);
                false
            }
        }
    }

    pub fn accepted(&self) -> usize {
        self.weights.len()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn x_keys(&self) -> &CategoryKeys {
        &self.x_keys
    }

    pub fn y_keys(&self) -> &CategoryKeys {
        &self.y_keys
    }

    /// Assemble the accepted units into a validated batch.
    ///
    /// Errors
    /// ------
    /// - `JointError::EmptyBatch` when every unit was dropped.
    pub fn build(&self) -> JointResult<UnitBatch> {
        if self.weights.is_empty() {
            return Err(JointError::EmptyBatch);
        }
        let n = self.weights.len();
        let mut x = Array2::<f64>::zeros((n, self.x_keys.len()));
        let mut y = Array2::<f64>::zeros((n, self.y_keys.len()));
        for (unit, (xs, ys)) in self.x_rows.iter().zip(&self.y_rows).enumerate() {
            x.row_mut(unit).assign(xs);
            y.row_mut(unit).assign(ys);
        }
        UnitBatch::new(x, y, Array1::from(self.weights.clone()))
    }
}
