//! joint::render — human-readable tables for diagnostics.
//!
//! Matrices are rendered as tab-separated percentages with one decimal,
//! framed by dashed rules. Cells at or below the display threshold (default
//! 0.05 %) are shown as `-` so that the structure of sparse joint tables
//! stands out. This is a debugging aid, not a machine-readable format.
use crate::joint::core::options::DEFAULT_DISPLAY_THRESHOLD;
use ndarray::ArrayView2;
use std::fmt;

const RULE: &str = "--------";

/// Format one probability as `"12.3%"`, or `"-"` when `x <= threshold`.
///
/// Examples
/// --------
/// ```rust
/// # use rust_ecoinference::joint::render::format_cell;
/// assert_eq!(format_cell(0.1234, 0.0005), "12.3%");
/// assert_eq!(format_cell(0.0004, 0.0005), "-");
/// ```
pub fn format_cell(x: f64, threshold: f64) -> String {
    if x > threshold {
        format!("{:.1}%", x * 100.0)
    } else {
        "-".to_string()
    }
}

/// Render a matrix without labels.
pub fn render_matrix(m: ArrayView2<f64>, threshold: f64) -> String {
    JointTable::new(m).threshold(threshold).to_string()
}

/// JointTable — `Display` adapter over a matrix view with optional labels.
///
/// When column labels are present a header row is emitted; when row labels
/// are present each row starts with its label. Label counts are trusted to
/// match the matrix shape; missing labels render as empty strings.
#[derive(Debug, Clone, Copy)]
pub struct JointTable<'a> {
    matrix: ArrayView2<'a, f64>,
    threshold: f64,
    row_labels: Option<&'a [String]>,
    col_labels: Option<&'a [String]>,
}

impl<'a> JointTable<'a> {
    pub fn new(matrix: ArrayView2<'a, f64>) -> Self {
        JointTable {
            matrix,
            threshold: DEFAULT_DISPLAY_THRESHOLD,
            row_labels: None,
            col_labels: None,
        }
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn labels(mut self, rows: &'a [String], cols: &'a [String]) -> Self {
        self.row_labels = Some(rows);
        self.col_labels = Some(cols);
        self
    }
}

impl fmt::Display for JointTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        if let Some(cols) = self.col_labels {
            if self.row_labels.is_some() {
                write!(f, "\t")?;
            }
            for label in cols {
                write!(f, "{label}\t")?;
            }
            writeln!(f)?;
        }
        for (i, row) in self.matrix.rows().into_iter().enumerate() {
            if let Some(rows) = self.row_labels {
                write!(f, "{}\t", rows.get(i).map(String::as_str).unwrap_or(""))?;
            }
            for &x in row {
                write!(f, "{}\t", format_cell(x, self.threshold))?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{RULE}")
    }
}
