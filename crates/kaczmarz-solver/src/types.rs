//! Core types: matrix storages, selector identifiers, and solve results.
//!
//! [`DenseMatrix`] and [`CsrMatrix`] are the two storages shipped with the
//! crate; both implement [`RowMatrix`], which is all the solver requires.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ops;
use crate::traits::RowMatrix;

// ---------------------------------------------------------------------------
// DenseMatrix
// ---------------------------------------------------------------------------

/// Row-major dense matrix.
///
/// Row `i` occupies `data[i * cols..(i + 1) * cols]`, so row access (the only
/// access pattern Kaczmarz methods need) is a contiguous slice.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl DenseMatrix {
    /// Wrap a row-major buffer.
    ///
    /// # Errors
    ///
    /// [`ValidationError::DimensionMismatch`] if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, ValidationError> {
        if data.len() != rows * cols {
            return Err(ValidationError::DimensionMismatch(format!(
                "buffer length {} does not equal {rows}x{cols} = {}",
                data.len(),
                rows * cols,
            )));
        }
        Ok(Self { data, rows, cols })
    }

    /// Build from a list of rows.
    ///
    /// # Errors
    ///
    /// [`ValidationError::DimensionMismatch`] if the rows are ragged.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, ValidationError> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(ValidationError::DimensionMismatch(format!(
                    "row {i} has {} columns, expected {cols}",
                    row.len(),
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    /// Square identity matrix of dimension `n`.
    pub fn identity(n: usize) -> Self {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Self {
            data,
            rows: n,
            cols: n,
        }
    }

    /// Borrow row `i` as a slice.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Dense matrix-vector multiply: `y = A * x`.
    pub fn matvec(&self, x: &[f64], y: &mut [f64]) {
        debug_assert!(x.len() >= self.cols);
        debug_assert!(y.len() >= self.rows);
        for (i, yi) in y.iter_mut().take(self.rows).enumerate() {
            *yi = ops::dot(self.row(i), x);
        }
    }
}

impl RowMatrix for DenseMatrix {
    #[inline]
    fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn row_dot(&self, row: usize, x: &[f64]) -> f64 {
        ops::dot(self.row(row), x)
    }

    #[inline]
    fn row_axpy(&self, row: usize, alpha: f64, y: &mut [f64]) {
        ops::axpy(alpha, self.row(row), y);
    }

    #[inline]
    fn row_norm_sq(&self, row: usize) -> f64 {
        let r = self.row(row);
        ops::dot(r, r)
    }
}

// ---------------------------------------------------------------------------
// CsrMatrix<T>
// ---------------------------------------------------------------------------

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores only non-zero entries, so a Kaczmarz projection costs O(nnz of the
/// row) instead of O(n).
///
/// # Layout
///
/// For a matrix with `m` rows and `nnz` non-zeros:
/// - `row_ptr` has length `m + 1`
/// - `col_indices` and `values` each have length `nnz`
/// - Row `i` spans indices `row_ptr[i]..row_ptr[i+1]`
#[derive(Debug, Clone)]
pub struct CsrMatrix<T> {
    /// Row pointers: `row_ptr[i]` is the start index in `col_indices`/`values`
    /// for row `i`.
    pub row_ptr: Vec<usize>,
    /// Column indices for each non-zero entry.
    pub col_indices: Vec<usize>,
    /// Values for each non-zero entry.
    pub values: Vec<T>,
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
}

impl<T> CsrMatrix<T> {
    /// Number of non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate over `(col_index, &value)` pairs for the given row.
    #[inline]
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, &T)> {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        self.col_indices[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter())
    }
}

impl CsrMatrix<f64> {
    /// Build a CSR matrix from COO (coordinate) triplets.
    ///
    /// Entries are sorted by (row, col) internally. Duplicate positions at the
    /// same (row, col) are summed into a single entry.
    ///
    /// # Panics
    ///
    /// Panics if a row or column index is out of bounds.
    pub fn from_coo(
        rows: usize,
        cols: usize,
        entries: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Self {
        let mut sorted: Vec<_> = entries.into_iter().collect();
        sorted.sort_by_key(|(r, c, _)| (*r, *c));
        sorted.dedup_by(|next, kept| {
            if (next.0, next.1) == (kept.0, kept.1) {
                kept.2 += next.2;
                true
            } else {
                false
            }
        });

        let nnz = sorted.len();
        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_indices = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        for &(r, _, _) in &sorted {
            assert!(r < rows, "row index {} out of bounds (rows={})", r, rows);
            row_ptr[r + 1] += 1;
        }
        for i in 1..=rows {
            row_ptr[i] += row_ptr[i - 1];
        }

        for (_, c, v) in sorted {
            assert!(c < cols, "col index {} out of bounds (cols={})", c, cols);
            col_indices.push(c);
            values.push(v);
        }

        Self {
            row_ptr,
            col_indices,
            values,
            rows,
            cols,
        }
    }

    /// Build a square identity matrix of dimension `n` in CSR format.
    pub fn identity(n: usize) -> Self {
        Self {
            row_ptr: (0..=n).collect(),
            col_indices: (0..n).collect(),
            values: vec![1.0f64; n],
            rows: n,
            cols: n,
        }
    }
}

impl RowMatrix for CsrMatrix<f64> {
    #[inline]
    fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn row_dot(&self, row: usize, x: &[f64]) -> f64 {
        self.row_entries(row).map(|(c, &v)| v * x[c]).sum()
    }

    #[inline]
    fn row_axpy(&self, row: usize, alpha: f64, y: &mut [f64]) {
        for (c, &v) in self.row_entries(row) {
            y[c] += alpha * v;
        }
    }

    #[inline]
    fn row_norm_sq(&self, row: usize) -> f64 {
        self.row_entries(row).map(|(_, &v)| v * v).sum()
    }
}

// ---------------------------------------------------------------------------
// Selector identifiers
// ---------------------------------------------------------------------------

/// Identifier of a row-selection policy.
///
/// Carried in [`SolverResult`] and log events so that results from different
/// policies can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectorKind {
    /// Round-robin over the rows (or a caller-supplied order).
    Cyclic,
    /// Row `i` drawn with probability proportional to `||a_i||^2`, weights
    /// scanned on every draw.
    Random,
    /// Every row drawn with probability `1/m`.
    UniformRandom,
    /// Strohmer-Vershynin distribution, precomputed once.
    SVRandom,
    /// Greedy choice of the most violated equation (Motzkin).
    MaxDistance,
    /// Uniform choice among rows whose residual is at or below a quantile of
    /// all residuals.
    Quantile,
    /// Like [`SelectorKind::Quantile`] with the threshold estimated from a
    /// random subsample.
    SampledQuantile,
    /// Like [`SelectorKind::Quantile`] with the threshold estimated from a
    /// sliding window of recently observed residuals.
    WindowedQuantile,
}

impl std::fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectorKind::Cyclic => write!(f, "cyclic"),
            SelectorKind::Random => write!(f, "random"),
            SelectorKind::UniformRandom => write!(f, "uniform-random"),
            SelectorKind::SVRandom => write!(f, "sv-random"),
            SelectorKind::MaxDistance => write!(f, "max-distance"),
            SelectorKind::Quantile => write!(f, "quantile"),
            SelectorKind::SampledQuantile => write!(f, "sampled-quantile"),
            SelectorKind::WindowedQuantile => write!(f, "windowed-quantile"),
        }
    }
}

// ---------------------------------------------------------------------------
// Solver result types
// ---------------------------------------------------------------------------

/// Residual-norm checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceInfo {
    /// Number of projections performed when the norm was measured.
    pub iteration: usize,
    /// `||A x - b||_2` at this iteration.
    pub residual_norm: f64,
}

/// Result returned by [`KaczmarzSolver::solve`](crate::solver::KaczmarzSolver::solve).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverResult {
    /// Solution vector `x`. When `converged` is false this is the
    /// lowest-residual iterate observed.
    pub solution: Vec<f64>,
    /// Number of projections performed.
    pub iterations: usize,
    /// Residual norm of `solution`.
    pub residual_norm: f64,
    /// Whether the residual norm reached the tolerance.
    pub converged: bool,
    /// Wall-clock time taken.
    pub wall_time: Duration,
    /// Residual norms measured at each convergence check.
    pub convergence_history: Vec<ConvergenceInfo>,
    /// Row-selection policy that produced the result.
    pub selector: SelectorKind,
}
