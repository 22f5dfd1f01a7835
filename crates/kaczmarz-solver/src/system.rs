//! Read-only view over a linear system `A x = b`.
//!
//! [`LinearSystem`] validates the inputs once, caches every squared row norm
//! (and their sum, `||A||_F^2`), and provides the row-level operations the
//! solver and the selectors share: signed row residuals, the full residual
//! norm, and the Kaczmarz projection itself.

use tracing::{debug, instrument};

use crate::error::{SolverError, ValidationError};
use crate::traits::RowMatrix;
use crate::types::CsrMatrix;
use crate::validation::{validate_csr_matrix, validate_rhs};

/// Immutable view of `(A, b)` with cached row norms.
///
/// Construction fails if `A` has a zero-norm row
/// ([`SolverError::DegenerateRow`]), a non-finite entry, or a row count that
/// differs from `b.len()`. Once built the view is never mutated and can be
/// shared read-only between any number of solvers.
pub struct LinearSystem<'a> {
    matrix: &'a dyn RowMatrix,
    rhs: &'a [f64],
    row_norms_sq: Vec<f64>,
    frobenius_sq: f64,
}

impl<'a> LinearSystem<'a> {
    /// Wrap `matrix` and `rhs`.
    ///
    /// # Errors
    ///
    /// - [`SolverError::InvalidConfiguration`] if the system has no rows,
    ///   `rhs.len() != matrix.rows()`, or any value is NaN/Inf.
    /// - [`SolverError::DegenerateRow`] for the first row whose norm is zero.
    #[instrument(skip_all, fields(rows = matrix.rows(), cols = matrix.cols()))]
    pub fn new(matrix: &'a dyn RowMatrix, rhs: &'a [f64]) -> Result<Self, SolverError> {
        let rows = matrix.rows();
        if rows == 0 {
            return Err(ValidationError::DimensionMismatch(
                "system has no equations".into(),
            )
            .into());
        }
        validate_rhs(rhs, rows)?;

        let mut row_norms_sq = Vec::with_capacity(rows);
        for row in 0..rows {
            let norm_sq = matrix.row_norm_sq(row);
            if !norm_sq.is_finite() {
                return Err(ValidationError::NonFiniteValue(format!(
                    "row {row} has squared norm {norm_sq}"
                ))
                .into());
            }
            if norm_sq <= 0.0 {
                return Err(SolverError::DegenerateRow { row });
            }
            row_norms_sq.push(norm_sq);
        }
        let frobenius_sq: f64 = row_norms_sq.iter().sum();
        debug!(frobenius_sq, "cached row norms");

        Ok(Self {
            matrix,
            rhs,
            row_norms_sq,
            frobenius_sq,
        })
    }

    /// Like [`new`](Self::new), but first checks the CSR structure with
    /// [`validate_csr_matrix`].
    ///
    /// # Errors
    ///
    /// Everything [`new`](Self::new) reports, plus structural CSR defects.
    pub fn from_csr(matrix: &'a CsrMatrix<f64>, rhs: &'a [f64]) -> Result<Self, SolverError> {
        validate_csr_matrix(matrix)?;
        Self::new(matrix, rhs)
    }

    /// Number of equations `m`.
    #[inline]
    pub fn rows(&self) -> usize {
        self.row_norms_sq.len()
    }

    /// Number of unknowns `n`.
    #[inline]
    pub fn cols(&self) -> usize {
        self.matrix.cols()
    }

    /// The wrapped matrix.
    #[inline]
    pub fn matrix(&self) -> &'a dyn RowMatrix {
        self.matrix
    }

    /// The right-hand side `b`.
    #[inline]
    pub fn rhs(&self) -> &'a [f64] {
        self.rhs
    }

    /// `||a_row||^2` (cached).
    #[inline]
    pub fn row_norm_sq(&self, row: usize) -> f64 {
        self.row_norms_sq[row]
    }

    /// `||a_row||`.
    #[inline]
    pub fn row_norm(&self, row: usize) -> f64 {
        self.row_norms_sq[row].sqrt()
    }

    /// All squared row norms.
    #[inline]
    pub fn row_norms_sq(&self) -> &[f64] {
        &self.row_norms_sq
    }

    /// `||A||_F^2 = sum_i ||a_i||^2`.
    #[inline]
    pub fn frobenius_norm_sq(&self) -> f64 {
        self.frobenius_sq
    }

    /// Signed residual of one equation: `r_row = a_row . x - b_row`.
    #[inline]
    pub fn row_residual(&self, row: usize, x: &[f64]) -> f64 {
        self.matrix.row_dot(row, x) - self.rhs[row]
    }

    /// Write every row residual `A x - b` into `out`.
    pub fn residual_into(&self, x: &[f64], out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.rows());
        for (row, r) in out.iter_mut().enumerate() {
            *r = self.row_residual(row, x);
        }
    }

    /// `||A x - b||_2`, computed row by row without allocating.
    pub fn residual_norm(&self, x: &[f64]) -> f64 {
        (0..self.rows())
            .map(|row| {
                let r = self.row_residual(row, x);
                r * r
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Kaczmarz update: project `x` onto the hyperplane `a_row . z = b_row`.
    ///
    /// Performs `x <- x - (r / ||a_row||^2) a_row` with `r = a_row . x - b_row`
    /// and returns `r` (the residual before the projection).
    #[inline]
    pub fn project(&self, row: usize, x: &mut [f64]) -> f64 {
        let r = self.row_residual(row, x);
        self.matrix.row_axpy(row, -r / self.row_norms_sq[row], x);
        r
    }
}

impl std::fmt::Debug for LinearSystem<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearSystem")
            .field("rows", &self.rows())
            .field("cols", &self.cols())
            .field("frobenius_sq", &self.frobenius_sq)
            .finish()
    }
}
