//! Input and parameter validation.
//!
//! All validation functions run eagerly, before any projection is performed,
//! so callers receive clear diagnostics instead of numerical garbage. Every
//! function returns [`ValidationError`], which converts into
//! [`SolverError::InvalidConfiguration`](crate::error::SolverError::InvalidConfiguration)
//! via `From`.

use crate::error::ValidationError;
use crate::types::CsrMatrix;

// ---------------------------------------------------------------------------
// CSR matrix validation
// ---------------------------------------------------------------------------

/// Validate the structural integrity of a CSR matrix.
///
/// Checks, in order:
///
/// 1. `row_ptr` length equals `rows + 1`.
/// 2. `row_ptr` is monotonically non-decreasing.
/// 3. `row_ptr[0] == 0` and `row_ptr[rows] == nnz`.
/// 4. `col_indices` length equals `values` length.
/// 5. All column indices are less than `cols`.
/// 6. No `NaN` or `Inf` values.
/// 7. No `(row, col)` position is stored twice.
/// 8. Column indices are sorted within each row (emits a [`tracing::warn`]
///    if not, but does not error).
///
/// # Errors
///
/// Returns [`ValidationError`] describing the first violation found.
///
/// # Examples
///
/// ```
/// use kaczmarz_solver::types::CsrMatrix;
/// use kaczmarz_solver::validation::validate_csr_matrix;
///
/// let m = CsrMatrix::<f64>::from_coo(2, 2, vec![(0, 0, 1.0), (1, 1, 2.0)]);
/// assert!(validate_csr_matrix(&m).is_ok());
/// ```
pub fn validate_csr_matrix(matrix: &CsrMatrix<f64>) -> Result<(), ValidationError> {
    if matrix.row_ptr.len() != matrix.rows + 1 {
        return Err(ValidationError::DimensionMismatch(format!(
            "row_ptr length {} does not equal rows + 1 = {}",
            matrix.row_ptr.len(),
            matrix.rows + 1,
        )));
    }

    for i in 1..matrix.row_ptr.len() {
        if matrix.row_ptr[i] < matrix.row_ptr[i - 1] {
            return Err(ValidationError::DimensionMismatch(format!(
                "row_ptr is not monotonically non-decreasing at position {i}",
            )));
        }
    }

    let nnz = matrix.values.len();
    if matrix.row_ptr[0] != 0 {
        return Err(ValidationError::DimensionMismatch(format!(
            "row_ptr[0] = {} (expected 0)",
            matrix.row_ptr[0],
        )));
    }
    if matrix.row_ptr[matrix.rows] != nnz {
        return Err(ValidationError::DimensionMismatch(format!(
            "values length {} does not match row_ptr[rows] = {}",
            nnz, matrix.row_ptr[matrix.rows],
        )));
    }

    if matrix.col_indices.len() != nnz {
        return Err(ValidationError::DimensionMismatch(format!(
            "col_indices length {} does not match values length {}",
            matrix.col_indices.len(),
            nnz,
        )));
    }

    for row in 0..matrix.rows {
        let mut prev_col: Option<usize> = None;
        let mut sorted = true;
        for idx in matrix.row_ptr[row]..matrix.row_ptr[row + 1] {
            let col = matrix.col_indices[idx];
            if col >= matrix.cols {
                return Err(ValidationError::IndexOutOfBounds {
                    index: col,
                    len: matrix.cols,
                    context: "column",
                });
            }

            let val = matrix.values[idx];
            if !val.is_finite() {
                return Err(ValidationError::NonFiniteValue(format!(
                    "matrix[{row}, {col}] = {val}",
                )));
            }

            if let Some(pc) = prev_col {
                if col == pc {
                    return Err(duplicate_entry(row, col));
                }
                if col < pc {
                    sorted = false;
                    tracing::warn!(
                        row,
                        "column indices not sorted within row (col {} follows {})",
                        col,
                        pc,
                    );
                }
            }
            prev_col = Some(col);
        }

        if !sorted {
            let mut cols =
                matrix.col_indices[matrix.row_ptr[row]..matrix.row_ptr[row + 1]].to_vec();
            cols.sort_unstable();
            if let Some(pair) = cols.windows(2).find(|pair| pair[0] == pair[1]) {
                return Err(duplicate_entry(row, pair[0]));
            }
        }
    }

    Ok(())
}

fn duplicate_entry(row: usize, col: usize) -> ValidationError {
    ValidationError::DimensionMismatch(format!(
        "matrix[{row}, {col}] is stored more than once",
    ))
}

// ---------------------------------------------------------------------------
// Vector validation
// ---------------------------------------------------------------------------

/// Validate a right-hand-side vector.
///
/// Checks that `rhs.len() == expected_len` and that no entry is `NaN` or
/// `Inf`. An all-zero RHS is valid but emits a [`tracing::warn`].
///
/// # Errors
///
/// Returns [`ValidationError`] on dimension mismatch or non-finite values.
pub fn validate_rhs(rhs: &[f64], expected_len: usize) -> Result<(), ValidationError> {
    if rhs.len() != expected_len {
        return Err(ValidationError::DimensionMismatch(format!(
            "rhs length {} does not match matrix rows {}",
            rhs.len(),
            expected_len,
        )));
    }

    let mut all_zero = true;
    for (i, &v) in rhs.iter().enumerate() {
        if !v.is_finite() {
            return Err(ValidationError::NonFiniteValue(format!("rhs[{i}] = {v}")));
        }
        if v != 0.0 {
            all_zero = false;
        }
    }

    if all_zero && !rhs.is_empty() {
        tracing::warn!("rhs vector is all zeros; the zero vector is a solution");
    }

    Ok(())
}

/// Validate a caller-supplied initial iterate.
///
/// # Errors
///
/// Returns [`ValidationError`] if the length differs from the number of
/// columns or an entry is not finite.
pub fn validate_initial_guess(x0: &[f64], cols: usize) -> Result<(), ValidationError> {
    if x0.len() != cols {
        return Err(ValidationError::DimensionMismatch(format!(
            "x0 length {} does not match matrix columns {}",
            x0.len(),
            cols,
        )));
    }
    if let Some((i, v)) = x0.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(ValidationError::NonFiniteValue(format!("x0[{i}] = {v}")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Parameter validation
// ---------------------------------------------------------------------------

/// Validate a residual-norm tolerance: finite and `>= 0`.
///
/// # Errors
///
/// Returns [`ValidationError::ParameterOutOfRange`] otherwise.
pub fn validate_tolerance(tolerance: f64) -> Result<(), ValidationError> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "tolerance".into(),
            value: tolerance.to_string(),
            expected: "finite value >= 0".into(),
        });
    }
    Ok(())
}

/// Validate a quantile level: `q` in `(0, 1]`.
///
/// # Errors
///
/// Returns [`ValidationError::ParameterOutOfRange`] otherwise (including NaN).
pub fn validate_quantile(q: f64) -> Result<(), ValidationError> {
    if !(q > 0.0 && q <= 1.0) {
        return Err(ValidationError::ParameterOutOfRange {
            name: "quantile".into(),
            value: q.to_string(),
            expected: "(0, 1]".into(),
        });
    }
    Ok(())
}

/// Validate that a count parameter lies in `[min, max]`.
///
/// # Errors
///
/// Returns [`ValidationError::ParameterOutOfRange`] otherwise.
pub fn validate_count(
    name: &str,
    value: usize,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    if value < min || value > max {
        let expected = if max == usize::MAX {
            format!(">= {min}")
        } else {
            format!("[{min}, {max}]")
        };
        return Err(ValidationError::ParameterOutOfRange {
            name: name.into(),
            value: value.to_string(),
            expected,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- validate_csr_matrix ------------------------------------------------

    #[test]
    fn valid_identity() {
        assert!(validate_csr_matrix(&CsrMatrix::<f64>::identity(4)).is_ok());
    }

    #[test]
    fn bad_row_ptr_length() {
        let mut m = CsrMatrix::<f64>::identity(3);
        m.row_ptr.pop();
        let err = validate_csr_matrix(&m).unwrap_err();
        assert!(matches!(err, ValidationError::DimensionMismatch(_)));
    }

    #[test]
    fn non_monotonic_row_ptr() {
        let m = CsrMatrix {
            row_ptr: vec![0, 2, 1, 3],
            col_indices: vec![0, 1, 2],
            values: vec![1.0, 1.0, 1.0],
            rows: 3,
            cols: 3,
        };
        let err = validate_csr_matrix(&m).unwrap_err();
        assert!(err.to_string().contains("monotonically"), "got: {err}");
    }

    #[test]
    fn column_out_of_bounds() {
        let mut m = CsrMatrix::<f64>::identity(2);
        m.col_indices[1] = 5;
        let err = validate_csr_matrix(&m).unwrap_err();
        assert_eq!(
            err,
            ValidationError::IndexOutOfBounds {
                index: 5,
                len: 2,
                context: "column",
            }
        );
    }

    #[test]
    fn nan_value_rejected() {
        let mut m = CsrMatrix::<f64>::identity(2);
        m.values[0] = f64::NAN;
        let err = validate_csr_matrix(&m).unwrap_err();
        assert!(matches!(err, ValidationError::NonFiniteValue(_)));
    }

    #[test]
    fn repeated_position_rejected() {
        let m = CsrMatrix {
            row_ptr: vec![0, 2, 3],
            col_indices: vec![0, 0, 1],
            values: vec![1.0, 1.0, 1.0],
            rows: 2,
            cols: 2,
        };
        let err = validate_csr_matrix(&m).unwrap_err();
        assert!(err.to_string().contains("more than once"), "got: {err}");
    }

    #[test]
    fn repeated_position_in_unsorted_row_rejected() {
        let m = CsrMatrix {
            row_ptr: vec![0, 3],
            col_indices: vec![2, 0, 2],
            values: vec![1.0, 1.0, 1.0],
            rows: 1,
            cols: 3,
        };
        let err = validate_csr_matrix(&m).unwrap_err();
        assert!(err.to_string().contains("matrix[0, 2]"), "got: {err}");
    }

    // -- vectors ------------------------------------------------------------

    #[test]
    fn rhs_length_and_finiteness() {
        assert!(validate_rhs(&[1.0, 2.0], 2).is_ok());
        assert!(validate_rhs(&[0.0, 0.0], 2).is_ok());
        assert!(matches!(
            validate_rhs(&[1.0], 2),
            Err(ValidationError::DimensionMismatch(_))
        ));
        assert!(matches!(
            validate_rhs(&[1.0, f64::INFINITY], 2),
            Err(ValidationError::NonFiniteValue(_))
        ));
    }

    #[test]
    fn initial_guess_checks() {
        assert!(validate_initial_guess(&[0.0; 3], 3).is_ok());
        assert!(validate_initial_guess(&[0.0; 2], 3).is_err());
        assert!(validate_initial_guess(&[0.0, f64::NAN, 0.0], 3).is_err());
    }

    // -- parameters ---------------------------------------------------------

    #[test]
    fn tolerance_bounds() {
        assert!(validate_tolerance(0.0).is_ok());
        assert!(validate_tolerance(1e-8).is_ok());
        assert!(validate_tolerance(-1.0).is_err());
        assert!(validate_tolerance(f64::NAN).is_err());
        assert!(validate_tolerance(f64::INFINITY).is_err());
    }

    #[test]
    fn quantile_bounds() {
        assert!(validate_quantile(1.0).is_ok());
        assert!(validate_quantile(0.5).is_ok());
        assert!(validate_quantile(0.0).is_err());
        assert!(validate_quantile(1.5).is_err());
        assert!(validate_quantile(f64::NAN).is_err());
    }

    #[test]
    fn count_bounds() {
        assert!(validate_count("sample_size", 1, 1, 10).is_ok());
        assert!(validate_count("sample_size", 10, 1, 10).is_ok());
        let err = validate_count("sample_size", 0, 1, 10).unwrap_err();
        assert!(err.to_string().contains("[1, 10]"), "got: {err}");
        let err = validate_count("window_size", 0, 1, usize::MAX).unwrap_err();
        assert!(err.to_string().contains(">= 1"), "got: {err}");
    }
}
