//! Error types for the Kaczmarz solver crate.
//!
//! Configuration problems are reported eagerly (when a [`LinearSystem`],
//! selector, or [`KaczmarzSolver`] is built) so that the iteration loop only
//! ever fails for numerical reasons. All errors implement `std::error::Error`
//! via `thiserror`.
//!
//! [`LinearSystem`]: crate::system::LinearSystem
//! [`KaczmarzSolver`]: crate::solver::KaczmarzSolver

/// Primary error type for solver operations.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// Solver or selector parameters, or the inputs themselves, are malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ValidationError),

    /// A row of `A` has zero norm, so the projection onto it is undefined.
    #[error("row {row} has zero norm; projection onto it is undefined")]
    DegenerateRow {
        /// Index of the offending row.
        row: usize,
    },

    /// The iteration budget ran out before the residual norm reached the
    /// tolerance.
    #[error(
        "solver did not converge after {iterations} iterations (residual={residual:.2e}, tol={tolerance:.2e})"
    )]
    NonConvergence {
        /// Number of iterations completed before the budget was exhausted.
        iterations: usize,
        /// Residual norm of `best_iterate`.
        residual: f64,
        /// Target tolerance that was not reached.
        tolerance: f64,
        /// Lowest-residual iterate observed during the run.
        best_iterate: Vec<f64>,
    },

    /// NaN or infinity appeared in the iterate.
    #[error("numerical divergence at iteration {iteration}: {detail}")]
    NumericalDivergence {
        /// Iteration at which the divergence was detected.
        iteration: usize,
        /// Human-readable explanation.
        detail: String,
    },
}

impl SolverError {
    /// Shorthand for a [`ValidationError::ParameterOutOfRange`] wrapped as
    /// [`SolverError::InvalidConfiguration`].
    pub(crate) fn out_of_range(
        name: &str,
        value: impl std::fmt::Display,
        expected: &str,
    ) -> Self {
        SolverError::InvalidConfiguration(ValidationError::ParameterOutOfRange {
            name: name.into(),
            value: value.to_string(),
            expected: expected.into(),
        })
    }
}

/// Validation errors for solver inputs and parameters.
///
/// These are raised before any computation begins so that callers get clear
/// diagnostics rather than mysterious numerical failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Dimensions are inconsistent (e.g. `b.len() != A.rows()`).
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A value is NaN or infinite where a finite number is required.
    #[error("non-finite value detected: {0}")]
    NonFiniteValue(String),

    /// An index refers past the end of the collection it addresses.
    #[error("{context} index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// Offending index.
        index: usize,
        /// Length of the addressed collection.
        len: usize,
        /// What was being indexed (e.g. "row", "column").
        context: &'static str,
    },

    /// A parameter is outside its valid range.
    #[error("parameter out of range: {name} = {value} (expected {expected})")]
    ParameterOutOfRange {
        /// Name of the parameter.
        name: String,
        /// The invalid value (as a string for flexibility).
        value: String,
        /// Human-readable description of the valid range.
        expected: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_converts_into_invalid_configuration() {
        let err: SolverError = ValidationError::DimensionMismatch("3 vs 4".into()).into();
        assert!(matches!(err, SolverError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("dimension mismatch"));
    }

    #[test]
    fn out_of_range_message_names_parameter() {
        let err = SolverError::out_of_range("quantile", 1.5, "(0, 1]");
        let msg = err.to_string();
        assert!(msg.contains("quantile"), "got: {msg}");
        assert!(msg.contains("1.5"), "got: {msg}");
    }

    #[test]
    fn non_convergence_display() {
        let err = SolverError::NonConvergence {
            iterations: 10,
            residual: 0.5,
            tolerance: 1e-6,
            best_iterate: vec![0.0; 2],
        };
        assert!(err.to_string().contains("10 iterations"));
    }
}
