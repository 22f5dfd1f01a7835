//! Capability traits at the two seams of the solver.
//!
//! [`RowMatrix`] is what the solver needs from a matrix storage;
//! [`RowSelector`] is what it needs from a row-selection policy.

use crate::error::SolverError;
use crate::solver::SolverState;
use crate::system::LinearSystem;
use crate::types::SelectorKind;

/// Row-oriented matrix access.
///
/// Kaczmarz methods touch `A` one row at a time, so this is the whole
/// contract a storage backend has to satisfy. Implementations must be
/// read-only: the solver never mutates the matrix.
pub trait RowMatrix: Send + Sync {
    /// Number of rows (equations).
    fn rows(&self) -> usize;

    /// Number of columns (unknowns).
    fn cols(&self) -> usize;

    /// `a_row . x`.
    fn row_dot(&self, row: usize, x: &[f64]) -> f64;

    /// `y += alpha * a_row`.
    fn row_axpy(&self, row: usize, alpha: f64, y: &mut [f64]);

    /// `||a_row||^2`.
    fn row_norm_sq(&self, row: usize) -> f64;
}

/// A row-selection policy.
///
/// The solver calls [`bind`](Self::bind) once when it is constructed,
/// [`reset`](Self::reset) at the start of every solve, and
/// [`select`](Self::select) once per iteration.
///
/// Selectors carry mutable state (cursors, random number generators,
/// residual windows) and are not meant to be shared between concurrent
/// solves: give every solver its own instance.
pub trait RowSelector {
    /// Check the selector's parameters against the system it will drive and
    /// precompute anything that depends on it.
    ///
    /// # Errors
    ///
    /// [`SolverError::InvalidConfiguration`] if a parameter is incompatible
    /// with the system (e.g. a subsample larger than the number of rows).
    fn bind(&mut self, _system: &LinearSystem<'_>) -> Result<(), SolverError> {
        Ok(())
    }

    /// Return to the freshly constructed state so that consecutive solves
    /// are independent (and reproducible for seeded selectors).
    fn reset(&mut self);

    /// Index of the row to project onto next. Must be `< system.rows()`.
    fn select(&mut self, state: &SolverState<'_>) -> usize;

    /// Identifier of this policy.
    fn kind(&self) -> SelectorKind;
}

impl<S: RowSelector + ?Sized> RowSelector for Box<S> {
    fn bind(&mut self, system: &LinearSystem<'_>) -> Result<(), SolverError> {
        (**self).bind(system)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn select(&mut self, state: &SolverState<'_>) -> usize {
        (**self).select(state)
    }

    fn kind(&self) -> SelectorKind {
        (**self).kind()
    }
}
