//! The Kaczmarz projection loop.
//!
//! [`KaczmarzSolver`] owns the iterate and drives
//!
//! ```text
//! x_0 = x0 (or 0)
//! for k = 0, 1, 2, ...:
//!     i = selector.select(state_k)
//!     r = a_i . x_k - b_i
//!     x_{k+1} = x_k - (r / ||a_i||^2) a_i
//!     every check_interval steps:
//!         if ||A x_{k+1} - b|| <= tolerance: converged
//! ```
//!
//! Each update is an exact orthogonal projection onto the hyperplane
//! `a_i . z = b_i`, so `a_i . x_{k+1} = b_i` up to rounding. The row-selection
//! policy is the only thing that differs between the Kaczmarz variants; see
//! the [`RowSelector`] implementations in this crate.
//!
//! # Failure modes
//!
//! - NaN or Inf in the iterate after a projection:
//!   [`SolverError::NumericalDivergence`].
//! - Iteration budget exhausted: [`SolverError::NonConvergence`] carrying the
//!   lowest-residual iterate, or an `Ok` result with `converged == false`
//!   when [`SolverConfig::fail_on_no_convergence`] is `false`.

use std::time::Instant;

use tracing::{debug, info, instrument, trace, warn};

use crate::config::SolverConfig;
use crate::error::{SolverError, ValidationError};
use crate::ops;
use crate::system::LinearSystem;
use crate::traits::RowSelector;
use crate::types::{ConvergenceInfo, SolverResult};
use crate::validation::validate_initial_guess;

// ---------------------------------------------------------------------------
// SolverState
// ---------------------------------------------------------------------------

/// Read-only snapshot of the solver handed to selectors and observers.
///
/// Selectors receive the state *before* the projection of the current
/// iteration; observers receive it *after*, with
/// [`last_row`](Self::last_row) set to the row just projected onto.
#[derive(Debug, Clone, Copy)]
pub struct SolverState<'s> {
    system: &'s LinearSystem<'s>,
    x: &'s [f64],
    iteration: usize,
    last_row: Option<usize>,
    history: &'s [ConvergenceInfo],
}

impl<'s> SolverState<'s> {
    /// State at `iteration` with no projection history.
    ///
    /// Useful for driving a selector by hand.
    pub fn new(system: &'s LinearSystem<'s>, x: &'s [f64], iteration: usize) -> Self {
        Self {
            system,
            x,
            iteration,
            last_row: None,
            history: &[],
        }
    }

    /// The system being solved.
    #[inline]
    pub fn system(&self) -> &'s LinearSystem<'s> {
        self.system
    }

    /// Current iterate.
    #[inline]
    pub fn x(&self) -> &'s [f64] {
        self.x
    }

    /// Number of projections performed so far.
    #[inline]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Row projected onto most recently, if any.
    #[inline]
    pub fn last_row(&self) -> Option<usize> {
        self.last_row
    }

    /// Residual norms measured so far (oldest first).
    #[inline]
    pub fn history(&self) -> &'s [ConvergenceInfo] {
        self.history
    }

    /// Most recent measured residual norm, if any.
    #[inline]
    pub fn last_residual_norm(&self) -> Option<f64> {
        self.history.last().map(|c| c.residual_norm)
    }
}

// ---------------------------------------------------------------------------
// KaczmarzSolver
// ---------------------------------------------------------------------------

/// Kaczmarz solver parameterised by its row-selection policy.
///
/// The solver borrows the [`LinearSystem`] (which may be shared with other
/// solvers) and exclusively owns its selector. Every call to
/// [`solve`](Self::solve) resets the selector and starts again from `x0`,
/// so repeated solves are independent.
///
/// # Example
///
/// ```rust
/// use kaczmarz_solver::config::SolverConfig;
/// use kaczmarz_solver::cyclic::Cyclic;
/// use kaczmarz_solver::solver::KaczmarzSolver;
/// use kaczmarz_solver::system::LinearSystem;
/// use kaczmarz_solver::types::DenseMatrix;
///
/// let a = DenseMatrix::from_rows(&[[2.0, 0.0], [0.0, 4.0]]).unwrap();
/// let b = vec![2.0, 8.0];
/// let system = LinearSystem::new(&a, &b).unwrap();
///
/// let mut solver = KaczmarzSolver::new(&system, Cyclic::new(), SolverConfig::default()).unwrap();
/// let result = solver.solve().unwrap();
/// assert!(result.converged);
/// assert!((result.solution[1] - 2.0).abs() < 1e-9);
/// ```
pub struct KaczmarzSolver<'s, S> {
    system: &'s LinearSystem<'s>,
    selector: S,
    config: SolverConfig,
}

impl<'s, S: RowSelector> KaczmarzSolver<'s, S> {
    /// Validate `config`, bind `selector` to `system`, and build the solver.
    ///
    /// # Errors
    ///
    /// [`SolverError::InvalidConfiguration`] if a solver parameter is out of
    /// range, `x0` does not match the system, or the selector rejects the
    /// system.
    pub fn new(
        system: &'s LinearSystem<'s>,
        mut selector: S,
        config: SolverConfig,
    ) -> Result<Self, SolverError> {
        config.validate()?;
        if let Some(x0) = &config.x0 {
            validate_initial_guess(x0, system.cols())?;
        }
        selector.bind(system)?;

        Ok(Self {
            system,
            selector,
            config,
        })
    }

    /// The system being solved.
    pub fn system(&self) -> &'s LinearSystem<'s> {
        self.system
    }

    /// The row-selection policy.
    pub fn selector(&self) -> &S {
        &self.selector
    }

    /// The solver configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Run the projection loop until convergence or until the iteration
    /// budget runs out.
    ///
    /// # Errors
    ///
    /// - [`SolverError::NumericalDivergence`] if the iterate becomes
    ///   non-finite.
    /// - [`SolverError::NonConvergence`] if the budget is exhausted and
    ///   `fail_on_no_convergence` is set.
    /// - [`SolverError::InvalidConfiguration`] if the selector returns a row
    ///   index out of range.
    pub fn solve(&mut self) -> Result<SolverResult, SolverError> {
        self.solve_with_observer(|_| {})
    }

    /// Same as [`solve`](Self::solve), calling `observer` after every
    /// projection with the updated state.
    ///
    /// # Errors
    ///
    /// See [`solve`](Self::solve).
    #[instrument(
        skip_all,
        fields(selector = %self.selector.kind(), rows = self.system.rows(), cols = self.system.cols())
    )]
    pub fn solve_with_observer<F>(&mut self, mut observer: F) -> Result<SolverResult, SolverError>
    where
        F: FnMut(&SolverState<'_>),
    {
        let start = Instant::now();
        let system = self.system;
        let rows = system.rows();
        let tolerance = self.config.tolerance;
        let max_iterations = self.config.max_iterations;
        let check_interval = self.config.check_interval;
        let kind = self.selector.kind();

        self.selector.reset();

        let mut x = match &self.config.x0 {
            Some(x0) => x0.clone(),
            None => vec![0.0; system.cols()],
        };

        let mut history =
            Vec::with_capacity((max_iterations / check_interval).min(256) + 1);
        let initial_residual = system.residual_norm(&x);
        history.push(ConvergenceInfo {
            iteration: 0,
            residual_norm: initial_residual,
        });

        info!(
            tolerance,
            max_iterations, initial_residual, "starting Kaczmarz iteration"
        );

        if initial_residual <= tolerance {
            info!("initial iterate already satisfies tolerance");
            return Ok(SolverResult {
                solution: x,
                iterations: 0,
                residual_norm: initial_residual,
                converged: true,
                wall_time: start.elapsed(),
                convergence_history: history,
                selector: kind,
            });
        }

        let mut best_residual = initial_residual;
        let mut best_x = x.clone();
        let mut last_row: Option<usize> = None;

        for k in 0..max_iterations {
            let row = {
                let state = SolverState {
                    system,
                    x: &x,
                    iteration: k,
                    last_row,
                    history: &history,
                };
                self.selector.select(&state)
            };
            if row >= rows {
                return Err(ValidationError::IndexOutOfBounds {
                    index: row,
                    len: rows,
                    context: "selected row",
                }
                .into());
            }

            let residual = system.project(row, &mut x);
            last_row = Some(row);
            let iterations = k + 1;

            if !ops::all_finite(&x) {
                warn!(iteration = iterations, row, residual, "iterate became non-finite");
                return Err(SolverError::NumericalDivergence {
                    iteration: iterations,
                    detail: format!(
                        "iterate became non-finite after projecting onto row {row} \
                         (row residual {residual:.6e})"
                    ),
                });
            }
            trace!(iteration = iterations, row, residual, "projected");

            observer(&SolverState {
                system,
                x: &x,
                iteration: iterations,
                last_row,
                history: &history,
            });

            if iterations % check_interval != 0 && iterations != max_iterations {
                continue;
            }

            let residual_norm = system.residual_norm(&x);
            history.push(ConvergenceInfo {
                iteration: iterations,
                residual_norm,
            });
            debug!(iteration = iterations, residual_norm, "residual check");

            if !residual_norm.is_finite() {
                warn!(iteration = iterations, "residual norm overflowed");
                return Err(SolverError::NumericalDivergence {
                    iteration: iterations,
                    detail: format!("residual norm became {residual_norm}"),
                });
            }

            if residual_norm < best_residual {
                best_residual = residual_norm;
                best_x.copy_from_slice(&x);
            }

            if residual_norm <= tolerance {
                info!(iterations, residual_norm, "converged");
                return Ok(SolverResult {
                    solution: x,
                    iterations,
                    residual_norm,
                    converged: true,
                    wall_time: start.elapsed(),
                    convergence_history: history,
                    selector: kind,
                });
            }
        }

        warn!(
            iterations = max_iterations,
            best_residual, tolerance, "iteration budget exhausted"
        );

        if self.config.fail_on_no_convergence {
            return Err(SolverError::NonConvergence {
                iterations: max_iterations,
                residual: best_residual,
                tolerance,
                best_iterate: best_x,
            });
        }

        Ok(SolverResult {
            solution: best_x,
            iterations: max_iterations,
            residual_norm: best_residual,
            converged: false,
            wall_time: start.elapsed(),
            convergence_history: history,
            selector: kind,
        })
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for KaczmarzSolver<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KaczmarzSolver")
            .field("system", self.system)
            .field("selector", &self.selector)
            .field("config", &self.config)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
