//! Kaczmarz row-projection solvers for linear systems `Ax = b`.
//!
//! Every Kaczmarz variant shares the same update: pick a row `i`, then
//! project the iterate onto the hyperplane `a_i . x = b_i`. The variants
//! differ only in how the row is picked, so this crate has one solver,
//! [`KaczmarzSolver`](solver::KaczmarzSolver), parameterised by a
//! [`RowSelector`](traits::RowSelector).
//!
//! # Available selectors
//!
//! | Selector | Module | Row choice |
//! |----------|--------|------------|
//! | [`Cyclic`](cyclic::Cyclic) | `cyclic` | `k mod m` (or a custom order) |
//! | [`Random`](random::Random) | `random` | probability proportional to `\|\|a_i\|\|^2` |
//! | [`UniformRandom`](random::UniformRandom) | `random` | uniform |
//! | [`SVRandom`](random::SVRandom) | `random` | precomputed `\|\|a_i\|\|^2 / \|\|A\|\|_F^2` |
//! | [`MaxDistance`](max_distance::MaxDistance) | `max_distance` | farthest hyperplane |
//! | [`Quantile`](quantile::Quantile) | `quantile` | uniform among rows below a residual quantile |
//! | [`SampledQuantile`](quantile::SampledQuantile) | `quantile` | same, threshold from a subsample |
//! | [`WindowedQuantile`](quantile::WindowedQuantile) | `quantile` | same, threshold from recent residuals |
//!
//! The quantile selectors are robust to a minority of corrupted equations:
//! rows with outsized residuals are excluded from projection.
//!
//! # Example
//!
//! ```rust
//! use kaczmarz_solver::config::SolverConfig;
//! use kaczmarz_solver::quantile::Quantile;
//! use kaczmarz_solver::solver::KaczmarzSolver;
//! use kaczmarz_solver::system::LinearSystem;
//! use kaczmarz_solver::types::CsrMatrix;
//!
//! // Overdetermined, consistent: x* = (1, 2).
//! let matrix = CsrMatrix::<f64>::from_coo(4, 2, vec![
//!     (0, 0, 1.0),
//!     (1, 1, 1.0),
//!     (2, 0, 1.0), (2, 1, 1.0),
//!     (3, 0, 1.0), (3, 1, -1.0),
//! ]);
//! let rhs = vec![1.0, 2.0, 3.0, -1.0];
//! let system = LinearSystem::from_csr(&matrix, &rhs).unwrap();
//!
//! let selector = Quantile::new(0.9).unwrap().with_seed(42);
//! let config = SolverConfig::default().with_tolerance(1e-10);
//! let mut solver = KaczmarzSolver::new(&system, selector, config).unwrap();
//! let result = solver.solve().unwrap();
//! assert!(result.converged);
//! assert!((result.solution[0] - 1.0).abs() < 1e-8);
//! ```

pub mod config;
pub mod cyclic;
pub mod error;
pub mod max_distance;
pub mod ops;
pub mod quantile;
pub mod random;
pub mod solver;
pub mod stats;
pub mod system;
pub mod traits;
pub mod types;
pub mod validation;

pub use config::{SelectorConfig, SolverConfig};
pub use error::{SolverError, ValidationError};
pub use solver::{KaczmarzSolver, SolverState};
pub use system::LinearSystem;
pub use traits::{RowMatrix, RowSelector};
pub use types::{ConvergenceInfo, CsrMatrix, DenseMatrix, SelectorKind, SolverResult};
