//! Solver and selector configuration.
//!
//! Both [`SolverConfig`] and [`SelectorConfig`] derive `serde` so that a
//! complete solve can be described in JSON (or any other serde format):
//!
//! ```rust
//! use kaczmarz_solver::config::{SelectorConfig, SolverConfig};
//!
//! let selector: SelectorConfig = serde_json::from_str(
//!     r#"{ "kind": "sampled_quantile", "quantile": 0.9, "sample_size": 50, "seed": 7 }"#,
//! ).unwrap();
//! let solver: SolverConfig =
//!     serde_json::from_str(r#"{ "max_iterations": 500, "tolerance": 1e-8 }"#).unwrap();
//! assert_eq!(solver.check_interval, 1);
//! # let _ = selector;
//! ```

use serde::{Deserialize, Serialize};

use crate::cyclic::Cyclic;
use crate::error::{SolverError, ValidationError};
use crate::max_distance::MaxDistance;
use crate::quantile::{
    Quantile, ResidualMeasure, SampledQuantile, Sampling, WindowedQuantile,
};
use crate::random::{Random, SVRandom, UniformRandom};
use crate::system::LinearSystem;
use crate::traits::RowSelector;
use crate::types::SelectorKind;
use crate::validation::{validate_count, validate_initial_guess, validate_tolerance};

// ---------------------------------------------------------------------------
// SolverConfig
// ---------------------------------------------------------------------------

/// Parameters of the projection loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum number of projections.
    pub max_iterations: usize,
    /// Absolute tolerance on `||A x - b||_2`.
    pub tolerance: f64,
    /// Initial iterate; zero vector when `None`.
    pub x0: Option<Vec<f64>>,
    /// Return [`SolverError::NonConvergence`] when the budget runs out. When
    /// `false` the best iterate is returned with `converged == false`.
    pub fail_on_no_convergence: bool,
    /// Measure the full residual every this many projections.
    pub check_interval: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-6,
            x0: None,
            fail_on_no_convergence: true,
            check_interval: 1,
        }
    }
}

impl SolverConfig {
    /// Iteration budget (default 10 000).
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Absolute residual-norm tolerance (default 1e-6).
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Start from `x0` instead of the zero vector.
    pub fn with_x0(mut self, x0: Vec<f64>) -> Self {
        self.x0 = Some(x0);
        self
    }

    /// Return `Err(NonConvergence)` (default) or the best iterate when the budget runs out.
    pub fn with_fail_on_no_convergence(mut self, fail: bool) -> Self {
        self.fail_on_no_convergence = fail;
        self
    }

    /// Measure `||A x - b||` every `check_interval` projections (default 1).
    pub fn with_check_interval(mut self, check_interval: usize) -> Self {
        self.check_interval = check_interval;
        self
    }

    /// Check every parameter that does not depend on the system.
    ///
    /// # Errors
    ///
    /// [`ValidationError::ParameterOutOfRange`] for a negative or non-finite
    /// tolerance, a zero iteration budget, a zero check interval, or a
    /// non-finite `x0` entry.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_tolerance(self.tolerance)?;
        validate_count("max_iterations", self.max_iterations, 1, usize::MAX)?;
        validate_count("check_interval", self.check_interval, 1, usize::MAX)?;
        if let Some(x0) = &self.x0 {
            validate_initial_guess(x0, x0.len())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SelectorConfig
// ---------------------------------------------------------------------------

fn default_quantile() -> f64 {
    0.9
}

/// Serializable description of a row-selection policy.
///
/// `seed == 0` (the default) means "seed from entropy".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectorConfig {
    Cyclic {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        order: Option<Vec<usize>>,
    },
    Random {
        #[serde(default)]
        seed: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weights: Option<Vec<f64>>,
    },
    UniformRandom {
        #[serde(default)]
        seed: u64,
    },
    #[serde(rename = "sv_random")]
    SVRandom {
        #[serde(default)]
        seed: u64,
    },
    MaxDistance,
    Quantile {
        #[serde(default = "default_quantile")]
        quantile: f64,
        #[serde(default)]
        measure: ResidualMeasure,
        #[serde(default)]
        seed: u64,
    },
    SampledQuantile {
        #[serde(default = "default_quantile")]
        quantile: f64,
        sample_size: usize,
        #[serde(default)]
        sampling: Sampling,
        #[serde(default)]
        measure: ResidualMeasure,
        #[serde(default)]
        seed: u64,
    },
    WindowedQuantile {
        #[serde(default = "default_quantile")]
        quantile: f64,
        window_size: usize,
        #[serde(default)]
        measure: ResidualMeasure,
        #[serde(default)]
        seed: u64,
    },
}

impl Default for SelectorConfig {
    fn default() -> Self {
        SelectorConfig::Cyclic { order: None }
    }
}

impl SelectorConfig {
    /// Policy this configuration describes.
    pub fn kind(&self) -> SelectorKind {
        match self {
            SelectorConfig::Cyclic { .. } => SelectorKind::Cyclic,
            SelectorConfig::Random { .. } => SelectorKind::Random,
            SelectorConfig::UniformRandom { .. } => SelectorKind::UniformRandom,
            SelectorConfig::SVRandom { .. } => SelectorKind::SVRandom,
            SelectorConfig::MaxDistance => SelectorKind::MaxDistance,
            SelectorConfig::Quantile { .. } => SelectorKind::Quantile,
            SelectorConfig::SampledQuantile { .. } => SelectorKind::SampledQuantile,
            SelectorConfig::WindowedQuantile { .. } => SelectorKind::WindowedQuantile,
        }
    }

    /// Instantiate the selector for `system`.
    ///
    /// The selector is not yet bound; [`KaczmarzSolver::new`] does that.
    ///
    /// # Errors
    ///
    /// [`SolverError::InvalidConfiguration`] if a parameter is out of range.
    ///
    /// [`KaczmarzSolver::new`]: crate::solver::KaczmarzSolver::new
    pub fn build(&self, system: &LinearSystem<'_>) -> Result<Box<dyn RowSelector>, SolverError> {
        let selector: Box<dyn RowSelector> = match self {
            SelectorConfig::Cyclic { order: None } => Box::new(Cyclic::new()),
            SelectorConfig::Cyclic { order: Some(order) } => {
                Box::new(Cyclic::with_order(order.clone())?)
            }
            SelectorConfig::Random { seed, weights } => {
                let random = match weights {
                    Some(w) => Random::with_weights(w.clone())?,
                    None => Random::new(),
                };
                Box::new(random.with_seed(*seed))
            }
            SelectorConfig::UniformRandom { seed } => {
                Box::new(UniformRandom::new().with_seed(*seed))
            }
            SelectorConfig::SVRandom { seed } => Box::new(SVRandom::new(system)?.with_seed(*seed)),
            SelectorConfig::MaxDistance => Box::new(MaxDistance::new()),
            SelectorConfig::Quantile {
                quantile,
                measure,
                seed,
            } => Box::new(
                Quantile::new(*quantile)?
                    .with_measure(*measure)
                    .with_seed(*seed),
            ),
            SelectorConfig::SampledQuantile {
                quantile,
                sample_size,
                sampling,
                measure,
                seed,
            } => Box::new(
                SampledQuantile::new(*quantile, *sample_size)?
                    .with_sampling(*sampling)
                    .with_measure(*measure)
                    .with_seed(*seed),
            ),
            SelectorConfig::WindowedQuantile {
                quantile,
                window_size,
                measure,
                seed,
            } => Box::new(
                WindowedQuantile::new(*quantile, *window_size)?
                    .with_measure(*measure)
                    .with_seed(*seed),
            ),
        };
        Ok(selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DenseMatrix;

    #[test]
    fn solver_defaults() {
        let c = SolverConfig::default();
        assert_eq!(c.max_iterations, 10_000);
        assert_eq!(c.tolerance, 1e-6);
        assert_eq!(c.check_interval, 1);
        assert!(c.fail_on_no_convergence);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn solver_validation() {
        assert!(SolverConfig::default().with_tolerance(-1.0).validate().is_err());
        assert!(SolverConfig::default().with_max_iterations(0).validate().is_err());
        assert!(SolverConfig::default().with_check_interval(0).validate().is_err());
        assert!(SolverConfig::default()
            .with_x0(vec![0.0, f64::NAN])
            .validate()
            .is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: SolverConfig = serde_json::from_str(r#"{ "tolerance": 1e-9 }"#).unwrap();
        assert_eq!(c.tolerance, 1e-9);
        assert_eq!(c.max_iterations, 10_000);
        assert_eq!(c.x0, None);
    }

    #[test]
    fn selector_json_tags() {
        let s: SelectorConfig = serde_json::from_str(r#"{ "kind": "max_distance" }"#).unwrap();
        assert_eq!(s, SelectorConfig::MaxDistance);

        let s: SelectorConfig =
            serde_json::from_str(r#"{ "kind": "sv_random", "seed": 3 }"#).unwrap();
        assert_eq!(s.kind(), SelectorKind::SVRandom);

        let s: SelectorConfig =
            serde_json::from_str(r#"{ "kind": "windowed_quantile", "window_size": 32 }"#)
                .unwrap();
        assert_eq!(
            s,
            SelectorConfig::WindowedQuantile {
                quantile: 0.9,
                window_size: 32,
                measure: ResidualMeasure::Normalized,
                seed: 0,
            }
        );
    }

    #[test]
    fn build_every_kind() {
        let a = DenseMatrix::from_rows(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]).unwrap();
        let b = vec![1.0, 1.0, 2.0];
        let system = LinearSystem::new(&a, &b).unwrap();

        let configs = [
            SelectorConfig::default(),
            SelectorConfig::Random { seed: 1, weights: None },
            SelectorConfig::UniformRandom { seed: 1 },
            SelectorConfig::SVRandom { seed: 1 },
            SelectorConfig::MaxDistance,
            SelectorConfig::Quantile {
                quantile: 0.5,
                measure: ResidualMeasure::Absolute,
                seed: 1,
            },
            SelectorConfig::SampledQuantile {
                quantile: 0.5,
                sample_size: 2,
                sampling: Sampling::WithReplacement,
                measure: ResidualMeasure::Normalized,
                seed: 1,
            },
            SelectorConfig::WindowedQuantile {
                quantile: 0.5,
                window_size: 4,
                measure: ResidualMeasure::Normalized,
                seed: 1,
            },
        ];
        for config in &configs {
            let selector = config.build(&system).unwrap();
            assert_eq!(selector.kind(), config.kind());
        }
    }

    #[test]
    fn build_rejects_bad_parameters() {
        let a = DenseMatrix::identity(2);
        let b = vec![1.0, 1.0];
        let system = LinearSystem::new(&a, &b).unwrap();

        let bad = [
            SelectorConfig::Cyclic { order: Some(vec![]) },
            SelectorConfig::Random {
                seed: 0,
                weights: Some(vec![-1.0, 2.0]),
            },
            SelectorConfig::Quantile {
                quantile: 0.0,
                measure: ResidualMeasure::Normalized,
                seed: 0,
            },
            SelectorConfig::SampledQuantile {
                quantile: 0.5,
                sample_size: 0,
                sampling: Sampling::WithoutReplacement,
                measure: ResidualMeasure::Normalized,
                seed: 0,
            },
            SelectorConfig::WindowedQuantile {
                quantile: 0.5,
                window_size: 0,
                measure: ResidualMeasure::Normalized,
                seed: 0,
            },
        ];
        for config in &bad {
            assert!(
                matches!(config.build(&system), Err(SolverError::InvalidConfiguration(_))),
                "{config:?} should be rejected"
            );
        }
    }
}
