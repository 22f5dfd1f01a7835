//! Randomized row selection.
//!
//! Three flavours:
//!
//! - [`Random`]: row `i` with probability proportional to a weight, by
//!   default `||a_i||^2`. Weights are re-read on every draw, so a draw is
//!   O(m).
//! - [`UniformRandom`]: every row equally likely, O(1) per draw.
//! - [`SVRandom`]: the Strohmer-Vershynin distribution
//!   `p_i = ||a_i||^2 / ||A||_F^2`, precomputed once so that draws are
//!   O(log m).
//!
//! Every selector owns a [`StdRng`]. A seed of `0` draws fresh entropy on
//! each reset; any other seed makes the selection sequence (and therefore
//! the whole solve) reproducible.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{SolverError, ValidationError};
use crate::solver::SolverState;
use crate::system::LinearSystem;
use crate::traits::RowSelector;
use crate::types::SelectorKind;

/// Build the generator for `seed` (0 = use entropy source).
pub(crate) fn make_rng(seed: u64) -> StdRng {
    if seed == 0 {
        StdRng::from_entropy()
    } else {
        StdRng::seed_from_u64(seed)
    }
}

// ---------------------------------------------------------------------------
// Random
// ---------------------------------------------------------------------------

/// Weighted random row selection, by default proportional to `||a_i||^2`.
#[derive(Debug, Clone)]
pub struct Random {
    weights: Option<Vec<f64>>,
    seed: u64,
    rng: StdRng,
}

impl Random {
    /// Rows drawn proportionally to their squared norms.
    pub fn new() -> Self {
        Self {
            weights: None,
            seed: 0,
            rng: make_rng(0),
        }
    }

    /// Rows drawn proportionally to `weights` instead of the row norms.
    ///
    /// # Errors
    ///
    /// [`SolverError::InvalidConfiguration`] if a weight is negative or
    /// non-finite, or if the weights sum to zero or overflow.
    pub fn with_weights(weights: Vec<f64>) -> Result<Self, SolverError> {
        if let Some((i, w)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(SolverError::out_of_range(
                &format!("weights[{i}]"),
                w,
                "finite value >= 0",
            ));
        }
        let total: f64 = weights.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(SolverError::out_of_range(
                "sum of weights",
                total,
                "finite positive value",
            ));
        }
        Ok(Self {
            weights: Some(weights),
            ..Self::new()
        })
    }

    /// Set the random seed for reproducible results.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = make_rng(seed);
        self
    }

    /// Configured seed (0 = entropy).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Inverse-CDF draw over `weights` by linear scan.
    fn draw(rng: &mut StdRng, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        let mut u = rng.gen::<f64>() * total;
        for (i, &w) in weights.iter().enumerate() {
            if u < w {
                return i;
            }
            u -= w;
        }
        // Rounding left u just above the last bucket.
        weights.iter().rposition(|&w| w > 0.0).unwrap_or(0)
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}

impl RowSelector for Random {
    fn bind(&mut self, system: &LinearSystem<'_>) -> Result<(), SolverError> {
        if let Some(weights) = &self.weights {
            if weights.len() != system.rows() {
                return Err(ValidationError::DimensionMismatch(format!(
                    "weights length {} does not match matrix rows {}",
                    weights.len(),
                    system.rows(),
                ))
                .into());
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.rng = make_rng(self.seed);
    }

    fn select(&mut self, state: &SolverState<'_>) -> usize {
        let weights = match &self.weights {
            Some(w) => w.as_slice(),
            None => state.system().row_norms_sq(),
        };
        Self::draw(&mut self.rng, weights)
    }

    fn kind(&self) -> SelectorKind {
        SelectorKind::Random
    }
}

// ---------------------------------------------------------------------------
// UniformRandom
// ---------------------------------------------------------------------------

/// Every row equally likely, independently of its norm.
#[derive(Debug, Clone)]
pub struct UniformRandom {
    seed: u64,
    rng: StdRng,
}

impl UniformRandom {
    /// Uniform selection seeded from entropy; see [`with_seed`](Self::with_seed).
    pub fn new() -> Self {
        Self {
            seed: 0,
            rng: make_rng(0),
        }
    }

    /// Set the random seed for reproducible results.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = make_rng(seed);
        self
    }

    /// Configured seed (0 = entropy).
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for UniformRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RowSelector for UniformRandom {
    fn reset(&mut self) {
        self.rng = make_rng(self.seed);
    }

    fn select(&mut self, state: &SolverState<'_>) -> usize {
        self.rng.gen_range(0..state.system().rows())
    }

    fn kind(&self) -> SelectorKind {
        SelectorKind::UniformRandom
    }
}

// ---------------------------------------------------------------------------
// SVRandom
// ---------------------------------------------------------------------------

/// Strohmer-Vershynin randomized Kaczmarz.
///
/// Row `i` is drawn with probability `||a_i||^2 / ||A||_F^2`. The
/// distribution is built once from the system passed to [`SVRandom::new`];
/// the selector can only drive systems with the same number of rows.
#[derive(Debug, Clone)]
pub struct SVRandom {
    dist: WeightedIndex<f64>,
    probabilities: Vec<f64>,
    seed: u64,
    rng: StdRng,
}

impl SVRandom {
    /// Precompute the row distribution of `system`.
    ///
    /// # Errors
    ///
    /// [`SolverError::InvalidConfiguration`] if the row norms do not form a
    /// valid distribution. Cannot happen for a successfully built
    /// [`LinearSystem`].
    pub fn new(system: &LinearSystem<'_>) -> Result<Self, SolverError> {
        let weights = system.row_norms_sq();
        let dist = WeightedIndex::new(weights).map_err(|e| {
            SolverError::out_of_range(
                "row weights",
                e,
                "finite non-negative weights with positive sum",
            )
        })?;
        let total = system.frobenius_norm_sq();
        let probabilities = weights.iter().map(|w| w / total).collect();
        Ok(Self {
            dist,
            probabilities,
            seed: 0,
            rng: make_rng(0),
        })
    }

    /// Set the random seed for reproducible results.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = make_rng(seed);
        self
    }

    /// Configured seed (0 = entropy).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Selection probability of every row (sums to 1).
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }
}

impl RowSelector for SVRandom {
    fn bind(&mut self, system: &LinearSystem<'_>) -> Result<(), SolverError> {
        if system.rows() != self.probabilities.len() {
            return Err(ValidationError::DimensionMismatch(format!(
                "selector was built for {} rows, system has {}",
                self.probabilities.len(),
                system.rows(),
            ))
            .into());
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.rng = make_rng(self.seed);
    }

    fn select(&mut self, _state: &SolverState<'_>) -> usize {
        self.dist.sample(&mut self.rng)
    }

    fn kind(&self) -> SelectorKind {
        SelectorKind::SVRandom
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
