//! Quantile-based robust row selection.
//!
//! These selectors only project onto equations whose current residual lies
//! at or below a quantile of the residual distribution. Equations that have
//! been corrupted by large errors sit in the upper tail and are therefore
//! (almost) never chosen once the iterate approaches the solution of the
//! consistent equations.
//!
//! | Selector             | Threshold computed from          | Cost per selection     |
//! |----------------------|----------------------------------|------------------------|
//! | [`Quantile`]         | every row's residual             | O(m n)                 |
//! | [`SampledQuantile`]  | a random subsample of `s` rows   | O(s n) + proposals     |
//! | [`WindowedQuantile`] | the last `w` proposed residuals  | O(w) + proposals       |
//!
//! The residual of a row is measured by a [`ResidualMeasure`]; the quantile
//! uses linear interpolation between order statistics (see [`crate::stats`]).

use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SolverError;
use crate::random::make_rng;
use crate::solver::SolverState;
use crate::stats::{quantile_in_place, SlidingWindow};
use crate::system::LinearSystem;
use crate::traits::RowSelector;
use crate::types::SelectorKind;
use crate::validation::{validate_count, validate_quantile};

/// Upper bound on rejection-sampling proposals per selection.
pub const MAX_PROPOSALS: usize = 64;

// ---------------------------------------------------------------------------
// Policy enums
// ---------------------------------------------------------------------------

/// How the residual of a row is measured before thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidualMeasure {
    /// `|a_i . x - b_i|`.
    Absolute,
    /// `|a_i . x - b_i| / ||a_i||`: distance to the row's hyperplane.
    #[default]
    Normalized,
}

impl ResidualMeasure {
    /// Measure of `row` at `x`.
    #[inline]
    pub fn evaluate(self, system: &LinearSystem<'_>, row: usize, x: &[f64]) -> f64 {
        let r = system.row_residual(row, x).abs();
        match self {
            ResidualMeasure::Absolute => r,
            ResidualMeasure::Normalized => r / system.row_norm(row),
        }
    }
}

/// How [`SampledQuantile`] draws its subsample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampling {
    /// Distinct rows.
    #[default]
    WithoutReplacement,
    /// Independent uniform draws; rows may repeat.
    WithReplacement,
}

/// Uniform choice among the rows whose value is at or below `threshold`.
///
/// `values[k]` is the measure of `rows(k)`. Returns `None` if no value
/// qualifies.
fn pick_below(
    rng: &mut StdRng,
    values: &[f64],
    threshold: f64,
    rows: impl Fn(usize) -> usize,
) -> Option<usize> {
    let eligible = values.iter().filter(|&&v| v <= threshold).count();
    if eligible == 0 {
        return None;
    }
    let pick = rng.gen_range(0..eligible);
    values
        .iter()
        .enumerate()
        .filter(|(_, &v)| v <= threshold)
        .nth(pick)
        .map(|(k, _)| rows(k))
}

// ---------------------------------------------------------------------------
// Quantile
// ---------------------------------------------------------------------------

/// Full-information quantile selection.
///
/// Every iteration measures all `m` rows, takes the `q`-quantile of the
/// measures as threshold, and picks uniformly among rows at or below it.
#[derive(Debug, Clone)]
pub struct Quantile {
    quantile: f64,
    measure: ResidualMeasure,
    seed: u64,
    rng: StdRng,
    measures: Vec<f64>,
    scratch: Vec<f64>,
    last_threshold: Option<f64>,
}

impl Quantile {
    /// # Errors
    ///
    /// [`SolverError::InvalidConfiguration`] unless `0 < quantile <= 1`.
    pub fn new(quantile: f64) -> Result<Self, SolverError> {
        validate_quantile(quantile)?;
        Ok(Self {
            quantile,
            measure: ResidualMeasure::default(),
            seed: 0,
            rng: make_rng(0),
            measures: Vec::new(),
            scratch: Vec::new(),
            last_threshold: None,
        })
    }

    /// Set the random seed for reproducible results.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = make_rng(seed);
        self
    }

    /// Residual measure used for the threshold (default: normalized).
    pub fn with_measure(mut self, measure: ResidualMeasure) -> Self {
        self.measure = measure;
        self
    }

    /// Quantile level `q`.
    pub fn quantile(&self) -> f64 {
        self.quantile
    }

    /// Residual measure compared against the threshold.
    pub fn measure(&self) -> ResidualMeasure {
        self.measure
    }

    /// Threshold used by the most recent selection.
    pub fn last_threshold(&self) -> Option<f64> {
        self.last_threshold
    }
}

impl RowSelector for Quantile {
    fn bind(&mut self, system: &LinearSystem<'_>) -> Result<(), SolverError> {
        self.measures.reserve(system.rows());
        self.scratch.reserve(system.rows());
        Ok(())
    }

    fn reset(&mut self) {
        self.rng = make_rng(self.seed);
        self.last_threshold = None;
    }

    fn select(&mut self, state: &SolverState<'_>) -> usize {
        let system = state.system();
        let x = state.x();
        let measure = self.measure;

        self.measures.clear();
        self.measures
            .extend((0..system.rows()).map(|row| measure.evaluate(system, row, x)));
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.measures);

        let threshold =
            quantile_in_place(&mut self.scratch, self.quantile).unwrap_or(f64::INFINITY);
        self.last_threshold = Some(threshold);

        pick_below(&mut self.rng, &self.measures, threshold, |row| row).unwrap_or(0)
    }

    fn kind(&self) -> SelectorKind {
        SelectorKind::Quantile
    }
}

// ---------------------------------------------------------------------------
// SampledQuantile
// ---------------------------------------------------------------------------

/// Quantile selection with a threshold estimated from a random subsample.
///
/// Each iteration draws `sample_size` rows, takes the `q`-quantile of their
/// measures as threshold, then proposes uniformly random rows (out of all
/// `m`) and accepts the first one at or below the threshold. After
/// [`MAX_PROPOSALS`] rejections it falls back to a uniform pick among the
/// subsample rows at or below the threshold.
#[derive(Debug, Clone)]
pub struct SampledQuantile {
    quantile: f64,
    sample_size: usize,
    sampling: Sampling,
    measure: ResidualMeasure,
    seed: u64,
    rng: StdRng,
    sample_rows: Vec<usize>,
    sample_measures: Vec<f64>,
    scratch: Vec<f64>,
    last_threshold: Option<f64>,
}

impl SampledQuantile {
    /// # Errors
    ///
    /// [`SolverError::InvalidConfiguration`] unless `0 < quantile <= 1` and
    /// `sample_size >= 1`. The upper bound `sample_size <= m` is checked
    /// when the selector is bound to a system.
    pub fn new(quantile: f64, sample_size: usize) -> Result<Self, SolverError> {
        validate_quantile(quantile)?;
        validate_count("sample_size", sample_size, 1, usize::MAX)?;
        Ok(Self {
            quantile,
            sample_size,
            sampling: Sampling::default(),
            measure: ResidualMeasure::default(),
            seed: 0,
            rng: make_rng(0),
            sample_rows: Vec::with_capacity(sample_size),
            sample_measures: Vec::with_capacity(sample_size),
            scratch: Vec::with_capacity(sample_size),
            last_threshold: None,
        })
    }

    /// Set the random seed for reproducible results.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = make_rng(seed);
        self
    }

    /// Residual measure used for the subsample and proposals (default: normalized).
    pub fn with_measure(mut self, measure: ResidualMeasure) -> Self {
        self.measure = measure;
        self
    }

    /// Draw the subsample with or without replacement (default: without).
    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// Quantile level `q` of the subsample threshold.
    pub fn quantile(&self) -> f64 {
        self.quantile
    }

    /// Rows drawn per selection.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// How the subsample is drawn.
    pub fn sampling(&self) -> Sampling {
        self.sampling
    }

    /// Threshold used by the most recent selection.
    pub fn last_threshold(&self) -> Option<f64> {
        self.last_threshold
    }

    fn draw_sample(&mut self, rows: usize) {
        self.sample_rows.clear();
        let size = self.sample_size.min(rows);
        match self.sampling {
            Sampling::WithoutReplacement => {
                self.sample_rows
                    .extend(index::sample(&mut self.rng, rows, size).iter());
            }
            Sampling::WithReplacement => {
                for _ in 0..size {
                    self.sample_rows.push(self.rng.gen_range(0..rows));
                }
            }
        }
    }
}

impl RowSelector for SampledQuantile {
    fn bind(&mut self, system: &LinearSystem<'_>) -> Result<(), SolverError> {
        validate_count("sample_size", self.sample_size, 1, system.rows())?;
        Ok(())
    }

    fn reset(&mut self) {
        self.rng = make_rng(self.seed);
        self.last_threshold = None;
    }

    fn select(&mut self, state: &SolverState<'_>) -> usize {
        let system = state.system();
        let x = state.x();
        let rows = system.rows();
        let measure = self.measure;

        self.draw_sample(rows);
        self.sample_measures.clear();
        self.sample_measures.extend(
            self.sample_rows
                .iter()
                .map(|&row| measure.evaluate(system, row, x)),
        );
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.sample_measures);

        let threshold =
            quantile_in_place(&mut self.scratch, self.quantile).unwrap_or(f64::INFINITY);
        self.last_threshold = Some(threshold);

        for _ in 0..MAX_PROPOSALS {
            let row = self.rng.gen_range(0..rows);
            if measure.evaluate(system, row, x) <= threshold {
                return row;
            }
        }

        let sample_rows = &self.sample_rows;
        pick_below(&mut self.rng, &self.sample_measures, threshold, |k| {
            sample_rows[k]
        })
        .unwrap_or(0)
    }

    fn kind(&self) -> SelectorKind {
        SelectorKind::SampledQuantile
    }
}

// ---------------------------------------------------------------------------
// WindowedQuantile
// ---------------------------------------------------------------------------

/// Quantile selection against a sliding window of recent residuals.
///
/// Every proposed row's measure is pushed into a fixed-capacity window that
/// persists across iterations. Until the window is full, proposals are
/// accepted unconditionally. Afterwards a proposal is accepted when its
/// measure is at or below the window's `q`-quantile; after
/// [`MAX_PROPOSALS`] rejections the smallest-measure proposal wins.
///
/// The window mixes residuals observed at older iterates, so the threshold
/// lags behind (and generally differs from) the full-information
/// [`Quantile`] threshold.
#[derive(Debug, Clone)]
pub struct WindowedQuantile {
    quantile: f64,
    measure: ResidualMeasure,
    seed: u64,
    rng: StdRng,
    window: SlidingWindow,
    last_threshold: Option<f64>,
}

impl WindowedQuantile {
    /// # Errors
    ///
    /// [`SolverError::InvalidConfiguration`] unless `0 < quantile <= 1` and
    /// `window_size >= 1`.
    pub fn new(quantile: f64, window_size: usize) -> Result<Self, SolverError> {
        validate_quantile(quantile)?;
        validate_count("window_size", window_size, 1, usize::MAX)?;
        Ok(Self {
            quantile,
            measure: ResidualMeasure::default(),
            seed: 0,
            rng: make_rng(0),
            window: SlidingWindow::new(window_size),
            last_threshold: None,
        })
    }

    /// Set the random seed for reproducible results.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = make_rng(seed);
        self
    }

    /// Residual measure used for proposals and the window (default: normalized).
    pub fn with_measure(mut self, measure: ResidualMeasure) -> Self {
        self.measure = measure;
        self
    }

    /// Quantile level `q` of the window threshold.
    pub fn quantile(&self) -> f64 {
        self.quantile
    }

    /// Capacity of the sliding window.
    pub fn window_size(&self) -> usize {
        self.window.capacity()
    }

    /// Record a residual measure in the window, evicting the oldest one
    /// once full.
    pub fn observe(&mut self, value: f64) {
        self.window.push(value);
    }

    /// `q`-quantile of the current window contents; `None` while empty.
    pub fn threshold(&self) -> Option<f64> {
        self.window.quantile(self.quantile)
    }

    /// Threshold used by the most recent post-warm-up selection.
    pub fn last_threshold(&self) -> Option<f64> {
        self.last_threshold
    }

    /// Sliding window of recently observed measures.
    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }
}

impl RowSelector for WindowedQuantile {
    fn reset(&mut self) {
        self.rng = make_rng(self.seed);
        self.window.clear();
        self.last_threshold = None;
    }

    fn select(&mut self, state: &SolverState<'_>) -> usize {
        let system = state.system();
        let x = state.x();
        let rows = system.rows();

        let mut fallback: Option<(usize, f64)> = None;
        for _ in 0..MAX_PROPOSALS {
            let row = self.rng.gen_range(0..rows);
            let value = self.measure.evaluate(system, row, x);
            self.observe(value);

            if !self.window.is_full() {
                return row;
            }
            let threshold = self.threshold().unwrap_or(f64::INFINITY);
            self.last_threshold = Some(threshold);
            if value <= threshold {
                return row;
            }
            if fallback.map_or(true, |(_, best)| value < best) {
                fallback = Some((row, value));
            }
        }

        fallback.map_or(0, |(row, _)| row)
    }

    fn kind(&self) -> SelectorKind {
        SelectorKind::WindowedQuantile
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
