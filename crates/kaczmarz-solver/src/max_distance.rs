//! Greedy (maximum-distance) row selection.
//!
//! Picks the equation whose hyperplane is farthest from the current iterate,
//! i.e. `argmax_i |a_i . x - b_i| / ||a_i||`. Deterministic; ties go to the
//! lowest index. Every selection evaluates all `m` row residuals.

use crate::solver::SolverState;
use crate::system::LinearSystem;
use crate::traits::RowSelector;
use crate::types::SelectorKind;

/// Row of `system` farthest from `x`, with its distance.
pub fn farthest_row(system: &LinearSystem<'_>, x: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::NEG_INFINITY);
    for row in 0..system.rows() {
        let distance = system.row_residual(row, x).abs() / system.row_norm(row);
        if distance > best.1 {
            best = (row, distance);
        }
    }
    best
}

/// Maximum-distance row selection.
#[derive(Debug, Clone, Default)]
pub struct MaxDistance {
    last_distance: Option<f64>,
}

impl MaxDistance {
    /// Greedy selector with no selection recorded yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Distance from the iterate to the hyperplane chosen by the most
    /// recent selection.
    pub fn last_distance(&self) -> Option<f64> {
        self.last_distance
    }
}

impl RowSelector for MaxDistance {
    fn reset(&mut self) {
        self.last_distance = None;
    }

    fn select(&mut self, state: &SolverState<'_>) -> usize {
        let (row, distance) = farthest_row(state.system(), state.x());
        self.last_distance = Some(distance);
        row
    }

    fn kind(&self) -> SelectorKind {
        SelectorKind::MaxDistance
    }
}
