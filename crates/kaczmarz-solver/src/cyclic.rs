//! Deterministic cyclic row order.
//!
//! The classical Kaczmarz sweep: iteration `k` projects onto row `k mod m`.
//! A custom visiting order can be supplied with [`Cyclic::with_order`]; rows
//! are then visited in that order, repeating.

use crate::error::{SolverError, ValidationError};
use crate::solver::SolverState;
use crate::system::LinearSystem;
use crate::traits::RowSelector;
use crate::types::SelectorKind;

/// Cyclic row selection.
#[derive(Debug, Clone, Default)]
pub struct Cyclic {
    order: Option<Vec<usize>>,
    cursor: usize,
}

impl Cyclic {
    /// Visit rows `0, 1, ..., m-1, 0, 1, ...`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Visit rows in `order`, repeating. Indices are checked against the
    /// system when the selector is bound to a solver.
    ///
    /// # Errors
    ///
    /// [`SolverError::InvalidConfiguration`] if `order` is empty.
    pub fn with_order(order: Vec<usize>) -> Result<Self, SolverError> {
        if order.is_empty() {
            return Err(SolverError::out_of_range(
                "order length",
                0,
                "at least one row",
            ));
        }
        Ok(Self {
            order: Some(order),
            cursor: 0,
        })
    }

    /// The custom visiting order, if one was given.
    pub fn order(&self) -> Option<&[usize]> {
        self.order.as_deref()
    }
}

impl RowSelector for Cyclic {
    fn bind(&mut self, system: &LinearSystem<'_>) -> Result<(), SolverError> {
        if let Some(order) = &self.order {
            let rows = system.rows();
            if let Some(&index) = order.iter().find(|&&i| i >= rows) {
                return Err(ValidationError::IndexOutOfBounds {
                    index,
                    len: rows,
                    context: "cyclic order",
                }
                .into());
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn select(&mut self, state: &SolverState<'_>) -> usize {
        let (row, len) = match &self.order {
            Some(order) => (order[self.cursor % order.len()], order.len()),
            None => {
                let rows = state.system().rows();
                (self.cursor % rows, rows)
            }
        };
        self.cursor = (self.cursor + 1) % len;
        row
    }

    fn kind(&self) -> SelectorKind {
        SelectorKind::Cyclic
    }
}
