//! Order statistics used by the quantile selectors.
//!
//! The quantile estimator interpolates linearly between adjacent order
//! statistics: for `N` values and level `q`, the position is `h = (N-1) q`
//! and the result is `v[floor(h)] + (h - floor(h)) (v[ceil(h)] - v[floor(h)])`.
//! `q = 1` therefore yields the maximum and `q = 0.5` the usual median.

use std::collections::VecDeque;

/// Quantile of an already sorted (ascending) slice.
///
/// Returns `None` for an empty slice.
pub fn sorted_quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let h = (n - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let frac = h - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Quantile of an unsorted slice, reordering it in place.
///
/// Runs in expected O(N) using two selections instead of a full sort.
/// Returns `None` for an empty slice.
pub fn quantile_in_place(values: &mut [f64], q: f64) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let h = (n - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let frac = h - lo as f64;

    let (_, &mut v_lo, upper) = values.select_nth_unstable_by(lo, f64::total_cmp);
    if frac == 0.0 || upper.is_empty() {
        return Some(v_lo);
    }
    // The next order statistic is the minimum of the upper partition.
    let v_hi = upper.iter().copied().fold(f64::INFINITY, f64::min);
    Some(v_lo + frac * (v_hi - v_lo))
}

// ---------------------------------------------------------------------------
// SlidingWindow
// ---------------------------------------------------------------------------

/// Fixed-capacity FIFO of observations with a sorted mirror.
///
/// Pushing costs O(capacity) (one binary-search removal and one insertion in
/// the mirror); reading a quantile costs O(1).
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    fifo: VecDeque<f64>,
    sorted: Vec<f64>,
    capacity: usize,
}

impl SlidingWindow {
    /// Empty window holding at most `capacity` values.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be positive");
        Self {
            fifo: VecDeque::with_capacity(capacity),
            sorted: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `value`, evicting the oldest observation once full.
    ///
    /// Returns the evicted value, if any.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.fifo.len() == self.capacity {
            let old = self.fifo.pop_front();
            if let Some(old) = old {
                let pos = self.sorted.partition_point(|v| v.total_cmp(&old).is_lt());
                self.sorted.remove(pos);
            }
            old
        } else {
            None
        };

        self.fifo.push_back(value);
        let pos = self
            .sorted
            .partition_point(|v| v.total_cmp(&value).is_le());
        self.sorted.insert(pos, value);
        evicted
    }

    /// Quantile of the current contents; `None` while empty.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        sorted_quantile(&self.sorted, q)
    }

    /// Number of stored observations.
    pub fn len(&self) -> usize {
        self.fifo.len()
    }

    /// `true` if nothing has been observed yet.
    pub fn is_empty(&self) -> bool {
        self.fifo.is_empty()
    }

    /// `true` once `capacity` observations are stored.
    pub fn is_full(&self) -> bool {
        self.fifo.len() == self.capacity
    }

    /// Maximum number of stored observations.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Observations in arrival order (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.fifo.iter().copied()
    }

    /// Drop every observation.
    pub fn clear(&mut self) {
        self.fifo.clear();
        self.sorted.clear();
    }
}
