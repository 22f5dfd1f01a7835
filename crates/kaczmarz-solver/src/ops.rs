//! Dense vector kernels used by the projection loop.
//!
//! The solver works on plain `&[f64]` slices; these helpers are the only
//! vector arithmetic it needs: dot, AXPY and a finiteness check.

/// Dot product with 4-wide accumulation.
///
/// # Panics
///
/// Panics if `a.len() != b.len()`.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "dot: length mismatch");

    let n = a.len();
    let chunks = n / 4;

    let mut acc0 = 0.0f64;
    let mut acc1 = 0.0f64;
    let mut acc2 = 0.0f64;
    let mut acc3 = 0.0f64;

    for c in 0..chunks {
        let j = c * 4;
        acc0 += a[j] * b[j];
        acc1 += a[j + 1] * b[j + 1];
        acc2 += a[j + 2] * b[j + 2];
        acc3 += a[j + 3] * b[j + 3];
    }
    for j in (chunks * 4)..n {
        acc0 += a[j] * b[j];
    }

    (acc0 + acc1) + (acc2 + acc3)
}

/// `y[i] += alpha * x[i]` for all `i`.
///
/// # Panics
///
/// Panics if `x.len() != y.len()`.
#[inline]
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    assert_eq!(x.len(), y.len(), "axpy: length mismatch");

    let n = x.len();
    let chunks = n / 4;

    for c in 0..chunks {
        let j = c * 4;
        y[j] += alpha * x[j];
        y[j + 1] += alpha * x[j + 1];
        y[j + 2] += alpha * x[j + 2];
        y[j + 3] += alpha * x[j + 3];
    }
    for j in (chunks * 4)..n {
        y[j] += alpha * x[j];
    }
}

/// `true` if no element is NaN or infinite.
#[inline]
pub fn all_finite(x: &[f64]) -> bool {
    x.iter().all(|v| v.is_finite())
}
