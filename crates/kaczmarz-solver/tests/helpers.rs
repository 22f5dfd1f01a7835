//! Shared test helpers for the kaczmarz-solver integration test suite.
//!
//! Provides deterministic random system generators, a dense reference
//! solver, and floating-point comparison utilities used across all test
//! modules.

#![allow(dead_code)]

use kaczmarz_solver::traits::RowMatrix;
use kaczmarz_solver::types::{CsrMatrix, DenseMatrix};

// ---------------------------------------------------------------------------
// Random number generator (simple LCG for deterministic reproducibility)
// ---------------------------------------------------------------------------

/// A minimal linear congruential generator for deterministic test data.
///
/// Uses the Knuth MMIX LCG parameters. Not cryptographically secure, but
/// perfectly adequate for generating reproducible test systems.
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform f64 in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform f64 in [lo, hi).
    pub fn next_f64_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

// ---------------------------------------------------------------------------
// System generators
// ---------------------------------------------------------------------------

/// Dense `rows x cols` matrix with entries uniform in [-1, 1).
pub fn random_dense(rows: usize, cols: usize, seed: u64) -> DenseMatrix {
    let mut rng = Lcg::new(seed);
    let data = (0..rows * cols)
        .map(|_| rng.next_f64_range(-1.0, 1.0))
        .collect();
    DenseMatrix::new(rows, cols, data).unwrap()
}

/// Square matrix with entries in [-1, 1) and `n` added to the diagonal.
pub fn diag_dominant(n: usize, seed: u64) -> DenseMatrix {
    let mut rng = Lcg::new(seed);
    let mut data = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            data[i * n + j] = rng.next_f64_range(-1.0, 1.0);
        }
        data[i * n + i] += n as f64;
    }
    DenseMatrix::new(n, n, data).unwrap()
}

/// Deterministic random vector of length `n` with entries in [-1, 1).
pub fn random_vector(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = Lcg::new(seed);
    (0..n).map(|_| rng.next_f64_range(-1.0, 1.0)).collect()
}

/// `A x` for a dense matrix.
pub fn matvec(a: &DenseMatrix, x: &[f64]) -> Vec<f64> {
    let mut y = vec![0.0; a.rows()];
    a.matvec(x, &mut y);
    y
}

/// Consistent system `A x* = b` with random `A` and `x*`.
///
/// Returns `(A, b, x*)`.
pub fn consistent_system(rows: usize, cols: usize, seed: u64) -> (DenseMatrix, Vec<f64>, Vec<f64>) {
    let a = random_dense(rows, cols, seed);
    let x_star = random_vector(cols, seed.wrapping_add(1));
    let b = matvec(&a, &x_star);
    (a, b, x_star)
}

/// Consistent system whose last equation has `corruption` added to its
/// right-hand side.
///
/// Returns `(A, b, x*)` where `x*` solves every equation except the last.
pub fn corrupted_system(
    rows: usize,
    cols: usize,
    corruption: f64,
    seed: u64,
) -> (DenseMatrix, Vec<f64>, Vec<f64>) {
    let (a, mut b, x_star) = consistent_system(rows, cols, seed);
    b[rows - 1] += corruption;
    (a, b, x_star)
}

/// Near-identity 3x3 system with known solution `(1, -2, 3)`.
pub fn near_identity_system() -> (DenseMatrix, Vec<f64>, Vec<f64>) {
    let a = DenseMatrix::from_rows(&[
        [2.0, 0.1, 0.0],
        [0.1, 3.0, 0.1],
        [0.0, 0.1, 1.5],
    ])
    .unwrap();
    let x_star = vec![1.0, -2.0, 3.0];
    let b = matvec(&a, &x_star);
    (a, b, x_star)
}

/// The same matrix in CSR form.
pub fn dense_to_csr(a: &DenseMatrix) -> CsrMatrix<f64> {
    let mut entries = Vec::new();
    for i in 0..a.rows() {
        for (j, &v) in a.row(i).iter().enumerate() {
            if v != 0.0 {
                entries.push((i, j, v));
            }
        }
    }
    CsrMatrix::<f64>::from_coo(a.rows(), a.cols(), entries)
}

// ---------------------------------------------------------------------------
// Dense reference solver
// ---------------------------------------------------------------------------

/// Solve a square `Ax = b` by Gaussian elimination with partial pivoting.
///
/// # Panics
///
/// Panics if the matrix is not square or is singular.
pub fn dense_solve(a: &DenseMatrix, rhs: &[f64]) -> Vec<f64> {
    let n = a.rows();
    assert_eq!(n, a.cols(), "dense_solve requires a square matrix");
    assert_eq!(rhs.len(), n, "rhs length must match matrix dimension");

    let mut aug: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let mut row = a.row(i).to_vec();
            row.push(rhs[i]);
            row
        })
        .collect();

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[col][col].abs();
        for row in (col + 1)..n {
            if aug[row][col].abs() > max_val {
                max_val = aug[row][col].abs();
                max_row = row;
            }
        }
        assert!(max_val > 1e-15, "matrix is singular or near-singular");
        aug.swap(col, max_row);

        let pivot = aug[col][col];
        for row in (col + 1)..n {
            let factor = aug[row][col] / pivot;
            for j in col..=n {
                aug[row][j] -= factor * aug[col][j];
            }
        }
    }

    let mut x = vec![0.0f64; n];
    for i in (0..n).rev() {
        let mut sum = aug[i][n];
        for j in (i + 1)..n {
            sum -= aug[i][j] * x[j];
        }
        x[i] = sum / aug[i][i];
    }
    x
}

// ---------------------------------------------------------------------------
// Floating-point comparison utilities
// ---------------------------------------------------------------------------

pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

pub fn l2_distance(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "vectors must have same length");
    a.iter()
        .zip(b.iter())
        .map(|(&ai, &bi)| (ai - bi) * (ai - bi))
        .sum::<f64>()
        .sqrt()
}

/// `||approx - exact|| / ||exact||`, or the absolute error if `exact` is 0.
pub fn relative_error(approx: &[f64], exact: &[f64]) -> f64 {
    let exact_norm = l2_norm(exact);
    let error = l2_distance(approx, exact);
    if exact_norm > 1e-15 {
        error / exact_norm
    } else {
        error
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Route solver tracing output through the test harness.
///
/// Honours `RUST_LOG`; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
