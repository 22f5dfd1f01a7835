//! Benchmarks for the row-selection policies.
//!
//! Two views: the cost of a single selection as the number of rows grows
//! (O(1) for UniformRandom up to O(m n) for MaxDistance and Quantile), and a
//! fixed-budget solve on an overdetermined system with a few corrupted
//! equations.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use kaczmarz_solver::config::{SelectorConfig, SolverConfig};
use kaczmarz_solver::quantile::{ResidualMeasure, Sampling};
use kaczmarz_solver::solver::{KaczmarzSolver, SolverState};
use kaczmarz_solver::system::LinearSystem;
use kaczmarz_solver::traits::RowSelector;
use kaczmarz_solver::types::DenseMatrix;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Dense `rows x cols` system `A x* = b` with `corrupted` rows pushed off by
/// a large error.
fn make_system(rows: usize, cols: usize, corrupted: usize, seed: u64) -> (DenseMatrix, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<f64> = (0..rows * cols).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let a = DenseMatrix::new(rows, cols, data).expect("buffer sized rows * cols");
    let x_star: Vec<f64> = (0..cols).map(|_| rng.gen_range(-1.0..1.0)).collect();

    let mut b = vec![0.0; rows];
    a.matvec(&x_star, &mut b);
    for _ in 0..corrupted {
        let i = rng.gen_range(0..rows);
        b[i] += rng.gen_range(10.0..50.0);
    }
    (a, b)
}

fn selectors(rows: usize) -> Vec<(&'static str, SelectorConfig)> {
    vec![
        ("cyclic", SelectorConfig::Cyclic { order: None }),
        (
            "random",
            SelectorConfig::Random {
                seed: 1,
                weights: None,
            },
        ),
        ("uniform_random", SelectorConfig::UniformRandom { seed: 1 }),
        ("sv_random", SelectorConfig::SVRandom { seed: 1 }),
        ("max_distance", SelectorConfig::MaxDistance),
        (
            "quantile",
            SelectorConfig::Quantile {
                quantile: 0.9,
                measure: ResidualMeasure::Normalized,
                seed: 1,
            },
        ),
        (
            "sampled_quantile",
            SelectorConfig::SampledQuantile {
                quantile: 0.9,
                sample_size: (rows / 10).max(1),
                sampling: Sampling::WithoutReplacement,
                measure: ResidualMeasure::Normalized,
                seed: 1,
            },
        ),
        (
            "windowed_quantile",
            SelectorConfig::WindowedQuantile {
                quantile: 0.9,
                window_size: 64,
                measure: ResidualMeasure::Normalized,
                seed: 1,
            },
        ),
    ]
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));

    for &rows in &[100usize, 1_000, 10_000] {
        let (a, b) = make_system(rows, 20, 0, 42);
        let system = LinearSystem::new(&a, &b).expect("valid system");
        let x = vec![0.0; 20];
        group.throughput(Throughput::Elements(1));

        for (name, config) in selectors(rows) {
            let mut selector = config.build(&system).expect("valid selector");
            let state = SolverState::new(&system, &x, 0);
            group.bench_with_input(BenchmarkId::new(name, rows), &rows, |bench, _| {
                bench.iter(|| selector.select(&state));
            });
        }
    }
    group.finish();
}

fn bench_solve_corrupted(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_corrupted");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(5));

    let rows = 2_000;
    let (a, b) = make_system(rows, 50, 20, 7);
    let system = LinearSystem::new(&a, &b).expect("valid system");
    let config = SolverConfig::default()
        .with_max_iterations(5_000)
        .with_check_interval(500)
        .with_fail_on_no_convergence(false);
    group.throughput(Throughput::Elements(5_000));

    for (name, selector_config) in selectors(rows) {
        group.bench_function(name, |bench| {
            let selector = selector_config.build(&system).expect("valid selector");
            let mut solver =
                KaczmarzSolver::new(&system, selector, config.clone()).expect("valid solver");
            bench.iter(|| solver.solve().expect("soft failure"));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_select, bench_solve_corrupted);
criterion_main!(benches);
