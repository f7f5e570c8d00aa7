// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use canopy_velocity::{LeastSquaresSolver, VelocityTracker};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use kurbo::Point;

// The velocity tracker's hot path is a degree-2 fit over at most 20 samples;
// bench that exact shape.
fn lsq_solve(c: &mut Criterion) {
    let time: Vec<f64> = (0..20).map(|i| -(i as f64) * 5.0).collect();
    let x: Vec<f64> = time.iter().map(|t| 3.0 * t + 0.001 * t * t).collect();
    let w = vec![1.0; 20];

    c.bench_function("lsq_solve_degree2_20_samples", |b| {
        b.iter(|| {
            let solver = LeastSquaresSolver::new(black_box(&time), black_box(&x), &w);
            black_box(solver.solve(2))
        });
    });
}

fn velocity_estimate(c: &mut Criterion) {
    let mut tracker = VelocityTracker::new();
    for i in 0..20u64 {
        tracker.add_position(i * 5, Point::new(i as f64 * 7.0, i as f64 * 3.0));
    }

    c.bench_function("velocity_estimate_full_ring", |b| {
        b.iter(|| black_box(&tracker).velocity_estimate());
    });

    let mut sparse = VelocityTracker::new();
    for t in [0u64, 16, 32, 48, 64] {
        sparse.add_position(t, Point::new(t as f64, 0.0));
    }

    c.bench_function("velocity_estimate_five_samples", |b| {
        b.iter(|| black_box(&sparse).velocity_estimate());
    });
}

criterion_group!(benches, lsq_solve, velocity_estimate);
criterion_main!(benches);
