//! Benchmarks for multi-restart CP-ALS fitting

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use parafit::prelude::*;
use std::hint::black_box;

fn bench_cp_als_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("cp_als_fit");
    group.sample_size(10);

    for &(size, rank) in &[(16, 3), (32, 5), (48, 8)] {
        let truth = KruskalTensor::<f64>::random_init(&[size, size, size], rank, 1).unwrap();
        let tensor = truth.construct_tensor().unwrap();
        let config = FitConfig::default()
            .with_n_restarts(4)
            .with_max_iterations(50)
            .with_seed(9);

        group.throughput(Throughput::Elements((size * size * size) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}x{}_r{}", size, size, size, rank)),
            &(tensor, rank),
            |b, (tensor, rank)| {
                b.iter(|| black_box(cp_als_fit(black_box(tensor), *rank, &config)))
            },
        );
    }

    group.finish();
}

fn bench_factor_match_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("factor_match_score");

    for &rank in &[4, 16, 64] {
        let a = KruskalTensor::<f64>::random_init(&[50, 50, 50], rank, 2).unwrap();
        let mut b = a.clone();
        let perm: Vec<usize> = (0..rank).rev().collect();
        b.permute_components(&perm).unwrap();
        let options = FmsOptions::default();

        group.bench_with_input(BenchmarkId::from_parameter(rank), &(a, b), |bench, (a, b)| {
            bench.iter(|| black_box(factor_match_score(a, b, &options)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cp_als_fit, bench_factor_match_score);
criterion_main!(benches);
