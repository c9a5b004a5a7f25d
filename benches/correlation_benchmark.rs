//! Benchmark the correlation report over growing numeric tables
//!
//! Run with: cargo bench --bench correlation_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polars::prelude::*;
use rand::prelude::*;
use rand::SeedableRng;

use kddlab::pipeline::{correlation_matrix, Dataset};

/// Numeric table where every fourth column tracks an earlier one, with ~2% missing values
fn generate_dataset(n_rows: usize, n_features: usize, seed: u64) -> Dataset {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(n_features);

    for i in 0..n_features {
        let values: Vec<Option<f64>> = if i % 4 == 3 {
            columns[i - 3]
                .iter()
                .map(|v| v.map(|x| x + rng.gen::<f64>() * 10.0 - 5.0))
                .collect()
        } else {
            (0..n_rows)
                .map(|_| (!rng.gen_bool(0.02)).then(|| rng.gen::<f64>() * 100.0))
                .collect()
        };
        columns.push(values);
    }

    let columns: Vec<Column> = columns
        .into_iter()
        .enumerate()
        .map(|(i, values)| Column::new(format!("feature_{}", i).into(), values))
        .collect();

    Dataset::from_frame("bench", DataFrame::new(columns).expect("Failed to create DataFrame"))
        .expect("Failed to create Dataset")
}

fn benchmark_correlation_by_columns(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlation_by_columns");
    group.sample_size(20);

    let n_rows = 10_000;
    for n_cols in [10, 25, 41, 80] {
        let ds = generate_dataset(n_rows, n_cols, 42);
        group.throughput(Throughput::Elements(((n_cols * (n_cols + 1)) / 2) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n_cols), &ds, |b, ds| {
            b.iter(|| correlation_matrix(black_box(ds), 3));
        });
    }

    group.finish();
}

fn benchmark_correlation_by_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlation_by_rows");
    group.sample_size(20);

    // NSL-KDD has 41 attributes plus the label
    let n_cols = 42;
    for n_rows in [1_000, 25_000, 125_973] {
        let ds = generate_dataset(n_rows, n_cols, 42);
        group.throughput(Throughput::Elements(n_rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n_rows), &ds, |b, ds| {
            b.iter(|| correlation_matrix(black_box(ds), 3));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_correlation_by_columns,
    benchmark_correlation_by_rows
);
criterion_main!(benches);
