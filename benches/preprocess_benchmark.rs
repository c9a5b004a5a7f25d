//! Benchmark fitting and applying the preprocessing state
//!
//! Run with: cargo bench --bench preprocess_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use rand::SeedableRng;

use kddlab::pipeline::{fit, parse_arff, Dataset, Imputation, PreprocessConfig, ScalerKind};

/// ARFF text with numeric, nominal and missing values in NSL-KDD proportions
fn generate_arff(n_rows: usize, seed: u64) -> String {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let protocols = ["tcp", "udp", "icmp"];
    let flags = ["SF", "S0", "REJ", "RSTO", "SH"];

    let mut out = String::from(
        "@relation bench\n\
         @attribute duration numeric\n\
         @attribute protocol_type {tcp,udp,icmp}\n\
         @attribute flag {SF,S0,REJ,RSTO,SH}\n\
         @attribute src_bytes numeric\n\
         @attribute dst_bytes numeric\n\
         @attribute same_srv_rate real\n\
         @data\n",
    );
    for _ in 0..n_rows {
        let dst = if rng.gen_bool(0.05) {
            "?".to_string()
        } else {
            rng.gen_range(0..10_000).to_string()
        };
        out.push_str(&format!(
            "{},{},{},{},{},{:.2}\n",
            rng.gen_range(0..100),
            protocols[rng.gen_range(0..protocols.len())],
            flags[rng.gen_range(0..flags.len())],
            rng.gen_range(0..50_000),
            dst,
            rng.gen::<f64>()
        ));
    }
    out
}

fn load(n_rows: usize) -> Dataset {
    parse_arff(generate_arff(n_rows, 42).as_bytes()).expect("Failed to parse benchmark data")
}

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_arff");
    group.sample_size(20);

    for n_rows in [1_000, 25_000, 125_973] {
        let text = generate_arff(n_rows, 42);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n_rows), &text, |b, text| {
            b.iter(|| parse_arff(black_box(text.as_bytes())));
        });
    }

    group.finish();
}

fn benchmark_fit_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_transform");
    group.sample_size(20);

    for scaler in [ScalerKind::Standard, ScalerKind::Robust] {
        let config = PreprocessConfig::new(scaler, Imputation::Median);
        for n_rows in [1_000, 25_000, 125_973] {
            let ds = load(n_rows);
            group.throughput(Throughput::Elements(n_rows as u64));
            group.bench_with_input(
                BenchmarkId::new(scaler.to_string(), n_rows),
                &ds,
                |b, ds| {
                    b.iter(|| {
                        let state = fit(black_box(ds), &config).expect("fit failed");
                        state.transform(ds)
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_parse, benchmark_fit_transform);
criterion_main!(benches);
