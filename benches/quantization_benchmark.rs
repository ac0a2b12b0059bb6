//! Benchmarks PQ build time and ADT-search throughput against the plain
//! graph path.
//!
//! Run with: `cargo bench --bench quantization_benchmark`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pgx_ann::{
    GraphKind, IndexFacade, IndexKind, IndexOptions, Metric, QuantisationParams, ScalarKind,
};

fn random_vector(dim: usize, seed: u64) -> Vec<f32> {
    let mut state = seed.wrapping_mul(2_685_821_657_736_338_717).max(1);
    (0..dim)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            ((state % 2000) as f32 - 1000.0) / 1000.0
        })
        .collect()
}

fn bench_quantised_build(c: &mut Criterion) {
    let dim = 32;
    let points: Vec<Vec<f32>> = (0..4000).map(|i| random_vector(dim, i as u64 + 1)).collect();

    c.bench_function("quantised_build_4000_points", |b| {
        b.iter_batched(
            || points.clone(),
            |points| {
                black_box(
                    IndexFacade::create(
                        IndexKind::Quantised,
                        GraphKind::Anng,
                        Metric::L2,
                        ScalarKind::F32,
                        dim,
                        IndexOptions::default(),
                        &points,
                    )
                    .unwrap(),
                )
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

fn bench_quantised_search(c: &mut Criterion) {
    let dim = 32;
    let points: Vec<Vec<f32>> = (0..4000).map(|i| random_vector(dim, i as u64 + 1)).collect();
    let index = IndexFacade::create(
        IndexKind::Quantised,
        GraphKind::Anng,
        Metric::L2,
        ScalarKind::F32,
        dim,
        IndexOptions::default(),
        &points,
    )
    .unwrap();
    let _ = QuantisationParams::default();
    let query = random_vector(dim, 13);

    c.bench_function("quantised_search_k10", |b| {
        b.iter(|| black_box(index.search_quantised(&query, 10, 4, 4.0).unwrap()));
    });
}

criterion_group!(benches, bench_quantised_build, bench_quantised_search);
criterion_main!(benches);
