//! Benchmark suite for graph search and insertion.
//!
//! Run with: `cargo bench --bench search_benchmark`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pgx_ann::{GraphKind, IndexFacade, IndexKind, IndexOptions, Metric, NeverCancel, ScalarKind};

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

fn build_index(n: usize, dim: usize) -> IndexFacade {
    let points: Vec<Vec<f32>> = (0..n).map(|i| random_vector(dim, i as u64 + 1)).collect();
    IndexFacade::create(
        IndexKind::Graph,
        GraphKind::Anng,
        Metric::L2,
        ScalarKind::F32,
        dim,
        IndexOptions::default(),
        &points,
    )
    .expect("index build")
}

fn bench_insert(c: &mut Criterion) {
    let dim = 64;
    c.bench_function("insert_into_2000_point_graph", |b| {
        b.iter_batched(
            || build_index(2000, dim),
            |mut index| {
                let v = random_vector(dim, 99_999);
                black_box(index.insert(&v).unwrap());
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

fn bench_search(c: &mut Criterion) {
    let dim = 64;
    let index = build_index(5000, dim);
    let query = random_vector(dim, 424_242);

    c.bench_function("search_k10_on_5000_point_graph", |b| {
        b.iter(|| {
            black_box(
                index
                    .search(&query, 10, f32::INFINITY, 0.1, &NeverCancel)
                    .unwrap(),
            )
        });
    });
}

criterion_group!(benches, bench_insert, bench_search);
criterion_main!(benches);
