//! Recall validation against brute-force exact search.
//!
//! Recall@k = |retrieved ∩ ground_truth| / k, computed over `ObjectId`s.

use std::collections::HashSet;

use pgx_ann::{
    GraphKind, IndexFacade, IndexKind, IndexOptions, Metric, NeverCancel, ScalarKind,
};

fn xorshift_vector(dim: usize, seed: u64) -> Vec<f32> {
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

fn l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

fn brute_force_top_k(points: &[(u32, Vec<f32>)], query: &[f32], k: usize) -> Vec<u32> {
    let mut ranked: Vec<(u32, f32)> = points
        .iter()
        .map(|(id, v)| (*id, l2(query, v)))
        .collect();
    ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    ranked.truncate(k);
    ranked.into_iter().map(|(id, _)| id).collect()
}

fn recall_at_k(retrieved: &[u32], ground_truth: &[u32]) -> f64 {
    let truth: HashSet<_> = ground_truth.iter().collect();
    let hits = retrieved.iter().filter(|id| truth.contains(id)).count();
    hits as f64 / ground_truth.len() as f64
}

#[test]
fn graph_search_recalls_most_exact_neighbours() {
    let dim = 32;
    let n = 2000;
    let raw: Vec<Vec<f32>> = (0..n).map(|i| xorshift_vector(dim, i as u64 + 1)).collect();

    let index = IndexFacade::create(
        IndexKind::Graph,
        GraphKind::Anng,
        Metric::L2,
        ScalarKind::F32,
        dim,
        IndexOptions::default(),
        &raw,
    )
    .unwrap();

    let labelled: Vec<(u32, Vec<f32>)> = (1..=n as u32).zip(raw.iter().cloned()).collect();

    let mut total_recall = 0.0;
    let num_queries = 25;
    for q in 0..num_queries {
        let query = xorshift_vector(dim, 900_000 + q as u64);
        let truth = brute_force_top_k(&labelled, &query, 10);
        let outcome = index
            .search(&query, 10, f32::INFINITY, 0.1, &NeverCancel)
            .unwrap();
        let retrieved: Vec<u32> = outcome.hits.iter().map(|h| h.id).collect();
        total_recall += recall_at_k(&retrieved, &truth);
    }

    let avg_recall = total_recall / f64::from(num_queries);
    assert!(
        avg_recall >= 0.8,
        "average recall@10 too low: {avg_recall}"
    );
}

#[test]
fn quantised_search_recovers_most_exact_top_k() {
    let dim = 32;
    let n = 10_000;
    let raw: Vec<Vec<f32>> = (0..n).map(|i| xorshift_vector(dim, i as u64 + 1)).collect();

    let index = IndexFacade::create(
        IndexKind::Quantised,
        GraphKind::Anng,
        Metric::L2,
        ScalarKind::F32,
        dim,
        IndexOptions::default(),
        &raw,
    )
    .unwrap();

    let labelled: Vec<(u32, Vec<f32>)> = (1..=n as u32).zip(raw.iter().cloned()).collect();

    let mut total_recall = 0.0;
    let num_queries = 20;
    for q in 0..num_queries {
        let query = xorshift_vector(dim, 500_000 + q as u64);
        let truth = brute_force_top_k(&labelled, &query, 10);
        let retrieved: Vec<u32> = index
            .search_quantised(&query, 10, 4, 4.0)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        total_recall += recall_at_k(&retrieved, &truth);
    }

    let avg_recall = total_recall / f64::from(num_queries);
    assert!(
        avg_recall >= 0.7,
        "average quantised recall@10 too low: {avg_recall}"
    );
}
