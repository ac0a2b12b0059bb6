//! Portable-SIMD fast paths built on the `wide` crate's `f32x8`.
//!
//! `wide` compiles to SSE/AVX2 automatically depending on target features,
//! so this module doesn't need its own `is_x86_feature_detected!` branches —
//! [`super::SimdFeatures`] exists for callers that want to reason about the
//! width, not for these kernels to branch on.

use wide::f32x8;

use crate::error::{Error, Result};

const LANES: usize = 8;

fn sum_lanes(acc: f32x8) -> f32 {
    acc.to_array().iter().sum()
}

fn fold_pairs(a: &[f32], b: &[f32], init: f32x8, f: impl Fn(f32x8, f32x8, f32x8) -> f32x8) -> f32x8 {
    let mut acc = init;
    let chunks = a.len() / LANES;
    for i in 0..chunks {
        let va = f32x8::from(<[f32; LANES]>::try_from(&a[i * LANES..i * LANES + LANES]).unwrap());
        let vb = f32x8::from(<[f32; LANES]>::try_from(&b[i * LANES..i * LANES + LANES]).unwrap());
        acc = f(acc, va, vb);
    }
    acc
}

fn tail_range(len: usize) -> std::ops::Range<usize> {
    (len - len % LANES)..len
}

fn check_len(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::Internal(format!(
            "simd kernel given mismatched lengths {} and {}",
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

pub(super) fn l1(a: &[f32], b: &[f32]) -> Result<f32> {
    check_len(a, b)?;
    let acc = fold_pairs(a, b, f32x8::ZERO, |acc, va, vb| acc + (va - vb).abs());
    let mut total = sum_lanes(acc);
    for i in tail_range(a.len()) {
        total += (a[i] - b[i]).abs();
    }
    Ok(total)
}

pub(super) fn l2(a: &[f32], b: &[f32]) -> Result<f32> {
    check_len(a, b)?;
    let acc = fold_pairs(a, b, f32x8::ZERO, |acc, va, vb| {
        let d = va - vb;
        acc + d * d
    });
    let mut total = sum_lanes(acc);
    for i in tail_range(a.len()) {
        let d = a[i] - b[i];
        total += d * d;
    }
    Ok(total.sqrt())
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    let acc = fold_pairs(a, b, f32x8::ZERO, |acc, va, vb| acc + va * vb);
    let mut total = sum_lanes(acc);
    for i in tail_range(a.len()) {
        total += a[i] * b[i];
    }
    total
}

fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

pub(super) fn cosine(a: &[f32], b: &[f32]) -> Result<f32> {
    check_len(a, b)?;
    let na = norm(a);
    let nb = norm(b);
    if na == 0.0 || nb == 0.0 {
        return Err(Error::InvalidVector("zero-norm input to Cosine metric".into()));
    }
    Ok(1.0 - dot(a, b) / (na * nb))
}

pub(super) fn normalized_cosine(a: &[f32], b: &[f32]) -> Result<f32> {
    check_len(a, b)?;
    Ok(1.0 - dot(a, b))
}

pub(super) fn normalized_l2(a: &[f32], b: &[f32]) -> Result<f32> {
    check_len(a, b)?;
    Ok((2.0 - 2.0 * dot(a, b)).max(0.0).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_matches_naive_for_non_multiple_of_eight() {
        let a: Vec<f32> = (0..13).map(|i| i as f32).collect();
        let b: Vec<f32> = (0..13).map(|i| (i as f32) * 0.5).collect();
        let got = l2(&a, &b).unwrap();
        let want: f32 = a
            .iter()
            .zip(&b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt();
        assert!((got - want).abs() < 1e-4);
    }

    #[test]
    fn l1_handles_exact_multiple_of_lanes() {
        let a = vec![1.0; 16];
        let b = vec![0.0; 16];
        assert!((l1(&a, &b).unwrap() - 16.0).abs() < 1e-6);
    }

    #[test]
    fn mismatched_lengths_error() {
        assert!(l2(&[1.0, 2.0], &[1.0]).is_err());
    }
}
