//! Scalar fallbacks for metrics that never benefit from wide lanes:
//! bit-popcount metrics and transcendental (arccos/acosh) metrics.
//! Thin re-exports over [`crate::metric::distance`] so the dispatch table
//! in [`super`] has a uniform `fn(&[f32], &[f32]) -> Result<f32>` shape.

use crate::error::Result;
use crate::metric::{distance, Metric};

pub(super) fn angle(a: &[f32], b: &[f32]) -> Result<f32> {
    distance(Metric::Angle, a, b)
}

pub(super) fn normalized_angle(a: &[f32], b: &[f32]) -> Result<f32> {
    distance(Metric::NormalizedAngle, a, b)
}

pub(super) fn hamming(a: &[f32], b: &[f32]) -> Result<f32> {
    distance(Metric::Hamming, a, b)
}

pub(super) fn jaccard(a: &[f32], b: &[f32]) -> Result<f32> {
    distance(Metric::Jaccard, a, b)
}

pub(super) fn sparse_jaccard(a: &[f32], b: &[f32]) -> Result<f32> {
    distance(Metric::SparseJaccard, a, b)
}

pub(super) fn poincare(a: &[f32], b: &[f32]) -> Result<f32> {
    distance(Metric::Poincare, a, b)
}

pub(super) fn lorentz(a: &[f32], b: &[f32]) -> Result<f32> {
    distance(Metric::Lorentz, a, b)
}
