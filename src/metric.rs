//! MetricKernels (C1): pairwise distance between two fixed-length vectors.
//!
//! Every kernel takes two `f32` slices of equal length (already decoded from
//! their on-disk [`crate::scalar::ScalarKind`] by the object store) and
//! returns a `Result<f32, Error>` so domain violations (zero norm, `‖·‖ ≥ 1`
//! for Poincare, ...) surface as [`Error::InvalidVector`]/[`Error::DistanceDomain`]
//! rather than propagating a NaN. Dispatch is resolved once per index by
//! [`crate::simd::dispatch_for`], not re-matched on every call.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The closed set of distance/similarity functions an index may be built
/// with. Fixed per-index at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Manhattan distance, Σ|a_i − b_i|.
    L1,
    /// Euclidean distance, √Σ(a_i − b_i)².
    L2,
    /// popcount(a XOR b), treating vectors as packed bits.
    Hamming,
    /// 1 − |A∩B|/|A∪B| over dense bitsets.
    Jaccard,
    /// Jaccard variant over sorted `u32` id-lists.
    SparseJaccard,
    /// arccos(clamp(<a,b>, -1, 1)) — no normalisation assumed.
    Angle,
    /// Cosine distance, `1 − <a,b> / (‖a‖·‖b‖)`.
    Cosine,
    /// arccos(clamp(<a,b>, -1, 1)) assuming `a`, `b` are already unit vectors.
    NormalizedAngle,
    /// `1 − <a,b>` assuming `a`, `b` are already unit vectors: a true
    /// distance (lower is closer), not the raw cosine similarity.
    NormalizedCosine,
    /// `√max(0, 2 − 2·<a,b>)` assuming `a`, `b` are already unit vectors.
    NormalizedL2,
    /// Poincare-ball hyperbolic distance; requires `‖a‖ < 1`, `‖b‖ < 1`.
    Poincare,
    /// Lorentz (hyperboloid model) hyperbolic distance.
    Lorentz,
}

impl Metric {
    /// Metrics that imply on-insert L2-normalisation of stored vectors.
    #[must_use]
    pub const fn implies_normalisation(self) -> bool {
        matches!(
            self,
            Self::NormalizedAngle | Self::NormalizedCosine | Self::NormalizedL2
        )
    }

}

const LANE_WIDTH: usize = 16;

fn check_same_len(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::Internal(format!(
            "metric kernel given mismatched lengths {} and {}",
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Computes `metric(a, b)` using the portable scalar fallback path.
///
/// `a` and `b` must have equal length; callers that pad to [`LANE_WIDTH`]
/// should pass the padded slices (padding is zero so it never perturbs the
/// sum-of-differences metrics, and callers must not pad the vectors used
/// with `Hamming`/`Jaccard`/`SparseJaccard` inconsistently on both sides).
pub fn distance(metric: Metric, a: &[f32], b: &[f32]) -> Result<f32> {
    check_same_len(a, b)?;
    match metric {
        Metric::L1 => Ok(a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()),
        Metric::L2 => Ok(a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt()),
        Metric::Hamming => Ok(hamming(a, b)),
        Metric::Jaccard => Ok(jaccard(a, b)),
        Metric::SparseJaccard => Ok(sparse_jaccard(a, b)),
        Metric::Angle => angle(a, b),
        Metric::Cosine => cosine_distance(a, b),
        Metric::NormalizedAngle => normalized_angle(a, b),
        Metric::NormalizedCosine => Ok(1.0 - dot(a, b)),
        Metric::NormalizedL2 => Ok((2.0 - 2.0 * dot(a, b)).max(0.0).sqrt()),
        Metric::Poincare => poincare(a, b),
        Metric::Lorentz => lorentz(a, b),
    }
}

/// Validates a vector against `metric`'s domain before it is stored,
/// applying the on-insert normalisation the metric implies, if any.
///
/// Called once from [`crate::store::ObjectStore::insert`]; not re-checked
/// on every `distance` call.
pub fn prepare_for_insert(metric: Metric, values: &mut [f32]) -> Result<()> {
    if metric.implies_normalisation() {
        let n = norm(values);
        if n == 0.0 || !n.is_finite() {
            return Err(Error::InvalidVector(
                "zero or non-finite norm under required normalisation".into(),
            ));
        }
        for v in values.iter_mut() {
            *v /= n;
        }
    }
    if metric == Metric::Poincare {
        let n = norm(values);
        if n >= 1.0 {
            return Err(Error::InvalidVector(format!(
                "poincare vectors must have norm < 1, got {n}"
            )));
        }
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidVector("non-finite component".into()));
    }
    Ok(())
}

fn angle(a: &[f32], b: &[f32]) -> Result<f32> {
    let na = norm(a);
    let nb = norm(b);
    if na == 0.0 || nb == 0.0 {
        return Err(Error::InvalidVector("zero-norm input to Angle metric".into()));
    }
    let cos = (dot(a, b) / (na * nb)).clamp(-1.0, 1.0);
    Ok(cos.acos())
}

fn normalized_angle(a: &[f32], b: &[f32]) -> Result<f32> {
    Ok(dot(a, b).clamp(-1.0, 1.0).acos())
}

/// Cosine *distance*, `1 − cosine_similarity`. Every metric in the closed
/// set returns a true distance (lower is closer); see `NormalizedCosine`
/// for the analogous fix on unit vectors.
fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    let na = norm(a);
    let nb = norm(b);
    if na == 0.0 || nb == 0.0 {
        return Err(Error::InvalidVector("zero-norm input to Cosine metric".into()));
    }
    Ok(1.0 - dot(a, b) / (na * nb))
}

fn poincare(a: &[f32], b: &[f32]) -> Result<f32> {
    let na2 = a.iter().map(|x| x * x).sum::<f32>();
    let nb2 = b.iter().map(|x| x * x).sum::<f32>();
    if na2 >= 1.0 || nb2 >= 1.0 {
        return Err(Error::DistanceDomain(format!(
            "poincare requires norm < 1, got {} and {}",
            na2.sqrt(),
            nb2.sqrt()
        )));
    }
    let diff2: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    let arg = 1.0 + 2.0 * diff2 / ((1.0 - na2) * (1.0 - nb2));
    Ok(arg.max(1.0).acosh())
}

fn lorentz(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.is_empty() || b.is_empty() {
        return Err(Error::DistanceDomain("lorentz requires non-empty vectors".into()));
    }
    let arg = 2.0 * a[0] * b[0] - dot(a, b);
    Ok(arg.max(1.0).acosh())
}

fn pack_bits(v: &[f32]) -> Vec<u64> {
    let mut words = vec![0u64; v.len().div_ceil(64)];
    for (i, &x) in v.iter().enumerate() {
        if x != 0.0 {
            words[i / 64] |= 1u64 << (i % 64);
        }
    }
    words
}

fn hamming(a: &[f32], b: &[f32]) -> f32 {
    let wa = pack_bits(a);
    let wb = pack_bits(b);
    wa.iter()
        .zip(wb.iter())
        .map(|(x, y)| (x ^ y).count_ones())
        .sum::<u32>() as f32
}

fn jaccard(a: &[f32], b: &[f32]) -> f32 {
    let wa = pack_bits(a);
    let wb = pack_bits(b);
    let mut inter = 0u32;
    let mut union = 0u32;
    for (x, y) in wa.iter().zip(wb.iter()) {
        inter += (x & y).count_ones();
        union += (x | y).count_ones();
    }
    if union == 0 {
        0.0
    } else {
        1.0 - (inter as f32 / union as f32)
    }
}

fn sparse_jaccard(a: &[f32], b: &[f32]) -> f32 {
    let sa: std::collections::BTreeSet<u32> = a.iter().map(|&x| x as u32).collect();
    let sb: std::collections::BTreeSet<u32> = b.iter().map(|&x| x as u32).collect();
    let inter = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    if union == 0 {
        0.0
    } else {
        1.0 - (inter as f32 / union as f32)
    }
}

/// Declared alignment requirement: kernels assume `dim` is padded to
/// a multiple of this many lanes.
pub const fn lane_width() -> usize {
    LANE_WIDTH
}

/// Pads `values` with zeros up to the next multiple of [`lane_width`].
#[must_use]
pub fn pad_to_lane_width(mut values: Vec<f32>) -> Vec<f32> {
    let padded_len = values.len().div_ceil(LANE_WIDTH) * LANE_WIDTH;
    values.resize(padded_len, 0.0);
    values
}
