//! Process-wide SIMD capability probe and dispatch.
//!
//! §6 mandates exactly one piece of process-wide state: a SIMD-capability
//! bitset computed once at load, read thereafter as immutable configuration.
//! Kernels select the widest supported path; everything else stays scalar.

mod scalar_kernels;
mod wide_kernels;

use std::sync::OnceLock;

use crate::metric::Metric;

/// Bitset of SIMD instruction sets detected on this process's CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimdFeatures {
    /// SSE / SSE2 baseline (always true on x86_64).
    pub sse2: bool,
    /// AVX (256-bit) support.
    pub avx: bool,
    /// AVX2 (256-bit integer) support.
    pub avx2: bool,
    /// AVX-512 Foundation support.
    pub avx512f: bool,
}

impl SimdFeatures {
    /// Probes the current CPU once. Cheap to call repeatedly after the
    /// first call since [`detected`] caches the result.
    #[must_use]
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            Self {
                sse2: true,
                avx: is_x86_feature_detected!("avx"),
                avx2: is_x86_feature_detected!("avx2"),
                avx512f: is_x86_feature_detected!("avx512f"),
            }
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            Self::default()
        }
    }

    /// Widest lane width usable given these features, in `f32` elements.
    #[must_use]
    pub const fn widest_lanes(self) -> usize {
        if self.avx512f {
            16
        } else if self.avx2 || self.avx {
            8
        } else {
            4
        }
    }
}

static FEATURES: OnceLock<SimdFeatures> = OnceLock::new();

/// Returns the process-wide capability bitset, computing it on first call.
#[must_use]
pub fn detected() -> SimdFeatures {
    *FEATURES.get_or_init(SimdFeatures::detect)
}

/// A resolved distance function for one `(ScalarKind, Metric)` pair,
/// bound once per index rather than re-matched on every query (§9).
pub type DistanceFn = fn(&[f32], &[f32]) -> crate::error::Result<f32>;

/// Resolves the fastest available kernel for `metric`.
///
/// Portable-SIMD (`wide`) fast paths exist for `L1`, `L2`, and the
/// inner-product family (`Cosine`, `Angle`, `NormalizedCosine`,
/// `NormalizedL2`, `NormalizedAngle`); every other metric always runs the
/// scalar path since it is bit-manipulation or transcendental-heavy and
/// wouldn't benefit from wide lanes the same way.
#[must_use]
pub fn dispatch_for(metric: Metric) -> DistanceFn {
    match metric {
        Metric::L1 => wide_kernels::l1,
        Metric::L2 => wide_kernels::l2,
        Metric::Cosine => wide_kernels::cosine,
        Metric::Angle => scalar_kernels::angle,
        Metric::NormalizedAngle => scalar_kernels::normalized_angle,
        Metric::NormalizedCosine => wide_kernels::normalized_cosine,
        Metric::NormalizedL2 => wide_kernels::normalized_l2,
        Metric::Hamming => scalar_kernels::hamming,
        Metric::Jaccard => scalar_kernels::jaccard,
        Metric::SparseJaccard => scalar_kernels::sparse_jaccard,
        Metric::Poincare => scalar_kernels::poincare,
        Metric::Lorentz => scalar_kernels::lorentz,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_is_stable_across_calls() {
        assert_eq!(detected(), detected());
    }

    #[test]
    fn wide_and_scalar_l2_agree() {
        let a = vec![1.0, 2.5, -3.0, 4.0, 0.5, 6.0, -7.5, 8.0];
        let b = vec![0.0, 2.0, -1.0, 4.5, 1.5, 5.0, -6.0, 9.0];
        let via_dispatch = dispatch_for(Metric::L2)(&a, &b).unwrap();
        let via_scalar = crate::metric::distance(Metric::L2, &a, &b).unwrap();
        assert!((via_dispatch - via_scalar).abs() < 1e-4);
    }
}
