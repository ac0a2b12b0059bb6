//! Scalar element kinds supported by the object store and metric kernels.

use half::f16;
use serde::{Deserialize, Serialize};

/// The closed set of element types a vector's components may be stored as.
///
/// Fixed per-index at creation; never changes for the life of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    /// Unsigned byte, used for binary/quantised metrics (Hamming, Jaccard).
    U8,
    /// IEEE-754-like 16-bit half precision float.
    F16,
    /// IEEE-754 32-bit float, the default.
    F32,
}

impl ScalarKind {
    /// Size in bytes of a single element of this kind.
    #[must_use]
    pub const fn byte_size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::F16 => 2,
            Self::F32 => 4,
        }
    }
}

impl Default for ScalarKind {
    fn default() -> Self {
        Self::F32
    }
}

/// Converts a slice of raw little-endian bytes for `kind` into `f32`s.
///
/// Used by metric kernels that only have an `f32` fast path (everything
/// except the dedicated U8/F16 L1/L2/inner-product kernels: only those
/// three get native F16 kernels, everything else upconverts).
#[must_use]
pub fn to_f32_vec(kind: ScalarKind, bytes: &[u8]) -> Vec<f32> {
    match kind {
        ScalarKind::U8 => bytes.iter().map(|&b| f32::from(b)).collect(),
        ScalarKind::F16 => bytes
            .chunks_exact(2)
            .map(|c| f16::from_le_bytes([c[0], c[1]]).to_f32())
            .collect(),
        ScalarKind::F32 => bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    }
}

/// Encodes `values` as raw little-endian bytes of `kind`, saturating for
/// `U8` and rounding to nearest for `F16`.
#[must_use]
pub fn from_f32_vec(kind: ScalarKind, values: &[f32]) -> Vec<u8> {
    match kind {
        ScalarKind::U8 => values
            .iter()
            .map(|&v| v.round().clamp(0.0, 255.0) as u8)
            .collect(),
        ScalarKind::F16 => values
            .iter()
            .flat_map(|&v| f16::from_f32(v).to_le_bytes())
            .collect(),
        ScalarKind::F32 => values.iter().flat_map(|&v| v.to_le_bytes()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_sizes() {
        assert_eq!(ScalarKind::U8.byte_size(), 1);
        assert_eq!(ScalarKind::F16.byte_size(), 2);
        assert_eq!(ScalarKind::F32.byte_size(), 4);
    }

    #[test]
    fn f32_round_trip() {
        let values = vec![1.0, -2.5, 3.25, 0.0];
        let bytes = from_f32_vec(ScalarKind::F32, &values);
        assert_eq!(to_f32_vec(ScalarKind::F32, &bytes), values);
    }

    #[test]
    fn f16_round_trip_is_approximate() {
        let values = vec![1.0, -2.5, 100.0];
        let bytes = from_f32_vec(ScalarKind::F16, &values);
        let back = to_f32_vec(ScalarKind::F16, &bytes);
        for (a, b) in values.iter().zip(back.iter()) {
            assert!((a - b).abs() < 0.1, "{a} vs {b}");
        }
    }

    #[test]
    fn u8_saturates() {
        let bytes = from_f32_vec(ScalarKind::U8, &[300.0, -5.0, 128.4]);
        assert_eq!(bytes, vec![255, 0, 128]);
    }
}
