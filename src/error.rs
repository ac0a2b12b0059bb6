//! Error types for the proximity-graph index engine.
//!
//! A single [`Error`] enum covers every layer: distance kernels, object
//! storage, graph maintenance, search, and persistence. Kernels and stores
//! never log; they return the error to the caller, who decides whether it's
//! recoverable.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the index engine.
///
/// Error codes follow the pattern `PGX-XXX` for quick cross-referencing in
/// logs and CLI output.
#[derive(Error, Debug)]
pub enum Error {
    /// Requested `ObjectId` is out of range or was tombstoned (PGX-001).
    #[error("[PGX-001] object {0} not found")]
    NotFound(u32),

    /// Inserted vector's length does not match the index's declared dimension (PGX-002).
    #[error("[PGX-002] dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the index was created with.
        expected: usize,
        /// Dimension of the vector that was rejected.
        actual: usize,
    },

    /// Vector failed a validity precondition, e.g. zero norm under an implied
    /// normalisation, or a non-finite component (PGX-003).
    #[error("[PGX-003] invalid vector: {0}")]
    InvalidVector(String),

    /// Mutation attempted on an index opened read-only (PGX-004).
    #[error("[PGX-004] index is read-only")]
    ReadOnly,

    /// A persisted file violated a format invariant during `open`/`load` (PGX-005).
    #[error("[PGX-005] corrupt persisted state: {0}")]
    Corrupt(String),

    /// A configured object cap was exceeded (PGX-006).
    #[error("[PGX-006] out of space: {0}")]
    OutOfSpace(String),

    /// A metric kernel received input outside its valid domain, e.g. a
    /// Poincare vector with norm >= 1 (PGX-007).
    #[error("[PGX-007] distance domain error: {0}")]
    DistanceDomain(String),

    /// A cancellation token fired, or a configured time limit was reached;
    /// the caller still receives whatever partial result had accumulated (PGX-008).
    #[error("[PGX-008] aborted: {0}")]
    Aborted(String),

    /// I/O failure while reading or writing persisted state (PGX-009).
    #[error("[PGX-009] io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure (PGX-010).
    #[error("[PGX-010] serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be parsed or failed validation (PGX-011).
    #[error("[PGX-011] configuration error: {0}")]
    Config(String),

    /// An internal invariant was violated; this indicates a bug rather than
    /// bad input (PGX-012).
    #[error("[PGX-012] internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the stable error code (e.g. `"PGX-001"`).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "PGX-001",
            Self::DimensionMismatch { .. } => "PGX-002",
            Self::InvalidVector(_) => "PGX-003",
            Self::ReadOnly => "PGX-004",
            Self::Corrupt(_) => "PGX-005",
            Self::OutOfSpace(_) => "PGX-006",
            Self::DistanceDomain(_) => "PGX-007",
            Self::Aborted(_) => "PGX-008",
            Self::Io(_) => "PGX-009",
            Self::Serialization(_) => "PGX-010",
            Self::Config(_) => "PGX-011",
            Self::Internal(_) => "PGX-012",
        }
    }

    /// Returns true if a caller could plausibly retry or recover from this
    /// error without rebuilding the index.
    ///
    /// `Corrupt` and `Internal` are not recoverable: they indicate the
    /// on-disk state or an invariant is broken.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Corrupt(_) | Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(Error::NotFound(7).code(), "PGX-001");
        assert_eq!(
            Error::DimensionMismatch {
                expected: 4,
                actual: 3
            }
            .code(),
            "PGX-002"
        );
        assert_eq!(Error::ReadOnly.code(), "PGX-004");
    }

    #[test]
    fn corrupt_and_internal_are_not_recoverable() {
        assert!(!Error::Corrupt("bad header".into()).is_recoverable());
        assert!(!Error::Internal("invariant".into()).is_recoverable());
        assert!(Error::NotFound(1).is_recoverable());
    }

    #[test]
    fn display_includes_code_prefix() {
        let err = Error::DimensionMismatch {
            expected: 128,
            actual: 64,
        };
        assert!(err.to_string().starts_with("[PGX-002]"));
    }
}
