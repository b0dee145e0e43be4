//! Error types for merge, tone-mapping and layout operations.

use thiserror::Error;

/// Error type for image operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Merge inputs have different sizes.
    #[error("dimension mismatch: low is {}x{}, high is {}x{}", low.0, low.1, high.0, high.1)]
    DimensionMismatch {
        /// Low-exposure width and height.
        low: (u32, u32),
        /// High-exposure width and height.
        high: (u32, u32),
    },

    /// Input buffer has a sample kind the operation does not accept.
    #[error("unsupported sample kind: {found}, expected {expected}")]
    UnsupportedSampleKind {
        /// Kind the operation needs.
        expected: hdrtone_core::SampleKind,
        /// Kind that was passed in.
        found: hdrtone_core::SampleKind,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Buffer construction failed.
    #[error(transparent)]
    Core(#[from] hdrtone_core::Error),
}

/// Result type for image operations.
pub type OpsResult<T> = Result<T, OpsError>;
