//! Error types for hdrtone-core operations.
//!
//! # Overview
//!
//! The [`Error`] enum covers the failure modes of buffer construction and
//! sample-kind parsing:
//! - Building an [`ImageBuffer`](crate::ImageBuffer) from a pixel vector of the wrong size
//! - Building a buffer with zero width or height
//! - Parsing an unknown sample-kind tag
//!
//! # Usage
//!
//! ```rust
//! use hdrtone_core::{Error, SampleKind};
//!
//! let err = "double".parse::<SampleKind>().unwrap_err();
//! assert!(matches!(err, Error::UnsupportedSampleKind(_)));
//! ```
//!
//! # Used By
//!
//! - `hdrtone-io` - wraps it in `DecodeError`
//! - `hdrtone-ops` - wraps it in `OpsError`

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or converting image buffers.
#[derive(Debug, Error)]
pub enum Error {
    /// The sample representation tag is not one of U8, U16 or F32.
    ///
    /// Accepted spellings are `uint8_t`/`u8`, `uint16_t`/`u16` and
    /// `float`/`f32`, case-insensitive.
    #[error("unsupported sample kind: {0}")]
    UnsupportedSampleKind(String),

    /// Pixel vector length does not match `width * height * 3`.
    #[error("buffer size mismatch for {width}x{height} RGB: expected {expected} samples, got {actual}")]
    BufferSize {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
        /// Required sample count
        expected: usize,
        /// Provided sample count
        actual: usize,
    },

    /// Width or height is zero, or the sample count overflows `usize`.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}
