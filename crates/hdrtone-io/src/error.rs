//! Error types for decode operations.
//!
//! Every decoder returns either a valid [`ImageBuffer`](hdrtone_core::ImageBuffer)
//! or one of these kinds. Nothing is retried inside a single decode call.

use std::io;
use thiserror::Error;

/// Decode or encode failure.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Buffer construction or sample-kind error from the core crate.
    #[error(transparent)]
    Core(#[from] hdrtone_core::Error),

    /// EXR channel other than R, G, B or A.
    #[error("unrecognized channel: {0}")]
    UnrecognizedChannel(String),

    /// Required R, G or B channel is absent.
    #[error("channel missing: {0}")]
    ChannelMissing(String),

    /// Source has fewer than three color channels, or an unsupported layout.
    #[error("unsupported channel layout: {0}")]
    UnsupportedChannelLayout(String),

    /// File lacks the Radiance `#?` signature.
    #[error("not a Radiance HDR file")]
    NotHdrFormat,

    /// File does not start with the expected magic bytes.
    #[error("bad magic: {0}")]
    BadMagic(String),

    /// Header ended before all required fields were read.
    #[error("truncated header: {0}")]
    TruncatedHeader(String),

    /// Pixel data is shorter than the header promises.
    #[error("truncated body: {0}")]
    TruncatedBody(String),

    /// Header is present but malformed.
    #[error("header parse error: {0}")]
    HeaderParseError(String),

    /// Pixel data is present but malformed.
    #[error("body parse error: {0}")]
    BodyParseError(String),

    /// Writing is not possible for this image or format.
    #[error("encode error: {0}")]
    EncodeError(String),
}

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
