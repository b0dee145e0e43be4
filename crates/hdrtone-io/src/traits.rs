//! Decoder trait shared by every format.
//!
//! Each format implements [`ImageDecoder::decode_from_memory`]; file decoding
//! reads the whole file synchronously and forwards to it.

use crate::{DecodeResult, FileFormat};
use hdrtone_core::{ImageBuffer, SampleKind};
use std::path::Path;
use tracing::trace;

/// Trait for image format decoders.
///
/// # Example
///
/// ```rust,ignore
/// use hdrtone_io::{ImageDecoder, PfmDecoder};
/// use hdrtone_core::SampleKind;
///
/// let image = PfmDecoder.decode("depth.pfm", SampleKind::F32)?;
/// ```
pub trait ImageDecoder {
    /// Format family handled by this decoder.
    fn format(&self) -> FileFormat;

    /// Decodes an image held in memory into the requested sample kind.
    fn decode_from_memory(&self, data: &[u8], kind: SampleKind) -> DecodeResult<ImageBuffer>;

    /// Reads a whole file and decodes it into the requested sample kind.
    fn decode<P: AsRef<Path>>(&self, path: P, kind: SampleKind) -> DecodeResult<ImageBuffer> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        trace!(path = %path.display(), bytes = data.len(), format = %self.format(), "read file");
        self.decode_from_memory(&data, kind)
    }
}
