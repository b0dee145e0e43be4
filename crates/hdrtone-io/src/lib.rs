//! # hdrtone-io
//!
//! Image decoding for the HDR tone-mapping pipeline.
//!
//! | Format | Decoder | Gamma tag | Notes |
//! |--------|---------|-----------|-------|
//! | OpenEXR | [`ExrDecoder`] | 1.0 | R/G/B required, A ignored, half promoted |
//! | Radiance HDR | [`HdrDecoder`] | 1.0 | RGBE, flat or RLE scanlines |
//! | PFM | [`PfmDecoder`] | 1.0 | scale sign selects byte order |
//! | PNG/JPEG/... | [`LdrDecoder`] | 2.2 | via the `image` crate |
//!
//! # Architecture
//!
//! - [`FileFormat`] - format tag, chosen from the file extension
//! - [`ImageDecoder`] - trait implemented by every decoder
//! - [`Decoder`] - closed set of decoders, created by path or by tag
//! - [`decode`] / [`load`] / [`write`] - high-level entry points
//! - [`cache::ImageCache`] - explicit per-path memo for redraw loops
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use hdrtone_core::SampleKind;
//!
//! // Sniff by extension, retry as LDR if the format decoder fails
//! let image = hdrtone_io::load("scene.exr", SampleKind::F32)?;
//!
//! // Decode with a known format, no fallback
//! let decoder = hdrtone_io::Decoder::for_format(hdrtone_io::FileFormat::RadianceHdr);
//! let sky = decoder.decode("sky.hdr", SampleKind::U16)?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod detect;
mod error;
mod traits;

pub mod cache;
pub mod exr;
pub mod hdr;
pub mod ldr;
pub mod pfm;

pub use detect::FileFormat;
pub use error::{DecodeError, DecodeResult};
pub use exr::ExrDecoder;
pub use hdr::HdrDecoder;
pub use ldr::LdrDecoder;
pub use pfm::PfmDecoder;
pub use traits::ImageDecoder;

use hdrtone_core::{ImageBuffer, SampleKind};
use std::path::Path;
use tracing::{debug, warn};

/// One decoder per [`FileFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    /// OpenEXR.
    Exr(ExrDecoder),
    /// Radiance RGBE.
    Hdr(HdrDecoder),
    /// Portable Float Map.
    Pfm(PfmDecoder),
    /// Common LDR formats.
    Ldr(LdrDecoder),
}

impl Decoder {
    /// Creates a decoder directly from a format tag.
    pub fn for_format(format: FileFormat) -> Self {
        match format {
            FileFormat::OpenExr => Decoder::Exr(ExrDecoder),
            FileFormat::RadianceHdr => Decoder::Hdr(HdrDecoder),
            FileFormat::Pfm => Decoder::Pfm(PfmDecoder),
            FileFormat::CommonLdr => Decoder::Ldr(LdrDecoder),
        }
    }

    /// Creates a decoder from the lower-cased file extension.
    pub fn for_path<P: AsRef<Path>>(path: P) -> Self {
        Self::for_format(FileFormat::from_extension(path))
    }
}

impl ImageDecoder for Decoder {
    fn format(&self) -> FileFormat {
        match self {
            Decoder::Exr(d) => d.format(),
            Decoder::Hdr(d) => d.format(),
            Decoder::Pfm(d) => d.format(),
            Decoder::Ldr(d) => d.format(),
        }
    }

    fn decode_from_memory(&self, data: &[u8], kind: SampleKind) -> DecodeResult<ImageBuffer> {
        match self {
            Decoder::Exr(d) => d.decode_from_memory(data, kind),
            Decoder::Hdr(d) => d.decode_from_memory(data, kind),
            Decoder::Pfm(d) => d.decode_from_memory(data, kind),
            Decoder::Ldr(d) => d.decode_from_memory(data, kind),
        }
    }
}

/// Decodes a file with the decoder chosen by its extension.
///
/// The first failure is returned as-is.
pub fn decode<P: AsRef<Path>>(path: P, kind: SampleKind) -> DecodeResult<ImageBuffer> {
    let path = path.as_ref();
    let decoder = Decoder::for_path(path);
    let image = decoder.decode(path, kind)?;
    debug!(
        path = %path.display(),
        format = %decoder.format(),
        width = image.width(),
        height = image.height(),
        kind = %kind,
        "decoded"
    );
    Ok(image)
}

/// Decodes a file, retrying once as common LDR if the sniffed decoder fails.
///
/// The file is read once. If both attempts fail, the error from the
/// format-specific decoder is returned.
pub fn load<P: AsRef<Path>>(path: P, kind: SampleKind) -> DecodeResult<ImageBuffer> {
    let path = path.as_ref();
    let decoder = Decoder::for_path(path);
    let data = std::fs::read(path)?;

    match decoder.decode_from_memory(&data, kind) {
        Ok(image) => Ok(image),
        Err(err) if decoder.format() != FileFormat::CommonLdr => {
            warn!(
                path = %path.display(),
                format = %decoder.format(),
                error = %err,
                "decode failed, retrying as common ldr"
            );
            LdrDecoder.decode_from_memory(&data, kind).map_err(|_| err)
        }
        Err(err) => Err(err),
    }
}

/// Writes an image, choosing the encoder from the file extension.
///
/// EXR, HDR and PFM store float samples. Any other extension goes through
/// the `image` crate as 8-bit RGB.
pub fn write<P: AsRef<Path>>(path: P, image: &ImageBuffer) -> DecodeResult<()> {
    let path = path.as_ref();
    match FileFormat::from_extension(path) {
        FileFormat::OpenExr => exr::write(path, image),
        FileFormat::RadianceHdr => hdr::write(path, image),
        FileFormat::Pfm => pfm::write(path, image),
        FileFormat::CommonLdr => ldr::write(path, image),
    }
}
