//! Common low-dynamic-range formats (PNG, JPEG, TIFF, BMP, ...).
//!
//! Decoding goes through the `image` crate. Sources need at least three
//! color channels; alpha is dropped. The result is always tagged with
//! gamma 2.2, regardless of what the caller asked for.
//!
//! # Example
//!
//! ```rust,ignore
//! use hdrtone_io::{ImageDecoder, LdrDecoder};
//! use hdrtone_core::SampleKind;
//!
//! let image = LdrDecoder.decode("photo.jpg", SampleKind::U8)?;
//! assert_eq!(image.gamma(), 2.2);
//! ```

use crate::{DecodeError, DecodeResult, FileFormat, ImageDecoder};
use hdrtone_core::{ImageBuffer, PixelData, SampleKind, LDR_GAMMA};
use image::{DynamicImage, ImageError};
use std::path::Path;
use tracing::debug;

/// General-purpose LDR decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LdrDecoder;

fn codec_err(e: ImageError) -> DecodeError {
    match e {
        ImageError::IoError(e) => DecodeError::Io(e),
        other => DecodeError::BodyParseError(other.to_string()),
    }
}

/// Converts an already decoded image into an RGB buffer.
pub fn from_dynamic(img: DynamicImage, kind: SampleKind) -> DecodeResult<ImageBuffer> {
    let channels = img.color().channel_count();
    if channels < 3 {
        return Err(DecodeError::UnsupportedChannelLayout(format!(
            "{:?} has {channels} channels, need at least 3",
            img.color()
        )));
    }

    let (width, height) = (img.width(), img.height());
    debug!(width, height, channels, color = ?img.color(), "ldr image");

    let is_8bit = img.color().bytes_per_pixel() == channels;
    let data = match kind {
        SampleKind::U8 if is_8bit => PixelData::U8(img.into_rgb8().into_raw()),
        _ => PixelData::quantize(kind, img.into_rgb32f().as_raw()),
    };
    Ok(ImageBuffer::new(width, height, LDR_GAMMA, data)?)
}

impl ImageDecoder for LdrDecoder {
    fn format(&self) -> FileFormat {
        FileFormat::CommonLdr
    }

    fn decode_from_memory(&self, data: &[u8], kind: SampleKind) -> DecodeResult<ImageBuffer> {
        let img = image::load_from_memory(data).map_err(codec_err)?;
        from_dynamic(img, kind)
    }
}

/// Writes an image through the `image` crate, format chosen by extension.
///
/// Samples are quantized to 8 bits first; float data should already be
/// tone-mapped.
pub fn write<P: AsRef<Path>>(path: P, image: &ImageBuffer) -> DecodeResult<()> {
    let ldr = image.convert(SampleKind::U8);
    let samples = ldr.as_u8().map(<[u8]>::to_vec).unwrap_or_default();
    let rgb = image::RgbImage::from_raw(ldr.width(), ldr.height(), samples)
        .ok_or_else(|| DecodeError::EncodeError("buffer size mismatch".into()))?;
    rgb.save(path.as_ref()).map_err(|e| match e {
        ImageError::IoError(e) => DecodeError::Io(e),
        other => DecodeError::EncodeError(other.to_string()),
    })
}
