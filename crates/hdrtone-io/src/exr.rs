//! OpenEXR format support.
//!
//! Reads the first valid layer of an EXR file through the `exr` crate.
//!
//! # Channel rules
//!
//! - Channels must be named exactly `R`, `G`, `B`; `A` is tolerated and dropped.
//! - Any other channel name fails with [`DecodeError::UnrecognizedChannel`].
//! - Fewer than three channels fails with [`DecodeError::UnsupportedChannelLayout`].
//! - A missing `R`, `G` or `B` fails with [`DecodeError::ChannelMissing`].
//!
//! Half-float channels are promoted to `f32` before quantization. `UINT`
//! channels carry absolute integer values and are not rescaled.
//!
//! # Example
//!
//! ```rust,ignore
//! use hdrtone_io::{ExrDecoder, ImageDecoder};
//! use hdrtone_core::SampleKind;
//!
//! let image = ExrDecoder.decode("render.exr", SampleKind::F32)?;
//! println!("Size: {}x{}", image.width(), image.height());
//! ```

use crate::{DecodeError, DecodeResult, FileFormat, ImageDecoder};
use exr::image::FlatSamples;
use exr::meta::MetaData;
use hdrtone_core::{ImageBuffer, PixelData, Sample, SampleKind, LINEAR_GAMMA};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// OpenEXR decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExrDecoder;

/// Positions of the color channels in a channel list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RgbIndices {
    r: usize,
    g: usize,
    b: usize,
}

/// Validates a channel table and locates R, G and B.
fn locate_rgb<S: AsRef<str>>(names: &[S]) -> DecodeResult<RgbIndices> {
    if names.len() < 3 {
        return Err(DecodeError::UnsupportedChannelLayout(format!(
            "{} channels, need at least 3",
            names.len()
        )));
    }

    let (mut r, mut g, mut b) = (None, None, None);
    for (index, name) in names.iter().enumerate() {
        match name.as_ref() {
            "R" => r = Some(index),
            "G" => g = Some(index),
            "B" => b = Some(index),
            "A" => {}
            other => return Err(DecodeError::UnrecognizedChannel(other.to_string())),
        }
    }

    let missing: String = [('R', r), ('G', g), ('B', b)]
        .iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(c, _)| *c)
        .collect();
    match (r, g, b) {
        (Some(r), Some(g), Some(b)) => Ok(RgbIndices { r, g, b }),
        _ => Err(DecodeError::ChannelMissing(missing)),
    }
}

#[inline]
fn flat_sample<T: Sample>(samples: &FlatSamples, index: usize) -> T {
    match samples {
        FlatSamples::F16(v) => T::from_f32(v[index].to_f32()),
        FlatSamples::F32(v) => T::from_f32(v[index]),
        FlatSamples::U32(v) => T::from_u32(v[index]),
    }
}

fn flat_len(samples: &FlatSamples) -> usize {
    match samples {
        FlatSamples::F16(v) => v.len(),
        FlatSamples::F32(v) => v.len(),
        FlatSamples::U32(v) => v.len(),
    }
}

fn interleave<T: Sample>(channels: [&FlatSamples; 3], pixels: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(pixels * 3);
    for i in 0..pixels {
        for samples in channels {
            out.push(flat_sample::<T>(samples, i));
        }
    }
    out
}

impl ImageDecoder for ExrDecoder {
    fn format(&self) -> FileFormat {
        FileFormat::OpenExr
    }

    fn decode_from_memory(&self, data: &[u8], kind: SampleKind) -> DecodeResult<ImageBuffer> {
        use exr::prelude::*;

        let meta = MetaData::read_from_buffered(Cursor::new(data), false)
            .map_err(|e| DecodeError::HeaderParseError(e.to_string()))?;
        let header = meta
            .headers
            .first()
            .ok_or_else(|| DecodeError::HeaderParseError("no layers in file".into()))?;
        let header_names: Vec<String> = header
            .channels
            .list
            .iter()
            .map(|c| c.name.to_string())
            .collect();
        debug!(channels = ?header_names, "exr channel table");
        locate_rgb(&header_names)?;

        let image = read()
            .no_deep_data()
            .largest_resolution_level()
            .all_channels()
            .first_valid_layer()
            .all_attributes()
            .from_buffered(Cursor::new(data))
            .map_err(|e| DecodeError::BodyParseError(e.to_string()))?;

        let layer = &image.layer_data;
        let width = layer.size.width();
        let height = layer.size.height();
        let pixels = width * height;
        debug!(width, height, "exr layer size");

        let channels = &layer.channel_data.list;
        let names: Vec<String> = channels.iter().map(|c| c.name.to_string()).collect();
        let idx = locate_rgb(&names)?;
        let rgb = [
            &channels[idx.r].sample_data,
            &channels[idx.g].sample_data,
            &channels[idx.b].sample_data,
        ];
        if let Some(short) = rgb.iter().position(|s| flat_len(s) != pixels) {
            return Err(DecodeError::UnsupportedChannelLayout(format!(
                "channel {} is subsampled",
                ["R", "G", "B"][short]
            )));
        }

        let data = match kind {
            SampleKind::F32 => PixelData::F32(interleave::<f32>(rgb, pixels)),
            SampleKind::U16 => PixelData::U16(interleave::<u16>(rgb, pixels)),
            SampleKind::U8 => PixelData::U8(interleave::<u8>(rgb, pixels)),
        };
        Ok(ImageBuffer::new(width as u32, height as u32, LINEAR_GAMMA, data)?)
    }
}

/// Writes an image to an EXR file as 32-bit float RGB.
pub fn write<P: AsRef<Path>>(path: P, image: &ImageBuffer) -> DecodeResult<()> {
    use exr::prelude::*;

    let width = image.width() as usize;
    let height = image.height() as usize;
    let samples = image.data().to_f32();

    let layer = Layer::new(
        (width, height),
        LayerAttributes::named("rgb"),
        Encoding::SMALL_LOSSLESS,
        SpecificChannels::rgb(|pos: Vec2<usize>| {
            let i = (pos.y() * width + pos.x()) * 3;
            (samples[i], samples[i + 1], samples[i + 2])
        }),
    );

    Image::from_layer(layer)
        .write()
        .to_file(path.as_ref())
        .map_err(|e| DecodeError::EncodeError(e.to_string()))?;
    Ok(())
}
