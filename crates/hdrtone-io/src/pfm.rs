//! Portable Float Map support.
//!
//! Layout:
//!
//! ```text
//! PF\n                three-channel magic ("Pf" is grayscale, rejected)
//! <width> <height>\n
//! <scale>\n           sign gives byte order: positive = big-endian
//! <float32 * width * height * 3>   rows bottom-to-top
//! ```
//!
//! Rows are flipped on decode so the buffer is top row first, like every
//! other decoder. Only the sign of the scale factor is used.

use crate::{DecodeError, DecodeResult, FileFormat, ImageDecoder};
use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use hdrtone_core::{ImageBuffer, PixelData, SampleKind, LINEAR_GAMMA};
use std::path::Path;
use tracing::{debug, info};

/// PFM decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PfmDecoder;

/// Parsed PFM header.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PfmHeader {
    width: u32,
    height: u32,
    big_endian: bool,
    /// Offset of the first pixel byte.
    body_offset: usize,
}

/// Reads the next whitespace-delimited token, returning it and the index
/// just past it. Fails if the data ends before the token is terminated.
fn next_token(data: &[u8], mut pos: usize, what: &str) -> DecodeResult<(String, usize)> {
    while pos < data.len() && data[pos].is_ascii_whitespace() {
        pos += 1;
    }
    let start = pos;
    while pos < data.len() && !data[pos].is_ascii_whitespace() {
        pos += 1;
    }
    if pos >= data.len() {
        return Err(DecodeError::TruncatedHeader(format!("missing {what}")));
    }
    let token = std::str::from_utf8(&data[start..pos])
        .map_err(|_| DecodeError::HeaderParseError(format!("{what} is not ASCII")))?;
    Ok((token.to_string(), pos))
}

fn parse_header(data: &[u8]) -> DecodeResult<PfmHeader> {
    if data.len() < 2 {
        return Err(DecodeError::TruncatedHeader("missing magic".into()));
    }
    match &data[0..2] {
        b"PF" => {}
        b"Pf" => {
            return Err(DecodeError::UnsupportedChannelLayout(
                "grayscale PFM (Pf), need 3 channels".into(),
            ));
        }
        other => {
            return Err(DecodeError::BadMagic(format!(
                "expected \"PF\", found {:?}",
                String::from_utf8_lossy(other)
            )));
        }
    }

    let (width, pos) = next_token(data, 2, "width")?;
    let (height, pos) = next_token(data, pos, "height")?;
    let (scale, pos) = next_token(data, pos, "scale factor")?;

    let width: u32 = width
        .parse()
        .map_err(|_| DecodeError::HeaderParseError(format!("invalid width {width:?}")))?;
    let height: u32 = height
        .parse()
        .map_err(|_| DecodeError::HeaderParseError(format!("invalid height {height:?}")))?;
    let scale: f32 = scale
        .parse()
        .map_err(|_| DecodeError::HeaderParseError(format!("invalid scale {scale:?}")))?;

    if width == 0 || height == 0 {
        return Err(DecodeError::HeaderParseError(format!(
            "invalid dimensions {width}x{height}"
        )));
    }
    if scale == 0.0 || !scale.is_finite() {
        return Err(DecodeError::HeaderParseError(format!("invalid scale {scale}")));
    }

    // exactly one whitespace byte separates the header from the body
    Ok(PfmHeader {
        width,
        height,
        big_endian: scale > 0.0,
        body_offset: pos + 1,
    })
}

impl ImageDecoder for PfmDecoder {
    fn format(&self) -> FileFormat {
        FileFormat::Pfm
    }

    fn decode_from_memory(&self, data: &[u8], kind: SampleKind) -> DecodeResult<ImageBuffer> {
        let header = parse_header(data)?;
        let width = header.width as usize;
        let height = header.height as usize;
        let samples_len = hdrtone_core::sample_count(header.width, header.height).ok();
        let expected = samples_len.and_then(|n| n.checked_mul(4)).ok_or_else(|| {
            DecodeError::HeaderParseError(format!(
                "dimensions {}x{} overflow",
                header.width, header.height
            ))
        })?;
        let row_len = width * 3;

        let body = &data[header.body_offset.min(data.len())..];
        if body.len() < expected {
            return Err(DecodeError::TruncatedBody(format!(
                "expected {expected} bytes of float data, found {}",
                body.len()
            )));
        }

        let mut stored = vec![0f32; expected / 4];
        if header.big_endian {
            debug!("pfm is big-endian, byte-swapping samples");
            BigEndian::read_f32_into(&body[..expected], &mut stored);
        } else {
            LittleEndian::read_f32_into(&body[..expected], &mut stored);
        }

        // bottom-to-top on disk
        let samples: Vec<f32> = stored.chunks_exact(row_len).rev().flatten().copied().collect();

        info!(width, height, "decoded pfm");
        Ok(ImageBuffer::new(
            header.width,
            header.height,
            LINEAR_GAMMA,
            PixelData::quantize(kind, &samples),
        )?)
    }
}

/// Encodes an image as PFM bytes in the given byte order.
pub fn encode(image: &ImageBuffer, big_endian: bool) -> Vec<u8> {
    let scale = if big_endian { "1.0" } else { "-1.0" };
    let mut out = format!("PF\n{} {}\n{}\n", image.width(), image.height(), scale).into_bytes();

    let samples = image.data().to_f32();
    out.reserve(samples.len() * 4);
    for row in samples.chunks_exact(image.row_length()).rev() {
        for &v in row {
            // writing into a Vec cannot fail
            let _ = if big_endian {
                out.write_f32::<BigEndian>(v)
            } else {
                out.write_f32::<LittleEndian>(v)
            };
        }
    }
    out
}

/// Writes an image to a little-endian PFM file.
pub fn write<P: AsRef<Path>>(path: P, image: &ImageBuffer) -> DecodeResult<()> {
    std::fs::write(path, encode(image, false))?;
    Ok(())
}
