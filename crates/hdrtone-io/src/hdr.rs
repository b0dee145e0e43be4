//! Radiance HDR (RGBE) format support.
//!
//! Supports reading and writing RGBE with optional RLE scanlines. Decoded
//! samples are linear and the buffer is tagged with gamma 1.0; a `GAMMA`
//! header entry is logged but not applied.

use crate::{DecodeError, DecodeResult, FileFormat, ImageDecoder};
use hdrtone_core::{ImageBuffer, PixelData, SampleKind, LINEAR_GAMMA};
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Cursor, Read, Write};
use std::path::Path;
use tracing::debug;

const HDR_MAGIC: &str = "#?";

/// Radiance RGBE decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HdrDecoder;

impl ImageDecoder for HdrDecoder {
    fn format(&self) -> FileFormat {
        FileFormat::RadianceHdr
    }

    fn decode_from_memory(&self, data: &[u8], kind: SampleKind) -> DecodeResult<ImageBuffer> {
        if !data.starts_with(HDR_MAGIC.as_bytes()) {
            return Err(DecodeError::NotHdrFormat);
        }

        let mut reader = Cursor::new(data);
        let res = read_header(&mut reader)?;
        debug!(?res, "hdr header");

        let samples = read_pixels(&mut reader, &res)?;
        let pixels = PixelData::quantize(kind, &samples);
        Ok(ImageBuffer::new(res.width, res.height, LINEAR_GAMMA, pixels)?)
    }
}

/// Writes an HDR (Radiance RGBE) file.
pub fn write<P: AsRef<Path>>(path: P, image: &ImageBuffer) -> DecodeResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}RADIANCE", HDR_MAGIC)?;
    writeln!(writer, "FORMAT=32-bit_rle_rgbe")?;
    writeln!(writer)?;
    writeln!(writer, "-Y {} +X {}", image.height(), image.width())?;

    write_pixels(&mut writer, image)?;
    writer.flush()?;
    Ok(())
}

fn read_header<R: BufRead>(reader: &mut R) -> DecodeResult<Resolution> {
    let mut line = String::new();
    // magic line, already checked
    reader.read_line(&mut line)?;

    loop {
        line.clear();
        let bytes = reader.read_line(&mut line)?;
        if bytes == 0 {
            return Err(DecodeError::TruncatedHeader("missing resolution line".into()));
        }
        let line = trim_line(&line);

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('+') || line.starts_with('-') {
            return parse_resolution(line);
        }

        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim();
            match key.trim().to_ascii_uppercase().as_str() {
                "FORMAT" => {
                    if !value.eq_ignore_ascii_case("32-bit_rle_rgbe") {
                        return Err(DecodeError::UnsupportedChannelLayout(format!(
                            "FORMAT={value}, only 32-bit_rle_rgbe is supported"
                        )));
                    }
                }
                "GAMMA" => debug!(gamma = value, "ignoring hdr gamma header"),
                _ => {}
            }
        }
    }
}

/// Longest run or literal a scanline packet can describe.
const MAX_PACKET: usize = 127;
/// Runs shorter than this are cheaper as literals.
const MIN_RUN: usize = 4;

/// Widths outside this range cannot use the new-style RLE marker.
fn rle_allowed(width: usize) -> bool {
    (8..=0x7fff).contains(&width)
}

/// New-style scanline marker: `2 2 hi lo`.
fn rle_marker(width: usize) -> [u8; 4] {
    [2, 2, (width >> 8) as u8, width as u8]
}

fn body_err(e: io::Error) -> DecodeError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        DecodeError::TruncatedBody("RGBE pixel data ends early".into())
    } else {
        DecodeError::Io(e)
    }
}

fn read_byte<R: Read>(reader: &mut R) -> DecodeResult<u8> {
    let mut b = [0u8; 1];
    reader.read_exact(&mut b).map_err(body_err)?;
    Ok(b[0])
}

/// Smallest possible encoding of one RLE scanline: the marker plus four
/// planes made only of maximal runs.
fn min_rle_scanline(width: usize) -> usize {
    4 + 4 * 2 * width.div_ceil(MAX_PACKET)
}

fn read_pixels(reader: &mut Cursor<&[u8]>, res: &Resolution) -> DecodeResult<Vec<f32>> {
    let (width, height) = (res.width as usize, res.height as usize);
    let total = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| {
            DecodeError::HeaderParseError(format!("resolution {width}x{height} overflows"))
        })?;

    // size the body against the input before allocating for it
    let rest = reader.get_ref().get(reader.position() as usize..).unwrap_or_default();
    let rle = rle_allowed(width) && rest.starts_with(&rle_marker(width));
    let needed = if rle {
        min_rle_scanline(width).checked_mul(height)
    } else {
        Some(total)
    };
    if needed.is_none_or(|n| rest.len() < n) {
        return Err(DecodeError::TruncatedBody(format!(
            "{} bytes cannot hold {width}x{height} RGBE pixels",
            rest.len()
        )));
    }

    let mut rgbe = vec![0u8; total];
    let mut marker = [0u8; 4];
    reader.read_exact(&mut marker).map_err(body_err)?;

    if rle {
        debug!(width, height, "rle scanlines");
        let mut plane = vec![0u8; width];
        for (y, row) in rgbe.chunks_exact_mut(width * 4).enumerate() {
            if y > 0 {
                reader.read_exact(&mut marker).map_err(body_err)?;
                if marker != rle_marker(width) {
                    return Err(DecodeError::BodyParseError(format!(
                        "scanline {y}: bad RLE marker {marker:?}"
                    )));
                }
            }
            for c in 0..4 {
                read_rle_plane(reader, &mut plane)?;
                for (px, &v) in row.chunks_exact_mut(4).zip(&plane) {
                    px[c] = v;
                }
            }
        }
    } else {
        // flat RGBE quadruples; the marker was the first pixel
        rgbe[..4].copy_from_slice(&marker);
        reader.read_exact(&mut rgbe[4..]).map_err(body_err)?;
    }

    // reorder into top-to-bottom, left-to-right
    let row_len = width * 4;
    let mut samples = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let src_y = if res.bottom_up { height - 1 - y } else { y };
        let row = &rgbe[src_y * row_len..(src_y + 1) * row_len];
        for x in 0..width {
            let src_x = if res.right_to_left { width - 1 - x } else { x };
            let q = &row[src_x * 4..src_x * 4 + 4];
            samples.extend(Rgbe([q[0], q[1], q[2], q[3]]).to_linear());
        }
    }
    Ok(samples)
}

/// Decodes one RLE channel plane of a scanline.
fn read_rle_plane<R: Read>(reader: &mut R, plane: &mut [u8]) -> DecodeResult<()> {
    let mut pos = 0;
    while pos < plane.len() {
        let code = read_byte(reader)? as usize;
        let (len, repeat) = if code > 128 { (code - 128, true) } else { (code, false) };
        let Some(span) = plane.get_mut(pos..pos + len).filter(|s| !s.is_empty()) else {
            return Err(DecodeError::BodyParseError(format!(
                "RLE packet of {len} at {pos} overflows scanline of {}",
                plane.len()
            )));
        };
        if repeat {
            span.fill(read_byte(reader)?);
        } else {
            reader.read_exact(span).map_err(body_err)?;
        }
        pos += len;
    }
    Ok(())
}

fn write_pixels<W: Write>(writer: &mut W, image: &ImageBuffer) -> DecodeResult<()> {
    let width = image.width() as usize;
    let samples = image.data().to_f32();
    let rle = rle_allowed(width);

    let mut quads = Vec::with_capacity(width * 4);
    let mut plane = Vec::with_capacity(width);
    for row in samples.chunks_exact(image.row_length()) {
        quads.clear();
        quads.extend(row.chunks_exact(3).flat_map(|p| Rgbe::from_linear([p[0], p[1], p[2]]).0));

        if !rle {
            writer.write_all(&quads)?;
            continue;
        }
        writer.write_all(&rle_marker(width))?;
        for c in 0..4 {
            plane.clear();
            plane.extend(quads.iter().skip(c).step_by(4));
            writer.write_all(&encode_rle_plane(&plane))?;
        }
    }
    Ok(())
}

/// Length of the run of equal bytes starting at `start`, capped at a packet.
fn run_at(data: &[u8], start: usize) -> usize {
    data[start..]
        .iter()
        .take(MAX_PACKET)
        .take_while(|&&b| b == data[start])
        .count()
}

/// Encodes one channel plane as run and literal packets.
fn encode_rle_plane(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / MAX_PACKET + 1);
    let mut pos = 0;
    while pos < data.len() {
        let run = run_at(data, pos);
        if run >= MIN_RUN {
            out.extend_from_slice(&[(128 + run) as u8, data[pos]]);
            pos += run;
            continue;
        }

        // gather literals until the next worthwhile run
        let start = pos;
        while pos < data.len() && pos - start < MAX_PACKET && run_at(data, pos) < MIN_RUN {
            pos += 1;
        }
        out.push((pos - start) as u8);
        out.extend_from_slice(&data[start..pos]);
    }
    out
}

/// One shared-exponent pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rgbe([u8; 4]);

impl Rgbe {
    /// Encodes linear RGB. Negative components clamp to 0.
    fn from_linear(rgb: [f32; 3]) -> Self {
        let rgb = rgb.map(|v| v.max(0.0));
        let max = rgb[0].max(rgb[1]).max(rgb[2]);
        if max < 1.0e-32 {
            return Self([0; 4]);
        }
        // max = m * 2^exp with m in [0.5, 1)
        let exp = max.log2().floor() as i32 + 1;
        let scale = 256.0 / 2f32.powi(exp);
        let [r, g, b] = rgb.map(|v| (v * scale).min(255.0) as u8);
        Self([r, g, b, (exp + 128) as u8])
    }

    /// Decodes to linear RGB.
    fn to_linear(self) -> [f32; 3] {
        let [r, g, b, e] = self.0;
        if e == 0 {
            return [0.0; 3];
        }
        let f = 2f32.powi(e as i32 - 136);
        [r, g, b].map(|v| v as f32 * f)
    }
}

/// Image size and scan order from the resolution line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Resolution {
    width: u32,
    height: u32,
    /// `+Y`: scanlines stored bottom to top.
    bottom_up: bool,
    /// `-X`: pixels stored right to left.
    right_to_left: bool,
}

/// Parses `<±Y> <h> <±X> <w>`. Column-major orders (`X` first) are rejected.
fn parse_resolution(line: &str) -> DecodeResult<Resolution> {
    let invalid = || DecodeError::HeaderParseError(format!("invalid resolution line: {line}"));
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [y_axis, h, x_axis, w] = tokens.as_slice() else {
        return Err(invalid());
    };
    match (*y_axis, *x_axis) {
        ("-Y" | "+Y", "-X" | "+X") => {}
        ("-X" | "+X", "-Y" | "+Y") => {
            return Err(DecodeError::UnsupportedChannelLayout(format!(
                "column-major scan order {y_axis} {x_axis}"
            )));
        }
        _ => return Err(invalid()),
    }
    let height: u32 = h.parse().map_err(|_| invalid())?;
    let width: u32 = w.parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok(Resolution {
        width,
        height,
        bottom_up: *y_axis == "+Y",
        right_to_left: *x_axis == "-X",
    })
}

fn trim_line(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}
