//! RGB image buffer with a tagged sample representation.
//!
//! [`ImageBuffer`] is the unit of exchange between decoders, the exposure
//! merger and the renderer. It always holds exactly three interleaved
//! channels (R, G, B) in row-major order, top row first.
//!
//! The sample storage is a [`PixelData`] sum type, so the sample kind and the
//! vector can never disagree. Buffers are immutable once built: every stage
//! produces a fresh buffer and hands it on by value.
//!
//! # Example
//!
//! ```rust
//! use hdrtone_core::{ImageBuffer, SampleKind};
//!
//! let img = ImageBuffer::from_f32(2, 1, 1.0, vec![0.0, 0.5, 1.0, 2.0, 0.25, 0.0])?;
//! let ldr = img.convert(SampleKind::U8);
//! assert_eq!(ldr.as_u8().unwrap(), &[0, 128, 255, 255, 64, 0]);
//! # Ok::<(), hdrtone_core::Error>(())
//! ```

use crate::sample::{Sample, SampleKind};
use crate::{Error, Result};

/// Number of channels in every buffer.
pub const CHANNELS: usize = 3;

/// Display gamma assumed for linear sources (EXR, RGBE, PFM, merged float).
pub const LINEAR_GAMMA: f32 = 1.0;

/// Display gamma baked into common LDR sources (PNG, JPEG, ...).
pub const LDR_GAMMA: f32 = 2.2;

/// Owned sample storage, one variant per [`SampleKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    /// 8-bit samples.
    U8(Vec<u8>),
    /// 16-bit samples (255-scaled).
    U16(Vec<u16>),
    /// 32-bit float samples.
    F32(Vec<f32>),
}

impl PixelData {
    /// Quantizes normalized samples into storage of the requested kind.
    pub fn quantize(kind: SampleKind, values: &[f32]) -> Self {
        match kind {
            SampleKind::U8 => Self::U8(values.iter().map(|&v| u8::from_f32(v)).collect()),
            SampleKind::U16 => Self::U16(values.iter().map(|&v| u16::from_f32(v)).collect()),
            SampleKind::F32 => Self::F32(values.to_vec()),
        }
    }

    /// Builds storage of the requested kind from any sample iterator.
    pub fn collect<I>(kind: SampleKind, values: I) -> Self
    where
        I: IntoIterator<Item = f32>,
    {
        let iter = values.into_iter();
        match kind {
            SampleKind::U8 => Self::U8(iter.map(u8::from_f32).collect()),
            SampleKind::U16 => Self::U16(iter.map(u16::from_f32).collect()),
            SampleKind::F32 => Self::F32(iter.collect()),
        }
    }

    /// Kind tag of this storage.
    pub fn kind(&self) -> SampleKind {
        match self {
            Self::U8(_) => SampleKind::U8,
            Self::U16(_) => SampleKind::U16,
            Self::F32(_) => SampleKind::F32,
        }
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalized value of sample `index`.
    #[inline]
    pub fn get_f32(&self, index: usize) -> Option<f32> {
        match self {
            Self::U8(v) => v.get(index).map(|&s| s.to_f32()),
            Self::U16(v) => v.get(index).map(|&s| s.to_f32()),
            Self::F32(v) => v.get(index).copied(),
        }
    }

    /// Copies all samples into normalized floats.
    pub fn to_f32(&self) -> Vec<f32> {
        match self {
            Self::U8(v) => v.iter().map(|&s| s.to_f32()).collect(),
            Self::U16(v) => v.iter().map(|&s| s.to_f32()).collect(),
            Self::F32(v) => v.clone(),
        }
    }

    /// Raw bytes in native endianness, as handed to a texture upload.
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        match self {
            Self::U8(v) => v.clone(),
            Self::U16(v) => v.iter().flat_map(|s| s.to_ne_bytes()).collect(),
            Self::F32(v) => v.iter().flat_map(|s| s.to_ne_bytes()).collect(),
        }
    }
}

/// Decoded or merged RGB image.
///
/// Invariant: `data.len() == width * height * 3`, checked on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    gamma: f32,
    data: PixelData,
}

impl ImageBuffer {
    /// Creates a buffer, validating dimensions against the sample count.
    pub fn new(width: u32, height: u32, gamma: f32, data: PixelData) -> Result<Self> {
        let expected = sample_count(width, height)?;
        if data.len() != expected {
            return Err(Error::BufferSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            gamma,
            data,
        })
    }

    /// Creates a float buffer.
    pub fn from_f32(width: u32, height: u32, gamma: f32, data: Vec<f32>) -> Result<Self> {
        Self::new(width, height, gamma, PixelData::F32(data))
    }

    /// Creates an 8-bit buffer.
    pub fn from_u8(width: u32, height: u32, gamma: f32, data: Vec<u8>) -> Result<Self> {
        Self::new(width, height, gamma, PixelData::U8(data))
    }

    /// Creates a 16-bit buffer.
    pub fn from_u16(width: u32, height: u32, gamma: f32, data: Vec<u16>) -> Result<Self> {
        Self::new(width, height, gamma, PixelData::U16(data))
    }

    /// Creates a buffer where every pixel has the same color.
    pub fn solid(width: u32, height: u32, gamma: f32, kind: SampleKind, rgb: [f32; 3]) -> Result<Self> {
        let count = sample_count(width, height)? / CHANNELS;
        let values = std::iter::repeat_n(rgb, count).flatten();
        Self::new(width, height, gamma, PixelData::collect(kind, values))
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Display gamma already baked into the samples.
    #[inline]
    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Sample representation.
    #[inline]
    pub fn sample_kind(&self) -> SampleKind {
        self.data.kind()
    }

    /// Sample storage.
    #[inline]
    pub fn data(&self) -> &PixelData {
        &self.data
    }

    /// Returns the same pixels tagged with a different gamma.
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Total pixel count.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Samples per row.
    #[inline]
    pub fn row_length(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Float samples, if this is an F32 buffer.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match &self.data {
            PixelData::F32(v) => Some(v),
            _ => None,
        }
    }

    /// 16-bit samples, if this is a U16 buffer.
    pub fn as_u16(&self) -> Option<&[u16]> {
        match &self.data {
            PixelData::U16(v) => Some(v),
            _ => None,
        }
    }

    /// 8-bit samples, if this is a U8 buffer.
    pub fn as_u8(&self) -> Option<&[u8]> {
        match &self.data {
            PixelData::U8(v) => Some(v),
            _ => None,
        }
    }

    /// Normalized RGB of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let base = (y as usize * self.width as usize + x as usize) * CHANNELS;
        Some([
            self.data.get_f32(base)?,
            self.data.get_f32(base + 1)?,
            self.data.get_f32(base + 2)?,
        ])
    }

    /// Converts to another sample kind, keeping dimensions and gamma.
    ///
    /// Conversion goes through the normalized domain, so `U8 -> U16` keeps
    /// the stored integer values and `U16 -> U8` clamps at 255.
    pub fn convert(&self, kind: SampleKind) -> ImageBuffer {
        if kind == self.sample_kind() {
            return self.clone();
        }
        let data = match (&self.data, kind) {
            (PixelData::U8(v), SampleKind::U16) => PixelData::U16(v.iter().map(|&s| s as u16).collect()),
            (PixelData::F32(v), _) => PixelData::quantize(kind, v),
            (other, _) => PixelData::quantize(kind, &other.to_f32()),
        };
        Self {
            width: self.width,
            height: self.height,
            gamma: self.gamma,
            data,
        }
    }

    /// Per-channel min, max and mean over the normalized samples.
    pub fn stats(&self) -> [(f32, f32, f32); 3] {
        let mut out = [(f32::INFINITY, f32::NEG_INFINITY, 0.0f64); 3];
        for i in 0..self.data.len() {
            let c = i % CHANNELS;
            let v = self.data.get_f32(i).unwrap_or(0.0);
            out[c].0 = out[c].0.min(v);
            out[c].1 = out[c].1.max(v);
            out[c].2 += v as f64;
        }
        let n = self.pixel_count().max(1) as f64;
        out.map(|(min, max, sum)| (min, max, (sum / n) as f32))
    }
}

/// `width * height * 3`, rejecting empty or overflowing sizes.
pub fn sample_count(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or(Error::InvalidDimensions { width, height })
}
