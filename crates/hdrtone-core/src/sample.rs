//! Sample representations and loss-aware conversion between them.
//!
//! Every decoder and the merger produce RGB samples in one of three
//! representations, described by [`SampleKind`]:
//!
//! | Kind | Storage | Normalized value of `s` |
//! |------|---------|-------------------------|
//! | `U8` | `u8` | `s / 255` |
//! | `U16` | `u16` | `s / 255` |
//! | `F32` | `f32` | `s` |
//!
//! # Quantization
//!
//! Converting a floating-point value `v` to an integer kind uses the same
//! scale for both widths:
//!
//! - `U8`: `clamp(round(v * 255), 0, 255)`
//! - `U16`: `clamp(round(v * 255), 0, 65535)`
//!
//! The 16-bit path deliberately scales by 255, not 65535. Values above 1.0
//! keep headroom up to `65535 / 255 ≈ 257` and the shader math that
//! divides by 255 stays identical for both integer textures. This wastes
//! most of the 16-bit range and looks like it was copied from the 8-bit
//! path, but it is the observed behavior and downstream consumers rely on it.
//!
//! # Example
//!
//! ```rust
//! use hdrtone_core::sample::{Sample, SampleKind};
//!
//! assert_eq!(u8::from_f32(0.5), 128);
//! assert_eq!(u16::from_f32(2.0), 510);
//! assert_eq!("uint16_t".parse::<SampleKind>().unwrap(), SampleKind::U16);
//! ```

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Scale shared by both integer sample kinds.
pub const INTEGER_SCALE: f32 = 255.0;

/// Runtime tag for the sample representation of an [`ImageBuffer`](crate::ImageBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleKind {
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit unsigned integer, scaled like `U8`.
    U16,
    /// 32-bit float, linear and unscaled.
    #[default]
    F32,
}

impl SampleKind {
    /// Bytes per stored sample.
    #[inline]
    pub const fn bytes_per_sample(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::F32 => 4,
        }
    }

    /// Canonical tag name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::U8 => "uint8_t",
            Self::U16 => "uint16_t",
            Self::F32 => "float",
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uint8_t" | "u8" => Ok(Self::U8),
            "uint16_t" | "u16" => Ok(Self::U16),
            "float" | "f32" => Ok(Self::F32),
            _ => Err(Error::UnsupportedSampleKind(s.to_string())),
        }
    }
}

/// A storable sample type.
///
/// Implemented for `u8`, `u16` and `f32`. Conversions go through the
/// normalized `f32` domain described in the module docs.
pub trait Sample: Copy + Default + Send + Sync + 'static {
    /// Kind tag for this storage type.
    const KIND: SampleKind;

    /// Quantizes (or copies) a normalized value into this representation.
    fn from_f32(v: f32) -> Self;

    /// Returns the normalized value of this sample.
    fn to_f32(self) -> f32;

    /// Converts an unscaled integer source sample.
    ///
    /// Integer sources (e.g. `UINT` EXR channels) carry absolute values: they
    /// are copied into floats and clamped into integer storage.
    fn from_u32(v: u32) -> Self;
}

impl Sample for u8 {
    const KIND: SampleKind = SampleKind::U8;

    #[inline]
    fn from_f32(v: f32) -> Self {
        (v * INTEGER_SCALE).round().clamp(0.0, u8::MAX as f32) as u8
    }

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32 / INTEGER_SCALE
    }

    #[inline]
    fn from_u32(v: u32) -> Self {
        v.min(u8::MAX as u32) as u8
    }
}

impl Sample for u16 {
    const KIND: SampleKind = SampleKind::U16;

    #[inline]
    fn from_f32(v: f32) -> Self {
        // Scaled by 255, see module docs.
        (v * INTEGER_SCALE).round().clamp(0.0, u16::MAX as f32) as u16
    }

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32 / INTEGER_SCALE
    }

    #[inline]
    fn from_u32(v: u32) -> Self {
        v.min(u16::MAX as u32) as u16
    }
}

impl Sample for f32 {
    const KIND: SampleKind = SampleKind::F32;

    #[inline]
    fn from_f32(v: f32) -> Self {
        v
    }

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_u32(v: u32) -> Self {
        v as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_u8_quantization() {
        assert_eq!(u8::from_f32(0.0), 0);
        assert_eq!(u8::from_f32(1.0), 255);
        assert_eq!(u8::from_f32(2.0), 255);
        assert_eq!(u8::from_f32(-0.5), 0);
        // 0.5 * 255 = 127.5 rounds away from zero
        assert_eq!(u8::from_f32(0.5), 128);
        assert_eq!(u8::from_f32(f32::NAN), 0);
    }

    #[test]
    fn test_u16_keeps_255_scale() {
        assert_eq!(u16::from_f32(1.0), 255);
        assert_eq!(u16::from_f32(2.0), 510);
        assert_eq!(u16::from_f32(1000.0), u16::MAX);
        assert_eq!(u16::from_f32(-1.0), 0);
    }

    #[test]
    fn test_to_f32_inverts_scale() {
        assert_relative_eq!(255u8.to_f32(), 1.0);
        assert_relative_eq!(510u16.to_f32(), 2.0);
        assert_relative_eq!(0.25f32.to_f32(), 0.25);
    }

    #[test]
    fn test_integer_sources_unscaled() {
        assert_eq!(u8::from_u32(300), 255);
        assert_eq!(u16::from_u32(300), 300);
        assert_eq!(f32::from_u32(7), 7.0);
    }

    #[test]
    fn test_parse_kind_tags() {
        assert_eq!("float".parse::<SampleKind>().unwrap(), SampleKind::F32);
        assert_eq!("F32".parse::<SampleKind>().unwrap(), SampleKind::F32);
        assert_eq!("uint16_t".parse::<SampleKind>().unwrap(), SampleKind::U16);
        assert_eq!("u8".parse::<SampleKind>().unwrap(), SampleKind::U8);
        assert!(matches!(
            "half".parse::<SampleKind>(),
            Err(Error::UnsupportedSampleKind(_))
        ));
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for kind in [SampleKind::U8, SampleKind::U16, SampleKind::F32] {
            assert_eq!(kind.to_string().parse::<SampleKind>().unwrap(), kind);
        }
    }
}
