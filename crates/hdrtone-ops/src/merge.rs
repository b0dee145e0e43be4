//! Two-exposure radiance merge.
//!
//! Blends a low-exposure and a high-exposure 8-bit capture of the same scene
//! into one float image. Each channel is weighted by the low capture's
//! brightness `l` through a smoothstep:
//!
//! ```text
//! w   = l * l * (3 - 2 * l)
//! out = w * l * ratio + (1 - w) * h
//! ```
//!
//! In shadows (`l` near 0) the high capture is trusted; in highlights (`l`
//! near 1) the low capture is trusted, scaled by the exposure ratio. The
//! weight is C1-continuous so the transition does not band.
//!
//! # Example
//!
//! ```rust,ignore
//! use hdrtone_ops::merge::ExposureMerger;
//!
//! let radiance = ExposureMerger::new().merge(&low, &high)?;
//! assert_eq!(radiance.sample_kind(), SampleKind::F32);
//! ```

use hdrtone_core::{ImageBuffer, SampleKind, INTEGER_SCALE};
use tracing::debug;

use crate::{OpsError, OpsResult};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Smoothstep weight on [0, 1].
#[inline]
pub fn blend_weight(l: f32) -> f32 {
    let l = l.clamp(0.0, 1.0);
    l * l * (3.0 - 2.0 * l)
}

/// Blends one normalized channel pair.
#[inline]
pub fn blend_sample(low: f32, high: f32, ratio: f32) -> f32 {
    let w = blend_weight(low);
    w * low * ratio + (1.0 - w) * high
}

/// Merges a low/high exposure pair into float radiance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureMerger {
    ratio: f32,
}

impl Default for ExposureMerger {
    fn default() -> Self {
        Self { ratio: 1.0 }
    }
}

impl ExposureMerger {
    /// Creates a merger with exposure ratio 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the factor that maps low-exposure values into the high
    /// exposure's radiance units. Must be finite and positive.
    pub fn with_exposure_ratio(mut self, ratio: f32) -> OpsResult<Self> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(OpsError::InvalidParameter(format!(
                "exposure ratio must be finite and > 0, got {ratio}"
            )));
        }
        self.ratio = ratio;
        Ok(self)
    }

    /// Current exposure ratio.
    pub fn exposure_ratio(&self) -> f32 {
        self.ratio
    }

    /// Merges two U8 captures of identical size into an F32 image.
    ///
    /// The result carries the low capture's gamma tag.
    pub fn merge(&self, low: &ImageBuffer, high: &ImageBuffer) -> OpsResult<ImageBuffer> {
        if (low.width(), low.height()) != (high.width(), high.height()) {
            return Err(OpsError::DimensionMismatch {
                low: (low.width(), low.height()),
                high: (high.width(), high.height()),
            });
        }
        let (lo, hi) = match (low.as_u8(), high.as_u8()) {
            (Some(lo), Some(hi)) => (lo, hi),
            (None, _) => {
                return Err(OpsError::UnsupportedSampleKind {
                    expected: SampleKind::U8,
                    found: low.sample_kind(),
                });
            }
            (_, None) => {
                return Err(OpsError::UnsupportedSampleKind {
                    expected: SampleKind::U8,
                    found: high.sample_kind(),
                });
            }
        };

        debug!(width = low.width(), height = low.height(), ratio = self.ratio, "merging exposures");

        let ratio = self.ratio;
        let blend = |(&l, &h): (&u8, &u8)| {
            blend_sample(l as f32 / INTEGER_SCALE, h as f32 / INTEGER_SCALE, ratio)
        };

        #[cfg(feature = "parallel")]
        let out: Vec<f32> = lo.par_iter().zip(hi.par_iter()).map(blend).collect();
        #[cfg(not(feature = "parallel"))]
        let out: Vec<f32> = lo.iter().zip(hi.iter()).map(blend).collect();

        Ok(ImageBuffer::from_f32(low.width(), low.height(), low.gamma(), out)?)
    }
}

/// Merges with the default exposure ratio.
pub fn merge(low: &ImageBuffer, high: &ImageBuffer) -> OpsResult<ImageBuffer> {
    ExposureMerger::default().merge(low, high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use hdrtone_core::LDR_GAMMA;

    fn solid(size: u32, v: u8) -> ImageBuffer {
        ImageBuffer::from_u8(size, size, LDR_GAMMA, vec![v; (size * size * 3) as usize]).unwrap()
    }

    #[test]
    fn test_weight_endpoints() {
        assert_eq!(blend_weight(0.0), 0.0);
        assert_eq!(blend_weight(1.0), 1.0);
        assert_abs_diff_eq!(blend_weight(0.5), 0.5);
    }

    #[test]
    fn test_extremes_trust_one_input() {
        assert_abs_diff_eq!(blend_sample(0.0, 0.7, 1.0), 0.7);
        assert_abs_diff_eq!(blend_sample(1.0, 0.2, 4.0), 4.0);
    }

    #[test]
    fn test_identical_inputs_pass_through() {
        for v in [0u8, 1, 64, 128, 200, 255] {
            let out = merge(&solid(3, v), &solid(3, v)).unwrap();
            assert_eq!(out.sample_kind(), SampleKind::F32);
            for &s in out.as_f32().unwrap() {
                assert_abs_diff_eq!(s, v as f32 / 255.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_continuous_in_low() {
        let high = 0.3;
        let mut prev = blend_sample(0.0, high, 2.0);
        for i in 1..=255 {
            let next = blend_sample(i as f32 / 255.0, high, 2.0);
            assert!((next - prev).abs() < 0.03, "jump at {i}: {prev} -> {next}");
            prev = next;
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = merge(&solid(4, 10), &solid(8, 10)).unwrap_err();
        assert!(matches!(
            err,
            OpsError::DimensionMismatch { low: (4, 4), high: (8, 8) }
        ));
    }

    #[test]
    fn test_rejects_float_input() {
        let float = ImageBuffer::solid(2, 2, 1.0, SampleKind::F32, [0.5; 3]).unwrap();
        let err = merge(&float, &solid(2, 1)).unwrap_err();
        assert!(matches!(
            err,
            OpsError::UnsupportedSampleKind { found: SampleKind::F32, .. }
        ));
    }

    #[test]
    fn test_ratio_validation() {
        assert!(ExposureMerger::new().with_exposure_ratio(0.0).is_err());
        assert!(ExposureMerger::new().with_exposure_ratio(f32::NAN).is_err());
        assert!(ExposureMerger::new().with_exposure_ratio(-2.0).is_err());
        let m = ExposureMerger::new().with_exposure_ratio(8.0).unwrap();
        assert_eq!(m.exposure_ratio(), 8.0);
    }

    #[test]
    fn test_output_keeps_low_gamma() {
        let low = solid(2, 100).with_gamma(1.8);
        let out = merge(&low, &solid(2, 50)).unwrap();
        assert_eq!(out.gamma(), 1.8);
    }
}
