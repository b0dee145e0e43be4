//! Radiance-to-display tone curves.
//!
//! Two curves are available:
//!
//! - **Plain**: clamp to [0, 1], then `v^(1/gamma)`.
//! - **Hable** (Uncharted 2 filmic): a rational shoulder/toe curve applied
//!   after a fixed exposure bias, normalized so the white point maps to 1.
//!
//! ```text
//! tonemap(x) = (x(Ax + CB) + DE) / (x(Ax + B) + DF) - E/F
//! color      = tonemap(exposureBias * rgb) / tonemap(W)
//! display    = clamp(color, 0, 1)^(1/gamma)
//! ```
//!
//! Only RGB is handled; alpha is implicitly 1.
//!
//! # Per-image gamma
//!
//! [`ToneCurve::for_image`] overrides the curve gamma with
//! `2.2 / image.gamma()`. A linear source (gamma tag 1.0) gets the full 2.2
//! correction; an LDR source (tag 2.2) gets 1.0, passing its encoding
//! through unchanged.

use std::fmt;

use hdrtone_core::ImageBuffer;

/// Display gamma the curves target.
pub const DISPLAY_GAMMA: f32 = 2.2;

/// Hable filmic constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HableParams {
    /// Shoulder strength.
    pub a: f32,
    /// Linear strength.
    pub b: f32,
    /// Linear angle.
    pub c: f32,
    /// Toe strength.
    pub d: f32,
    /// Toe numerator.
    pub e: f32,
    /// Toe denominator.
    pub f: f32,
    /// Linear white point.
    pub w: f32,
    /// Multiplier applied to radiance before the curve.
    pub exposure_bias: f32,
}

/// The fixed Uncharted 2 constants.
pub const HABLE: HableParams = HableParams {
    a: 0.15,
    b: 0.50,
    c: 0.10,
    d: 0.20,
    e: 0.02,
    f: 0.30,
    w: 11.2,
    exposure_bias: 2.0,
};

impl Default for HableParams {
    fn default() -> Self {
        HABLE
    }
}

impl HableParams {
    /// The rational curve for one channel.
    #[inline]
    pub fn curve(&self, x: f32) -> f32 {
        let Self { a, b, c, d, e, f, .. } = *self;
        (x * (a * x + c * b) + d * e) / (x * (a * x + b) + d * f) - e / f
    }

    /// `1 / curve(W)`.
    #[inline]
    pub fn white_scale(&self) -> f32 {
        1.0 / self.curve(self.w)
    }
}

/// Which curve a [`ToneCurve`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveKind {
    /// Clamp and gamma only.
    #[default]
    Plain,
    /// Hable filmic curve.
    Hable,
}

impl CurveKind {
    /// Picks a curve by name. `"hable"` (any case) selects Hable; every other
    /// name selects Plain.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("hable") {
            Self::Hable
        } else {
            Self::Plain
        }
    }

    /// Lower-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Hable => "hable",
        }
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `v^(1/gamma)`, with non-positive input mapped to 0.
#[inline]
pub fn gamma_correct(v: f32, gamma: f32) -> f32 {
    if v <= 0.0 { 0.0 } else { v.powf(1.0 / gamma) }
}

/// A tone curve with its gamma term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneCurve {
    kind: CurveKind,
    params: HableParams,
    gamma: f32,
}

impl Default for ToneCurve {
    fn default() -> Self {
        Self::plain(DISPLAY_GAMMA)
    }
}

impl ToneCurve {
    /// Plain clamp + gamma curve.
    pub fn plain(gamma: f32) -> Self {
        Self { kind: CurveKind::Plain, params: HABLE, gamma }
    }

    /// Hable filmic curve with the fixed constants.
    pub fn hable(gamma: f32) -> Self {
        Self { kind: CurveKind::Hable, params: HABLE, gamma }
    }

    /// Curve by kind.
    pub fn new(kind: CurveKind, gamma: f32) -> Self {
        Self { kind, params: HABLE, gamma }
    }

    /// Curve by name, see [`CurveKind::from_name`].
    pub fn from_name(name: &str, gamma: f32) -> Self {
        Self::new(CurveKind::from_name(name), gamma)
    }

    /// Replaces the gamma term.
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Same curve with gamma set to `2.2 / image.gamma()`.
    pub fn for_image(self, image: &ImageBuffer) -> Self {
        self.with_gamma(DISPLAY_GAMMA / image.gamma())
    }

    /// Curve kind.
    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    /// Gamma term.
    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Hable constants (also carried by Plain curves for uniform upload).
    pub fn params(&self) -> &HableParams {
        &self.params
    }

    /// Curve output before clamp and gamma.
    #[inline]
    pub fn filmic(&self, rgb: [f32; 3]) -> [f32; 3] {
        match self.kind {
            CurveKind::Plain => rgb,
            CurveKind::Hable => {
                let p = &self.params;
                let scale = p.white_scale();
                rgb.map(|v| p.curve(p.exposure_bias * v) * scale)
            }
        }
    }

    /// Maps a radiance color to a display color in [0, 1].
    #[inline]
    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        self.filmic(rgb).map(|v| gamma_correct(v.clamp(0.0, 1.0), self.gamma))
    }

    /// Named shader constants: `gamma` always, plus `A`..`F`, `W` and
    /// `exposureBias` for Hable.
    pub fn uniforms(&self) -> Vec<(&'static str, f32)> {
        let mut out = vec![("gamma", self.gamma)];
        if self.kind == CurveKind::Hable {
            let p = &self.params;
            out.extend([
                ("A", p.a),
                ("B", p.b),
                ("C", p.c),
                ("D", p.d),
                ("E", p.e),
                ("F", p.f),
                ("W", p.w),
                ("exposureBias", p.exposure_bias),
            ]);
        }
        out
    }
}
