//! Renderer handoff and the CPU surface.
//!
//! Each displayed image is a [`RenderSlot`]: the buffer, its tone curve and
//! the quad it covers. A [`Surface`] receives the pixels once through
//! [`Surface::upload`] and then draws the quad with the curve.
//!
//! The GPU path lives outside this crate. [`Canvas`] is a software
//! [`Surface`] that runs the same curve per pixel, used by the CLI and
//! tests.
//!
//! # Texture formats
//!
//! | Kind | Internal | Format | Type |
//! |------|----------|--------|------|
//! | `U8` | `RGB8` | `RGB` | `UNSIGNED_BYTE` |
//! | `U16` | `RGB16UI` | `RGB_INTEGER` | `UNSIGNED_SHORT` |
//! | `F32` | `RGB32F` | `RGB` | `FLOAT` |
//!
//! `U16` is an integer texture; the shader divides by 255 like the CPU path.

use hdrtone_core::{ImageBuffer, PixelData, Sample, SampleKind, CHANNELS, LDR_GAMMA};
use tracing::{debug, trace};

use crate::layout::QuadCorners;
use crate::tonecurve::ToneCurve;
use crate::{OpsError, OpsResult};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// GL-style texture format triple for a sample kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureFormat {
    /// Sized internal format.
    pub internal_format: &'static str,
    /// Pixel transfer format.
    pub format: &'static str,
    /// Component type.
    pub data_type: &'static str,
}

impl TextureFormat {
    /// Texture format matching `kind`.
    pub const fn for_kind(kind: SampleKind) -> Self {
        match kind {
            SampleKind::U8 => Self {
                internal_format: "RGB8",
                format: "RGB",
                data_type: "UNSIGNED_BYTE",
            },
            SampleKind::U16 => Self {
                internal_format: "RGB16UI",
                format: "RGB_INTEGER",
                data_type: "UNSIGNED_SHORT",
            },
            SampleKind::F32 => Self {
                internal_format: "RGB32F",
                format: "RGB",
                data_type: "FLOAT",
            },
        }
    }
}

/// Everything a texture upload needs. Borrows the pixels for the duration
/// of the call.
#[derive(Debug, Clone, Copy)]
pub struct UploadDesc<'a> {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixels per stored row, as declared to the graphics API
    /// (`UNPACK_ROW_LENGTH`). At least `width`; equal to it for packed rows.
    pub row_length: u32,
    /// Texture format.
    pub format: TextureFormat,
    /// Row-major pixels, top row first.
    pub pixels: &'a PixelData,
}

impl<'a> UploadDesc<'a> {
    /// Describes an upload of `image`.
    pub fn new(image: &'a ImageBuffer) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            row_length: image.width(),
            format: TextureFormat::for_kind(image.sample_kind()),
            pixels: image.data(),
        }
    }

    /// Pixel bytes in native endianness, ready for the graphics API.
    pub fn bytes(&self) -> Vec<u8> {
        self.pixels.to_ne_bytes()
    }

    /// Expected byte length of [`bytes`](Self::bytes).
    pub fn byte_len(&self) -> usize {
        self.row_length as usize * CHANNELS * self.height as usize * self.pixels.kind().bytes_per_sample()
    }
}

/// One displayed image.
#[derive(Debug, Clone)]
pub struct RenderSlot {
    image: ImageBuffer,
    curve: ToneCurve,
    quad: QuadCorners,
}

impl RenderSlot {
    /// Creates a slot. The curve's gamma is replaced by `2.2 / image.gamma()`.
    pub fn new(image: ImageBuffer, curve: ToneCurve, quad: QuadCorners) -> Self {
        let curve = curve.for_image(&image);
        Self { image, curve, quad }
    }

    /// Creates a slot keeping the curve gamma as given.
    pub fn with_fixed_gamma(image: ImageBuffer, curve: ToneCurve, quad: QuadCorners) -> Self {
        Self { image, curve, quad }
    }

    /// Image shown in this slot.
    pub fn image(&self) -> &ImageBuffer {
        &self.image
    }

    /// Effective tone curve.
    pub fn curve(&self) -> &ToneCurve {
        &self.curve
    }

    /// Screen quad.
    pub fn quad(&self) -> &QuadCorners {
        &self.quad
    }

    /// Upload description for this slot's image.
    pub fn upload_desc(&self) -> UploadDesc<'_> {
        UploadDesc::new(&self.image)
    }
}

/// A render target that takes textures and draws tone-mapped quads.
pub trait Surface {
    /// Stores the pixels for texture `slot`, replacing any previous upload.
    fn upload(&mut self, slot: usize, desc: &UploadDesc<'_>) -> OpsResult<()>;

    /// Draws texture `slot` into `quad` through `curve`.
    fn draw(&mut self, slot: usize, curve: &ToneCurve, quad: &QuadCorners) -> OpsResult<()>;

    /// Uploads and draws every slot in order.
    fn present(&mut self, slots: &[RenderSlot]) -> OpsResult<()> {
        for (index, slot) in slots.iter().enumerate() {
            self.upload(index, &slot.upload_desc())?;
            self.draw(index, slot.curve(), slot.quad())?;
        }
        Ok(())
    }
}

#[inline]
fn map_pixel(curve: &ToneCurve, src: &[f32], dst: &mut [u8]) {
    let out = curve.apply([src[0], src[1], src[2]]);
    for (d, v) in dst.iter_mut().zip(out) {
        *d = u8::from_f32(v);
    }
}

/// Tone-maps an image on the CPU into 8-bit display values.
///
/// The curve is used as given; see [`ToneCurve::for_image`] for the
/// per-image gamma. The result is tagged with gamma 2.2.
pub fn tonemap_image(image: &ImageBuffer, curve: &ToneCurve) -> OpsResult<ImageBuffer> {
    debug!(
        width = image.width(),
        height = image.height(),
        curve = %curve.kind(),
        gamma = curve.gamma(),
        "tonemap"
    );
    let src = image.data().to_f32();
    let mut out = vec![0u8; src.len()];

    #[cfg(feature = "parallel")]
    out.par_chunks_exact_mut(3)
        .zip(src.par_chunks_exact(3))
        .for_each(|(dst, px)| map_pixel(curve, px, dst));
    #[cfg(not(feature = "parallel"))]
    out.chunks_exact_mut(3)
        .zip(src.chunks_exact(3))
        .for_each(|(dst, px)| map_pixel(curve, px, dst));

    Ok(ImageBuffer::from_u8(image.width(), image.height(), LDR_GAMMA, out)?)
}

#[derive(Debug, Clone)]
struct Texture {
    width: u32,
    height: u32,
    samples: Vec<f32>,
}

/// Software surface rendering into an RGB8 framebuffer.
///
/// Quads are rasterized axis-aligned with nearest-neighbour sampling. Pixels
/// not covered by any quad stay black.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    textures: Vec<Option<Texture>>,
}

impl Canvas {
    /// Creates a black canvas.
    pub fn new(width: u32, height: u32) -> OpsResult<Self> {
        let len = hdrtone_core::sample_count(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![0; len],
            textures: Vec::new(),
        })
    }

    /// Canvas width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Framebuffer, RGB8 row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Resets the framebuffer to black. Uploaded textures are kept.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Copies the framebuffer into a display-encoded image.
    pub fn to_image(&self) -> OpsResult<ImageBuffer> {
        Ok(ImageBuffer::from_u8(self.width, self.height, LDR_GAMMA, self.pixels.clone())?)
    }

    /// Consumes the canvas, returning the framebuffer as an image.
    pub fn into_image(self) -> OpsResult<ImageBuffer> {
        Ok(ImageBuffer::from_u8(self.width, self.height, LDR_GAMMA, self.pixels)?)
    }

    /// Pixel span `[start, end)` covered by the normalized range `[lo, hi]`.
    fn span(lo: f32, hi: f32, size: u32) -> (u32, u32) {
        let to_px = |v: f32| (((v + 1.0) * 0.5 * size as f32).round()).clamp(0.0, size as f32) as u32;
        (to_px(lo), to_px(hi))
    }
}

impl Surface for Canvas {
    fn upload(&mut self, slot: usize, desc: &UploadDesc<'_>) -> OpsResult<()> {
        if desc.width == 0 || desc.height == 0 || desc.row_length < desc.width {
            return Err(OpsError::InvalidParameter(format!(
                "upload of {}x{} with row length {}",
                desc.width, desc.height, desc.row_length
            )));
        }
        let stride = desc.row_length as usize * CHANNELS;
        let expected = stride.checked_mul(desc.height as usize);
        if expected != Some(desc.pixels.len()) {
            return Err(OpsError::InvalidParameter(format!(
                "upload of {} samples does not fill {} rows of {stride}",
                desc.pixels.len(),
                desc.height
            )));
        }
        let stored = desc.pixels.to_f32();
        let packed = desc.width as usize * CHANNELS;
        let samples = if stride == packed {
            stored
        } else {
            stored.chunks_exact(stride).flat_map(|row| &row[..packed]).copied().collect()
        };
        trace!(slot, width = desc.width, height = desc.height, format = desc.format.internal_format, "upload");
        if self.textures.len() <= slot {
            self.textures.resize(slot + 1, None);
        }
        self.textures[slot] = Some(Texture {
            width: desc.width,
            height: desc.height,
            samples,
        });
        Ok(())
    }

    fn draw(&mut self, slot: usize, curve: &ToneCurve, quad: &QuadCorners) -> OpsResult<()> {
        let tex = self
            .textures
            .get(slot)
            .and_then(Option::as_ref)
            .ok_or_else(|| OpsError::InvalidParameter(format!("no texture uploaded for slot {slot}")))?;

        let (x0, x1) = Self::span(quad.left(), quad.right(), self.width);
        // +y is up in display space, rows run top to bottom
        let (y0, y1) = Self::span(-quad.top(), -quad.bottom(), self.height);
        if x0 >= x1 || y0 >= y1 {
            return Ok(());
        }
        trace!(slot, x0, x1, y0, y1, "draw");

        let (qw, qh) = ((x1 - x0) as f32, (y1 - y0) as f32);
        let row_len = self.width as usize * 3;
        for y in y0..y1 {
            let v = ((y - y0) as f32 + 0.5) / qh;
            let ty = ((v * tex.height as f32) as u32).min(tex.height - 1);
            for x in x0..x1 {
                let u = ((x - x0) as f32 + 0.5) / qw;
                let tx = ((u * tex.width as f32) as u32).min(tex.width - 1);
                let s = (ty as usize * tex.width as usize + tx as usize) * 3;
                let d = y as usize * row_len + x as usize * 3;
                map_pixel(curve, &tex.samples[s..s + 3], &mut self.pixels[d..d + 3]);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{layout, Arrangement};
    use hdrtone_core::LINEAR_GAMMA;

    #[test]
    fn test_texture_formats() {
        assert_eq!(TextureFormat::for_kind(SampleKind::U8).internal_format, "RGB8");
        let u16 = TextureFormat::for_kind(SampleKind::U16);
        assert_eq!((u16.internal_format, u16.format, u16.data_type), ("RGB16UI", "RGB_INTEGER", "UNSIGNED_SHORT"));
        assert_eq!(TextureFormat::for_kind(SampleKind::F32).data_type, "FLOAT");
    }

    #[test]
    fn test_upload_desc() {
        let image = ImageBuffer::solid(5, 2, LINEAR_GAMMA, SampleKind::U16, [0.5; 3]).unwrap();
        let desc = UploadDesc::new(&image);
        assert_eq!(desc.row_length, 5);
        assert_eq!(desc.pixels.len(), 30);
        assert_eq!(desc.format, TextureFormat::for_kind(SampleKind::U16));
        assert_eq!(desc.byte_len(), 60);
        assert_eq!(desc.bytes().len(), desc.byte_len());
    }

    #[test]
    fn test_slot_applies_gamma_override() {
        let image = ImageBuffer::solid(1, 1, LDR_GAMMA, SampleKind::U8, [0.5; 3]).unwrap();
        let slot = RenderSlot::new(image, ToneCurve::hable(2.2), QuadCorners::FULL);
        assert_eq!(slot.curve().gamma(), 1.0);
    }

    #[test]
    fn test_tonemap_image_plain() {
        let image = ImageBuffer::from_f32(2, 1, LINEAR_GAMMA, vec![0.0, 0.5, 1.0, 2.0, -1.0, 0.25]).unwrap();
        let out = tonemap_image(&image, &ToneCurve::plain(1.0)).unwrap();
        assert_eq!(out.sample_kind(), SampleKind::U8);
        assert_eq!(out.gamma(), LDR_GAMMA);
        assert_eq!(out.as_u8().unwrap(), &[0, 128, 255, 255, 0, 64]);
    }

    #[test]
    fn test_canvas_side_by_side() {
        let red = ImageBuffer::solid(1, 1, LINEAR_GAMMA, SampleKind::F32, [1.0, 0.0, 0.0]).unwrap();
        let blue = ImageBuffer::solid(3, 3, LINEAR_GAMMA, SampleKind::F32, [0.0, 0.0, 1.0]).unwrap();
        let quads = layout(2, Arrangement::SideBySide).unwrap();
        let slots = vec![
            RenderSlot::new(red, ToneCurve::plain(2.2), quads[0]),
            RenderSlot::new(blue, ToneCurve::plain(2.2), quads[1]),
        ];

        let mut canvas = Canvas::new(4, 2).unwrap();
        canvas.present(&slots).unwrap();
        let px = canvas.pixels();
        for y in 0..2 {
            for x in 0..4 {
                let i = (y * 4 + x) * 3;
                let expected = if x < 2 { [255, 0, 0] } else { [0, 0, 255] };
                assert_eq!(&px[i..i + 3], &expected, "pixel {x},{y}");
            }
        }
    }

    #[test]
    fn test_canvas_top_bottom_samples_rows() {
        // 1x2 texture: white on top, black below
        let image = ImageBuffer::from_f32(1, 2, LINEAR_GAMMA, vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0]).unwrap();
        let quad = layout(2, Arrangement::TopBottom).unwrap()[0];
        let mut canvas = Canvas::new(1, 4).unwrap();
        canvas.upload(0, &UploadDesc::new(&image)).unwrap();
        canvas.draw(0, &ToneCurve::plain(1.0), &quad).unwrap();

        let rows: Vec<u8> = canvas.pixels().chunks_exact(3).map(|p| p[0]).collect();
        assert_eq!(rows, vec![255, 0, 0, 0]);
    }

    #[test]
    fn test_upload_rejects_inconsistent_desc() {
        let pixels = PixelData::F32(vec![0.0; 3]);
        let mut canvas = Canvas::new(2, 2).unwrap();
        let bad = [
            // row shorter than the image
            UploadDesc { width: 2, height: 1, row_length: 1, format: TextureFormat::for_kind(SampleKind::F32), pixels: &pixels },
            // sample count does not match
            UploadDesc { width: 2, height: 1, row_length: 2, format: TextureFormat::for_kind(SampleKind::F32), pixels: &pixels },
            UploadDesc { width: 1, height: 0, row_length: 1, format: TextureFormat::for_kind(SampleKind::F32), pixels: &pixels },
            UploadDesc { width: 0, height: 1, row_length: 1, format: TextureFormat::for_kind(SampleKind::F32), pixels: &pixels },
        ];
        for desc in &bad {
            assert!(matches!(canvas.upload(0, desc), Err(OpsError::InvalidParameter(_))));
        }
        // nothing was stored, so drawing still fails cleanly
        assert!(canvas.draw(0, &ToneCurve::default(), &QuadCorners::FULL).is_err());
    }

    #[test]
    fn test_upload_padded_rows() {
        // 1x2 image stored with a row length of 2 pixels; the padding is ignored
        let pixels = PixelData::F32(vec![1.0, 1.0, 1.0, 9.0, 9.0, 9.0, 0.0, 0.0, 0.0, 9.0, 9.0, 9.0]);
        let desc = UploadDesc {
            width: 1,
            height: 2,
            row_length: 2,
            format: TextureFormat::for_kind(SampleKind::F32),
            pixels: &pixels,
        };
        assert_eq!(desc.byte_len(), 48);

        let mut canvas = Canvas::new(1, 2).unwrap();
        canvas.upload(0, &desc).unwrap();
        canvas.draw(0, &ToneCurve::plain(1.0), &QuadCorners::FULL).unwrap();
        assert_eq!(canvas.pixels(), &[255, 255, 255, 0, 0, 0]);
    }

    #[test]
    fn test_draw_without_upload() {
        let mut canvas = Canvas::new(2, 2).unwrap();
        let err = canvas.draw(3, &ToneCurve::default(), &QuadCorners::FULL).unwrap_err();
        assert!(matches!(err, OpsError::InvalidParameter(_)));
    }
}
