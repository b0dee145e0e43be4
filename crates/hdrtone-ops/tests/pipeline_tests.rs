//! Merge, tone-map and compose a few synthetic images end to end.

use approx::assert_abs_diff_eq;
use hdrtone_core::{ImageBuffer, SampleKind, LDR_GAMMA, LINEAR_GAMMA};
use hdrtone_ops::render::tonemap_image;
use hdrtone_ops::{
    layout, merge, Arrangement, Canvas, ExposureMerger, OpsError, RenderSlot, Surface, ToneCurve,
};

fn ramp_u8(width: u32, height: u32) -> ImageBuffer {
    let data = (0..width * height * 3).map(|i| (i * 7 % 256) as u8).collect();
    ImageBuffer::from_u8(width, height, LDR_GAMMA, data).unwrap()
}

#[test]
fn identical_exposures_merge_to_input() {
    let img = ramp_u8(8, 4);
    let out = merge::merge(&img, &img).unwrap();
    assert_eq!(out.sample_kind(), SampleKind::F32);
    for (&m, &s) in out.as_f32().unwrap().iter().zip(img.as_u8().unwrap()) {
        assert_abs_diff_eq!(m, s as f32 / 255.0, epsilon = 1e-6);
    }
}

#[test]
fn merge_extends_range_with_ratio() {
    let low = ImageBuffer::from_u8(1, 1, LDR_GAMMA, vec![255, 128, 0]).unwrap();
    let high = ImageBuffer::from_u8(1, 1, LDR_GAMMA, vec![255, 255, 40]).unwrap();
    let out = ExposureMerger::new()
        .with_exposure_ratio(4.0)
        .unwrap()
        .merge(&low, &high)
        .unwrap();
    let px = out.pixel(0, 0).unwrap();
    // saturated low sample is fully trusted and scaled
    assert_abs_diff_eq!(px[0], 4.0);
    assert!(px[1] > 1.0);
    // black low sample defers to the high capture
    assert_abs_diff_eq!(px[2], 40.0 / 255.0);
}

#[test]
fn mismatched_merge_fails() {
    let err = merge::merge(&ramp_u8(4, 4), &ramp_u8(8, 8)).unwrap_err();
    assert!(matches!(err, OpsError::DimensionMismatch { .. }));
}

#[test]
fn hable_tonemap_of_linear_source() {
    let image =
        ImageBuffer::from_f32(3, 1, LINEAR_GAMMA, vec![0.0, 0.0, 0.0, 0.18, 0.18, 0.18, 11.2, 11.2, 11.2])
            .unwrap();
    let curve = ToneCurve::hable(1.0).for_image(&image);
    let out = tonemap_image(&image, &curve).unwrap();
    let px = out.as_u8().unwrap();
    assert!(px[0] <= 1);
    assert!(px[3] > 50 && px[3] < 200, "mid grey mapped to {}", px[3]);
    assert_eq!(&px[6..9], &[255, 255, 255]);
}

#[test]
fn compose_two_images_top_bottom() {
    let bright = ImageBuffer::solid(2, 2, LINEAR_GAMMA, SampleKind::F32, [4.0; 3]).unwrap();
    let dark = ImageBuffer::solid(2, 2, LDR_GAMMA, SampleKind::U8, [0.0; 3]).unwrap();
    let quads = layout::layout(2, Arrangement::TopBottom).unwrap();
    let slots = [
        RenderSlot::new(bright, ToneCurve::plain(2.2), quads[0]),
        RenderSlot::new(dark, ToneCurve::plain(2.2), quads[1]),
    ];

    let mut canvas = Canvas::new(3, 4).unwrap();
    canvas.present(&slots).unwrap();
    let image = canvas.into_image().unwrap();
    assert_eq!(image.gamma(), LDR_GAMMA);
    for y in 0..4 {
        let expected = if y < 2 { 1.0 } else { 0.0 };
        for x in 0..3 {
            assert_eq!(image.pixel(x, y), Some([expected; 3]), "pixel {x},{y}");
        }
    }
}
