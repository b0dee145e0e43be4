//! End-to-end decoding tests against files written to a temp directory.

use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use exr::prelude::*;
use exr::image::{AnyChannel, AnyChannels, FlatSamples};
use half::f16;
use hdrtone_core::{ImageBuffer, SampleKind, LDR_GAMMA, LINEAR_GAMMA};
use hdrtone_io::{DecodeError, Decoder, FileFormat, ImageDecoder};
use smallvec::SmallVec;

/// Writes a 2x2 EXR with the given channels.
fn write_exr(path: &Path, channels: Vec<(&str, FlatSamples)>) {
    let list = channels
        .into_iter()
        .map(|(name, samples)| AnyChannel::new(name, samples))
        .collect::<SmallVec<[AnyChannel<FlatSamples>; 4]>>();
    let layer = Layer::new(
        (2, 2),
        LayerAttributes::named("test"),
        Encoding::UNCOMPRESSED,
        AnyChannels::sort(list),
    );
    Image::from_layer(layer).write().to_file(path).unwrap();
}

fn zeros() -> FlatSamples {
    FlatSamples::F32(vec![0.0; 4])
}

fn temp_file(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

#[test]
fn exr_red_ramp_decodes_at_every_kind() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_file(&dir, "ramp.exr");
    write_exr(
        &path,
        vec![
            ("R", FlatSamples::F32(vec![0.1, 0.2, 0.3, 0.4])),
            ("G", zeros()),
            ("B", zeros()),
        ],
    );

    let float = hdrtone_io::decode(&path, SampleKind::F32).unwrap();
    assert_eq!(float.width(), 2);
    assert_eq!(float.height(), 2);
    assert_eq!(float.gamma(), LINEAR_GAMMA);
    let data = float.as_f32().unwrap();
    for (i, expected) in [0.1f32, 0.2, 0.3, 0.4].iter().enumerate() {
        assert_relative_eq!(data[i * 3], *expected);
        assert_eq!(data[i * 3 + 1], 0.0);
        assert_eq!(data[i * 3 + 2], 0.0);
    }

    let bytes = hdrtone_io::decode(&path, SampleKind::U8).unwrap();
    let reds: Vec<u8> = bytes.as_u8().unwrap().chunks_exact(3).map(|p| p[0]).collect();
    assert_eq!(reds, vec![26, 51, 77, 102]);

    let shorts = hdrtone_io::decode(&path, SampleKind::U16).unwrap();
    let reds: Vec<u16> = shorts.as_u16().unwrap().chunks_exact(3).map(|p| p[0]).collect();
    assert_eq!(reds, vec![26, 51, 77, 102]);
}

#[test]
fn exr_alpha_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_file(&dir, "rgba.exr");
    write_exr(
        &path,
        vec![
            ("R", FlatSamples::F32(vec![1.0; 4])),
            ("G", FlatSamples::F32(vec![2.0; 4])),
            ("B", FlatSamples::F32(vec![3.0; 4])),
            ("A", FlatSamples::F32(vec![0.5; 4])),
        ],
    );

    let image = hdrtone_io::decode(&path, SampleKind::F32).unwrap();
    assert_eq!(image.as_f32().unwrap().len(), 2 * 2 * 3);
    assert_eq!(image.pixel(1, 1), Some([1.0, 2.0, 3.0]));
}

#[test]
fn exr_depth_channel_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_file(&dir, "depth.exr");
    write_exr(
        &path,
        vec![("R", zeros()), ("G", zeros()), ("B", zeros()), ("Z", zeros())],
    );

    let err = hdrtone_io::decode(&path, SampleKind::F32).unwrap_err();
    assert!(matches!(err, DecodeError::UnrecognizedChannel(ref name) if name == "Z"));
}

#[test]
fn exr_missing_blue_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_file(&dir, "rga.exr");
    write_exr(&path, vec![("R", zeros()), ("G", zeros()), ("A", zeros())]);

    let err = hdrtone_io::decode(&path, SampleKind::F32).unwrap_err();
    assert!(matches!(err, DecodeError::ChannelMissing(ref m) if m == "B"));
}

#[test]
fn exr_half_channels_promoted() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_file(&dir, "half.exr");
    let half = |v: f32| FlatSamples::F16(vec![f16::from_f32(v); 4]);
    write_exr(&path, vec![("R", half(0.5)), ("G", half(1.5)), ("B", half(-2.0))]);

    let image = hdrtone_io::decode(&path, SampleKind::F32).unwrap();
    assert_eq!(image.pixel(0, 0), Some([0.5, 1.5, -2.0]));

    let bytes = hdrtone_io::decode(&path, SampleKind::U8).unwrap();
    assert_eq!(&bytes.as_u8().unwrap()[..3], &[128, 255, 0]);
}

#[test]
fn exr_uint_channels_unscaled() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_file(&dir, "uint.exr");
    let uint = |v: u32| FlatSamples::U32(vec![v; 4]);
    write_exr(&path, vec![("R", uint(7)), ("G", uint(300)), ("B", uint(70_000))]);

    let float = hdrtone_io::decode(&path, SampleKind::F32).unwrap();
    assert_eq!(float.pixel(0, 0), Some([7.0, 300.0, 70_000.0]));

    let bytes = hdrtone_io::decode(&path, SampleKind::U8).unwrap();
    assert_eq!(&bytes.as_u8().unwrap()[..3], &[7, 255, 255]);

    let shorts = hdrtone_io::decode(&path, SampleKind::U16).unwrap();
    assert_eq!(&shorts.as_u16().unwrap()[..3], &[7, 300, 65535]);
}

fn pfm_bytes(scale: &str, big_endian: bool) -> Vec<u8> {
    let mut file = format!("PF\n2 1\n{scale}\n").into_bytes();
    for v in [0.25f32, 0.5, 1.0, 2.0, 4.0, 8.0] {
        if big_endian {
            file.extend_from_slice(&v.to_be_bytes());
        } else {
            file.extend_from_slice(&v.to_le_bytes());
        }
    }
    file
}

#[test]
fn pfm_scale_sign_selects_byte_order() {
    let big = Decoder::for_format(FileFormat::Pfm)
        .decode_from_memory(&pfm_bytes("1.0", true), SampleKind::F32)
        .unwrap();
    let little = Decoder::for_format(FileFormat::Pfm)
        .decode_from_memory(&pfm_bytes("-3.5", false), SampleKind::F32)
        .unwrap();

    assert_eq!(big.as_f32(), little.as_f32());
    assert_eq!(big.as_f32().unwrap(), &[0.25, 0.5, 1.0, 2.0, 4.0, 8.0]);
    assert_eq!(big.gamma(), LINEAR_GAMMA);
}

#[test]
fn hdr_write_then_decode() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_file(&dir, "sky.hdr");
    let data: Vec<f32> = (0..40 * 3 * 3).map(|i| 0.05 + (i % 17) as f32 * 0.5).collect();
    let image = ImageBuffer::from_f32(40, 3, LINEAR_GAMMA, data.clone()).unwrap();
    hdrtone_io::write(&path, &image).unwrap();

    let loaded = hdrtone_io::decode(&path, SampleKind::F32).unwrap();
    assert_eq!(loaded.width(), 40);
    assert_eq!(loaded.height(), 3);
    assert_eq!(loaded.gamma(), LINEAR_GAMMA);
    for (a, b) in loaded.as_f32().unwrap().iter().zip(&data) {
        // RGBE keeps about 8 bits of mantissa relative to the largest channel
        assert!((a - b).abs() <= 0.04 * 8.05, "{a} vs {b}");
    }
}

#[test]
fn load_falls_back_to_ldr() {
    let dir = tempfile::tempdir().unwrap();
    let png = temp_file(&dir, "real.png");
    let image = ImageBuffer::from_u8(1, 1, LDR_GAMMA, vec![10, 20, 30]).unwrap();
    hdrtone_io::write(&png, &image).unwrap();

    // a PNG hiding behind an .exr extension
    let disguised = temp_file(&dir, "fake.exr");
    std::fs::copy(&png, &disguised).unwrap();

    assert!(hdrtone_io::decode(&disguised, SampleKind::U8).is_err());
    let loaded = hdrtone_io::load(&disguised, SampleKind::U8).unwrap();
    assert_eq!(loaded.gamma(), LDR_GAMMA);
    assert_eq!(loaded.as_u8().unwrap(), &[10, 20, 30]);
}

#[test]
fn load_reports_first_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_file(&dir, "broken.pfm");
    std::fs::write(&path, b"PF\n4 4\n-1.0\n\x00\x00").unwrap();

    let err = hdrtone_io::load(&path, SampleKind::F32).unwrap_err();
    assert!(matches!(err, DecodeError::TruncatedBody(_)), "{err}");
}

#[test]
fn hdr_without_magic_is_not_hdr() {
    let err = Decoder::for_path("x.hdr")
        .decode_from_memory(b"P6\n1 1\n255\n\0\0\0", SampleKind::F32)
        .unwrap_err();
    assert!(matches!(err, DecodeError::NotHdrFormat));
}
