//! Compose command
//!
//! Lays out N images across the output and tone-maps each into its quad.
//! An input that fails to decode is logged and its slot stays black.

use crate::ComposeArgs;
use anyhow::{bail, Result};
use hdrtone_core::SampleKind;
use hdrtone_ops::layout::layout;
use hdrtone_ops::tonecurve::DISPLAY_GAMMA;
use hdrtone_ops::{Arrangement, Canvas, RenderSlot, Surface, ToneCurve};
use tracing::{debug, error};

/// Runs the compose command.
pub fn run(args: ComposeArgs, verbose: u8) -> Result<()> {
    let arrangement = if args.top_bottom {
        Arrangement::TopBottom
    } else {
        Arrangement::SideBySide
    };
    let quads = layout(args.input.len(), arrangement)?;
    let curve = ToneCurve::new(args.curve.into(), DISPLAY_GAMMA);

    let mut slots = Vec::with_capacity(args.input.len());
    for (path, quad) in args.input.iter().zip(quads) {
        match super::load_image(path, SampleKind::F32) {
            Ok(image) => slots.push(RenderSlot::new(image, curve, quad)),
            Err(e) => error!("{:#}, leaving slot blank", e),
        }
    }
    if slots.is_empty() {
        bail!("None of the {} inputs could be decoded", args.input.len());
    }

    let max_w = slots.iter().map(|s| s.image().width()).max().unwrap_or(1);
    let max_h = slots.iter().map(|s| s.image().height()).max().unwrap_or(1);
    let n = args.input.len() as u32;
    let (fit_w, fit_h) = match arrangement {
        Arrangement::SideBySide => (max_w.saturating_mul(n), max_h),
        Arrangement::TopBottom => (max_w, max_h.saturating_mul(n)),
    };
    let width = args.width.unwrap_or(fit_w);
    let height = args.height.unwrap_or(fit_h);
    debug!(width, height, slots = slots.len(), "compose canvas");

    let mut canvas = Canvas::new(width, height)?;
    canvas.present(&slots)?;
    super::save_image(&args.output, &canvas.into_image()?)?;

    if verbose > 0 {
        println!(
            "Composed {}/{} images into {} ({}x{})",
            slots.len(),
            args.input.len(),
            args.output.display(),
            width,
            height
        );
    }
    Ok(())
}
