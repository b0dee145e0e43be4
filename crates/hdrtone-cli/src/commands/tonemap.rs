//! Tonemap command

use crate::TonemapArgs;
use anyhow::Result;
use hdrtone_ops::render::tonemap_image;
use hdrtone_ops::tonecurve::DISPLAY_GAMMA;
use hdrtone_ops::ToneCurve;
use tracing::info;

/// Decodes, tone-maps on the CPU and writes an 8-bit image.
pub fn run(args: TonemapArgs, verbose: u8) -> Result<()> {
    let image = super::load_image(&args.input, args.kind)?;

    let curve = ToneCurve::new(args.curve.into(), DISPLAY_GAMMA);
    let curve = match args.gamma {
        Some(gamma) => curve.with_gamma(gamma),
        None => curve.for_image(&image),
    };
    info!(curve = %curve.kind(), gamma = curve.gamma(), "tonemapping {}", args.input.display());

    let output = tonemap_image(&image, &curve)?;
    super::save_image(&args.output, &output)?;

    if verbose > 0 {
        println!(
            "{} -> {} ({}, gamma {:.3})",
            args.input.display(),
            args.output.display(),
            curve.kind(),
            curve.gamma()
        );
    }
    Ok(())
}
