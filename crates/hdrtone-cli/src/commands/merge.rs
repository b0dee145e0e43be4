//! Merge command

use crate::MergeArgs;
use anyhow::Result;
use hdrtone_core::SampleKind;
use hdrtone_io::FileFormat;
use hdrtone_ops::render::tonemap_image;
use hdrtone_ops::tonecurve::DISPLAY_GAMMA;
use hdrtone_ops::{ExposureMerger, ToneCurve};
use tracing::info;

/// Merges an exposure pair and writes radiance, or a tone-mapped image for
/// LDR extensions.
pub fn run(args: MergeArgs, verbose: u8) -> Result<()> {
    let low = super::load_image(&args.low, SampleKind::U8)?;
    let high = super::load_image(&args.high, SampleKind::U8)?;

    let merger = ExposureMerger::new().with_exposure_ratio(args.ratio)?;
    let radiance = merger.merge(&low, &high)?;
    info!(width = radiance.width(), height = radiance.height(), ratio = args.ratio, "merged");

    if FileFormat::from_extension(&args.output).is_linear() {
        super::save_image(&args.output, &radiance)?;
    } else {
        let curve = ToneCurve::new(args.curve.into(), DISPLAY_GAMMA).for_image(&radiance);
        super::save_image(&args.output, &tonemap_image(&radiance, &curve)?)?;
    }

    if verbose > 0 {
        println!(
            "Merged {} + {} -> {}",
            args.low.display(),
            args.high.display(),
            args.output.display()
        );
    }
    Ok(())
}
