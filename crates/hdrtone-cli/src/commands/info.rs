//! Image info command.
//!
//! Prints format, size, sample kind, gamma tag and per-channel statistics.

use crate::InfoArgs;
use anyhow::Result;
use hdrtone_io::FileFormat;
use std::fs::{self, File};
use std::io::Read;
use tracing::warn;

/// Runs the info command.
pub fn run(args: InfoArgs, verbose: u8) -> Result<()> {
    for (i, path) in args.input.iter().enumerate() {
        let file_size = fs::metadata(path)?.len();
        let format = FileFormat::from_extension(path);

        let mut head = [0u8; 4];
        let n = File::open(path)?.read(&mut head)?;
        let sniffed = FileFormat::from_bytes(&head[..n]);
        if let Some(sniffed) = sniffed.filter(|&s| s != format) {
            warn!("{}: extension says {}, signature says {}", path.display(), format, sniffed);
        }
        let image = super::load_image(path, args.kind)?;

        if i > 0 {
            println!();
        }
        println!("{}", path.display());
        println!("  Format:     {}", format);
        println!("  Resolution: {}x{}", image.width(), image.height());
        println!("  Samples:    {}", image.sample_kind());
        println!("  Gamma:      {:.2}", image.gamma());
        println!("  File size:  {}", super::format_size(file_size));

        let stats = image.stats();
        for (name, (min, max, mean)) in ["R", "G", "B"].iter().zip(stats) {
            println!("  {name}: min {min:.6}  max {max:.6}  mean {mean:.6}");
        }

        if verbose > 0 {
            println!("  Pixels:     {}", image.pixel_count());
            println!("  Linear:     {}", format.is_linear());
            if let Some(sniffed) = sniffed {
                println!("  Signature:  {}", sniffed);
            }
        }
    }
    Ok(())
}
