//! hdrtone - HDR decode, exposure merge and tone-mapping CLI

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use hdrtone_core::SampleKind;
use hdrtone_ops::CurveKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "hdrtone")]
#[command(author, version, about = "HDR decode, exposure merge and tone mapping")]
#[command(long_about = "
Decodes OpenEXR, Radiance HDR, PFM and common LDR images, merges exposure
pairs and tone-maps radiance for display.

Examples:
  hdrtone info scene.exr sky.hdr              # Size, sample kind, gamma, stats
  hdrtone tonemap scene.exr -o scene.png      # Hable filmic curve
  hdrtone tonemap photo.jpg -o out.png --curve plain --gamma 1.0
  hdrtone merge dark.jpg bright.jpg -o merged.exr --ratio 4
  hdrtone compose a.exr b.hdr c.png -o sheet.png --top-bottom
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Display image information
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Tone-map one image to an LDR file
    #[command(visible_alias = "t")]
    Tonemap(TonemapArgs),

    /// Merge a low/high exposure pair
    #[command(visible_alias = "m")]
    Merge(MergeArgs),

    /// Tile several tone-mapped images into one
    #[command(visible_alias = "c")]
    Compose(ComposeArgs),
}

/// Tone curve selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CurveArg {
    /// Hable filmic curve
    Hable,
    /// Clamp and gamma only
    Plain,
}

impl From<CurveArg> for CurveKind {
    fn from(arg: CurveArg) -> Self {
        match arg {
            CurveArg::Hable => CurveKind::Hable,
            CurveArg::Plain => CurveKind::Plain,
        }
    }
}

#[derive(Args)]
struct InfoArgs {
    /// Input image(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Sample kind to decode at: f32, u16, u8
    #[arg(short, long, default_value = "f32")]
    kind: SampleKind,
}

#[derive(Args)]
struct TonemapArgs {
    /// Input image
    input: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// Tone curve
    #[arg(long, value_enum, default_value_t = CurveArg::Hable)]
    curve: CurveArg,

    /// Sample kind to decode at: f32, u16, u8
    #[arg(short, long, default_value = "f32")]
    kind: SampleKind,

    /// Fixed curve gamma (default: 2.2 / source gamma)
    #[arg(short, long)]
    gamma: Option<f32>,
}

#[derive(Args)]
struct MergeArgs {
    /// Low-exposure capture
    low: PathBuf,

    /// High-exposure capture
    high: PathBuf,

    /// Output image (EXR/HDR/PFM keep radiance, others are tone-mapped)
    #[arg(short, long)]
    output: PathBuf,

    /// Exposure ratio between the captures
    #[arg(short, long, default_value = "1.0")]
    ratio: f32,

    /// Tone curve for LDR output
    #[arg(long, value_enum, default_value_t = CurveArg::Hable)]
    curve: CurveArg,
}

#[derive(Args)]
struct ComposeArgs {
    /// Input images, one slot each
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// Stack vertically instead of side by side
    #[arg(long)]
    top_bottom: bool,

    /// Tone curve for every slot
    #[arg(long, value_enum, default_value_t = CurveArg::Hable)]
    curve: CurveArg,

    /// Output width (default: fits the largest input per slot)
    #[arg(long)]
    width: Option<u32>,

    /// Output height (default: fits the largest input per slot)
    #[arg(long)]
    height: Option<u32>,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Info(args) => commands::info::run(args, cli.verbose),
        Commands::Tonemap(args) => commands::tonemap::run(args, cli.verbose),
        Commands::Merge(args) => commands::merge::run(args, cli.verbose),
        Commands::Compose(args) => commands::compose::run(args, cli.verbose),
    }
}
