//! CLI command implementations

pub mod compose;
pub mod info;
pub mod merge;
pub mod tonemap;

use anyhow::{Context, Result};
use hdrtone_core::{ImageBuffer, SampleKind};
use std::path::Path;

/// Load image from path, retrying as common LDR if the format decoder fails
pub fn load_image(path: &Path, kind: SampleKind) -> Result<ImageBuffer> {
    hdrtone_io::load(path, kind).with_context(|| format!("Failed to load: {}", path.display()))
}

/// Save image to path
pub fn save_image(path: &Path, image: &ImageBuffer) -> Result<()> {
    hdrtone_io::write(path, image).with_context(|| format!("Failed to save: {}", path.display()))
}

/// Format file size for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
