//! # hdrtone-core
//!
//! Core types for HDR decoding, exposure merging and tone mapping.
//!
//! - [`ImageBuffer`] - RGB pixel buffer with width, height and gamma hint
//! - [`PixelData`] - Tagged sample storage (`U8`, `U16`, `F32`)
//! - [`SampleKind`] - Runtime tag for the sample representation
//! - [`Sample`] - Conversion between representations
//!
//! ## Crate Structure
//!
//! ```text
//! hdrtone-core (this crate)
//!    ^
//!    |
//!    +-- hdrtone-io  (format detection, decoders, writers, cache)
//!    +-- hdrtone-ops (exposure merge, tone curves, layout, surfaces)
//!    +-- hdrtone-cli
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;
pub mod sample;

pub use error::{Error, Result};
pub use image::{sample_count, ImageBuffer, PixelData, CHANNELS, LDR_GAMMA, LINEAR_GAMMA};
pub use sample::{Sample, SampleKind, INTEGER_SCALE};
