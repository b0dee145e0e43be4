//! # hdrtone-ops
//!
//! Exposure merging, tone curves and display layout for HDR images.
//!
//! # Modules
//!
//! - [`merge`] - Blend a low/high exposure pair into float radiance
//! - [`tonecurve`] - Plain and Hable filmic radiance-to-display curves
//! - [`layout`] - Split the display into quads for N images
//! - [`render`] - Texture handoff, [`Surface`] trait and the CPU [`Canvas`]
//!
//! # Example
//!
//! ```rust,ignore
//! use hdrtone_ops::{layout, merge, render, Arrangement, ToneCurve};
//!
//! let radiance = merge::merge(&low, &high)?;
//! let quads = layout::layout(1, Arrangement::SideBySide)?;
//! let slot = render::RenderSlot::new(radiance, ToneCurve::hable(2.2), quads[0]);
//!
//! let mut canvas = render::Canvas::new(1280, 720)?;
//! canvas.present(&[slot])?;
//! ```
//!
//! # Features
//!
//! - `parallel` - run the merge and CPU tone-map passes on the rayon pool

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod layout;
pub mod merge;
pub mod render;
pub mod tonecurve;

pub use error::{OpsError, OpsResult};
pub use layout::{Arrangement, QuadCorners};
pub use merge::ExposureMerger;
pub use render::{Canvas, RenderSlot, Surface, TextureFormat, UploadDesc};
pub use tonecurve::{CurveKind, ToneCurve};
