//! Quad placement in normalized display space.
//!
//! Display space spans [-1, 1] on both axes with +y up. [`layout`] splits it
//! into `n` equal slots along one axis:
//!
//! ```text
//! SideBySide, n = 3            TopBottom, n = 2
//! +-----+-----+-----+ y=1      +-----------------+ y=1
//! |  0  |  1  |  2  |          |        0        |
//! |     |     |     |          +-----------------+ y=0
//! |     |     |     |          |        1        |
//! +-----+-----+-----+ y=-1     +-----------------+ y=-1
//! ```

use crate::{OpsError, OpsResult};

/// Arrangement of multiple quads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arrangement {
    /// Left to right.
    #[default]
    SideBySide,
    /// Top to bottom.
    TopBottom,
}

/// Four corners of a screen quad, in normalized display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadCorners {
    /// Top-left `[x, y]`.
    pub top_left: [f32; 2],
    /// Bottom-left `[x, y]`.
    pub bottom_left: [f32; 2],
    /// Bottom-right `[x, y]`.
    pub bottom_right: [f32; 2],
    /// Top-right `[x, y]`.
    pub top_right: [f32; 2],
}

impl Default for QuadCorners {
    fn default() -> Self {
        Self::FULL
    }
}

impl QuadCorners {
    /// The whole display.
    pub const FULL: Self = Self::from_bounds(-1.0, 1.0, 1.0, -1.0);

    /// Axis-aligned quad from its edges.
    pub const fn from_bounds(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            top_left: [left, top],
            bottom_left: [left, bottom],
            bottom_right: [right, bottom],
            top_right: [right, top],
        }
    }

    /// Corners in vertex order: top-left, bottom-left, bottom-right, top-right.
    pub fn corners(&self) -> [[f32; 2]; 4] {
        [self.top_left, self.bottom_left, self.bottom_right, self.top_right]
    }

    /// Left edge.
    pub fn left(&self) -> f32 {
        self.top_left[0]
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.top_right[0]
    }

    /// Top edge.
    pub fn top(&self) -> f32 {
        self.top_left[1]
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.bottom_left[1]
    }

    /// Horizontal extent.
    pub fn width(&self) -> f32 {
        self.right() - self.left()
    }

    /// Vertical extent.
    pub fn height(&self) -> f32 {
        self.top() - self.bottom()
    }
}

/// Splits the display into `count` equal quads.
///
/// Quads tile [-1, 1] x [-1, 1] with no gaps or overlaps. Slot 0 is the
/// leftmost (side by side) or topmost (top to bottom).
pub fn layout(count: usize, arrangement: Arrangement) -> OpsResult<Vec<QuadCorners>> {
    if count == 0 {
        return Err(OpsError::InvalidParameter("layout needs at least one image".into()));
    }

    let step = 2.0 / count as f32;
    // the last edge is pinned so rounding cannot leave a gap at the border
    let edge = |i: usize| if i == count { 1.0 } else { -1.0 + i as f32 * step };

    let quads = (0..count)
        .map(|i| match arrangement {
            Arrangement::SideBySide => QuadCorners::from_bounds(edge(i), 1.0, edge(i + 1), -1.0),
            Arrangement::TopBottom => QuadCorners::from_bounds(-1.0, -edge(i), 1.0, -edge(i + 1)),
        })
        .collect();
    Ok(quads)
}
