//! World-space geometry primitives.
//!
//! The vertical axis is `y`; "horizontal" and "planar" always mean the
//! `x`/`z` plane.

use serde::{Deserialize, Serialize};

/// Side length, in blocks, of one residency region.
pub const REGION_SIZE: i32 = 16;

/// A continuous position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// East/west axis.
    pub x: f64,
    /// Vertical axis.
    pub y: f64,
    /// North/south axis.
    pub z: f64,
}

impl Position {
    /// Creates a position from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar (x/z) distance to `other`, ignoring height.
    #[must_use]
    pub fn horizontal_distance(&self, other: &Position) -> f64 {
        (other.x - self.x).hypot(other.z - self.z)
    }

    /// Returns this position shifted by the given planar offset.
    #[must_use]
    pub fn offset(&self, dx: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y, self.z + dz)
    }

    /// The block containing this position.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn block(&self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }
}

/// An integer block coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    /// East/west axis.
    pub x: i32,
    /// Vertical axis.
    pub y: i32,
    /// North/south axis.
    pub z: i32,
}

impl BlockPos {
    /// Creates a block coordinate from its components.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The block directly above.
    #[must_use]
    pub const fn above(&self, dy: i32) -> Self {
        Self::new(self.x, self.y + dy, self.z)
    }

    /// The residency region containing this column.
    #[must_use]
    pub const fn region(&self) -> RegionCoord {
        RegionCoord {
            x: self.x.div_euclid(REGION_SIZE),
            z: self.z.div_euclid(REGION_SIZE),
        }
    }

    /// The standing position centred on top of this block.
    #[must_use]
    pub fn standing_position(&self) -> Position {
        Position::new(
            f64::from(self.x) + 0.5,
            f64::from(self.y) + 1.0,
            f64::from(self.z) + 0.5,
        )
    }
}

/// Coordinate of a residency region (a square of columns the host loads and
/// unloads as a unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionCoord {
    /// Region x index.
    pub x: i32,
    /// Region z index.
    pub z: i32,
}
