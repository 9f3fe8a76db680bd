use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Web Mercator projection constants
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Half the width of the Web Mercator world in meters.
pub const MERCATOR_HALF_SIZE: f64 = PI * EARTH_RADIUS;

/// Represents a point in projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Identifies one cell of a multi-resolution tile grid.
///
/// Columns grow eastwards and rows grow southwards from the grid origin.
/// Both are signed so that a column from a neighbouring world copy can be
/// represented before it is wrapped back into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub z: u8,
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub fn new(z: u8, x: i32, y: i32) -> Self {
        Self { z, x, y }
    }

    /// Returns the same tile with its column wrapped into `0..columns`.
    ///
    /// Columns already in range are returned as is. A wrapped column that
    /// does not fit an `i32` leaves the tile unchanged.
    pub fn wrap_x(&self, columns: i64) -> TileCoord {
        let x = i64::from(self.x);
        if columns <= 0 || (0..columns).contains(&x) {
            return *self;
        }
        match i32::try_from(x.rem_euclid(columns)) {
            Ok(x) => TileCoord::new(self.z, x, self.y),
            Err(_) => *self,
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}
