use crate::core::geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned bounding box in projected coordinates.
///
/// Serialized as `[min_x, min_y, max_x, max_y]`, the same order the export
/// endpoint expects in its `BBOX` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Extent {
    pub min: Point,
    pub max: Point,
}

impl Extent {
    /// Creates new extent from two corner points
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Creates an extent from individual coordinates
    pub fn from_coords(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(Point::new(min_x, min_y), Point::new(max_x, max_y))
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Top-left corner, the origin of an XYZ tile grid
    pub fn top_left(&self) -> Point {
        Point::new(self.min.x, self.max.y)
    }

    /// Checks if the extent is valid (min <= max)
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }
}

impl From<[f64; 4]> for Extent {
    fn from(coords: [f64; 4]) -> Self {
        Self::from_coords(coords[0], coords[1], coords[2], coords[3])
    }
}

impl From<Extent> for [f64; 4] {
    fn from(extent: Extent) -> Self {
        extent.to_array()
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::new(Point::new(0.0, 0.0), Point::new(0.0, 0.0))
    }
}

/// Formats as `min_x,min_y,max_x,max_y` with no spaces.
impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min.x, self.min.y, self.max.x, self.max.y
        )
    }
}
