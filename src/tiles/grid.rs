//! Tile grid: zoom levels, resolutions and tile geometry
//!
//! Rows grow downwards from a top-left origin, the XYZ convention used by
//! ArcGIS tiled services.

use crate::{
    constants::{DEFAULT_MAX_ZOOM, TILE_SIZE},
    core::{
        bounds::Extent,
        geo::{Point, TileCoord, MERCATOR_HALF_SIZE},
    },
    tiles::projection::Projection,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tile dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct TileSize {
    pub width: u32,
    pub height: u32,
}

impl TileSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    /// Scales both dimensions by `ratio`, rounding to whole pixels.
    pub fn scale(&self, ratio: f64) -> TileSize {
        TileSize::new(
            (self.width as f64 * ratio).round() as u32,
            (self.height as f64 * ratio).round() as u32,
        )
    }
}

impl Default for TileSize {
    fn default() -> Self {
        Self::square(TILE_SIZE)
    }
}

impl From<[u32; 2]> for TileSize {
    fn from(size: [u32; 2]) -> Self {
        Self::new(size[0], size[1])
    }
}

impl From<TileSize> for [u32; 2] {
    fn from(size: TileSize) -> Self {
        [size.width, size.height]
    }
}

/// Formats as `width,height`, the `SIZE` parameter layout.
impl fmt::Display for TileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    /// Map units per pixel, one entry per zoom level
    resolutions: Vec<f64>,
    origin: Point,
    #[serde(default)]
    tile_size: TileSize,
    /// Per-zoom override of `tile_size`
    #[serde(default)]
    tile_sizes: Option<Vec<TileSize>>,
    #[serde(default)]
    extent: Option<Extent>,
}

impl TileGrid {
    pub fn new(resolutions: Vec<f64>, origin: Point, tile_size: TileSize) -> Self {
        Self {
            resolutions,
            origin,
            tile_size,
            tile_sizes: None,
            extent: None,
        }
    }

    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extent = Some(extent);
        self
    }

    pub fn with_tile_sizes(mut self, tile_sizes: Vec<TileSize>) -> Self {
        self.tile_sizes = Some(tile_sizes);
        self
    }

    /// XYZ grid covering the projection's extent, zoom 0 fitting the whole
    /// extent in one tile and each further zoom halving the resolution.
    /// Projections without an extent get the Web Mercator one.
    pub fn for_projection(projection: &Projection, max_zoom: u8, tile_size: TileSize) -> Self {
        let extent = projection.extent().unwrap_or_else(|| {
            Extent::from_coords(
                -MERCATOR_HALF_SIZE,
                -MERCATOR_HALF_SIZE,
                MERCATOR_HALF_SIZE,
                MERCATOR_HALF_SIZE,
            )
        });
        let max_resolution = f64::max(
            extent.width() / tile_size.width as f64,
            extent.height() / tile_size.height as f64,
        );
        let resolutions = (0..=max_zoom as i32)
            .map(|z| max_resolution / 2_f64.powi(z))
            .collect();

        Self::new(resolutions, extent.top_left(), tile_size).with_extent(extent)
    }

    /// Grid used when a source has none configured.
    pub fn default_for_projection(projection: &Projection) -> Self {
        Self::for_projection(projection, DEFAULT_MAX_ZOOM, TileSize::default())
    }

    /// Number of zoom levels defined by this grid
    pub fn resolution_count(&self) -> usize {
        self.resolutions.len()
    }

    pub fn resolutions(&self) -> &[f64] {
        &self.resolutions
    }

    pub fn resolution(&self, z: u8) -> Option<f64> {
        self.resolutions.get(z as usize).copied()
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn extent(&self) -> Option<Extent> {
        self.extent
    }

    pub fn tile_size(&self, z: u8) -> TileSize {
        self.tile_sizes
            .as_ref()
            .and_then(|sizes| sizes.get(z as usize).copied())
            .unwrap_or(self.tile_size)
    }

    /// Projected extent of one tile, `None` when `coord.z` is not a level of
    /// this grid.
    pub fn tile_coord_extent(&self, coord: TileCoord) -> Option<Extent> {
        let resolution = self.resolution(coord.z)?;
        let size = self.tile_size(coord.z);
        let tile_width = size.width as f64 * resolution;
        let tile_height = size.height as f64 * resolution;

        let min_x = self.origin.x + coord.x as f64 * tile_width;
        let min_y = self.origin.y - (coord.y as f64 + 1.0) * tile_height;
        Some(Extent::from_coords(
            min_x,
            min_y,
            min_x + tile_width,
            min_y + tile_height,
        ))
    }

    /// Number of tile columns spanning the grid extent at `z`.
    pub fn columns_at(&self, z: u8) -> Option<i64> {
        let extent = self.extent?;
        let resolution = self.resolution(z)?;
        let tile_width = self.tile_size(z).width as f64 * resolution;
        if tile_width <= 0.0 {
            return None;
        }
        // tolerate float noise when the extent is an exact multiple of the tile width
        let columns = (extent.max.x - self.origin.x) / tile_width;
        Some((columns - 1e-9).ceil() as i64)
    }

    /// Rejects grids that cannot produce a meaningful tile extent.
    pub fn validate(&self) -> Result<()> {
        if self.resolutions.is_empty() {
            return Err(Error::InvalidOptions("tile grid has no resolutions".into()));
        }
        if let Some(bad) = self
            .resolutions
            .iter()
            .find(|r| !r.is_finite() || **r <= 0.0)
        {
            return Err(Error::InvalidOptions(format!(
                "tile grid resolution {} is not a positive number",
                bad
            )));
        }
        let zero_sized = std::iter::once(&self.tile_size)
            .chain(self.tile_sizes.iter().flatten())
            .any(|size| size.width == 0 || size.height == 0);
        if zero_sized {
            return Err(Error::InvalidOptions("tile grid has a zero tile size".into()));
        }
        Ok(())
    }
}
