use crate::core::geo::TileCoord;
use crate::tiles::projection::Projection;
use fxhash::FxHasher64;
use std::hash::{Hash, Hasher};

/// Trait representing anything that can produce tile request URLs.
///
/// Fetching, decoding and caching belong to the pipeline that owns the
/// source; a source only answers which URL a tile lives at.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`, or `None` when this source
    /// cannot serve the tile and the pipeline should skip it.
    fn tile_url(&self, coord: TileCoord, pixel_ratio: f64, projection: &Projection) -> Option<String>;

    /// Pixel ratio of the tiles this source produces for a display at
    /// `pixel_ratio`.
    fn tile_pixel_ratio(&self, pixel_ratio: f64) -> f64;

    /// Changes whenever the configuration behind the URLs changes, so that
    /// tiles rendered under an old key can be discarded.
    fn key(&self) -> String {
        String::new()
    }
}

/// Deterministic hash of a tile coordinate, identical on 32 and 64-bit
/// targets.
pub fn tile_coord_hash(coord: &TileCoord) -> u64 {
    let mut hasher = FxHasher64::default();
    coord.hash(&mut hasher);
    hasher.finish()
}

/// Picks the mirror for `coord`. The same coordinate always maps to the same
/// URL so HTTP caches stay warm.
pub fn select_url<'a>(urls: &'a [String], coord: &TileCoord) -> Option<&'a str> {
    match urls.len() {
        0 => None,
        1 => Some(urls[0].as_str()),
        n => {
            let index = (tile_coord_hash(coord) % n as u64) as usize;
            Some(urls[index].as_str())
        }
    }
}
