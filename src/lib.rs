//! # ArcGIS export
//!
//! A tile source for ArcGIS Map/Image Server export operations.
//!
//! For every tile the source derives the image size, bounding box and
//! spatial reference from a tile grid and projection, layers them over the
//! user-supplied query parameters, picks one of the configured mirror URLs
//! and produces the `export`/`exportImage` request URL. Fetching, decoding
//! and caching the images is left to the pipeline that owns the source.

#[macro_use]
mod macros;

pub mod core;
pub mod prelude;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    bounds::Extent,
    config::ArcGisRestOptions,
    geo::{Point, TileCoord},
};

pub use crate::tiles::{
    arcgis::ArcGisRestSource,
    grid::{TileGrid, TileSize},
    params::{ParamValue, ParameterSet},
    projection::Projection,
    source::TileSource,
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum ArcGisError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

/// Error type alias for convenience
pub type Error = ArcGisError;
