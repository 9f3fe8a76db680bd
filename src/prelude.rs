//! Prelude module for common arcgis-export types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use arcgis_export::prelude::*;`

pub use crate::core::{
    bounds::Extent,
    config::ArcGisRestOptions,
    geo::{Point, TileCoord},
};

pub use crate::tiles::{
    arcgis::{default_base_params, ArcGisRestSource, TileLoadFunction},
    grid::{TileGrid, TileSize},
    params::{ParamValue, ParameterSet},
    projection::Projection,
    source::TileSource,
};

pub use crate::params;

pub use crate::{Error as ArcGisError, Result};

pub use std::sync::Arc;
