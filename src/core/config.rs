//! Construction options for the ArcGIS REST tile source
//!
//! Options can be built in code or loaded from JSON. Every field has a
//! default, so a configuration file only needs the service URL.

use crate::{
    constants::DEFAULT_REPROJECTION_ERROR_THRESHOLD,
    tiles::{grid::TileGrid, params::ParameterSet},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcGisRestOptions {
    pub attributions: Vec<String>,
    /// Tile cache size hint for the owning pipeline
    pub cache_size: Option<usize>,
    pub cross_origin: Option<String>,
    /// Projection code of the source, e.g. `EPSG:3857`
    pub projection: Option<String>,
    /// Explicit tile grid; when absent one is derived from the projection
    pub tile_grid: Option<TileGrid>,
    pub reprojection_error_threshold: f64,
    /// Single service URL, used when `urls` is empty
    pub url: Option<String>,
    /// Mirror service URLs
    pub urls: Vec<String>,
    pub wrap_x: bool,
    /// Opacity transition duration in milliseconds
    pub transition: Option<u64>,
    /// Initial user parameters
    pub params: ParameterSet,
}

impl Default for ArcGisRestOptions {
    fn default() -> Self {
        Self {
            attributions: Vec::new(),
            cache_size: None,
            cross_origin: None,
            projection: None,
            tile_grid: None,
            reprojection_error_threshold: DEFAULT_REPROJECTION_ERROR_THRESHOLD,
            url: None,
            urls: Vec::new(),
            wrap_x: true,
            transition: None,
            params: ParameterSet::new(),
        }
    }
}

impl ArcGisRestOptions {
    /// Options pointing at a single service URL.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// The mirror list a source built from these options will use.
    pub fn service_urls(&self) -> Vec<String> {
        if !self.urls.is_empty() {
            self.urls.clone()
        } else {
            self.url.iter().cloned().collect()
        }
    }

    /// Checks the options for values that can never yield a usable URL.
    pub fn validate(&self) -> Result<()> {
        if self.service_urls().iter().any(|url| url.trim().is_empty()) {
            return Err(Error::InvalidOptions("service URL is blank".into()));
        }
        if let Some(grid) = &self.tile_grid {
            grid.validate()?;
        }
        if !self.reprojection_error_threshold.is_finite() || self.reprojection_error_threshold < 0.0 {
            return Err(Error::InvalidOptions(format!(
                "reprojection error threshold {} is not a non-negative number",
                self.reprojection_error_threshold
            )));
        }
        Ok(())
    }
}
