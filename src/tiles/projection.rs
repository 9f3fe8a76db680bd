//! Minimal projection descriptor
//!
//! Only what the export request needs: the code (for the spatial reference
//! id), the validity extent (to derive a default tile grid) and whether the
//! projection covers the whole world (for world wrapping).

use crate::core::{bounds::Extent, geo::MERCATOR_HALF_SIZE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    code: String,
    #[serde(default)]
    extent: Option<Extent>,
    #[serde(default)]
    global: bool,
}

impl Projection {
    /// Projection known only by its code, with no extent.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            extent: None,
            global: false,
        }
    }

    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extent = Some(extent);
        self
    }

    pub fn with_global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    /// Spherical Web Mercator
    pub fn epsg_3857() -> Self {
        Self::new("EPSG:3857")
            .with_extent(Extent::from_coords(
                -MERCATOR_HALF_SIZE,
                -MERCATOR_HALF_SIZE,
                MERCATOR_HALF_SIZE,
                MERCATOR_HALF_SIZE,
            ))
            .with_global(true)
    }

    /// WGS 84 geographic coordinates
    pub fn epsg_4326() -> Self {
        Self::new("EPSG:4326")
            .with_extent(Extent::from_coords(-180.0, -90.0, 180.0, 90.0))
            .with_global(true)
    }

    /// Looks up one of the built-in projections, falling back to a bare code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "EPSG:3857" | "EPSG:102100" | "EPSG:102113" | "EPSG:900913" => {
                Self::epsg_3857().renamed(code)
            }
            "EPSG:4326" | "CRS:84" => Self::epsg_4326().renamed(code),
            _ => Self::new(code),
        }
    }

    fn renamed(mut self, code: &str) -> Self {
        self.code = code.to_string();
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn extent(&self) -> Option<Extent> {
        self.extent
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    /// The bare spatial reference id the REST API accepts: everything after
    /// the last `:` of the code, or the whole code if it has none.
    pub fn srid(&self) -> &str {
        self.code.rsplit(':').next().unwrap_or(&self.code)
    }
}
