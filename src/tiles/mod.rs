pub mod arcgis;
pub mod endpoint;
pub mod grid;
pub mod params;
pub mod projection;
pub mod source;

// Re-exports for convenience
pub use arcgis::{default_base_params, ArcGisRestSource, TileLoadFunction};
pub use endpoint::{append_params, export_endpoint};
pub use grid::{TileGrid, TileSize};
pub use params::{ParamValue, ParameterSet};
pub use projection::Projection;
pub use source::{select_url, tile_coord_hash, TileSource};
