//! Core constants derived from ArcGIS REST defaults and common web-map conventions.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Highest zoom level of a grid derived from a projection.
pub const DEFAULT_MAX_ZOOM: u8 = 42;

/// DPI the export endpoint assumes when none is requested.
pub const DEFAULT_DPI: f64 = 90.0;

/// Default reprojection error threshold, in pixels.
pub const DEFAULT_REPROJECTION_ERROR_THRESHOLD: f64 = 0.5;

/// Image format requested when the user does not set `F`.
pub const DEFAULT_F: &str = "image";

/// Image encoding requested when the user does not set `FORMAT`.
pub const DEFAULT_FORMAT: &str = "PNG32";

/// Transparency requested when the user does not set `TRANSPARENT`.
pub const DEFAULT_TRANSPARENT: bool = true;

/// Query keys computed from tile geometry; user values never reach the wire.
pub const RESERVED_PARAMS: [&str; 5] = ["SIZE", "BBOX", "BBOXSR", "IMAGESR", "DPI"];
