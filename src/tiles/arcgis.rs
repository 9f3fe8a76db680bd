//! Tile source backed by an ArcGIS Map/Image Server export operation
//!
//! Unlike a cached tile service, the export operation renders an image for
//! an arbitrary bounding box. Every tile request therefore carries the tile's
//! pixel size, its extent and spatial reference, on top of whatever the user
//! configured (layers, time, format, ...).

use crate::{
    constants::{DEFAULT_DPI, DEFAULT_F, DEFAULT_FORMAT, DEFAULT_TRANSPARENT, RESERVED_PARAMS},
    core::{config::ArcGisRestOptions, geo::TileCoord},
    tiles::{
        endpoint::{append_params, export_endpoint},
        grid::TileGrid,
        params::{ParamValue, ParameterSet},
        projection::Projection,
        source::{select_url, TileSource},
    },
    Result,
};
use fxhash::FxHashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Hook the owning pipeline may call instead of its default image loader.
pub type TileLoadFunction = Arc<dyn Fn(TileCoord, &str) + Send + Sync>;

/// Base parameters every export request starts from. User parameters
/// override them.
pub fn default_base_params() -> ParameterSet {
    let mut params = ParameterSet::new();
    params.insert("F", DEFAULT_F);
    params.insert("FORMAT", DEFAULT_FORMAT);
    params.insert("TRANSPARENT", DEFAULT_TRANSPARENT);
    params
}

pub struct ArcGisRestSource {
    params: ParameterSet,
    cache_key: String,
    revision: u64,
    urls: Vec<String>,
    tile_grid: Option<Arc<TileGrid>>,
    projection: Option<Projection>,
    attributions: Vec<String>,
    cache_size: Option<usize>,
    cross_origin: Option<String>,
    reprojection_error_threshold: f64,
    wrap_x: bool,
    transition: Option<u64>,
    tile_load_function: Option<TileLoadFunction>,
    grids_by_projection: Mutex<FxHashMap<String, Arc<TileGrid>>>,
}

impl ArcGisRestSource {
    pub fn new(options: ArcGisRestOptions) -> Self {
        let urls = options.service_urls();
        let cache_key = options.params.cache_key();
        Self {
            params: options.params,
            cache_key,
            revision: 0,
            urls,
            tile_grid: options.tile_grid.map(Arc::new),
            projection: options.projection.as_deref().map(Projection::from_code),
            attributions: options.attributions,
            cache_size: options.cache_size,
            cross_origin: options.cross_origin,
            reprojection_error_threshold: options.reprojection_error_threshold,
            wrap_x: options.wrap_x,
            transition: options.transition,
            tile_load_function: None,
            grids_by_projection: Mutex::new(FxHashMap::default()),
        }
    }

    /// Like [`ArcGisRestSource::new`], but rejects options that can never
    /// produce a usable request.
    pub fn try_new(options: ArcGisRestOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::new(options))
    }

    pub fn with_tile_load_function(mut self, f: TileLoadFunction) -> Self {
        self.tile_load_function = Some(f);
        self
    }

    /// The live user parameters, without defaults or computed keys.
    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    /// Merges `update` into the user parameters. Keys absent from `update`
    /// keep their value. Bumps the revision when the cache key changes.
    pub fn set_parameters(&mut self, update: &ParameterSet) {
        self.params.merge(update);
        let key = self.compute_cache_key();
        if key != self.cache_key {
            log::debug!("ArcGIS params changed, cache key {:?} -> {:?}", self.cache_key, key);
            self.cache_key = key;
            self.revision += 1;
        }
    }

    pub fn compute_cache_key(&self) -> String {
        self.params.cache_key()
    }

    /// Incremented every time previously built URLs become stale.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn set_urls(&mut self, urls: Vec<String>) {
        if urls != self.urls {
            self.urls = urls;
            self.revision += 1;
        }
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.set_urls(vec![url.into()]);
    }

    pub fn tile_grid(&self) -> Option<&TileGrid> {
        self.tile_grid.as_deref()
    }

    /// Grid used for `projection` when none is configured, built once per
    /// projection code. Projections sharing a code share the grid built for
    /// the first one seen, whatever extent the later ones carry.
    pub fn tile_grid_for_projection(&self, projection: &Projection) -> Arc<TileGrid> {
        match self.grids_by_projection.lock() {
            Ok(mut grids) => grids
                .entry(projection.code().to_string())
                .or_insert_with(|| Arc::new(TileGrid::default_for_projection(projection)))
                .clone(),
            Err(_) => Arc::new(TileGrid::default_for_projection(projection)),
        }
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    pub fn attributions(&self) -> &[String] {
        &self.attributions
    }

    pub fn cache_size(&self) -> Option<usize> {
        self.cache_size
    }

    pub fn cross_origin(&self) -> Option<&str> {
        self.cross_origin.as_deref()
    }

    pub fn reprojection_error_threshold(&self) -> f64 {
        self.reprojection_error_threshold
    }

    pub fn wrap_x(&self) -> bool {
        self.wrap_x
    }

    pub fn transition(&self) -> Option<u64> {
        self.transition
    }

    pub fn tile_load_function(&self) -> Option<&TileLoadFunction> {
        self.tile_load_function.as_ref()
    }

    pub fn set_tile_load_function(&mut self, f: TileLoadFunction) {
        self.tile_load_function = Some(f);
        self.revision += 1;
    }

    /// Builds the export URL for one tile of `grid`.
    ///
    /// Parameters are layered `base_params`, then the user parameters, then
    /// the keys computed from the tile (`SIZE`, `BBOX`, `BBOXSR`, `IMAGESR`,
    /// `DPI`), each layer overriding the previous one. A user `DPI` is kept
    /// as the base the pixel ratio scales.
    ///
    /// Returns `None` when no service URL is configured or `coord.z` is not
    /// a level of `grid`.
    pub fn request_url(
        &self,
        coord: TileCoord,
        grid: &TileGrid,
        pixel_ratio: f64,
        projection: &Projection,
        base_params: &ParameterSet,
    ) -> Option<String> {
        if self.urls.is_empty() {
            log::debug!("no ArcGIS service URL configured, skipping tile {}", coord);
            return None;
        }
        if grid.resolution_count() < coord.z as usize + 1 {
            log::debug!(
                "tile {} beyond the {} zoom levels of the grid",
                coord,
                grid.resolution_count()
            );
            return None;
        }

        let extent = grid.tile_coord_extent(coord)?;
        let mut size = grid.tile_size(coord.z);
        if pixel_ratio != 1.0 {
            size = size.scale(pixel_ratio);
        }
        let srid = projection.srid();

        let mut params = base_params.merged(&self.params);
        let dpi = params
            .get("DPI")
            .and_then(ParamValue::as_f64)
            .filter(|dpi| dpi.is_finite() && *dpi != 0.0)
            .unwrap_or(DEFAULT_DPI);
        let reserved: [ParamValue; 5] = [
            size.to_string().into(),
            extent.to_string().into(),
            srid.into(),
            srid.into(),
            (dpi * pixel_ratio).round().into(),
        ];
        for (key, value) in RESERVED_PARAMS.into_iter().zip(reserved) {
            params.insert(key, value);
        }

        let base = select_url(&self.urls, &coord)?;
        let url = append_params(&export_endpoint(base), &params);
        log::trace!("tile {} -> {}", coord, url);
        Some(url)
    }
}

impl TileSource for ArcGisRestSource {
    fn tile_url(&self, coord: TileCoord, pixel_ratio: f64, projection: &Projection) -> Option<String> {
        let grid = match &self.tile_grid {
            Some(grid) => Arc::clone(grid),
            None => self.tile_grid_for_projection(projection),
        };

        let coord = match grid.columns_at(coord.z) {
            Some(columns) if self.wrap_x && projection.is_global() => coord.wrap_x(columns),
            _ => coord,
        };

        self.request_url(coord, &grid, pixel_ratio, projection, &default_base_params())
    }

    /// The export operation renders at the requested density, so tiles come
    /// back at exactly the display ratio.
    fn tile_pixel_ratio(&self, pixel_ratio: f64) -> f64 {
        pixel_ratio
    }

    fn key(&self) -> String {
        self.cache_key.clone()
    }
}

impl fmt::Debug for ArcGisRestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArcGisRestSource")
            .field("urls", &self.urls)
            .field("params", &self.params)
            .field("cache_key", &self.cache_key)
            .field("revision", &self.revision)
            .field("tile_grid", &self.tile_grid)
            .field("projection", &self.projection)
            .field("wrap_x", &self.wrap_x)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{bounds::Extent, geo::Point};
    use crate::tiles::grid::TileSize;
    use std::collections::HashMap;
    use url::form_urlencoded;

    const MAP_SERVER: &str = "https://host/arcgis/rest/services/X/MapServer";

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn source(urls: &[&str]) -> ArcGisRestSource {
        ArcGisRestSource::new(ArcGisRestOptions {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            ..ArcGisRestOptions::default()
        })
    }

    /// Two zoom levels, tile (0, 0, 0) spans [0, 0, 100, 100].
    fn hundred_unit_grid() -> TileGrid {
        TileGrid::new(
            vec![100.0 / 256.0, 50.0 / 256.0],
            Point::new(0.0, 100.0),
            TileSize::square(256),
        )
    }

    fn query(url: &str) -> HashMap<String, String> {
        let (_, query) = url.split_once('?').expect("url has a query");
        form_urlencoded::parse(query.as_bytes()).into_owned().collect()
    }

    fn build(source: &ArcGisRestSource, pixel_ratio: f64) -> String {
        source
            .request_url(
                TileCoord::new(0, 0, 0),
                &hundred_unit_grid(),
                pixel_ratio,
                &Projection::new("EPSG:3857"),
                &default_base_params(),
            )
            .expect("url")
    }

    #[test]
    fn test_size_and_bbox() {
        init_logging();
        let url = build(&source(&[MAP_SERVER]), 1.0);
        assert!(url.starts_with("https://host/arcgis/rest/services/X/MapServer/export?"));

        let q = query(&url);
        assert_eq!(q["SIZE"], "256,256");
        assert_eq!(q["BBOX"], "0,0,100,100");
        assert_eq!(q["BBOXSR"], "3857");
        assert_eq!(q["IMAGESR"], "3857");
        assert_eq!(q["DPI"], "90");
        assert_eq!(q["F"], "image");
        assert_eq!(q["FORMAT"], "PNG32");
        assert_eq!(q["TRANSPARENT"], "true");
    }

    #[test]
    fn test_pixel_ratio_scales_size_and_dpi() {
        let q = query(&build(&source(&[MAP_SERVER]), 2.0));
        assert_eq!(q["SIZE"], "512,512");
        assert_eq!(q["DPI"], "180");
        assert_eq!(q["BBOX"], "0,0,100,100");
    }

    #[test]
    fn test_user_dpi_is_scaled() {
        let mut source = source(&[MAP_SERVER]);
        source.set_parameters(&[("DPI", 96)].into_iter().collect());
        let q = query(&build(&source, 2.0));
        assert_eq!(q["DPI"], "192");

        source.set_parameters(&[("DPI", "120")].into_iter().collect());
        let q = query(&build(&source, 1.5));
        assert_eq!(q["DPI"], "180");
    }

    #[test]
    fn test_unusable_dpi_falls_back_to_default() {
        let mut source = source(&[MAP_SERVER]);
        source.set_parameters(&[("DPI", 0)].into_iter().collect());
        assert_eq!(query(&build(&source, 2.0))["DPI"], "180");

        source.set_parameters(&[("DPI", "high")].into_iter().collect());
        assert_eq!(query(&build(&source, 2.0))["DPI"], "180");

        source.set_parameters(&[("DPI", true)].into_iter().collect());
        assert_eq!(query(&build(&source, 2.0))["DPI"], "180");

        source.set_parameters(&[("DPI", "0")].into_iter().collect());
        assert_eq!(query(&build(&source, 1.0))["DPI"], "90");
    }

    #[test]
    fn test_every_reserved_key_is_computed() {
        let mut source = source(&[MAP_SERVER]);
        source.set_parameters(&RESERVED_PARAMS.iter().map(|key| (*key, "user")).collect());

        let q = query(&build(&source, 1.0));
        for key in RESERVED_PARAMS {
            assert_ne!(q[key], "user", "{} kept the user value", key);
        }
        assert_eq!(q["DPI"], "90");
    }

    #[test]
    fn test_reserved_keys_override_user_values() {
        let mut source = source(&[MAP_SERVER]);
        source.set_parameters(
            &[("BBOX", "x"), ("SIZE", "1,1"), ("BBOXSR", "4326"), ("IMAGESR", "4326")]
                .into_iter()
                .collect(),
        );
        assert!(source.key().contains("BBOX-x"));

        let q = query(&build(&source, 1.0));
        assert_eq!(q["BBOX"], "0,0,100,100");
        assert_eq!(q["SIZE"], "256,256");
        assert_eq!(q["BBOXSR"], "3857");
        assert_eq!(q["IMAGESR"], "3857");

        // building never touches the stored parameters
        assert_eq!(source.parameters().get("BBOX"), Some(&ParamValue::from("x")));
    }

    #[test]
    fn test_user_params_override_defaults() {
        let mut source = source(&[MAP_SERVER]);
        source.set_parameters(
            &[
                ("FORMAT", ParamValue::from("JPG")),
                ("TRANSPARENT", false.into()),
                ("LAYERS", "show:0,2".into()),
            ]
            .into_iter()
            .collect(),
        );
        let q = query(&build(&source, 1.0));
        assert_eq!(q["FORMAT"], "JPG");
        assert_eq!(q["TRANSPARENT"], "false");
        assert_eq!(q["LAYERS"], "show:0,2");
        assert_eq!(q["F"], "image");
    }

    #[test]
    fn test_srid_from_esri_code() {
        let url = source(&[MAP_SERVER])
            .request_url(
                TileCoord::new(0, 0, 0),
                &hundred_unit_grid(),
                1.0,
                &Projection::new("EPSG:102100"),
                &default_base_params(),
            )
            .unwrap();
        let q = query(&url);
        assert_eq!(q["BBOXSR"], "102100");
        assert_eq!(q["IMAGESR"], "102100");
    }

    #[test]
    fn test_zoom_out_of_range() {
        let source = source(&[MAP_SERVER]);
        let grid = hundred_unit_grid();
        let projection = Projection::new("EPSG:3857");
        let base = default_base_params();

        assert!(source.request_url(TileCoord::new(1, 0, 0), &grid, 1.0, &projection, &base).is_some());
        assert!(source.request_url(TileCoord::new(2, 0, 0), &grid, 1.0, &projection, &base).is_none());
    }

    #[test]
    fn test_no_urls() {
        init_logging();
        let source = ArcGisRestSource::new(ArcGisRestOptions::default());
        for x in 0..4 {
            assert!(source
                .tile_url(TileCoord::new(2, x, 1), 1.0, &Projection::epsg_3857())
                .is_none());
        }
    }

    #[test]
    fn test_image_server_endpoint() {
        let url = build(&source(&["https://host/arcgis/rest/services/Y/ImageServer/"]), 1.0);
        assert!(url.starts_with("https://host/arcgis/rest/services/Y/ImageServer/exportImage?"));
    }

    #[test]
    fn test_existing_query_is_merged() {
        let url = build(&source(&["https://host/rest/services/X/MapServer?token=abc"]), 1.0);
        assert!(url.starts_with("https://host/rest/services/X/MapServer/export?token=abc&"));
        assert_eq!(url.matches('?').count(), 1);
    }

    #[test]
    fn test_cache_key_tracks_parameters() {
        let mut source = source(&[MAP_SERVER]);
        assert_eq!(source.key(), "");
        assert_eq!(source.revision(), 0);

        source.set_parameters(&[("LAYERS", "show:0")].into_iter().collect());
        assert_eq!(source.key(), "LAYERS-show:0");
        assert_eq!(source.revision(), 1);

        source.set_parameters(&ParameterSet::new());
        assert_eq!(source.key(), "LAYERS-show:0");
        assert_eq!(source.revision(), 1);

        source.set_parameters(&[("LAYERS", "show:0")].into_iter().collect());
        assert_eq!(source.revision(), 1);

        source.set_parameters(&[("LAYERS", "show:1")].into_iter().collect());
        assert_eq!(source.key(), "LAYERS-show:1");
        assert_eq!(source.revision(), 2);
        assert_eq!(source.key(), source.compute_cache_key());
    }

    #[test]
    fn test_initial_params_in_key() {
        let mut options = ArcGisRestOptions::with_url(MAP_SERVER);
        options.params.insert("TIME", "1199145600000");
        let source = ArcGisRestSource::new(options);
        assert_eq!(source.key(), "TIME-1199145600000");
    }

    #[test]
    fn test_set_urls_bumps_revision() {
        let mut source = source(&[MAP_SERVER]);
        source.set_urls(vec![MAP_SERVER.to_string()]);
        assert_eq!(source.revision(), 0);

        source.set_url("https://other/arcgis/rest/services/X/MapServer");
        assert_eq!(source.revision(), 1);
        assert_eq!(source.urls().len(), 1);
    }

    #[test]
    fn test_tile_url_uses_projection_grid() {
        let source = source(&[MAP_SERVER]);
        let url = source
            .tile_url(TileCoord::new(1, 1, 0), 1.0, &Projection::epsg_3857())
            .unwrap();
        let q = query(&url);
        assert_eq!(q["SIZE"], "256,256");
        assert_eq!(q["BBOX"], "0,0,20037508.342789244,20037508.342789244");

        // the derived grid is reused
        let a = source.tile_grid_for_projection(&Projection::epsg_3857());
        let b = source.tile_grid_for_projection(&Projection::epsg_3857());
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_tile_url_wraps_columns() {
        let source = source(&[MAP_SERVER]);
        let projection = Projection::epsg_3857();
        let wrapped = source.tile_url(TileCoord::new(1, -1, 0), 1.0, &projection);
        let direct = source.tile_url(TileCoord::new(1, 1, 0), 1.0, &projection);
        assert_eq!(wrapped, direct);

        let no_wrap = ArcGisRestSource::new(ArcGisRestOptions {
            url: Some(MAP_SERVER.to_string()),
            wrap_x: false,
            ..ArcGisRestOptions::default()
        });
        assert_ne!(no_wrap.tile_url(TileCoord::new(1, -1, 0), 1.0, &projection), direct);
    }

    #[test]
    fn test_wrap_keeps_last_column_at_high_zoom() {
        let source = source(&[MAP_SERVER]);
        let projection = Projection::epsg_3857();
        let last = source
            .tile_url(TileCoord::new(31, i32::MAX, 0), 1.0, &projection)
            .unwrap();
        let wrapped = source.tile_url(TileCoord::new(31, -1, 0), 1.0, &projection);
        assert_eq!(wrapped.as_deref(), Some(last.as_str()));

        let min_x: f64 = query(&last)["BBOX"].split(',').next().unwrap().parse().unwrap();
        assert!(min_x > 0.0, "last column landed west of the origin: {}", min_x);
    }

    #[test]
    fn test_grid_cache_is_keyed_by_code() {
        let source = source(&[MAP_SERVER]);
        let small = Projection::new("EPSG:2056").with_extent(Extent::from_coords(0.0, 0.0, 256.0, 256.0));
        let large = Projection::new("EPSG:2056").with_extent(Extent::from_coords(0.0, 0.0, 512.0, 512.0));

        let first = source.tile_grid_for_projection(&small);
        let second = source.tile_grid_for_projection(&large);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.extent(), small.extent());
    }

    #[test]
    fn test_explicit_grid_zoom_guard() {
        let source = ArcGisRestSource::new(ArcGisRestOptions {
            url: Some(MAP_SERVER.to_string()),
            tile_grid: Some(hundred_unit_grid()),
            ..ArcGisRestOptions::default()
        });
        let projection = Projection::new("EPSG:3857");
        assert!(source.tile_url(TileCoord::new(1, 0, 0), 1.0, &projection).is_some());
        assert!(source.tile_url(TileCoord::new(2, 0, 0), 1.0, &projection).is_none());
    }

    #[test]
    fn test_pixel_ratio_passthrough() {
        let source = source(&[MAP_SERVER]);
        assert_eq!(source.tile_pixel_ratio(1.0), 1.0);
        assert_eq!(source.tile_pixel_ratio(2.5), 2.5);
    }

    #[test]
    fn test_try_new_rejects_bad_grid() {
        let result = ArcGisRestSource::try_new(ArcGisRestOptions {
            url: Some(MAP_SERVER.to_string()),
            tile_grid: Some(TileGrid::new(vec![], Point::default(), TileSize::default())),
            ..ArcGisRestOptions::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_tile_load_function_is_stored() {
        let source = source(&[MAP_SERVER]).with_tile_load_function(Arc::new(|_: TileCoord, _: &str| {}));
        assert!(source.tile_load_function().is_some());
    }

    #[test]
    fn test_options_metadata() {
        let source = ArcGisRestSource::new(ArcGisRestOptions {
            attributions: vec!["© Esri".into()],
            cache_size: Some(128),
            cross_origin: Some("anonymous".into()),
            projection: Some("EPSG:102100".into()),
            transition: Some(0),
            ..ArcGisRestOptions::with_url(MAP_SERVER)
        });
        assert_eq!(source.attributions(), &["© Esri".to_string()][..]);
        assert_eq!(source.cache_size(), Some(128));
        assert_eq!(source.cross_origin(), Some("anonymous"));
        assert_eq!(source.projection().map(|p| p.srid()), Some("102100"));
        assert_eq!(source.transition(), Some(0));
        assert_eq!(source.reprojection_error_threshold(), 0.5);
        assert!(source.wrap_x());
    }
}
