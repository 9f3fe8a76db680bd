use arcgis_export::prelude::*;

/// Prints the export URLs a pipeline would request for a small block of
/// tiles, optionally reading the source options from a JSON file.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(path) => ArcGisRestOptions::from_json_file(&path)?,
        None => ArcGisRestOptions {
            urls: vec![
                "https://services.arcgisonline.com/arcgis/rest/services/World_Topo_Map/MapServer"
                    .to_string(),
                "https://server.arcgisonline.com/arcgis/rest/services/World_Topo_Map/MapServer"
                    .to_string(),
            ],
            params: params! { "LAYERS" => "show:0" },
            ..ArcGisRestOptions::default()
        },
    };
    let mut source = ArcGisRestSource::try_new(options)?;
    let projection = source
        .projection()
        .cloned()
        .unwrap_or_else(Projection::epsg_3857);

    println!("ArcGIS export demo");
    println!("   Mirrors: {}", source.urls().len());
    println!("   Cache key: {:?}", source.key());

    for pixel_ratio in [1.0, 2.0] {
        println!("\nPixel ratio {}:", source.tile_pixel_ratio(pixel_ratio));
        for x in 0..2 {
            for y in 0..2 {
                let coord = TileCoord::new(1, x, y);
                match source.tile_url(coord, pixel_ratio, &projection) {
                    Some(url) => println!("   {} {}", coord, url),
                    None => println!("   {} skipped", coord),
                }
            }
        }
    }

    source.set_parameters(&params! { "TRANSPARENT" => false, "FORMAT" => "JPG" });
    println!("\nAfter update (revision {}):", source.revision());
    println!("   Cache key: {:?}", source.key());
    if let Some(url) = source.tile_url(TileCoord::new(0, 0, 0), 1.0, &projection) {
        println!("   0/0/0 {}", url);
    }

    Ok(())
}
