//! Index command - convert a location to its tile.

use std::io::Write;

use clap::Args;
use tilemap::coord::{tile_span, to_geo_point, to_tile_index, GeoPoint, MAX_ZOOM};

use crate::error::CliError;

/// Arguments for the index command.
#[derive(Debug, Args)]
pub struct IndexArgs {
    /// Latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Zoom level (0-18)
    #[arg(long, default_value_t = 17)]
    pub zoom: u8,
}

/// Run the index command.
pub fn run(args: &IndexArgs, out: &mut impl Write) -> Result<(), CliError> {
    if args.zoom > MAX_ZOOM {
        return Err(CliError::InvalidArgument(format!(
            "zoom {} is above the maximum of {}",
            args.zoom, MAX_ZOOM
        )));
    }

    let point = GeoPoint::clamped(args.lat, args.lon).mercator_safe();
    let index = to_tile_index(point.lat, point.lon, args.zoom);
    let (x, y) = index.tile();
    let (fx, fy) = index.fraction();
    let corner = to_geo_point(x as f64, y as f64, args.zoom);
    let (lat_span, lon_span) = tile_span(x, y, args.zoom);

    writeln!(out, "Location:   {:.6}, {:.6}", point.lat, point.lon)?;
    writeln!(out, "Zoom:       {}", args.zoom)?;
    writeln!(out, "Index:      {:.6}, {:.6}", index.x, index.y)?;
    writeln!(out, "Tile:       {}/{}", x, y)?;
    writeln!(out, "Within:     {:.4}, {:.4}", fx, fy)?;
    writeln!(out, "NW corner:  {:.6}, {:.6}", corner.lat, corner.lon)?;
    writeln!(out, "Span:       {:.6} lat, {:.6} lon", lat_span, lon_span)?;
    Ok(())
}
