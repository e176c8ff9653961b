//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude),
//! fractional Web Mercator tile indices and panel pixels, plus the circle
//! rasterizer used for translucent overlays. Everything here is pure.

mod circle;
mod types;

pub use circle::{rasterize_circle, MAX_CIRCLE_RADIUS};
pub use types::{
    GeoPoint, PixelPoint, TileIndex, ViewAnchor, MAX_LAT, MAX_LON, MAX_ZOOM, MERCATOR_MAX_LAT,
    MIN_LAT, MIN_LON, MIN_ZOOM, TILE_SIZE,
};

use std::f64::consts::PI;

/// Number of tiles along one axis at `zoom`.
#[inline]
pub fn tiles_per_axis(zoom: u8) -> f64 {
    2.0_f64.powi(zoom as i32)
}

/// Converts geographic coordinates to a fractional tile index.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees, strictly inside (-90, 90)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 18)
///
/// Latitudes beyond the Mercator square produce rows outside `[0, 2^zoom)`;
/// the poles themselves produce non-finite values, so callers clamp first.
#[inline]
pub fn to_tile_index(lat: f64, lon: f64, zoom: u8) -> TileIndex {
    let n = tiles_per_axis(zoom);

    let x = (lon + 180.0) / 360.0 * n;

    let lat_rad = lat.to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;

    TileIndex { x, y }
}

/// Converts a (possibly fractional) tile index back to geographic coordinates.
///
/// For an integer index this is the northwest corner of the tile.
#[inline]
pub fn to_geo_point(x: f64, y: f64, zoom: u8) -> GeoPoint {
    let n = tiles_per_axis(zoom);

    let lon = x / n * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * y / n)).sinh().atan();

    GeoPoint {
        lat: lat_rad.to_degrees(),
        lon,
    }
}

/// Geographic size `(lat_span, lon_span)` of the tile at `(x, y)`.
///
/// The longitude span is the same for every tile of a zoom level; the
/// latitude span shrinks toward the poles.
pub fn tile_span(x: i64, y: i64, zoom: u8) -> (f64, f64) {
    let nw = to_geo_point(x as f64, y as f64, zoom);
    let se = to_geo_point((x + 1) as f64, (y + 1) as f64, zoom);
    ((nw.lat - se.lat).abs(), (se.lon - nw.lon).abs())
}

/// Maps a geographic point to panel pixels.
///
/// With the anchor's `center` index drawn at `origin`, a point lands at
/// `origin + TILE_SIZE * (index - center)`. Without an anchor (the center
/// tile is not among the tiles on screen) the result is [`PixelPoint::ORIGIN`].
pub fn project_to_pixel(point: GeoPoint, zoom: u8, anchor: Option<&ViewAnchor>) -> PixelPoint {
    let Some(anchor) = anchor else {
        return PixelPoint::ORIGIN;
    };

    let index = to_tile_index(point.lat, point.lon, zoom);
    let tile = TILE_SIZE as f64;
    let px = anchor.origin.0 + tile * (index.x - anchor.center.x);
    let py = anchor.origin.1 + tile * (index.y - anchor.center.y);

    PixelPoint::new(px.round() as i32, py.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HANNOVER: GeoPoint = GeoPoint::new(52.382463, 9.717836);

    #[test]
    fn test_hannover_at_zoom_17() {
        let index = to_tile_index(HANNOVER.lat, HANNOVER.lon, 17);
        assert_eq!(index.tile(), (69074, 43067));
        assert!((index.x - 69074.156_111).abs() < 1e-3);
        assert!((index.y - 43067.906_130).abs() < 1e-3);
    }

    #[test]
    fn test_new_york_city_at_zoom_16() {
        let index = to_tile_index(40.7128, -74.0060, 16);
        assert_eq!(index.tile(), (19295, 24640));
    }

    #[test]
    fn test_origin_is_world_center() {
        let index = to_tile_index(0.0, 0.0, 1);
        assert!((index.x - 1.0).abs() < 1e-12);
        assert!((index.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_zero_single_tile() {
        let index = to_tile_index(45.0, 90.0, 0);
        assert_eq!(index.tile(), (0, 0));
    }

    #[test]
    fn test_to_geo_point_northwest_corner() {
        let nw = to_geo_point(0.0, 0.0, 5);
        assert!((nw.lon + 180.0).abs() < 1e-9);
        assert!((nw.lat - MERCATOR_MAX_LAT).abs() < 1e-9);
    }

    #[test]
    fn test_to_geo_point_at_equator() {
        let p = to_geo_point(512.0, 512.0, 10);
        assert!(p.lat.abs() < 1e-9, "Should be on the equator");
        assert!(p.lon.abs() < 1e-9, "Should be on the prime meridian");
    }

    #[test]
    fn test_tile_span_longitude() {
        let (_, lon_span) = tile_span(10, 10, 4);
        assert!((lon_span - 22.5).abs() < 1e-9);
    }

    #[test]
    fn test_tile_span_shrinks_toward_pole() {
        let (equator, _) = tile_span(0, 128, 8);
        let (north, _) = tile_span(0, 10, 8);
        assert!(north < equator);
    }

    #[test]
    fn test_project_without_anchor_is_degenerate() {
        assert_eq!(project_to_pixel(HANNOVER, 17, None), PixelPoint::ORIGIN);
    }

    #[test]
    fn test_project_center_lands_on_origin() {
        let anchor = ViewAnchor {
            center: to_tile_index(HANNOVER.lat, HANNOVER.lon, 17),
            origin: (400.0, 300.0),
        };
        assert_eq!(
            project_to_pixel(HANNOVER, 17, Some(&anchor)),
            PixelPoint::new(400, 300)
        );
    }

    #[test]
    fn test_project_neighbouring_point() {
        let anchor = ViewAnchor {
            center: to_tile_index(HANNOVER.lat, HANNOVER.lon, 17),
            origin: (400.0, 300.0),
        };
        // About two tiles east and two tiles south of the center.
        let p = project_to_pixel(GeoPoint::new(52.37930, 9.72310), 17, Some(&anchor));
        assert_eq!(p, PixelPoint::new(891, 783));
    }

    #[test]
    fn test_geo_point_clamped() {
        let p = GeoPoint::clamped(123.0, -200.0);
        assert_eq!(p, GeoPoint::new(90.0, -180.0));
        assert_eq!(p.mercator_safe().lat, MERCATOR_MAX_LAT);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_fractional_roundtrip_exact(
                lat in -85.0..85.0_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                let index = to_tile_index(lat, lon, zoom);
                let back = to_geo_point(index.x, index.y, zoom);
                prop_assert!((back.lat - lat).abs() < 1e-6);
                prop_assert!((back.lon - lon).abs() < 1e-6);
            }

            #[test]
            fn test_corner_roundtrip_within_one_tile(
                lat in -85.0..85.0_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                let index = to_tile_index(lat, lon, zoom);
                let (x, y) = index.tile();
                let corner = to_geo_point(x as f64, y as f64, zoom);
                let (lat_span, lon_span) = tile_span(x, y, zoom);

                prop_assert!(
                    (corner.lat - lat).abs() <= lat_span + 1e-9,
                    "lat {} -> corner {} (span {})", lat, corner.lat, lat_span
                );
                prop_assert!(
                    (corner.lon - lon).abs() <= lon_span + 1e-9,
                    "lon {} -> corner {} (span {})", lon, corner.lon, lon_span
                );
            }

            #[test]
            fn test_longitude_monotonic(
                lat in -85.0..85.0_f64,
                lon1 in -180.0..180.0_f64,
                delta in 0.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                let lon2 = (lon1 + delta).min(180.0);
                let a = to_tile_index(lat, lon1, zoom);
                let b = to_tile_index(lat, lon2, zoom);
                prop_assert!(a.x <= b.x, "x decreased: {} -> {}", a.x, b.x);
            }

            #[test]
            fn test_index_in_world_bounds(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                let index = to_tile_index(lat, lon, zoom);
                let n = tiles_per_axis(zoom);
                prop_assert!(index.x >= 0.0 && index.x <= n);
                prop_assert!(index.y >= 0.0 && index.y <= n);
            }
        }
    }
}
