//! Coordinate types and constants.

/// Minimum supported zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Maximum supported zoom level.
pub const MAX_ZOOM: u8 = 18;

/// Minimum latitude accepted at the viewport boundary.
pub const MIN_LAT: f64 = -90.0;

/// Maximum latitude accepted at the viewport boundary.
pub const MAX_LAT: f64 = 90.0;

/// Minimum longitude.
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude.
pub const MAX_LON: f64 = 180.0;

/// Latitude at which the Web Mercator square ends (±85.0511°).
///
/// Tile math at the poles diverges, so anything that feeds a clamped
/// latitude into [`super::to_tile_index`] limits it to this value first.
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Edge length of one tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude, positive north.
    pub lat: f64,
    /// Longitude, positive east.
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a point without range checks.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Creates a point with latitude clamped to [-90, 90] and longitude to
    /// [-180, 180].
    pub fn clamped(lat: f64, lon: f64) -> Self {
        Self {
            lat: lat.clamp(MIN_LAT, MAX_LAT),
            lon: lon.clamp(MIN_LON, MAX_LON),
        }
    }

    /// Returns the same point with its latitude limited to the Web Mercator
    /// square.
    pub fn mercator_safe(self) -> Self {
        Self {
            lat: self.lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT),
            lon: self.lon,
        }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// A fractional position in the tile grid of one zoom level.
///
/// The integer part names the tile; the fractional part is the position
/// inside it (0.0 = west/north edge).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileIndex {
    /// Column, increasing eastward.
    pub x: f64,
    /// Row, increasing southward.
    pub y: f64,
}

impl TileIndex {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Integer tile column and row containing this index.
    pub fn tile(&self) -> (i64, i64) {
        (self.x.floor() as i64, self.y.floor() as i64)
    }

    /// Position inside the containing tile, each component in [0, 1).
    pub fn fraction(&self) -> (f64, f64) {
        (self.x - self.x.floor(), self.y - self.y.floor())
    }
}

/// A panel-relative pixel position. The origin is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    /// The degenerate position returned when a point cannot be placed.
    pub const ORIGIN: PixelPoint = PixelPoint { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Reference frame used to turn tile indices into panel pixels.
///
/// `center` is the fractional tile index drawn at `origin`, normally the
/// middle of the panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewAnchor {
    pub center: TileIndex,
    pub origin: (f64, f64),
}
