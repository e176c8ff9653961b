//! Tile identity and lifecycle.
//!
//! A [`TileKey`] names one tile image. The matching [`Tile`] record tracks
//! where that image is in its lifecycle:
//!
//! ```text
//! Pending ──► Loading ──► Ready
//!                   └───► Failed
//! ```
//!
//! Transitions only move forward. A tile found on disk, or delivered by a
//! completion after it left the cache's view, starts directly as `Ready`.

mod state;

pub use state::{Tile, TileImage, TileState};

use std::fmt;

use crate::coord::MAX_ZOOM;
use crate::layer::LayerId;

/// Unique identifier of one tile image.
///
/// # Example
///
/// ```
/// use tilemap::layer::LayerId;
/// use tilemap::tile::TileKey;
///
/// let key = TileKey::new(69074, 43067, 17, LayerId::Mapnik);
/// assert_eq!(key.to_string(), "mapnik/17/69074/43067");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    /// Column, increasing eastward.
    pub x: u32,
    /// Row, increasing southward.
    pub y: u32,
    /// Zoom level, at most [`MAX_ZOOM`].
    pub zoom: u8,
    /// Layer the image belongs to.
    pub layer: LayerId,
}

impl TileKey {
    /// Creates a key. The zoom is clamped to [`MAX_ZOOM`].
    pub fn new(x: u32, y: u32, zoom: u8, layer: LayerId) -> Self {
        Self {
            x,
            y,
            zoom: zoom.min(MAX_ZOOM),
            layer,
        }
    }

    /// Creates a key from a possibly out-of-range grid position.
    ///
    /// Columns wrap around the antimeridian. Rows outside the world have no
    /// tile and yield `None`.
    pub fn wrapped(x: i64, y: i64, zoom: u8, layer: LayerId) -> Option<Self> {
        let zoom = zoom.min(MAX_ZOOM);
        let n = 1i64 << zoom;
        if !(0..n).contains(&y) {
            return None;
        }
        let x = x.rem_euclid(n);
        Some(Self::new(x as u32, y as u32, zoom, layer))
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.layer, self.zoom, self.x, self.y)
    }
}
