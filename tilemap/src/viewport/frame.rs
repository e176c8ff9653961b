//! Renderable output of the viewport.
//!
//! A [`Frame`] is a snapshot: tile placements in panel pixels plus overlay
//! pixel positions. Drawing it is up to the caller.

use image::Rgba;

use crate::coord::{GeoPoint, PixelPoint, ViewAnchor};
use crate::tile::{TileImage, TileKey, TileState};

use super::overlay::GreyedOverlay;

/// Alpha applied to rectangle fills.
pub const RECT_FILL_ALPHA: u8 = 30;

/// One cell of the visible tile window.
#[derive(Debug, Clone)]
pub struct TilePlacement {
    /// Position relative to the center tile, `(0, 0)` being the center.
    pub offset: (i64, i64),
    /// Absolute tile, `None` for rows above or below the world.
    pub key: Option<TileKey>,
    pub state: Option<TileState>,
    /// Tile image or the loading placeholder; `None` with `key`.
    pub image: Option<TileImage>,
    /// Panel position of the tile's top-left corner.
    pub top_left: PixelPoint,
}

impl TilePlacement {
    pub fn is_ready(&self) -> bool {
        self.state == Some(TileState::Ready)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointPlacement {
    pub label: String,
    pub position: PixelPoint,
    pub color: Rgba<u8>,
}

/// Screen-space rectangle, normalized so width and height are positive.
#[derive(Debug, Clone, PartialEq)]
pub struct RectPlacement {
    pub top_left: PixelPoint,
    pub width: u32,
    pub height: u32,
    pub color: Rgba<u8>,
}

impl RectPlacement {
    /// Builds a rectangle from any two opposite corners.
    pub fn from_corners(a: PixelPoint, b: PixelPoint, color: Rgba<u8>) -> Self {
        Self {
            top_left: PixelPoint::new(a.x.min(b.x), a.y.min(b.y)),
            width: a.x.abs_diff(b.x),
            height: a.y.abs_diff(b.y),
            color,
        }
    }

    /// Outline color with the translucent fill alpha.
    pub fn fill_color(&self) -> Rgba<u8> {
        let [r, g, b, _] = self.color.0;
        Rgba([r, g, b, RECT_FILL_ALPHA])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CirclePlacement {
    pub center: PixelPoint,
    pub radius: u32,
    /// Outline pixels in angular order.
    pub outline: Vec<PixelPoint>,
    pub color: Rgba<u8>,
}

/// Everything needed to paint the panel once.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub zoom: u8,
    pub center: GeoPoint,
    /// Half the edge length of the tile window, in tiles.
    pub radius: i64,
    /// Reference used to place overlays, `None` when the center tile is
    /// off the map.
    pub anchor: Option<ViewAnchor>,
    pub tiles: Vec<TilePlacement>,
    pub points: Vec<PointPlacement>,
    pub rectangles: Vec<RectPlacement>,
    pub circles: Vec<CirclePlacement>,
    pub greyed: Option<GreyedOverlay>,
}

impl Frame {
    pub(crate) fn empty(width: u32, height: u32, zoom: u8, center: GeoPoint) -> Self {
        Self {
            width,
            height,
            zoom,
            center,
            radius: 0,
            anchor: None,
            tiles: Vec::new(),
            points: Vec::new(),
            rectangles: Vec::new(),
            circles: Vec::new(),
            greyed: None,
        }
    }

    /// Keys of all placed tiles, in row-major order.
    pub fn keys(&self) -> impl Iterator<Item = TileKey> + '_ {
        self.tiles.iter().filter_map(|t| t.key)
    }

    /// Placement at an offset from the center tile.
    pub fn placement(&self, dx: i64, dy: i64) -> Option<&TilePlacement> {
        self.tiles.iter().find(|t| t.offset == (dx, dy))
    }

    /// Number of placed tiles in `state`.
    pub fn count(&self, state: TileState) -> usize {
        self.tiles
            .iter()
            .filter(|t| t.state == Some(state))
            .count()
    }

    /// Whether every placed tile is `Ready` or `Failed`.
    pub fn is_settled(&self) -> bool {
        self.tiles
            .iter()
            .filter_map(|t| t.state)
            .all(TileState::is_settled)
    }
}
