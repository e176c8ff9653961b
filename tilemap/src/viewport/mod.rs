//! Map viewport controller.
//!
//! [`MapViewport`] owns the view state (center, zoom, panel size), decides
//! which tiles are visible, requests missing ones and publishes a [`Frame`]
//! for the caller to paint.
//!
//! ```text
//! mutator ─► recompute() ─► cache.get(key) ─┬─ hit ──► placement
//!                                           └─ miss ─► fetcher.enqueue()
//!
//! timer ──► tick() ─► fetcher.drain() ─► changed? ─► recompute(), redraw
//! ```
//!
//! All mutation happens on the caller's thread; `tick` is the only place
//! where downloaded tiles become visible.

mod controller;
mod frame;
mod overlay;

pub use controller::{visible_radius, MapViewport};
pub use frame::{
    CirclePlacement, Frame, PointPlacement, RectPlacement, TilePlacement, RECT_FILL_ALPHA,
};
pub use overlay::{GreyedOverlay, OverlayCircle, OverlayPoint, OverlayRect};

use std::time::Duration;

use crate::coord::GeoPoint;
use crate::layer::LayerId;

/// Default center: Leibniz Universität Hannover.
pub const DEFAULT_CENTER: GeoPoint = GeoPoint::new(52.382463, 9.717836);

pub const DEFAULT_ZOOM: u8 = 17;

pub const DEFAULT_WIDTH: u32 = 800;

pub const DEFAULT_HEIGHT: u32 = 600;

/// Default interval between fetch-completion polls.
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 500;

/// Initial view state and refresh settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportConfig {
    pub center: GeoPoint,
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
    pub layer: LayerId,
    /// How often the owner should call [`MapViewport::tick`].
    pub refresh_interval: Duration,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            layer: LayerId::default(),
            refresh_interval: Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS),
        }
    }
}

impl ViewportConfig {
    pub fn with_center(mut self, center: GeoPoint) -> Self {
        self.center = center;
        self
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_layer(mut self, layer: LayerId) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}

/// Keyboard-style panning direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    West,
    East,
}
