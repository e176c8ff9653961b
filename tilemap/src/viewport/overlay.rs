//! Overlay primitives supplied as geographic data.

use image::Rgba;

use crate::coord::GeoPoint;

/// A labelled marker.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPoint {
    pub label: String,
    pub position: GeoPoint,
    pub color: Rgba<u8>,
}

impl OverlayPoint {
    pub fn new(label: impl Into<String>, position: GeoPoint, color: Rgba<u8>) -> Self {
        Self {
            label: label.into(),
            position,
            color,
        }
    }
}

/// A bounding box given by two opposite corners.
///
/// The corners are expected as north-west and south-east, but swapped
/// corners still produce a valid box on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRect {
    pub north_west: GeoPoint,
    pub south_east: GeoPoint,
    pub color: Rgba<u8>,
}

impl OverlayRect {
    pub fn new(north_west: GeoPoint, south_east: GeoPoint, color: Rgba<u8>) -> Self {
        Self {
            north_west,
            south_east,
            color,
        }
    }

    /// Midpoint of the two corners in degrees.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            self.north_west.lat + (self.south_east.lat - self.north_west.lat) / 2.0,
            self.north_west.lon + (self.south_east.lon - self.north_west.lon) / 2.0,
        )
    }
}

/// A circle around a geographic point with a radius in screen pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayCircle {
    pub center: GeoPoint,
    pub radius: u32,
    pub color: Rgba<u8>,
}

impl OverlayCircle {
    pub fn new(center: GeoPoint, radius: u32, color: Rgba<u8>) -> Self {
        Self {
            center,
            radius,
            color,
        }
    }
}

/// Uniform grey wash drawn over the whole panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreyedOverlay {
    /// Grey level used for all three color channels.
    pub grey: u8,
    pub alpha: u8,
}

impl GreyedOverlay {
    pub fn new(grey: u8, alpha: u8) -> Self {
        Self { grey, alpha }
    }

    pub fn color(&self) -> Rgba<u8> {
        Rgba([self.grey, self.grey, self.grey, self.alpha])
    }
}
