//! Shared "loading" placeholder image.
//!
//! Every tile that is not `Ready` renders as the same fully transparent
//! 256×256 image, so the panel background shows through until the real
//! image arrives. One instance is built on first use and shared by `Arc`
//! for the lifetime of the process.

use std::sync::{Arc, OnceLock};

use image::{DynamicImage, Rgba, RgbaImage};

use crate::coord::TILE_SIZE;
use crate::tile::TileImage;

static LOADING_PLACEHOLDER: OnceLock<TileImage> = OnceLock::new();

/// Builds a fully transparent tile-sized image.
pub fn generate_placeholder(size: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 0])))
}

/// The process-wide loading placeholder.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tilemap::cache::loading_placeholder;
///
/// let a = loading_placeholder();
/// let b = loading_placeholder();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
pub fn loading_placeholder() -> TileImage {
    LOADING_PLACEHOLDER
        .get_or_init(|| Arc::new(generate_placeholder(TILE_SIZE)))
        .clone()
}

/// Whether `image` is the shared placeholder instance.
pub fn is_placeholder(image: &TileImage) -> bool {
    Arc::ptr_eq(image, &loading_placeholder())
}
