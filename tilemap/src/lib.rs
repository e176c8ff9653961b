//! TileMap - slippy-map tile support
//!
//! Converts geographic coordinates into Web Mercator tile indices and panel
//! pixels, keeps a two-level (memory + disk) cache of tile images, and
//! downloads missing tiles on background worker threads without blocking the
//! thread that drives the view.
//!
//! # Modules
//!
//! - [`coord`]: coordinate math and circle rasterization
//! - [`layer`]: tile server table and mirror selection
//! - [`tile`]: tile identity and lifecycle
//! - [`cache`]: in-memory tile records over an on-disk layout
//! - [`fetcher`]: worker pool, retry policy and completion channel
//! - [`viewport`]: view state, tile window and renderable frame
//! - [`config`], [`logging`], [`telemetry`], [`error`]: application plumbing
//!
//! # Example
//!
//! ```ignore
//! use tilemap::config::MapConfig;
//! use tilemap::viewport::MapViewport;
//!
//! let config = MapConfig::load()?;
//! let mut viewport = MapViewport::from_config(&config)?;
//! loop {
//!     if viewport.tick() {
//!         paint(viewport.frame());
//!     }
//!     std::thread::sleep(viewport.refresh_interval());
//! }
//! ```

pub mod cache;
pub mod config;
pub mod coord;
pub mod error;
pub mod fetcher;
pub mod layer;
pub mod logging;
pub mod telemetry;
pub mod tile;
pub mod viewport;

pub use error::MapError;
