//! CLI command implementations.
//!
//! Each subcommand has its own module with its clap arguments and a `run`
//! function writing human-readable output to the given writer.
//!
//! # Command Modules
//!
//! - [`circle`] - Rasterized circle points
//! - [`index`] - Location to tile index conversion
//! - [`path`] - Cache path and server URLs of a tile
//! - [`view`] - Headless viewport run that downloads the visible tiles

pub mod circle;
pub mod index;
pub mod path;
pub mod view;
