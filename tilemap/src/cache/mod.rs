//! Two-level tile cache.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │        TileCache         │   TileKey → Tile { state, image }
//! │  (memory, no eviction)   │
//! └────────────┬─────────────┘
//!              │ miss
//!              ▼
//! ┌──────────────────────────┐
//! │        DiskLayout        │   {root}/{layer}/{zoom}/{x}/{y}.{ext}
//! └──────────────────────────┘
//! ```
//!
//! Tiles that are not `Ready` are displayed with the shared
//! [`loading_placeholder`].

mod disk;
mod memory;
mod placeholder;

pub use disk::DiskLayout;
pub use memory::{LookupStats, StateCounts, TileCache, TileLookup};
pub use placeholder::{generate_placeholder, is_placeholder, loading_placeholder};
