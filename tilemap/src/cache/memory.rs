//! In-memory tile cache.
//!
//! Holds one [`Tile`] record per key for the life of the process. There is
//! no eviction: memory grows with every distinct tile that has been looked
//! at. Callers that need bounded memory must drop and rebuild the cache.
//!
//! The cache is owned by the consuming thread. Fetch workers never touch it;
//! their results reach it through the fetcher's `drain`, which calls
//! [`TileCache::promote`] and [`TileCache::mark_failed`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use super::disk::DiskLayout;
use super::placeholder::loading_placeholder;
use crate::tile::{Tile, TileImage, TileKey, TileState};

/// Result of a cache lookup.
#[derive(Debug, Clone)]
pub struct TileLookup {
    /// Current state of the tile.
    pub state: TileState,
    /// The tile image when `Ready`, the shared placeholder otherwise.
    pub image: TileImage,
    /// Set only by the lookup that created the entry: the caller should
    /// submit a fetch for it.
    pub needs_fetch: bool,
}

/// Number of tiles in each state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub pending: usize,
    pub loading: usize,
    pub ready: usize,
    pub failed: usize,
}

impl StateCounts {
    pub fn total(&self) -> usize {
        self.pending + self.loading + self.ready + self.failed
    }
}

/// Lookup counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupStats {
    pub memory_hits: u64,
    pub disk_hits: u64,
    pub misses: u64,
}

/// Two-level tile cache: a map of tile records in front of the disk layout.
pub struct TileCache {
    tiles: HashMap<TileKey, Tile>,
    disk: Arc<DiskLayout>,
    max_attempts: u32,
    stats: LookupStats,
}

impl TileCache {
    /// Creates an empty cache over `disk`.
    ///
    /// `max_attempts` seeds the retry budget recorded on new tiles.
    pub fn new(disk: Arc<DiskLayout>, max_attempts: u32) -> Self {
        Self {
            tiles: HashMap::new(),
            disk,
            max_attempts,
            stats: LookupStats::default(),
        }
    }

    /// The disk layout backing this cache.
    pub fn disk(&self) -> &Arc<DiskLayout> {
        &self.disk
    }

    /// Looks up a tile, creating its record on first reference.
    ///
    /// A tile unknown to memory is read from disk; a usable file makes it
    /// `Ready` immediately. Otherwise a `Pending` record is created and
    /// `needs_fetch` is set. Repeated lookups of a tile that is not `Ready`
    /// return the same state and the same placeholder instance and never
    /// ask for a second fetch.
    pub fn get(&mut self, key: &TileKey) -> TileLookup {
        if let Some(tile) = self.tiles.get(key) {
            self.stats.memory_hits += 1;
            return Self::lookup_of(tile, false);
        }

        let tile = match self.disk.load(key) {
            Some(image) => {
                self.stats.disk_hits += 1;
                trace!(tile = %key, "Disk cache hit");
                Tile::ready(*key, image)
            }
            None => {
                self.stats.misses += 1;
                Tile::pending(*key, self.max_attempts)
            }
        };
        let needs_fetch = tile.state() == TileState::Pending;
        let lookup = Self::lookup_of(&tile, needs_fetch);
        self.tiles.insert(*key, tile);
        lookup
    }

    /// Disk path of a tile.
    pub fn disk_path(&self, key: &TileKey) -> std::path::PathBuf {
        self.disk.path(key)
    }

    /// Marks a tile as having a fetch in flight.
    ///
    /// Returns whether the state changed. Unknown keys are ignored.
    pub fn mark_loading(&mut self, key: &TileKey) -> bool {
        self.tiles
            .get_mut(key)
            .map(Tile::begin_loading)
            .unwrap_or(false)
    }

    /// Stores a fetched image and marks the tile `Ready`.
    ///
    /// A key the cache does not track (for example after the cache was
    /// rebuilt) is inserted as `Ready` for later reuse. Returns whether
    /// anything changed.
    pub fn promote(&mut self, key: &TileKey, image: TileImage) -> bool {
        self.promote_after(key, image, 1)
    }

    /// Like [`promote`](Self::promote), recording how many attempts the fetch
    /// took.
    pub fn promote_after(&mut self, key: &TileKey, image: TileImage, attempts: u32) -> bool {
        match self.tiles.get_mut(key) {
            Some(tile) => tile.complete(image, attempts),
            None => {
                self.tiles.insert(*key, Tile::ready(*key, image));
                true
            }
        }
    }

    /// Marks a tile `Failed` after its fetch gave up.
    ///
    /// Returns whether the state changed. Unknown keys are ignored.
    pub fn mark_failed(&mut self, key: &TileKey) -> bool {
        self.tiles.get_mut(key).map(Tile::fail).unwrap_or(false)
    }

    /// Current state of a tile, if the cache knows it.
    pub fn state(&self, key: &TileKey) -> Option<TileState> {
        self.tiles.get(key).map(Tile::state)
    }

    /// Tile record, if the cache knows it.
    pub fn tile(&self, key: &TileKey) -> Option<&Tile> {
        self.tiles.get(key)
    }

    /// Number of tracked tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Number of tiles per state.
    pub fn counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for tile in self.tiles.values() {
            match tile.state() {
                TileState::Pending => counts.pending += 1,
                TileState::Loading => counts.loading += 1,
                TileState::Ready => counts.ready += 1,
                TileState::Failed => counts.failed += 1,
            }
        }
        counts
    }

    pub fn stats(&self) -> LookupStats {
        self.stats
    }

    fn lookup_of(tile: &Tile, needs_fetch: bool) -> TileLookup {
        let image = match (tile.state(), tile.image()) {
            (TileState::Ready, Some(image)) => image.clone(),
            _ => loading_placeholder(),
        };
        TileLookup {
            state: tile.state(),
            image,
            needs_fetch,
        }
    }
}
