//! Tile state machine.

use std::fmt;
use std::sync::Arc;

use image::DynamicImage;

use super::TileKey;

/// A decoded tile image, shared between the cache and rendered frames.
pub type TileImage = Arc<DynamicImage>;

/// Lifecycle state of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TileState {
    /// Known to the cache, no fetch submitted yet.
    Pending,
    /// A fetch request is queued or in flight.
    Loading,
    /// The image is available.
    Ready,
    /// Every fetch attempt failed. The placeholder stays on screen.
    Failed,
}

impl TileState {
    /// Whether the state allows moving to `next`.
    ///
    /// Only forward moves are allowed; staying put is not a transition.
    pub fn can_transition_to(self, next: TileState) -> bool {
        matches!(
            (self, next),
            (TileState::Pending, TileState::Loading)
                | (TileState::Pending, TileState::Ready)
                | (TileState::Loading, TileState::Ready)
                | (TileState::Loading, TileState::Failed)
        )
    }

    /// Whether the tile will not change state again.
    pub fn is_settled(self) -> bool {
        matches!(self, TileState::Ready | TileState::Failed)
    }
}

impl fmt::Display for TileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TileState::Pending => "pending",
            TileState::Loading => "loading",
            TileState::Ready => "ready",
            TileState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Cache record for one tile.
#[derive(Debug, Clone)]
pub struct Tile {
    key: TileKey,
    state: TileState,
    image: Option<TileImage>,
    retries_remaining: u32,
}

impl Tile {
    /// A tile that has not been fetched yet.
    pub fn pending(key: TileKey, retries: u32) -> Self {
        Self {
            key,
            state: TileState::Pending,
            image: None,
            retries_remaining: retries,
        }
    }

    /// A tile whose image is already known.
    pub fn ready(key: TileKey, image: TileImage) -> Self {
        Self {
            key,
            state: TileState::Ready,
            image: Some(image),
            retries_remaining: 0,
        }
    }

    pub fn key(&self) -> &TileKey {
        &self.key
    }

    pub fn state(&self) -> TileState {
        self.state
    }

    /// The decoded image, present only when `Ready`.
    pub fn image(&self) -> Option<&TileImage> {
        self.image.as_ref()
    }

    pub fn retries_remaining(&self) -> u32 {
        self.retries_remaining
    }

    /// `Pending → Loading`. Returns whether the state changed.
    pub fn begin_loading(&mut self) -> bool {
        self.advance(TileState::Loading)
    }

    /// Stores the image and moves to `Ready`. Returns whether the state
    /// changed; a `Failed` or already `Ready` tile is left untouched.
    pub fn complete(&mut self, image: TileImage, attempts: u32) -> bool {
        if !self.advance(TileState::Ready) {
            return false;
        }
        self.image = Some(image);
        self.retries_remaining = self.retries_remaining.saturating_sub(attempts);
        true
    }

    /// Moves to `Failed`. Returns whether the state changed.
    pub fn fail(&mut self) -> bool {
        if !self.advance(TileState::Failed) {
            return false;
        }
        self.retries_remaining = 0;
        true
    }

    fn advance(&mut self, next: TileState) -> bool {
        if self.state.can_transition_to(next) {
            self.state = next;
            true
        } else {
            false
        }
    }
}
