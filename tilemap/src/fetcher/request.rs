//! Messages exchanged with fetch workers.

use std::fmt;

use crate::layer::{LayerRegistry, MirrorSelector};
use crate::tile::{TileImage, TileKey};

/// A tile to download from a resolved URL.
///
/// Consumed exactly once by one worker. The mirror host is fixed when the
/// request is built, so every retry goes to the same URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub key: TileKey,
    pub url: String,
}

impl FetchRequest {
    pub fn new(key: TileKey, url: impl Into<String>) -> Self {
        Self {
            key,
            url: url.into(),
        }
    }

    /// Builds the request for `key` from its layer record.
    ///
    /// Returns `None` when the layer has no hosts configured.
    pub fn resolve(
        key: TileKey,
        registry: &LayerRegistry,
        selector: &MirrorSelector,
    ) -> Option<Self> {
        let url = registry.get(key.layer).resolve_url(&key, selector)?;
        Some(Self { key, url })
    }
}

/// Final outcome of one fetch request.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The tile was downloaded, decoded and written to disk.
    Ready { image: TileImage, attempts: u32 },
    /// Every attempt failed; `reason` describes the last failure.
    Failed { attempts: u32, reason: String },
}

impl FetchOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            FetchOutcome::Ready { attempts, .. } | FetchOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Completion record sent from a worker to the consumer.
#[derive(Debug, Clone)]
pub struct FetchCompletion {
    pub key: TileKey,
    pub outcome: FetchOutcome,
}

impl fmt::Display for FetchCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            FetchOutcome::Ready { attempts, .. } => {
                write!(f, "{} ready after {} attempt(s)", self.key, attempts)
            }
            FetchOutcome::Failed { attempts, reason } => {
                write!(f, "{} failed after {} attempt(s): {}", self.key, attempts, reason)
            }
        }
    }
}
