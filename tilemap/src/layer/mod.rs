//! Tile layer registry.
//!
//! A layer is a family of tile servers publishing the same imagery under the
//! same URL scheme. The registry maps each [`LayerId`] to its [`TileLayer`]
//! record: mirror hosts, path template, image format and fetch limits.
//!
//! # URL Format
//!
//! ```text
//! http://{host}{path_template}{zoom}/{x}/{y}.{ext}
//! ```
//!
//! `{host}` is picked per request from the layer's mirrors by a
//! [`MirrorSelector`].

mod mirror;

pub use mirror::MirrorSelector;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::tile::TileKey;

/// Default number of fetch worker threads per layer.
pub const DEFAULT_WORKERS: usize = 1;

/// Default outbound connection limit for each worker.
pub const DEFAULT_CONNECTIONS_PER_WORKER: usize = 3;

/// Identifies a tile layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum LayerId {
    /// OpenStreetMap standard style, served by three mirrors.
    #[default]
    Mapnik,
    /// OpenStreetMap standard style from the old single-host endpoint.
    MapnikLegacy,
    /// Tiles@home hill-shaded rendering.
    Tah,
    /// OpenAerialMap imagery.
    Oam,
}

impl LayerId {
    /// All known layers.
    pub const ALL: [LayerId; 4] = [
        LayerId::Mapnik,
        LayerId::MapnikLegacy,
        LayerId::Tah,
        LayerId::Oam,
    ];

    /// Short name used in cache paths and configuration.
    pub fn name(&self) -> &'static str {
        match self {
            LayerId::Mapnik => "mapnik",
            LayerId::MapnikLegacy => "mapnikold",
            LayerId::Tah => "tah",
            LayerId::Oam => "oam",
        }
    }

    /// Whether the layer carries aerial imagery rather than rendered maps.
    pub fn is_imagery(&self) -> bool {
        matches!(self, LayerId::Oam)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a layer name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown tile layer '{0}' (expected one of: mapnik, mapnikold, tah, oam)")]
pub struct UnknownLayer(pub String);

impl FromStr for LayerId {
    type Err = UnknownLayer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mapnik" => Ok(LayerId::Mapnik),
            "mapnikold" => Ok(LayerId::MapnikLegacy),
            "tah" => Ok(LayerId::Tah),
            "oam" => Ok(LayerId::Oam),
            other => Err(UnknownLayer(other.to_string())),
        }
    }
}

/// Encoded image format served by a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileFormat {
    Png,
    Jpeg,
}

impl TileFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            TileFormat::Png => "png",
            TileFormat::Jpeg => "jpg",
        }
    }

    /// `jpg` for imagery layers, `png` for everything else.
    pub fn for_layer(id: LayerId) -> Self {
        if id.is_imagery() {
            TileFormat::Jpeg
        } else {
            TileFormat::Png
        }
    }
}

/// Fetch concurrency limits attached to a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    /// Number of worker threads.
    pub workers: usize,
    /// Outbound connections each worker may keep open.
    pub connections_per_worker: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            connections_per_worker: DEFAULT_CONNECTIONS_PER_WORKER,
        }
    }
}

/// Configuration record for one tile layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    /// Interchangeable mirror hosts (may include a port).
    pub hosts: Vec<String>,
    /// Path prefix placed between the host and `{zoom}/{x}/{y}.{ext}`.
    pub path_template: String,
    /// Image format, which also decides the file extension.
    pub format: TileFormat,
    /// Fetch concurrency limits.
    pub limits: FetchLimits,
}

impl TileLayer {
    /// Creates a layer record with default limits.
    pub fn new(
        hosts: impl IntoIterator<Item = impl Into<String>>,
        path_template: impl Into<String>,
        format: TileFormat,
    ) -> Self {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
            path_template: path_template.into(),
            format,
            limits: FetchLimits::default(),
        }
    }

    /// Builds the tile URL against a specific host.
    pub fn url_for_host(&self, host: &str, key: &TileKey) -> String {
        format!(
            "http://{}{}{}/{}/{}.{}",
            host,
            self.path_template,
            key.zoom,
            key.x,
            key.y,
            self.format.extension()
        )
    }

    /// Builds the tile URL, picking a mirror with `selector`.
    ///
    /// Returns `None` when the layer has no hosts configured.
    pub fn resolve_url(&self, key: &TileKey, selector: &MirrorSelector) -> Option<String> {
        let host = selector.choose(&self.hosts)?;
        Some(self.url_for_host(host, key))
    }
}

/// Static table of tile layers.
#[derive(Debug, Clone)]
pub struct LayerRegistry {
    layers: HashMap<LayerId, TileLayer>,
}

impl LayerRegistry {
    /// Creates a registry with the built-in layer table.
    pub fn new() -> Self {
        let mut layers = HashMap::new();
        layers.insert(
            LayerId::Mapnik,
            TileLayer::new(
                [
                    "a.tile.openstreetmap.org",
                    "b.tile.openstreetmap.org",
                    "c.tile.openstreetmap.org",
                ],
                "/",
                TileFormat::for_layer(LayerId::Mapnik),
            ),
        );
        layers.insert(
            LayerId::MapnikLegacy,
            TileLayer::new(
                ["tile.openstreetmap.org"],
                "/mapnik/",
                TileFormat::for_layer(LayerId::MapnikLegacy),
            ),
        );
        layers.insert(
            LayerId::Tah,
            TileLayer::new(
                ["cassini.toolserver.org:8080"],
                "/http://a.tile.openstreetmap.org/+http://toolserver.org/~cmarqu/hill/",
                TileFormat::for_layer(LayerId::Tah),
            ),
        );
        layers.insert(
            LayerId::Oam,
            TileLayer::new(
                ["oam1.hypercube.telascience.org"],
                "/tiles/1.0.0/openaerialmap-900913/",
                TileFormat::for_layer(LayerId::Oam),
            ),
        );
        Self { layers }
    }

    /// Looks up a layer record. Every [`LayerId`] has an entry.
    pub fn get(&self, id: LayerId) -> &TileLayer {
        // `new` fills every id and `replace` never removes one.
        &self.layers[&id]
    }

    /// Replaces the record of one layer.
    pub fn replace(&mut self, id: LayerId, layer: TileLayer) {
        self.layers.insert(id, layer);
    }

    /// File extension for tiles of `id`.
    pub fn extension(&self, id: LayerId) -> &'static str {
        self.get(id).format.extension()
    }
}

impl Default for LayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
