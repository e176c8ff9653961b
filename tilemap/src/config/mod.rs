//! Application configuration.
//!
//! [`MapConfig`] gathers everything needed to open a map: cache location,
//! fetcher settings, the initial view and the layer table. Settings are read
//! from an INI file; every key is optional and falls back to its default.
//!
//! ```ini
//! [map]
//! layer = mapnik
//! seed = 42
//!
//! [cache]
//! directory = ~/.cache/tilemap
//!
//! [fetcher]
//! workers = 2
//! connections_per_worker = 3
//! max_attempts = 3
//! timeout = 30
//!
//! [viewport]
//! lat = 52.382463
//! lon = 9.717836
//! zoom = 17
//! width = 800
//! height = 600
//! refresh_ms = 500
//!
//! [layer.mapnik]
//! hosts = a.tile.openstreetmap.org, b.tile.openstreetmap.org
//! path = /
//! workers = 1
//! connections_per_worker = 3
//! ```
//!
//! Configuration is read-only; nothing is ever written back.

mod parser;

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::fetcher::FetcherConfig;
use crate::layer::{LayerId, LayerRegistry};
use crate::viewport::ViewportConfig;

/// Name of the per-user directory for cache and configuration.
pub const APP_DIR_NAME: &str = "tilemap";

/// Configuration file name inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse the config file
    #[error("Failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Pool sizes set explicitly in `[fetcher]` or through
/// [`MapConfig::with_fetcher`].
///
/// Fields left `None` follow the active layer's
/// [`FetchLimits`](crate::layer::FetchLimits).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolOverrides {
    pub workers: Option<usize>,
    pub connections_per_worker: Option<usize>,
}

/// Everything needed to open a map.
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Root of the on-disk tile cache.
    pub cache_dir: PathBuf,

    /// Worker pool and retry settings.
    pub fetcher: FetcherConfig,

    /// Pool sizes that win over the active layer's limits.
    pub pool_overrides: PoolOverrides,

    /// Initial view, including the active layer.
    pub viewport: ViewportConfig,

    /// Layer table, with any per-layer overrides applied.
    pub layers: LayerRegistry,

    /// Fixed seed for mirror selection; random when `None`.
    pub mirror_seed: Option<u64>,
}

impl Default for MapConfig {
    fn default() -> Self {
        let layers = LayerRegistry::new();
        let viewport = ViewportConfig::default();
        let fetcher = FetcherConfig::from_limits(layers.get(viewport.layer).limits);
        Self {
            cache_dir: default_cache_dir(),
            fetcher,
            pool_overrides: PoolOverrides::default(),
            viewport,
            layers,
            mirror_seed: None,
        }
    }
}

impl MapConfig {
    /// Load configuration from the default path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parser::parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(content).map_err(ini::Error::Parse)?;
        parser::parse_ini(&ini)
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Replaces the fetcher settings; its pool sizes then stay fixed when
    /// the layer changes.
    pub fn with_fetcher(mut self, fetcher: FetcherConfig) -> Self {
        self.pool_overrides = PoolOverrides {
            workers: Some(fetcher.workers),
            connections_per_worker: Some(fetcher.connections_per_worker),
        };
        self.fetcher = fetcher;
        self
    }

    pub fn with_viewport(mut self, viewport: ViewportConfig) -> Self {
        self.viewport = viewport;
        self
    }

    /// Makes `layer` the active layer and sizes the pool from its limits.
    pub fn with_layer(mut self, layer: LayerId) -> Self {
        self.viewport.layer = layer;
        self.apply_layer_limits();
        self
    }

    /// Sizes the fetcher pool from the active layer's limits, keeping any
    /// explicit [`PoolOverrides`]. Retry and timeout are left alone.
    pub fn apply_layer_limits(&mut self) {
        let limits = self.layers.get(self.viewport.layer).limits;
        self.fetcher.workers = self.pool_overrides.workers.unwrap_or(limits.workers);
        self.fetcher.connections_per_worker = self
            .pool_overrides
            .connections_per_worker
            .unwrap_or(limits.connections_per_worker);
    }

    pub fn with_mirror_seed(mut self, seed: u64) -> Self {
        self.mirror_seed = Some(seed);
        self
    }
}

/// Default tile cache root: the platform cache directory plus `tilemap`.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join(APP_DIR_NAME)
}

/// Get the path to the config directory.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Get the path to the config file.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::FetchLimits;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = MapConfig::default();
        assert!(config.cache_dir.ends_with(APP_DIR_NAME));
        assert_eq!(config.fetcher.workers, 1);
        assert_eq!(config.fetcher.connections_per_worker, 3);
        assert_eq!(config.fetcher.retry.max_attempts(), 3);
        assert_eq!(config.viewport.layer, LayerId::Mapnik);
        assert_eq!(config.viewport.zoom, 17);
        assert_eq!(config.viewport.refresh_interval, Duration::from_millis(500));
        assert!(config.mirror_seed.is_none());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let config = MapConfig::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config.viewport, ViewportConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[viewport]\nzoom = 12\n\n[cache]\ndirectory = /tmp/tiles\n").unwrap();

        let config = MapConfig::load_from(&path).unwrap();
        assert_eq!(config.viewport.zoom, 12);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/tiles"));
    }

    #[test]
    fn test_builders() {
        let config = MapConfig::default()
            .with_cache_dir("/var/cache/tiles")
            .with_layer(LayerId::Oam)
            .with_mirror_seed(9)
            .with_fetcher(FetcherConfig::default().with_workers(3));
        assert_eq!(config.cache_dir, PathBuf::from("/var/cache/tiles"));
        assert_eq!(config.viewport.layer, LayerId::Oam);
        assert_eq!(config.mirror_seed, Some(9));
        assert_eq!(config.fetcher.workers, 3);
    }

    #[test]
    fn test_with_layer_follows_layer_limits() {
        let mut config = MapConfig::default();
        let mut oam = config.layers.get(LayerId::Oam).clone();
        oam.limits = FetchLimits {
            workers: 4,
            connections_per_worker: 6,
        };
        config.layers.replace(LayerId::Oam, oam);

        let config = config
            .with_fetcher(FetcherConfig::default().with_timeout(Duration::from_secs(5)))
            .with_layer(LayerId::Oam);
        // with_fetcher pinned the pool sizes.
        assert_eq!(config.fetcher.workers, 1);

        let mut config = MapConfig {
            pool_overrides: PoolOverrides::default(),
            ..config
        }
        .with_layer(LayerId::Oam);
        assert_eq!(config.fetcher.workers, 4);
        assert_eq!(config.fetcher.connections_per_worker, 6);
        assert_eq!(config.fetcher.timeout, Duration::from_secs(5));

        config.pool_overrides.connections_per_worker = Some(2);
        let config = config.with_layer(LayerId::Mapnik).with_layer(LayerId::Oam);
        assert_eq!(config.fetcher.workers, 4);
        assert_eq!(config.fetcher.connections_per_worker, 2);
    }

    #[test]
    fn test_invalid_value_display() {
        let err = ConfigError::InvalidValue {
            section: "viewport".to_string(),
            key: "zoom".to_string(),
            value: "x".to_string(),
            reason: "must be an integer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration: viewport.zoom = 'x' - must be an integer"
        );
    }
}
