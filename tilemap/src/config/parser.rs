//! INI parsing logic for converting `Ini` → `MapConfig`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use super::{ConfigError, MapConfig};
use crate::coord::{GeoPoint, MAX_ZOOM};
use crate::fetcher::RetryPolicy;
use crate::layer::LayerId;

/// Prefix of per-layer sections, e.g. `[layer.mapnik]`.
const LAYER_SECTION_PREFIX: &str = "layer.";

/// Parse an `Ini` object into a `MapConfig`.
///
/// Starts from `MapConfig::default()` and overlays any values found in the
/// INI. Layer sections are applied before `[fetcher]` so that explicit
/// fetcher settings win over the active layer's limits.
pub(super) fn parse_ini(ini: &Ini) -> Result<MapConfig, ConfigError> {
    let mut config = MapConfig::default();

    // [layer.<name>] sections
    for (name, section) in ini.iter() {
        let Some(layer_name) = name.and_then(|n| n.strip_prefix(LAYER_SECTION_PREFIX)) else {
            continue;
        };
        let section_name = format!("{}{}", LAYER_SECTION_PREFIX, layer_name);
        let id: LayerId = layer_name.parse().map_err(|e: crate::layer::UnknownLayer| {
            ConfigError::InvalidValue {
                section: section_name.clone(),
                key: String::new(),
                value: layer_name.to_string(),
                reason: e.to_string(),
            }
        })?;

        let mut layer = config.layers.get(id).clone();
        if let Some(v) = section.get("hosts") {
            let hosts: Vec<String> = v
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(String::from)
                .collect();
            if hosts.is_empty() {
                return Err(invalid(&section_name, "hosts", v, "must list at least one host"));
            }
            layer.hosts = hosts;
        }
        if let Some(v) = section.get("path") {
            let v = v.trim();
            if !v.starts_with('/') || !v.ends_with('/') {
                return Err(invalid(&section_name, "path", v, "must start and end with '/'"));
            }
            layer.path_template = v.to_string();
        }
        if let Some(v) = section.get("workers") {
            layer.limits.workers =
                parse_positive(&section_name, "workers", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("connections_per_worker") {
            layer.limits.connections_per_worker = parse_positive(
                &section_name,
                "connections_per_worker",
                v,
                "must be a positive integer",
            )?;
        }
        config.layers.replace(id, layer);
    }

    // [map] section
    if let Some(section) = ini.section(Some("map")) {
        if let Some(v) = section.get("layer") {
            config.viewport.layer = v
                .parse()
                .map_err(|e: crate::layer::UnknownLayer| invalid("map", "layer", v, &e.to_string()))?;
        }
        if let Some(v) = section.get("seed") {
            config.mirror_seed = Some(parse_value("map", "seed", v, "must be an unsigned integer")?);
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.cache_dir = expand_tilde(v);
            }
        }
    }

    // [fetcher] section
    if let Some(section) = ini.section(Some("fetcher")) {
        parse_fetcher(section, &mut config)?;
    }
    config.apply_layer_limits();

    // [viewport] section
    if let Some(section) = ini.section(Some("viewport")) {
        let mut lat = config.viewport.center.lat;
        let mut lon = config.viewport.center.lon;
        if let Some(v) = section.get("lat") {
            lat = parse_value("viewport", "lat", v, "must be a number of degrees")?;
            if !(-90.0..=90.0).contains(&lat) {
                return Err(invalid("viewport", "lat", v, "must be between -90 and 90"));
            }
        }
        if let Some(v) = section.get("lon") {
            lon = parse_value("viewport", "lon", v, "must be a number of degrees")?;
            if !(-180.0..=180.0).contains(&lon) {
                return Err(invalid("viewport", "lon", v, "must be between -180 and 180"));
            }
        }
        config.viewport.center = GeoPoint::new(lat, lon);

        if let Some(v) = section.get("zoom") {
            let zoom: u8 = parse_value("viewport", "zoom", v, "must be an integer from 0 to 18")?;
            if zoom > MAX_ZOOM {
                return Err(invalid("viewport", "zoom", v, "must be an integer from 0 to 18"));
            }
            config.viewport.zoom = zoom;
        }
        if let Some(v) = section.get("width") {
            config.viewport.width = parse_value("viewport", "width", v, "must be a pixel count")?;
        }
        if let Some(v) = section.get("height") {
            config.viewport.height = parse_value("viewport", "height", v, "must be a pixel count")?;
        }
        if let Some(v) = section.get("refresh_ms") {
            let ms: u64 = parse_positive("viewport", "refresh_ms", v, "must be a positive integer (milliseconds)")?;
            config.viewport.refresh_interval = Duration::from_millis(ms);
        }
    }

    Ok(config)
}

fn parse_fetcher(section: &Properties, config: &mut MapConfig) -> Result<(), ConfigError> {
    if let Some(v) = section.get("workers") {
        config.pool_overrides.workers =
            Some(parse_positive("fetcher", "workers", v, "must be a positive integer")?);
    }
    if let Some(v) = section.get("connections_per_worker") {
        config.pool_overrides.connections_per_worker = Some(parse_positive(
            "fetcher",
            "connections_per_worker",
            v,
            "must be a positive integer",
        )?);
    }
    let fetcher = &mut config.fetcher;
    if let Some(v) = section.get("max_attempts") {
        let attempts: u32 =
            parse_positive("fetcher", "max_attempts", v, "must be a positive integer")?;
        fetcher.retry = RetryPolicy::immediate(attempts);
    }
    if let Some(v) = section.get("timeout") {
        let secs: u64 =
            parse_positive("fetcher", "timeout", v, "must be a positive integer (seconds)")?;
        fetcher.timeout = Duration::from_secs(secs);
    }
    Ok(())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: FromStr>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_positive<T>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let parsed: T = parse_value(section, key, value, reason)?;
    if parsed <= T::default() {
        return Err(invalid(section, key, value, reason));
    }
    Ok(parsed)
}

/// Expand `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::TileFormat;

    fn parse(content: &str) -> Result<MapConfig, ConfigError> {
        MapConfig::from_ini_str(content)
    }

    fn invalid_key(err: ConfigError) -> (String, String) {
        match err {
            ConfigError::InvalidValue { section, key, .. } => (section, key),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_is_default() {
        let config = parse("").unwrap();
        let default = MapConfig::default();
        assert_eq!(config.viewport, default.viewport);
        assert_eq!(config.fetcher, default.fetcher);
        assert_eq!(config.cache_dir, default.cache_dir);
    }

    #[test]
    fn test_full_file() {
        let config = parse(
            "[map]\nlayer = oam\nseed = 42\n\n\
             [cache]\ndirectory = /srv/tiles\n\n\
             [fetcher]\nworkers = 4\nconnections_per_worker = 2\nmax_attempts = 5\ntimeout = 10\n\n\
             [viewport]\nlat = 40.6984\nlon = -74.0415\nzoom = 16\nwidth = 1024\nheight = 768\nrefresh_ms = 250\n",
        )
        .unwrap();

        assert_eq!(config.viewport.layer, LayerId::Oam);
        assert_eq!(config.mirror_seed, Some(42));
        assert_eq!(config.cache_dir, PathBuf::from("/srv/tiles"));
        assert_eq!(config.fetcher.workers, 4);
        assert_eq!(config.fetcher.connections_per_worker, 2);
        assert_eq!(config.fetcher.retry.max_attempts(), 5);
        assert_eq!(config.fetcher.timeout, Duration::from_secs(10));
        assert_eq!(config.viewport.center, GeoPoint::new(40.6984, -74.0415));
        assert_eq!(config.viewport.zoom, 16);
        assert_eq!((config.viewport.width, config.viewport.height), (1024, 768));
        assert_eq!(config.viewport.refresh_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_layer_override() {
        let config = parse(
            "[layer.mapnik]\nhosts = tiles.example.org, tiles2.example.org\npath = /osm/\nworkers = 2\nconnections_per_worker = 6\n",
        )
        .unwrap();

        let layer = config.layers.get(LayerId::Mapnik);
        assert_eq!(layer.hosts, vec!["tiles.example.org", "tiles2.example.org"]);
        assert_eq!(layer.path_template, "/osm/");
        assert_eq!(layer.format, TileFormat::Png);
        assert_eq!(config.fetcher.workers, 2);
        assert_eq!(config.fetcher.connections_per_worker, 6);
    }

    #[test]
    fn test_fetcher_section_wins_over_layer_limits() {
        let config = parse("[layer.mapnik]\nworkers = 2\n\n[fetcher]\nworkers = 5\n").unwrap();
        assert_eq!(config.fetcher.workers, 5);
    }

    #[test]
    fn test_layer_chosen_later_brings_its_limits() {
        let content = "[layer.oam]\nworkers = 4\nconnections_per_worker = 6\n";
        let config = parse(content).unwrap().with_layer(LayerId::Oam);
        assert_eq!(config.fetcher.workers, 4);
        assert_eq!(config.fetcher.connections_per_worker, 6);

        let from_file = parse(&format!("[map]\nlayer = oam\n{content}")).unwrap();
        assert_eq!(from_file.fetcher, config.fetcher);

        let pinned = parse(&format!("{content}[fetcher]\nworkers = 2\n"))
            .unwrap()
            .with_layer(LayerId::Oam);
        assert_eq!(pinned.fetcher.workers, 2);
        assert_eq!(pinned.fetcher.connections_per_worker, 6);
    }

    #[test]
    fn test_inactive_layer_limits_ignored() {
        let config = parse("[layer.tah]\nworkers = 7\n").unwrap();
        assert_eq!(config.layers.get(LayerId::Tah).limits.workers, 7);
        assert_eq!(config.fetcher.workers, 1);
    }

    #[test]
    fn test_unknown_layer() {
        let (section, key) = invalid_key(parse("[map]\nlayer = satellite\n").unwrap_err());
        assert_eq!((section.as_str(), key.as_str()), ("map", "layer"));

        let err = parse("[layer.bogus]\nhosts = a\n").unwrap_err();
        assert_eq!(invalid_key(err).0, "layer.bogus");
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            ("[viewport]\nzoom = 19\n", "viewport", "zoom"),
            ("[viewport]\nzoom = -1\n", "viewport", "zoom"),
            ("[viewport]\nlat = 95\n", "viewport", "lat"),
            ("[viewport]\nlon = east\n", "viewport", "lon"),
            ("[viewport]\nrefresh_ms = 0\n", "viewport", "refresh_ms"),
            ("[fetcher]\nworkers = 0\n", "fetcher", "workers"),
            ("[fetcher]\nmax_attempts = many\n", "fetcher", "max_attempts"),
            ("[fetcher]\ntimeout = -5\n", "fetcher", "timeout"),
            ("[layer.oam]\nhosts = ,\n", "layer.oam", "hosts"),
            ("[layer.oam]\npath = tiles\n", "layer.oam", "path"),
        ];
        for (content, section, key) in cases {
            let err = parse(content).unwrap_err();
            assert_eq!(
                invalid_key(err),
                (section.to_string(), key.to_string()),
                "{content:?}"
            );
        }
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/tiles"), home.join("tiles"));
        }
    }
}
