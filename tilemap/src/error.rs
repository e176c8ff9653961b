//! Map startup error types.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::fetcher::FetchError;

/// Errors that can occur while opening a map.
///
/// Only startup can fail. Once a [`MapViewport`](crate::viewport::MapViewport)
/// runs, download and cache problems degrade to placeholder tiles instead.
#[derive(Debug)]
pub enum MapError {
    /// Configuration could not be loaded.
    Config(ConfigError),

    /// The fetcher could not be started.
    Fetcher(FetchError),

    /// Cache directory could not be prepared.
    Io(io::Error),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Config(e) => write!(f, "Configuration error: {}", e),
            MapError::Fetcher(e) => write!(f, "Failed to start tile fetcher: {}", e),
            MapError::Io(e) => write!(f, "Failed to prepare tile cache: {}", e),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Config(e) => Some(e),
            MapError::Fetcher(e) => Some(e),
            MapError::Io(e) => Some(e),
        }
    }
}

impl From<ConfigError> for MapError {
    fn from(e: ConfigError) -> Self {
        MapError::Config(e)
    }
}

impl From<FetchError> for MapError {
    fn from(e: FetchError) -> Self {
        MapError::Fetcher(e)
    }
}

impl From<io::Error> for MapError {
    fn from(e: io::Error) -> Self {
        MapError::Io(e)
    }
}
