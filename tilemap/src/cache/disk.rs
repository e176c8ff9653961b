//! On-disk tile layout.
//!
//! Tiles are stored as the raw bytes the server returned, one file per tile:
//!
//! ```text
//! {root}/{layer}/{zoom}/{x}/{y}.{ext}
//! ```
//!
//! The layout is deterministic and readable by other tools. Directories are
//! created on demand; a directory that already exists (possibly created by a
//! concurrent writer) is not an error.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::layer::{LayerId, LayerRegistry};
use crate::tile::{TileImage, TileKey};

/// Maps tile keys to files under a cache root.
#[derive(Debug, Clone)]
pub struct DiskLayout {
    root: PathBuf,
    extensions: HashMap<LayerId, &'static str>,
}

impl DiskLayout {
    /// Creates a layout rooted at `root`, taking file extensions from
    /// `registry`.
    pub fn new(root: impl Into<PathBuf>, registry: &LayerRegistry) -> Self {
        let extensions = LayerId::ALL
            .iter()
            .map(|&id| (id, registry.extension(id)))
            .collect();
        Self {
            root: root.into(),
            extensions,
        }
    }

    /// Root directory of the cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path of a tile. Pure; touches nothing on disk.
    pub fn path(&self, key: &TileKey) -> PathBuf {
        let ext = self.extensions.get(&key.layer).copied().unwrap_or("png");
        self.root
            .join(key.layer.name())
            .join(key.zoom.to_string())
            .join(key.x.to_string())
            .join(format!("{}.{}", key.y, ext))
    }

    /// Writes tile bytes to their path, creating directories as needed.
    ///
    /// The bytes go to a sibling `.part` file first and are renamed into
    /// place, so readers never observe a half-written tile.
    pub fn store(&self, key: &TileKey, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut partial = path.clone().into_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        fs::write(&partial, bytes)?;
        fs::rename(&partial, &path)?;
        Ok(path)
    }

    /// Reads and decodes a stored tile.
    ///
    /// A missing, unreadable or undecodable file is a miss.
    pub fn load(&self, key: &TileKey) -> Option<TileImage> {
        let path = self.path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Unreadable disk cache entry");
                return None;
            }
        };

        match image::load_from_memory(&bytes) {
            Ok(image) => Some(Arc::new(image)),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Malformed disk cache entry");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::encoded_png;
    use tempfile::TempDir;

    fn layout(dir: &TempDir) -> DiskLayout {
        DiskLayout::new(dir.path(), &LayerRegistry::new())
    }

    #[test]
    fn test_path_layout() {
        let layout = DiskLayout::new("/cache", &LayerRegistry::new());
        let key = TileKey::new(69074, 43067, 17, LayerId::Mapnik);
        assert_eq!(
            layout.path(&key),
            PathBuf::from("/cache/mapnik/17/69074/43067.png")
        );

        let key = TileKey::new(5, 6, 7, LayerId::Oam);
        assert_eq!(layout.path(&key), PathBuf::from("/cache/oam/7/5/6.jpg"));
    }

    #[test]
    fn test_store_creates_directories() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        let key = TileKey::new(1, 2, 3, LayerId::Mapnik);

        let path = layout.store(&key, b"bytes").unwrap();
        assert_eq!(path, dir.path().join("mapnik/3/1/2.png"));
        assert_eq!(fs::read(&path).unwrap(), b"bytes");
    }

    #[test]
    fn test_store_tolerates_existing_directories() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        fs::create_dir_all(dir.path().join("mapnik/3/1")).unwrap();

        layout
            .store(&TileKey::new(1, 2, 3, LayerId::Mapnik), b"a")
            .unwrap();
        layout
            .store(&TileKey::new(1, 3, 3, LayerId::Mapnik), b"b")
            .unwrap();
        assert!(dir.path().join("mapnik/3/1/3.png").exists());
    }

    #[test]
    fn test_store_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        let path = layout
            .store(&TileKey::new(1, 2, 3, LayerId::Mapnik), b"a")
            .unwrap();
        assert!(!path.with_extension("png.part").exists());
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        let key = TileKey::new(4, 5, 6, LayerId::Mapnik);

        layout.store(&key, &encoded_png(8)).unwrap();
        let image = layout.load(&key).expect("stored tile should load");
        assert_eq!(image.width(), 8);
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(layout(&dir)
            .load(&TileKey::new(4, 5, 6, LayerId::Mapnik))
            .is_none());
    }

    #[test]
    fn test_load_malformed_is_none() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        let key = TileKey::new(4, 5, 6, LayerId::Mapnik);
        layout.store(&key, b"<html>404</html>").unwrap();
        assert!(layout.load(&key).is_none());
    }
}
