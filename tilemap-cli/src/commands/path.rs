//! Path command - show where a tile lives on disk and on the servers.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use tilemap::cache::DiskLayout;
use tilemap::config::MapConfig;
use tilemap::layer::LayerId;
use tilemap::tile::TileKey;

use crate::error::CliError;

/// Arguments for the path command.
#[derive(Debug, Args)]
pub struct PathArgs {
    /// Tile column
    #[arg(long)]
    pub x: u32,

    /// Tile row
    #[arg(long)]
    pub y: u32,

    /// Zoom level (0-18)
    #[arg(long)]
    pub zoom: u8,

    /// Tile layer (mapnik, mapnikold, tah, oam)
    #[arg(long, default_value = "mapnik")]
    pub layer: LayerId,

    /// Cache directory (default: from configuration)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

/// Run the path command.
pub fn run(args: &PathArgs, config: &MapConfig, out: &mut impl Write) -> Result<(), CliError> {
    let key = TileKey::wrapped(args.x as i64, args.y as i64, args.zoom, args.layer)
        .filter(|key| key.x == args.x && key.zoom == args.zoom)
        .ok_or_else(|| {
            CliError::InvalidArgument(format!(
                "tile {}/{} does not exist at zoom {}",
                args.x, args.y, args.zoom
            ))
        })?;

    let cache_dir = args.cache_dir.as_ref().unwrap_or(&config.cache_dir);
    let disk = DiskLayout::new(cache_dir, &config.layers);
    let path = disk.path(&key);
    let layer = config.layers.get(key.layer);

    writeln!(out, "Tile:   {}", key)?;
    writeln!(
        out,
        "Cache:  {}{}",
        path.display(),
        if path.exists() { "" } else { " (not cached)" }
    )?;
    for host in &layer.hosts {
        writeln!(out, "URL:    {}", layer.url_for_host(host, &key))?;
    }
    Ok(())
}
