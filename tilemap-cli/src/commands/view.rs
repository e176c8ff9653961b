//! View command - run a map viewport without a window.
//!
//! Opens the viewport the same way an interactive panel would, then ticks it
//! on its refresh interval until every visible tile is settled, the timeout
//! expires, or the user presses Ctrl+C. Downloaded tiles stay in the disk
//! cache, so this doubles as a way to pre-seed an area.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use tilemap::config::MapConfig;
use tilemap::coord::{GeoPoint, MAX_ZOOM};
use tilemap::layer::LayerId;
use tilemap::tile::TileState;
use tilemap::viewport::MapViewport;
use tracing::{info, warn};

use crate::error::CliError;

/// Arguments for the view command.
#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Center latitude (default: from configuration)
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Center longitude (default: from configuration)
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Zoom level (0-18)
    #[arg(long)]
    pub zoom: Option<u8>,

    /// Panel width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Panel height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Tile layer (mapnik, mapnikold, tah, oam)
    #[arg(long)]
    pub layer: Option<LayerId>,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Cache directory (default: from configuration)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

/// How a viewport run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    Settled,
    /// Nothing in flight, yet some tiles were never submitted.
    Stalled,
    TimedOut,
    Interrupted,
}

/// Run the view command.
pub fn run(args: &ViewArgs, config: MapConfig, out: &mut impl Write) -> Result<(), CliError> {
    let config = apply_args(args, config)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!(error = %e, "Could not install Ctrl+C handler");
    }

    let mut viewport = MapViewport::from_config(&config)?;
    writeln!(
        out,
        "Viewing {:.6}, {:.6} at zoom {} ({}x{}, layer {})",
        viewport.center().lat,
        viewport.center().lon,
        viewport.zoom(),
        viewport.panel_size().0,
        viewport.panel_size().1,
        viewport.layer()
    )?;
    writeln!(out, "Cache: {}", config.cache_dir.display())?;

    let end = drive(
        &mut viewport,
        Duration::from_secs(args.timeout_secs),
        &interrupted,
    );
    viewport.shutdown();
    write_summary(&viewport, end, out)
}

/// Applies command-line overrides on top of the loaded configuration.
fn apply_args(args: &ViewArgs, mut config: MapConfig) -> Result<MapConfig, CliError> {
    if let Some(zoom) = args.zoom {
        if zoom > MAX_ZOOM {
            return Err(CliError::InvalidArgument(format!(
                "zoom {} is above the maximum of {}",
                zoom, MAX_ZOOM
            )));
        }
        config.viewport.zoom = zoom;
    }

    let center = config.viewport.center;
    config.viewport.center = GeoPoint::clamped(
        args.lat.unwrap_or(center.lat),
        args.lon.unwrap_or(center.lon),
    );
    if let Some(width) = args.width {
        config.viewport.width = width;
    }
    if let Some(height) = args.height {
        config.viewport.height = height;
    }
    if let Some(layer) = args.layer {
        config = config.with_layer(layer);
    }
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = dir.clone();
    }
    Ok(config)
}

/// Ticks the viewport until nothing is outstanding or the run is cut short.
pub fn drive(viewport: &mut MapViewport, timeout: Duration, interrupted: &AtomicBool) -> RunEnd {
    let deadline = Instant::now() + timeout;
    let interval = viewport.refresh_interval();

    loop {
        if viewport.tick() {
            let counts = viewport.cache().counts();
            info!(
                ready = counts.ready,
                failed = counts.failed,
                outstanding = viewport.outstanding(),
                "Frame updated"
            );
        }
        if viewport.outstanding() == 0 {
            return if viewport.frame().is_settled() {
                RunEnd::Settled
            } else {
                RunEnd::Stalled
            };
        }
        if interrupted.load(Ordering::SeqCst) {
            return RunEnd::Interrupted;
        }
        if Instant::now() >= deadline {
            return RunEnd::TimedOut;
        }
        std::thread::sleep(interval.min(deadline.saturating_duration_since(Instant::now())));
    }
}

fn write_summary(viewport: &MapViewport, end: RunEnd, out: &mut impl Write) -> Result<(), CliError> {
    let frame = viewport.frame();
    let lookups = viewport.cache().stats();

    writeln!(out)?;
    match end {
        RunEnd::Settled => writeln!(out, "All visible tiles settled.")?,
        RunEnd::Stalled => writeln!(out, "Some tiles could not be requested.")?,
        RunEnd::TimedOut => writeln!(out, "Timed out with downloads outstanding.")?,
        RunEnd::Interrupted => writeln!(out, "Interrupted.")?,
    }
    writeln!(out, "Visible tiles:  {}", frame.keys().count())?;
    writeln!(out, "  Ready:        {}", frame.count(TileState::Ready))?;
    writeln!(out, "  Failed:       {}", frame.count(TileState::Failed))?;
    writeln!(out, "  Loading:      {}", frame.count(TileState::Loading))?;
    writeln!(out, "  Pending:      {}", frame.count(TileState::Pending))?;
    writeln!(
        out,
        "Lookups:        {} memory, {} disk, {} missed",
        lookups.memory_hits, lookups.disk_hits, lookups.misses
    )?;
    writeln!(out, "Downloads:      {}", viewport.fetch_stats())?;
    Ok(())
}
