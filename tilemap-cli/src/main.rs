//! TileMap CLI - Command-line interface
//!
//! Headless access to the TileMap library: coordinate conversion, cache
//! paths, circle rasterization, and a viewport run that downloads the tiles
//! around a location into the disk cache.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tilemap::config::MapConfig;
use tilemap::logging::{default_log_dir, default_log_file, init_logging, LogOptions};

use commands::{circle, index, path, view};
use error::CliError;

#[derive(Parser)]
#[command(name = "tilemap")]
#[command(version, about = "Web Mercator tile cache and fetcher", long_about = None)]
struct Cli {
    /// Configuration file (default: platform config dir, tilemap/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to a file (default location when given without a path)
    #[arg(long, global = true, num_args = 0..=1, require_equals = true, value_name = "PATH")]
    log_file: Option<Option<PathBuf>>,

    /// Increase log verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a location to its tile index and tile corner
    Index(index::IndexArgs),
    /// Show the cache path and server URLs of a tile
    Path(path::PathArgs),
    /// Download the tiles around a location, like an open map panel would
    View(view::ViewArgs),
    /// Print the pixels of a rasterized circle
    Circle(circle::CircleArgs),
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _logging_guard = match init_logging(&LogOptions {
        file: log_file_path(cli.log_file.clone()),
        default_filter: Some(filter.to_string()),
    }) {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e).exit(),
    };

    if let Err(e) = run(cli) {
        e.exit();
    }
}

/// `--log-file=PATH` logs to PATH; a bare `--log-file` uses the default
/// log location.
fn log_file_path(arg: Option<Option<PathBuf>>) -> Option<PathBuf> {
    arg.map(|path| path.unwrap_or_else(|| default_log_dir().join(default_log_file())))
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Index(args) => index::run(&args, &mut stdout),
        Command::Circle(args) => circle::run(&args, &mut stdout),
        Command::Path(args) => {
            let config = load_config(cli.config.as_deref())?;
            path::run(&args, &config, &mut stdout)
        }
        Command::View(args) => {
            let config = load_config(cli.config.as_deref())?;
            view::run(&args, config, &mut stdout)
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<MapConfig, CliError> {
    let config = match path {
        Some(path) => MapConfig::load_from(path)?,
        None => MapConfig::load()?,
    };
    Ok(config)
}
