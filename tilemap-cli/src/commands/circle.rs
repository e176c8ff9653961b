//! Circle command - print the pixels of a rasterized circle.

use std::io::Write;

use clap::Args;
use tilemap::coord::{rasterize_circle, MAX_CIRCLE_RADIUS};

use crate::error::CliError;

/// Arguments for the circle command.
#[derive(Debug, Args)]
pub struct CircleArgs {
    /// Radius in pixels
    #[arg(long)]
    pub radius: u32,

    /// Center x coordinate
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub cx: i32,

    /// Center y coordinate
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub cy: i32,
}

/// Run the circle command. One `x y` pair per line.
pub fn run(args: &CircleArgs, out: &mut impl Write) -> Result<(), CliError> {
    if args.radius > MAX_CIRCLE_RADIUS {
        return Err(CliError::InvalidArgument(format!(
            "radius {} is above the maximum of {}",
            args.radius, MAX_CIRCLE_RADIUS
        )));
    }
    for point in rasterize_circle(args.cx, args.cy, args.radius) {
        writeln!(out, "{} {}", point.x, point.y)?;
    }
    Ok(())
}
