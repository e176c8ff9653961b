//! Midpoint circle rasterization.
//!
//! The outline is emitted as a single polygon walking the circle in one
//! angular direction. Filling a polygon whose vertices jump back and forth
//! between octants leaves seams when the fill is translucent, so each octant
//! is appended in the order that continues from where the previous one ended.

use super::PixelPoint;

/// Largest radius rasterized; larger radii are clamped to it.
///
/// Far beyond any panel size, and small enough that the outline stays a few
/// hundred thousand points.
pub const MAX_CIRCLE_RADIUS: u32 = 1 << 16;

/// Rasterizes the outline of a circle.
///
/// Consecutive points differ by at most one pixel on each axis. The polygon
/// is implicitly closed: the last point is adjacent to the first and is not
/// repeated. A radius of zero yields the center point alone. Radii above
/// [`MAX_CIRCLE_RADIUS`] are clamped, and points beyond the `i32` range
/// saturate at its bounds.
pub fn rasterize_circle(cx: i32, cy: i32, radius: u32) -> Vec<PixelPoint> {
    let octant = first_octant(i64::from(radius.min(MAX_CIRCLE_RADIUS)));

    let mut offsets: Vec<(i64, i64)> = Vec::with_capacity(octant.len() * 8);
    // Starting straight "down" (positive y) and turning toward positive x.
    offsets.extend(octant.iter().map(|&(x, y)| (x, y)));
    offsets.extend(octant.iter().rev().map(|&(x, y)| (y, x)));
    offsets.extend(octant.iter().map(|&(x, y)| (y, -x)));
    offsets.extend(octant.iter().rev().map(|&(x, y)| (x, -y)));
    offsets.extend(octant.iter().map(|&(x, y)| (-x, -y)));
    offsets.extend(octant.iter().rev().map(|&(x, y)| (-y, -x)));
    offsets.extend(octant.iter().map(|&(x, y)| (-y, x)));
    offsets.extend(octant.iter().rev().map(|&(x, y)| (-x, y)));

    let mut points: Vec<PixelPoint> = offsets
        .into_iter()
        .map(|(dx, dy)| PixelPoint::new(offset(cx, dx), offset(cy, dy)))
        .collect();

    // Octant seams produce repeated vertices.
    points.dedup();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

fn offset(center: i32, delta: i64) -> i32 {
    (i64::from(center) + delta).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Offsets of the octant from (0, r) to the 45° diagonal.
///
/// x grows by exactly one per step while y shrinks by zero or one. The last
/// offset satisfies `0 <= y - x <= 1`.
fn first_octant(radius: i64) -> Vec<(i64, i64)> {
    let mut x = 0;
    let mut y = radius;
    let mut f = 1 - radius;
    let mut dd_f_x = 0;
    let mut dd_f_y = -2 * radius;

    let mut octant = vec![(x, y)];
    while x < y {
        if f >= 0 {
            y -= 1;
            dd_f_y += 2;
            f += dd_f_y;
        }
        x += 1;
        dd_f_x += 2;
        f += dd_f_x + 1;
        if x > y {
            // Past the diagonal; the mirrored octant covers it.
            break;
        }
        octant.push((x, y));
    }
    octant
}
