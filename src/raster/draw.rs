//! Rasterization of point and polygon geometry into clipped patches.
//!
//! Pixel `(row, col)` is sampled at the integer coordinate `(x = col, y = row)`.
//! Geometry reaching outside the image is clipped; the returned
//! [`Footprint`] tells the caller whether that happened.

use serde::Serialize;

use super::layer::Patch;
use crate::annotation::{ClassId, PixelXY};

/// Where an object's geometry lies relative to the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Footprint {
    /// Entirely inside the image.
    Inside,
    /// Partly outside; the outside part was clipped away.
    Clipped,
    /// Nothing of the object lands inside the image.
    Outside,
}

/// Axis-aligned pixel box, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PixelBox {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl PixelBox {
    fn around(points: impl IntoIterator<Item = (i64, i64)>) -> Option<Self> {
        points.into_iter().fold(None, |acc, (x, y)| {
            Some(match acc {
                None => PixelBox {
                    x0: x,
                    y0: y,
                    x1: x,
                    y1: y,
                },
                Some(b) => PixelBox {
                    x0: b.x0.min(x),
                    y0: b.y0.min(y),
                    x1: b.x1.max(x),
                    y1: b.y1.max(y),
                },
            })
        })
    }

    /// Intersection with the image `[0, width) x [0, height)`.
    pub fn clip(&self, height: usize, width: usize) -> Option<PixelBox> {
        let clipped = PixelBox {
            x0: self.x0.max(0),
            y0: self.y0.max(0),
            x1: self.x1.min(width as i64 - 1),
            y1: self.y1.min(height as i64 - 1),
        };
        (clipped.x0 <= clipped.x1 && clipped.y0 <= clipped.y1).then_some(clipped)
    }

    fn patch(&self, class: ClassId) -> Patch {
        Patch::new(
            class,
            self.y0 as usize,
            self.x0 as usize,
            (self.y1 - self.y0 + 1) as usize,
            (self.x1 - self.x0 + 1) as usize,
        )
    }
}

/// Classifies a footprint from the object's unclipped box and its rasterized patch.
pub(crate) fn footprint_of(full: PixelBox, clipped: Option<PixelBox>, patch: &Patch) -> Footprint {
    match clipped {
        Some(c) if c == full => Footprint::Inside,
        Some(_) if !patch.is_empty() => Footprint::Clipped,
        _ => Footprint::Outside,
    }
}

/// Draws a filled disc of `radius` around every point.
///
/// A pixel belongs to a disc when `dx² + dy² <= radius²`.
pub fn rasterize_points(
    class: ClassId,
    points: &[PixelXY],
    radius: u32,
    height: usize,
    width: usize,
) -> (Patch, Footprint) {
    let r = radius as i64;
    let Some(full) = PixelBox::around(points.iter().flat_map(|p| {
        let (x, y) = (p.x as i64, p.y as i64);
        [(x - r, y - r), (x + r, y + r)]
    })) else {
        return (Patch::empty(class), Footprint::Outside);
    };

    let clipped = full.clip(height, width);
    let Some(bounds) = clipped else {
        return (Patch::empty(class), Footprint::Outside);
    };

    let mut patch = bounds.patch(class);
    // Squares of a u32 radius overflow i64.
    let r2 = (r as i128) * (r as i128);
    for p in points {
        let (cx, cy) = (p.x as i64, p.y as i64);
        let y_range = (cy - r).max(bounds.y0)..=(cy + r).min(bounds.y1);
        for y in y_range {
            let dy = (y - cy) as i128;
            for x in (cx - r).max(bounds.x0)..=(cx + r).min(bounds.x1) {
                let dx = (x - cx) as i128;
                if dx * dx + dy * dy <= r2 {
                    patch.mark(y as usize, x as usize);
                }
            }
        }
    }

    let footprint = footprint_of(full, clipped, &patch);
    (patch, footprint)
}

/// Fills the interior of a closed ring (even-odd rule) together with its outline.
///
/// The ring is closed implicitly from the last vertex back to the first.
/// One vertex yields a single pixel and two vertices a segment.
pub fn rasterize_polygon(
    class: ClassId,
    ring: &[PixelXY],
    height: usize,
    width: usize,
) -> (Patch, Footprint) {
    let Some(full) = PixelBox::around(ring.iter().map(|p| (p.x as i64, p.y as i64))) else {
        return (Patch::empty(class), Footprint::Outside);
    };

    let clipped = full.clip(height, width);
    let Some(bounds) = clipped else {
        return (Patch::empty(class), Footprint::Outside);
    };

    let mut patch = bounds.patch(class);
    let n = ring.len();

    if n >= 3 {
        let mut crossings: Vec<f64> = Vec::with_capacity(n);
        for y in bounds.y0..=bounds.y1 {
            let yf = y as f64;
            crossings.clear();
            for i in 0..n {
                let a = ring[i];
                let b = ring[(i + 1) % n];
                let (ay, by) = (a.y as f64, b.y as f64);
                // Half-open in y so shared vertices count once.
                if (ay <= yf && yf < by) || (by <= yf && yf < ay) {
                    let t = (yf - ay) / (by - ay);
                    crossings.push(a.x as f64 + t * (b.x as f64 - a.x as f64));
                }
            }
            crossings.sort_by(|l, r| l.total_cmp(r));

            for span in crossings.chunks_exact(2) {
                let start = (span[0].ceil() as i64).max(bounds.x0);
                let end = (span[1].floor() as i64).min(bounds.x1);
                for x in start..=end {
                    patch.mark(y as usize, x as usize);
                }
            }
        }
    }

    for i in 0..n {
        let next = if n == 1 { i } else { (i + 1) % n };
        draw_segment(&mut patch, bounds, ring[i], ring[next]);
    }

    let footprint = footprint_of(full, clipped, &patch);
    (patch, footprint)
}

/// Marks the pixels of the segment `a`-`b` that fall inside `bounds`.
///
/// Steps along the major axis, so the work is bounded by the clip box and
/// not by the segment length.
fn draw_segment(patch: &mut Patch, bounds: PixelBox, a: PixelXY, b: PixelXY) {
    let (ax, ay, bx, by) = (a.x as i64, a.y as i64, b.x as i64, b.y as i64);
    let (dx, dy) = (bx - ax, by - ay);

    if dx == 0 && dy == 0 {
        if ax >= bounds.x0 && ax <= bounds.x1 && ay >= bounds.y0 && ay <= bounds.y1 {
            patch.mark(ay as usize, ax as usize);
        }
        return;
    }

    if dx.abs() >= dy.abs() {
        let lo = ax.min(bx).max(bounds.x0);
        let hi = ax.max(bx).min(bounds.x1);
        for x in lo..=hi {
            let y = (ay as f64 + (x - ax) as f64 * dy as f64 / dx as f64).round() as i64;
            if y >= bounds.y0 && y <= bounds.y1 {
                patch.mark(y as usize, x as usize);
            }
        }
    } else {
        let lo = ay.min(by).max(bounds.y0);
        let hi = ay.max(by).min(bounds.y1);
        for y in lo..=hi {
            let x = (ax as f64 + (y - ay) as f64 * dx as f64 / dy as f64).round() as i64;
            if x >= bounds.x0 && x <= bounds.x1 {
                patch.mark(y as usize, x as usize);
            }
        }
    }
}
