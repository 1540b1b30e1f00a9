//! Per-object decoding: annotation record → class id + clipped patch.

use log::debug;

use super::bitmap::{decode_bitmap, BitMask};
use super::draw::{footprint_of, rasterize_points, rasterize_polygon, Footprint, PixelBox};
use super::layer::Patch;
use crate::annotation::{AnnotationObject, ClassConfig, ClassId, Geometry, PithPoint, PixelXY};
use crate::error::LogmaskError;

/// One object turned into raster form.
#[derive(Clone, Debug)]
pub struct DecodedObject {
    /// Position of the object in its document.
    pub index: usize,
    pub class: ClassId,
    pub kind: &'static str,
    pub patch: Patch,
    pub footprint: Footprint,
    /// All coordinates of a point object; empty for other kinds.
    pub markers: Vec<PithPoint>,
}

/// Decodes one annotation object for an image of `height` x `width` pixels.
///
/// Fails on an unsupported geometry tag, a missing or empty payload, an
/// unknown class title, or an undecodable bitmap.
pub fn decode_object(
    index: usize,
    object: &AnnotationObject,
    config: &ClassConfig,
    height: usize,
    width: usize,
) -> Result<DecodedObject, LogmaskError> {
    let geometry = object.geometry(index)?;
    let class = config
        .table()
        .lookup(&object.class_title)
        .ok_or_else(|| LogmaskError::UnknownClass {
            index,
            title: object.class_title.clone(),
        })?;

    let mut markers = Vec::new();
    let (patch, footprint) = match geometry {
        Geometry::Point(points) => {
            markers.extend_from_slice(points);
            rasterize_points(class, points, config.point_radius(), height, width)
        }
        Geometry::Polygon(ring) => rasterize_polygon(class, ring, height, width),
        Geometry::Bitmap { origin, data } => {
            let mask = decode_bitmap(data)
                .map_err(|source| LogmaskError::BitmapDecode { index, source })?;
            place_bitmap(class, origin, &mask, height, width)
        }
    };

    debug!(
        "object {}: {} '{}' -> class {} ({} px, {:?})",
        index,
        geometry.kind(),
        object.class_title,
        class,
        patch.area(),
        footprint
    );

    Ok(DecodedObject {
        index,
        class,
        kind: geometry.kind(),
        patch,
        footprint,
        markers,
    })
}

/// Places a decoded bitmap with its top-left corner at `origin`.
pub fn place_bitmap(
    class: ClassId,
    origin: PixelXY,
    mask: &BitMask,
    height: usize,
    width: usize,
) -> (Patch, Footprint) {
    if mask.is_empty() {
        return (Patch::empty(class), Footprint::Outside);
    }

    let (ox, oy) = (origin.x as i64, origin.y as i64);
    let full = PixelBox {
        x0: ox,
        y0: oy,
        x1: ox + mask.width() as i64 - 1,
        y1: oy + mask.height() as i64 - 1,
    };
    let clipped = full.clip(height, width);
    let Some(bounds) = clipped else {
        return (Patch::empty(class), Footprint::Outside);
    };

    let mut patch = Patch::new(
        class,
        bounds.y0 as usize,
        bounds.x0 as usize,
        (bounds.y1 - bounds.y0 + 1) as usize,
        (bounds.x1 - bounds.x0 + 1) as usize,
    );
    for y in bounds.y0..=bounds.y1 {
        for x in bounds.x0..=bounds.x1 {
            if mask.get((y - oy) as usize, (x - ox) as usize) {
                patch.mark(y as usize, x as usize);
            }
        }
    }

    // Only set cells decide the footprint, not the rectangle around them.
    let footprint = match footprint_of(full, clipped, &patch) {
        Footprint::Clipped if patch.area() == mask.count_set() => Footprint::Inside,
        other => other,
    };
    (patch, footprint)
}
