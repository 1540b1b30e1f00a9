//! Core entry point: annotation objects in, label mask and pith out.
//!
//! ```
//! use logmask::annotation::{AnnotationObject, ClassConfig, PixelXY};
//! use logmask::pipeline::rasterize_objects;
//!
//! let config = ClassConfig::default();
//! let objects = vec![AnnotationObject::point("pith", [PixelXY::new(12, 7)])];
//!
//! let out = rasterize_objects(20, 30, &objects, &config)?;
//! assert_eq!(out.pith, Some(PixelXY::new(12, 7)));
//! assert_eq!(out.mask.get(7, 12), 7);
//! # Ok::<(), logmask::LogmaskError>(())
//! ```

mod report;

pub use report::{RasterIssue, RasterIssueCode, RasterReport, RasterSeverity};

use log::{debug, warn};
use rayon::prelude::*;

use crate::annotation::{AnnotationDocument, AnnotationObject, ClassConfig, PithPoint};
use crate::error::LogmaskError;
use crate::raster::{composite, decode_object, ClassLayerStack, CompositeMask, DecodedObject, Footprint};

/// The result of rasterizing one image.
#[derive(Clone, Debug)]
pub struct Rasterized {
    pub mask: CompositeMask,
    pub pith: Option<PithPoint>,
    pub report: RasterReport,
}

/// Rasterizes the annotations of one image.
///
/// Every object is decoded into its own patch (in parallel); the patches are
/// then merged in list order into a per-class layer stack, which is
/// collapsed into the label mask by class priority. The pith is the first
/// coordinate of the first point object.
///
/// # Errors
/// Fails on the first object (in list order) with an unsupported geometry,
/// a missing or empty payload, an unknown class or an undecodable bitmap.
/// No mask is produced in that case. An image whose layer stack would
/// exceed [`MAX_LAYER_CELLS`] is rejected before anything is allocated.
pub fn rasterize_objects(
    height: u32,
    width: u32,
    objects: &[AnnotationObject],
    config: &ClassConfig,
) -> Result<Rasterized, LogmaskError> {
    let (h, w) = check_image_size(height, width, config.table().layer_count())?;

    let decoded: Vec<Result<DecodedObject, LogmaskError>> = objects
        .par_iter()
        .enumerate()
        .map(|(index, object)| decode_object(index, object, config, h, w))
        .collect();
    let decoded = decoded.into_iter().collect::<Result<Vec<_>, _>>()?;

    let mut report = RasterReport::new(h, w);
    report.objects = decoded.len();

    let mut stack = ClassLayerStack::new(config.table().layer_count(), h, w);
    let mut pith: Option<PithPoint> = None;

    for object in &decoded {
        stack.merge_patch(&object.patch);
        *report
            .objects_by_kind
            .entry(object.kind.to_string())
            .or_default() += 1;

        record_footprint(&mut report, object);

        if let Some(&first) = object.markers.first() {
            if pith.is_none() {
                pith = Some(first);
                if object.markers.len() > 1 {
                    report.add(RasterIssue::info(
                        RasterIssueCode::ExtraPithCandidates,
                        Some(object.index),
                        format!(
                            "point object has {} coordinates; only the first is the pith",
                            object.markers.len()
                        ),
                    ));
                }
            } else {
                report.add(RasterIssue::info(
                    RasterIssueCode::ExtraPithCandidates,
                    Some(object.index),
                    "additional point object ignored for the pith location",
                ));
            }
        }
    }

    if pith.is_none() {
        debug!("no point object; pith is absent");
        report.add(RasterIssue::info(
            RasterIssueCode::MissingPith,
            None,
            "no point annotation; pith location is absent",
        ));
    }

    let mask = composite(&stack, config.priority());

    for (label, count) in mask.histogram() {
        let name = config
            .table()
            .name_of(label.into())
            .map(str::to_string)
            .unwrap_or_else(|| format!("class_{}", label));
        report.class_pixels.insert(name, count);
    }
    report.pith = pith;

    Ok(Rasterized { mask, pith, report })
}

/// Upper bound on `layers * height * width` for one image.
pub const MAX_LAYER_CELLS: u64 = 1 << 31;

/// Checks that an image of `height` x `width` with `layers` class layers can
/// be rasterized, and returns its size as `usize`.
pub fn check_image_size(
    height: u32,
    width: u32,
    layers: usize,
) -> Result<(usize, usize), LogmaskError> {
    if height == 0 || width == 0 {
        return Err(LogmaskError::InvalidImageSize { height, width });
    }
    let too_large = || LogmaskError::ImageTooLarge {
        height,
        width,
        layers,
        limit: MAX_LAYER_CELLS,
    };
    let cells = (height as u64)
        .checked_mul(width as u64)
        .and_then(|pixels| pixels.checked_mul(layers.max(1) as u64))
        .ok_or_else(too_large)?;
    if cells > MAX_LAYER_CELLS || usize::try_from(cells).is_err() {
        return Err(too_large());
    }
    Ok((height as usize, width as usize))
}

/// Rasterizes a whole annotation document using its recorded image size.
pub fn rasterize_document(
    document: &AnnotationDocument,
    config: &ClassConfig,
) -> Result<Rasterized, LogmaskError> {
    rasterize_objects(
        document.size.height,
        document.size.width,
        &document.objects,
        config,
    )
}

fn record_footprint(report: &mut RasterReport, object: &DecodedObject) {
    match object.footprint {
        Footprint::Inside => {}
        Footprint::Clipped => {
            warn!(
                "object {} ({} '{}') extends past the image and was clipped",
                object.index, object.kind, object.class
            );
            report.add(RasterIssue::warning(
                RasterIssueCode::GeometryClipped,
                Some(object.index),
                format!("{} clipped to the image bounds", object.kind),
            ));
        }
        Footprint::Outside => {
            warn!(
                "object {} ({}) lies entirely outside the image",
                object.index, object.kind
            );
            report.add(RasterIssue::warning(
                RasterIssueCode::GeometryOutsideImage,
                Some(object.index),
                format!("{} lies entirely outside the image", object.kind),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::PixelXY;

    #[test]
    fn test_zero_size_rejected() {
        let err = rasterize_objects(0, 10, &[], &ClassConfig::default()).unwrap_err();
        assert!(matches!(err, LogmaskError::InvalidImageSize { .. }));
    }

    #[test]
    fn test_huge_size_rejected_without_allocating() {
        let config = ClassConfig::default();
        let err = rasterize_objects(u32::MAX, u32::MAX, &[], &config).unwrap_err();
        assert!(matches!(err, LogmaskError::ImageTooLarge { .. }));

        // Fits in u64 but not under the cell cap once the 11 layers count.
        let err = rasterize_objects(20_000, 20_000, &[], &config).unwrap_err();
        assert!(matches!(err, LogmaskError::ImageTooLarge { layers: 11, .. }));
    }

    #[test]
    fn test_size_check_bounds() {
        assert_eq!(check_image_size(480, 640, 11).unwrap(), (480, 640));
        assert!(check_image_size(1 << 16, 1 << 15, 1).is_ok());
        assert!(check_image_size(1 << 16, 1 << 15, 2).is_err());
    }

    #[test]
    fn test_first_error_in_list_order_wins() {
        let mut bad = AnnotationObject::polygon("wood", [PixelXY::new(0, 0)]);
        bad.geometry_type = "circle".into();
        let objects = vec![
            AnnotationObject::polygon("wood", [PixelXY::new(0, 0), PixelXY::new(3, 3)]),
            AnnotationObject::point("no such class", [PixelXY::new(1, 1)]),
            bad,
        ];

        let err = rasterize_objects(5, 5, &objects, &ClassConfig::default()).unwrap_err();
        assert!(matches!(err, LogmaskError::UnknownClass { index: 1, .. }));
    }

    #[test]
    fn test_pith_comes_from_first_point_object() {
        let objects = vec![
            AnnotationObject::point("pith", [PixelXY::new(4, 4), PixelXY::new(8, 8)]),
            AnnotationObject::point("pith", [PixelXY::new(1, 1)]),
        ];
        let out = rasterize_objects(10, 10, &objects, &ClassConfig::default()).unwrap();

        assert_eq!(out.pith, Some(PixelXY::new(4, 4)));
        assert_eq!(
            out.report
                .issues_with(RasterIssueCode::ExtraPithCandidates)
                .count(),
            2
        );
    }

    #[test]
    fn test_clipping_is_reported() {
        let objects = vec![
            AnnotationObject::point("knot sound", [PixelXY::new(0, 0)]),
            AnnotationObject::polygon(
                "crack",
                [PixelXY::new(50, 50), PixelXY::new(60, 50), PixelXY::new(60, 60)],
            ),
        ];
        let out = rasterize_objects(10, 10, &objects, &ClassConfig::default()).unwrap();

        let clipped: Vec<_> = out
            .report
            .issues_with(RasterIssueCode::GeometryClipped)
            .collect();
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped[0].object, Some(0));
        assert_eq!(
            out.report
                .issues_with(RasterIssueCode::GeometryOutsideImage)
                .count(),
            1
        );
        assert_eq!(out.report.class_pixels.get("knot_sound"), Some(&11));
        assert_eq!(out.report.class_pixels.get("crack"), None);
    }
}
