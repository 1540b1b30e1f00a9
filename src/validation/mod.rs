//! Annotation document validation for logmask.
//!
//! This module checks a document against a class configuration before it
//! is rasterized, reporting every problem at once instead of stopping at
//! the first:
//! - Document integrity (positive image size, pith marker present)
//! - Object schema (known class, supported geometry, payload present)
//! - Geometry (bitmaps decodable, shapes inside the image)

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use crate::annotation::{AnnotationDocument, ClassConfig, Geometry};
use crate::error::LogmaskError;
use crate::pipeline::check_image_size;
use crate::raster::{decode_object, Footprint};

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
}

/// Validates a document and returns a report of all issues found.
///
/// Every object is decoded exactly as rasterization would decode it, so a
/// document without errors is guaranteed to rasterize.
pub fn validate_document(
    document: &AnnotationDocument,
    config: &ClassConfig,
    _opts: &ValidateOptions,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    let size_ok = validate_size(document, config, &mut report);

    let mut pith_candidates = 0usize;
    for (index, object) in document.objects.iter().enumerate() {
        let context = IssueContext::Object { index };

        // Schema checks first; they do not need a valid image size.
        let geometry = match object.geometry(index) {
            Ok(geometry) => geometry,
            Err(err) => {
                report.add(schema_issue(err, context));
                continue;
            }
        };
        if config.table().lookup(&object.class_title).is_none() {
            report.add(ValidationIssue::error(
                IssueCode::UnknownClass,
                format!("Class '{}' is not in the class table", object.class_title),
                context,
            ));
            continue;
        }

        if let Geometry::Point(points) = geometry {
            pith_candidates += points.len();
        }

        if !size_ok {
            continue;
        }

        match decode_object(
            index,
            object,
            config,
            document.size.height as usize,
            document.size.width as usize,
        ) {
            Ok(decoded) => match decoded.footprint {
                Footprint::Inside => {}
                Footprint::Clipped => report.add(ValidationIssue::warning(
                    IssueCode::GeometryOutOfBounds,
                    format!(
                        "{} extends outside the {}x{} image and will be clipped",
                        decoded.kind, document.size.width, document.size.height
                    ),
                    context,
                )),
                Footprint::Outside => report.add(ValidationIssue::warning(
                    IssueCode::GeometryOutsideImage,
                    format!(
                        "{} lies entirely outside the {}x{} image",
                        decoded.kind, document.size.width, document.size.height
                    ),
                    context,
                )),
            },
            Err(err) => report.add(schema_issue(err, context)),
        }
    }

    if pith_candidates == 0 {
        report.add(ValidationIssue::warning(
            IssueCode::MissingPith,
            "No point annotation; the pith location will be absent",
            IssueContext::Document,
        ));
    } else if pith_candidates > 1 {
        report.add(ValidationIssue::warning(
            IssueCode::MultiplePithPoints,
            format!(
                "{} point coordinates found; only the first is used as the pith",
                pith_candidates
            ),
            IssueContext::Document,
        ));
    }

    report
}

/// Checks the recorded image size. Returns true if it is usable.
fn validate_size(
    document: &AnnotationDocument,
    config: &ClassConfig,
    report: &mut ValidationReport,
) -> bool {
    let size = document.size;
    match check_image_size(size.height, size.width, config.table().layer_count()) {
        Ok(_) => true,
        Err(err) => {
            report.add(ValidationIssue::error(
                IssueCode::InvalidImageSize,
                err.to_string(),
                IssueContext::Document,
            ));
            false
        }
    }
}

/// Maps a decoding error to the matching validation issue.
fn schema_issue(err: LogmaskError, context: IssueContext) -> ValidationIssue {
    let code = match &err {
        LogmaskError::UnsupportedGeometry { .. } => IssueCode::UnsupportedGeometry,
        LogmaskError::MissingPayload { .. } => IssueCode::MissingPayload,
        LogmaskError::EmptyGeometry { .. } => IssueCode::EmptyGeometry,
        LogmaskError::UnknownClass { .. } => IssueCode::UnknownClass,
        _ => IssueCode::BitmapUndecodable,
    };
    ValidationIssue::error(code, err.to_string(), context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationObject, PixelXY};

    fn valid_document() -> AnnotationDocument {
        AnnotationDocument::new(40, 60)
            .with_object(AnnotationObject::polygon(
                "wood",
                [
                    PixelXY::new(0, 0),
                    PixelXY::new(59, 0),
                    PixelXY::new(59, 39),
                    PixelXY::new(0, 39),
                ],
            ))
            .with_object(AnnotationObject::point("pith", [PixelXY::new(30, 20)]))
    }

    fn validate(document: &AnnotationDocument) -> ValidationReport {
        validate_document(document, &ClassConfig::default(), &ValidateOptions::default())
    }

    #[test]
    fn test_valid_document() {
        let report = validate(&valid_document());
        assert!(
            report.is_clean(),
            "Expected no issues, got: {:?}",
            report.issues
        );
    }

    #[test]
    fn test_invalid_image_size() {
        let mut document = valid_document();
        document.size.width = 0;

        let report = validate(&document);
        assert_eq!(report.error_count(), 1);
        assert!(report.has(IssueCode::InvalidImageSize));
    }

    #[test]
    fn test_oversized_image_is_an_error() {
        let mut document = valid_document();
        document.size.height = u32::MAX;
        document.size.width = u32::MAX;

        let report = validate(&document);
        assert_eq!(report.error_count(), 1);
        assert!(report.has(IssueCode::InvalidImageSize));
        assert!(report.to_string().contains("exceeds"));
    }

    #[test]
    fn test_unknown_class_and_unsupported_geometry() {
        let mut circle = AnnotationObject::polygon("wood", [PixelXY::new(1, 1)]);
        circle.geometry_type = "circle".into();
        let document = valid_document()
            .with_object(AnnotationObject::point("bark", [PixelXY::new(1, 1)]))
            .with_object(circle);

        let report = validate(&document);
        assert_eq!(report.error_count(), 2);
        assert!(report.has(IssueCode::UnknownClass));
        assert!(report.has(IssueCode::UnsupportedGeometry));
        assert!(report.to_string().contains("object 3"));
    }

    #[test]
    fn test_undecodable_bitmap() {
        let document = valid_document().with_object(AnnotationObject::bitmap(
            "rot",
            PixelXY::new(0, 0),
            "not-a-bitmap",
        ));

        let report = validate(&document);
        assert!(report.has(IssueCode::BitmapUndecodable));
        assert!(!report.is_ok());
    }

    #[test]
    fn test_out_of_bounds_warnings() {
        let document = valid_document()
            .with_object(AnnotationObject::point("knot_sound", [PixelXY::new(59, 39)]))
            .with_object(AnnotationObject::polygon(
                "crack",
                [PixelXY::new(100, 100), PixelXY::new(120, 100), PixelXY::new(120, 120)],
            ));

        let report = validate(&document);
        assert!(report.is_ok());
        assert!(report.has(IssueCode::GeometryOutOfBounds));
        assert!(report.has(IssueCode::GeometryOutsideImage));
        // The knot marker counts as a second pith candidate.
        assert!(report.has(IssueCode::MultiplePithPoints));
    }

    #[test]
    fn test_missing_pith_is_warning() {
        let mut document = valid_document();
        document.objects.pop();

        let report = validate(&document);
        assert!(report.is_ok());
        assert_eq!(report.warning_count(), 1);
        assert!(report.has(IssueCode::MissingPith));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let mut document = valid_document();
        document.objects.pop();

        let json = serde_json::to_string(&validate(&document)).unwrap();
        assert!(json.contains("\"code\":\"MissingPith\""));
        assert!(json.contains("\"scope\":\"document\""));
    }
}
