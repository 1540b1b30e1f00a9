//! Annotation records for one image.
//!
//! These mirror the Supervisely per-image annotation layout: an image size
//! and an ordered list of objects, each carrying a class title, a geometry
//! tag and a geometry payload. Records are kept close to the wire format;
//! the typed [`Geometry`] view is produced on demand so that an unknown tag
//! surfaces as an error at rasterization time instead of a parse failure.

use serde::{Deserialize, Serialize};

use crate::error::{BitmapError, LogmaskError};
use crate::raster::bitmap::{encode_bitmap, BitMask};

/// An integer pixel coordinate, serialized as `[x, y]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelXY {
    pub x: i32,
    pub y: i32,
}

impl PixelXY {
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for PixelXY {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

// Serialized as a two-element array; fractional input is rounded.
impl Serialize for PixelXY {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.x, self.y].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PixelXY {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [x, y] = <[f64; 2]>::deserialize(deserializer)?;
        if !x.is_finite() || !y.is_finite() {
            return Err(serde::de::Error::custom("coordinate must be finite"));
        }
        Ok(PixelXY::new(x.round() as i32, y.round() as i32))
    }
}

/// The pith location of a log cross-section.
pub type PithPoint = PixelXY;

/// Image dimensions in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub height: u32,
    pub width: u32,
}

/// All annotations of one image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub size: ImageSize,

    #[serde(default)]
    pub objects: Vec<AnnotationObject>,
}

impl AnnotationDocument {
    /// Creates an empty document for an image of the given size.
    pub fn new(height: u32, width: u32) -> Self {
        Self {
            description: None,
            size: ImageSize { height, width },
            objects: Vec::new(),
        }
    }

    /// Appends an object and returns the document.
    pub fn with_object(mut self, object: AnnotationObject) -> Self {
        self.objects.push(object);
        self
    }
}

/// Vertex lists of a point or polygon object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointsPayload {
    #[serde(default)]
    pub exterior: Vec<PixelXY>,

    /// Holes. Accepted for compatibility; rasterization uses the exterior ring only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interior: Vec<Vec<PixelXY>>,
}

/// Embedded compressed bitmap of a bitmap object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BitmapPayload {
    /// Top-left placement of the bitmap in image pixels.
    pub origin: PixelXY,

    /// base64(zlib(PNG)) with the mask in the alpha channel.
    pub data: String,
}

/// One annotated shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub class_title: String,

    pub geometry_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<PointsPayload>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitmap: Option<BitmapPayload>,
}

/// Geometry tags understood by the rasterizer.
pub mod geometry_type {
    pub const POINT: &str = "point";
    pub const POLYGON: &str = "polygon";
    pub const BITMAP: &str = "bitmap";
}

/// Typed view of an object's geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry<'a> {
    /// Point markers, each drawn as a small disc.
    Point(&'a [PixelXY]),
    /// A single closed exterior ring.
    Polygon(&'a [PixelXY]),
    /// An embedded bitmap placed at `origin`.
    Bitmap { origin: PixelXY, data: &'a str },
}

impl<'a> Geometry<'a> {
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => geometry_type::POINT,
            Geometry::Polygon(_) => geometry_type::POLYGON,
            Geometry::Bitmap { .. } => geometry_type::BITMAP,
        }
    }
}

impl AnnotationObject {
    /// Creates a point object.
    pub fn point(class_title: impl Into<String>, points: impl IntoIterator<Item = PixelXY>) -> Self {
        Self::with_points(class_title, geometry_type::POINT, points)
    }

    /// Creates a polygon object from its exterior ring.
    pub fn polygon(
        class_title: impl Into<String>,
        ring: impl IntoIterator<Item = PixelXY>,
    ) -> Self {
        Self::with_points(class_title, geometry_type::POLYGON, ring)
    }

    /// Creates a bitmap object from an already encoded payload.
    pub fn bitmap(class_title: impl Into<String>, origin: PixelXY, data: impl Into<String>) -> Self {
        Self {
            id: None,
            class_title: class_title.into(),
            geometry_type: geometry_type::BITMAP.to_string(),
            points: None,
            bitmap: Some(BitmapPayload {
                origin,
                data: data.into(),
            }),
        }
    }

    /// Creates a bitmap object by encoding `mask`.
    pub fn from_mask(
        class_title: impl Into<String>,
        origin: PixelXY,
        mask: &BitMask,
    ) -> Result<Self, BitmapError> {
        Ok(Self::bitmap(class_title, origin, encode_bitmap(mask)?))
    }

    fn with_points(
        class_title: impl Into<String>,
        kind: &str,
        points: impl IntoIterator<Item = PixelXY>,
    ) -> Self {
        Self {
            id: None,
            class_title: class_title.into(),
            geometry_type: kind.to_string(),
            points: Some(PointsPayload {
                exterior: points.into_iter().collect(),
                interior: Vec::new(),
            }),
            bitmap: None,
        }
    }

    /// Returns the typed geometry of this object.
    ///
    /// `index` is the object's position in its document and is only used
    /// for error reporting.
    pub fn geometry(&self, index: usize) -> Result<Geometry<'_>, LogmaskError> {
        let kind = self.geometry_type.as_str();
        let missing = || LogmaskError::MissingPayload {
            index,
            kind: kind.to_string(),
        };

        match kind {
            geometry_type::POINT | geometry_type::POLYGON => {
                let points = self.points.as_ref().ok_or_else(missing)?;
                if points.exterior.is_empty() {
                    return Err(LogmaskError::EmptyGeometry {
                        index,
                        kind: kind.to_string(),
                    });
                }
                if kind == geometry_type::POINT {
                    Ok(Geometry::Point(&points.exterior))
                } else {
                    Ok(Geometry::Polygon(&points.exterior))
                }
            }
            geometry_type::BITMAP => {
                let bitmap = self.bitmap.as_ref().ok_or_else(missing)?;
                Ok(Geometry::Bitmap {
                    origin: bitmap.origin,
                    data: &bitmap.data,
                })
            }
            other => Err(LogmaskError::UnsupportedGeometry {
                index,
                kind: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_xy_serde() {
        let p: PixelXY = serde_json::from_str("[12, 7]").unwrap();
        assert_eq!(p, PixelXY::new(12, 7));
        let rounded: PixelXY = serde_json::from_str("[12.6, 6.9]").unwrap();
        assert_eq!(rounded, PixelXY::new(13, 7));
        assert_eq!(serde_json::to_string(&p).unwrap(), "[12,7]");
        assert!(serde_json::from_str::<PixelXY>("[1]").is_err());
    }

    #[test]
    fn test_geometry_dispatch() {
        let point = AnnotationObject::point("pith", [PixelXY::new(1, 2)]);
        assert_eq!(
            point.geometry(0).unwrap(),
            Geometry::Point(&[PixelXY::new(1, 2)])
        );

        let bitmap = AnnotationObject::bitmap("rot", PixelXY::new(3, 4), "abc");
        assert_eq!(bitmap.geometry(1).unwrap().kind(), "bitmap");
    }

    #[test]
    fn test_unsupported_geometry_names_the_tag() {
        let mut object = AnnotationObject::polygon("wood", [PixelXY::new(0, 0)]);
        object.geometry_type = "circle".into();

        match object.geometry(3) {
            Err(LogmaskError::UnsupportedGeometry { index, kind }) => {
                assert_eq!(index, 3);
                assert_eq!(kind, "circle");
            }
            other => panic!("expected UnsupportedGeometry, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_and_empty_payloads() {
        let mut object = AnnotationObject::point("pith", Vec::<PixelXY>::new());
        assert!(matches!(
            object.geometry(0),
            Err(LogmaskError::EmptyGeometry { .. })
        ));

        object.points = None;
        assert!(matches!(
            object.geometry(0),
            Err(LogmaskError::MissingPayload { .. })
        ));
    }
}
