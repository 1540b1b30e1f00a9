//! Annotation records and class configuration.
//!
//! This module holds everything the rasterizer consumes:
//!
//! - [`AnnotationDocument`] / [`AnnotationObject`]: one image's annotations,
//!   as read from Supervisely JSON by [`io_supervisely`].
//! - [`ClassTable`] / [`ClassPriority`]: the class-name to id mapping and the
//!   order that decides which class keeps a pixel claimed by several.
//! - [`ClassConfig`]: both of the above plus the point radius, loadable from
//!   YAML or JSON.
//!
//! # Example
//!
//! ```
//! use logmask::annotation::{AnnotationDocument, AnnotationObject, ClassConfig, PixelXY};
//!
//! let config = ClassConfig::default();
//! let document = AnnotationDocument::new(64, 64)
//!     .with_object(AnnotationObject::point("Pith", [PixelXY::new(32, 32)]));
//!
//! assert_eq!(config.table().lookup(&document.objects[0].class_title).map(|c| c.as_u8()), Some(7));
//! ```

mod classes;
pub mod config;
pub mod io_supervisely;
mod model;

pub use classes::{normalize_class_name, ClassId, ClassPriority, ClassTable, BACKGROUND};
pub use config::{
    read_class_config, ClassConfig, ClassConfigFile, DEFAULT_POINT_RADIUS, MAX_POINT_RADIUS,
};
pub use model::{
    geometry_type, AnnotationDocument, AnnotationObject, BitmapPayload, Geometry, ImageSize,
    PithPoint, PixelXY, PointsPayload,
};
