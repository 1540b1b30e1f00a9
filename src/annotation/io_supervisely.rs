//! Reader and writer for Supervisely per-image annotation JSON.
//!
//! Each image in a Supervisely project has one JSON document:
//!
//! ```json
//! {
//!   "size": { "height": 480, "width": 640 },
//!   "objects": [
//!     { "classTitle": "pith", "geometryType": "point",
//!       "points": { "exterior": [[320, 240]], "interior": [] } },
//!     { "classTitle": "crack", "geometryType": "bitmap",
//!       "bitmap": { "origin": [10, 20], "data": "eJzrDPBz5+WS4m..." } }
//!   ]
//! }
//! ```
//!
//! Fields the rasterizer does not use (`tags`, `labelerLogin`, `createdAt`,
//! ...) are accepted and dropped.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::model::AnnotationDocument;
use crate::error::LogmaskError;

/// Reads an annotation document from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_annotation_json(path: &Path) -> Result<AnnotationDocument, LogmaskError> {
    let file = File::open(path).map_err(LogmaskError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| LogmaskError::AnnotationJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes an annotation document to a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_annotation_json(
    path: &Path,
    document: &AnnotationDocument,
) -> Result<(), LogmaskError> {
    let file = File::create(path).map_err(LogmaskError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, document).map_err(|source| {
        LogmaskError::AnnotationJsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Reads an annotation document from a JSON string.
pub fn from_annotation_str(json: &str) -> Result<AnnotationDocument, serde_json::Error> {
    serde_json::from_str(json)
}

/// Reads an annotation document from a JSON byte slice.
///
/// Useful for fuzzing and processing raw bytes without UTF-8 validation overhead.
pub fn from_annotation_slice(bytes: &[u8]) -> Result<AnnotationDocument, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Writes an annotation document to a pretty-printed JSON string.
pub fn to_annotation_string(document: &AnnotationDocument) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(document)
}
