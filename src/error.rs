use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for logmask operations.
#[derive(Debug, Error)]
pub enum LogmaskError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse annotation JSON from {path}: {source}")]
    AnnotationJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write annotation JSON to {path}: {source}")]
    AnnotationJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse class config from {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Invalid class config: {0}")]
    InvalidConfig(String),

    #[error("Unsupported geometry type '{kind}' (object {index})")]
    UnsupportedGeometry { index: usize, kind: String },

    #[error("Unknown class '{title}' (object {index})")]
    UnknownClass { index: usize, title: String },

    #[error("Failed to decode bitmap (object {index}): {source}")]
    BitmapDecode {
        index: usize,
        #[source]
        source: BitmapError,
    },

    #[error("Object {index} has geometry type '{kind}' but no coordinates")]
    EmptyGeometry { index: usize, kind: String },

    #[error("Object {index} has geometry type '{kind}' but no matching payload")]
    MissingPayload { index: usize, kind: String },

    #[error("Invalid image size {width}x{height} (must be positive)")]
    InvalidImageSize { height: u32, width: u32 },

    #[error("Image {width}x{height} with {layers} class layers exceeds the {limit}-cell limit")]
    ImageTooLarge {
        height: u32,
        width: u32,
        layers: usize,
        limit: u64,
    },

    #[error("Failed to write mask to {path}: {source}")]
    MaskWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// Errors from the embedded bitmap codec (base64 / zlib / PNG).
#[derive(Debug, Error)]
pub enum BitmapError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("zlib stream error: {0}")]
    Zlib(#[source] std::io::Error),

    #[error("invalid PNG: {0}")]
    Png(#[from] image::ImageError),

    #[error("PNG has no alpha channel (color type {0})")]
    MissingAlpha(String),

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),

    #[error("bitmap has zero width or height")]
    Empty,

    #[error("bitmap stream inflates past {limit} bytes")]
    TooLarge { limit: u64 },
}
