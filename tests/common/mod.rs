#![allow(dead_code)]

use std::fs;
use std::path::Path;

use logmask::annotation::io_supervisely::to_annotation_string;
use logmask::annotation::AnnotationDocument;

pub fn write_document(path: &Path, document: &AnnotationDocument) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    let json = to_annotation_string(document).expect("serialize annotation");
    fs::write(path, json).expect("write annotation file");
}

/// Reads a label mask PNG back as `(height, width, labels)`.
pub fn read_mask(path: &Path) -> (usize, usize, Vec<u8>) {
    let img = image::open(path).expect("open mask png").to_luma8();
    let (width, height) = img.dimensions();
    (height as usize, width as usize, img.into_raw())
}

pub fn count_label(labels: &[u8], label: u8) -> usize {
    labels.iter().filter(|&&v| v == label).count()
}
