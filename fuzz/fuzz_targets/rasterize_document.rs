//! Fuzz target for the whole rasterization pipeline.
//!
//! Any document that parses must either rasterize or fail with an error;
//! the image size is capped so a single input cannot exhaust memory.

#![no_main]

use libfuzzer_sys::fuzz_target;
use logmask::annotation::io_supervisely::from_annotation_slice;
use logmask::annotation::ClassConfig;
use logmask::pipeline::rasterize_objects;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(document) = from_annotation_slice(data) else {
        return;
    };
    let height = document.size.height.min(256);
    let width = document.size.width.min(256);

    let _ = rasterize_objects(height, width, &document.objects, &ClassConfig::default());
});
