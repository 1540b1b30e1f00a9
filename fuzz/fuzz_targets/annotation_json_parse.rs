//! Fuzz target for Supervisely annotation JSON parsing.
//!
//! Feeds arbitrary bytes to the annotation parser and checks that it never
//! panics, crashes or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use logmask::annotation::io_supervisely::from_annotation_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_annotation_slice(data);
});
