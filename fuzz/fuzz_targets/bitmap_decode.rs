//! Fuzz target for embedded bitmap payload decoding.

#![no_main]

use libfuzzer_sys::fuzz_target;
use logmask::raster::decode_bitmap;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = decode_bitmap(text);
    }
});
