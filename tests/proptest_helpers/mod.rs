#![allow(dead_code)]

use logmask::annotation::{AnnotationObject, ClassConfig, PixelXY};
use logmask::raster::BitMask;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Class titles of the built-in table, background excluded.
pub fn class_titles() -> Vec<String> {
    ClassConfig::default()
        .table()
        .iter()
        .filter(|(_, id)| id.as_u8() != 0)
        .map(|(name, _)| name.to_string())
        .collect()
}

pub fn arb_class_title() -> BoxedStrategy<String> {
    prop::sample::select(class_titles()).boxed()
}

pub fn arb_bitmask(max_h: usize, max_w: usize) -> BoxedStrategy<BitMask> {
    (1..=max_h, 1..=max_w)
        .prop_flat_map(|(h, w)| {
            prop::collection::vec(any::<bool>(), h * w)
                .prop_map(move |cells| BitMask::from_cells(h, w, cells))
        })
        .prop_filter_map("cell count matches", |mask| mask)
        .boxed()
}

/// A coordinate that may fall a little outside a `height` x `width` image.
pub fn arb_pixel(height: i32, width: i32) -> BoxedStrategy<PixelXY> {
    (-4..width + 4, -4..height + 4)
        .prop_map(|(x, y)| PixelXY::new(x, y))
        .boxed()
}

pub fn arb_ring(height: i32, width: i32, max_len: usize) -> BoxedStrategy<Vec<PixelXY>> {
    prop::collection::vec(arb_pixel(height, width), 1..=max_len).boxed()
}

/// Points and polygons with known classes.
pub fn arb_object(height: i32, width: i32) -> BoxedStrategy<AnnotationObject> {
    let point = (arb_class_title(), arb_ring(height, width, 3))
        .prop_map(|(class, points)| AnnotationObject::point(class, points));
    let polygon = (arb_class_title(), arb_ring(height, width, 8))
        .prop_map(|(class, ring)| AnnotationObject::polygon(class, ring));
    prop_oneof![point, polygon].boxed()
}

pub fn arb_objects(height: i32, width: i32, max_len: usize) -> BoxedStrategy<Vec<AnnotationObject>> {
    prop::collection::vec(arb_object(height, width), 0..=max_len).boxed()
}
