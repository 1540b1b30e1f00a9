//! Criterion microbenches for logmask decoding and compositing.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - Bitmap payload decoding (decode_bitmap)
//! - Layer compositing by class priority (composite)
//! - The whole per-image pipeline on a fixture (rasterize_document)

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use logmask::annotation::io_supervisely::from_annotation_str;
use logmask::annotation::{ClassConfig, ClassId};
use logmask::pipeline::rasterize_document;
use logmask::raster::{
    composite, decode_bitmap, encode_bitmap, rasterize_points, rasterize_polygon, BitMask,
    ClassLayerStack,
};

// Include test fixtures at compile time (no file I/O during benchmark)
const LOG_FIXTURE: &str = include_str!("../tests/fixtures/sample_log.json");

const SIDE: usize = 512;

/// Benchmark decoding a large bitmap payload.
fn bench_bitmap_decode(c: &mut Criterion) {
    let mask = BitMask::from_fn(256, 256, |r, col| (r / 8 + col / 8) % 2 == 0);
    let data = encode_bitmap(&mask).expect("Failed to encode bench bitmap");

    let mut group = c.benchmark_group("bitmap");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("decode_bitmap", |b| {
        b.iter(|| {
            let mask = decode_bitmap(black_box(&data)).unwrap();
            black_box(mask)
        })
    });

    group.finish();
}

/// Benchmark compositing a stack where every class claims overlapping regions.
fn bench_composite(c: &mut Criterion) {
    let config = ClassConfig::default();
    let mut stack = ClassLayerStack::new(config.table().layer_count(), SIDE, SIDE);

    let wood = [
        (0, 0),
        (SIDE as i32 - 1, 0),
        (SIDE as i32 - 1, SIDE as i32 - 1),
        (0, SIDE as i32 - 1),
    ]
    .map(|(x, y)| logmask::annotation::PixelXY::new(x, y));
    stack.merge_patch(&rasterize_polygon(ClassId::new(10), &wood, SIDE, SIDE).0);
    for id in 1..10u8 {
        let center = logmask::annotation::PixelXY::new(40 * id as i32, 30 * id as i32);
        stack.merge_patch(&rasterize_points(ClassId::new(id), &[center], 60, SIDE, SIDE).0);
    }

    let mut group = c.benchmark_group("composite");
    group.throughput(Throughput::Elements((SIDE * SIDE) as u64));

    group.bench_function("composite_512", |b| {
        b.iter(|| {
            let mask = composite(black_box(&stack), config.priority());
            black_box(mask)
        })
    });

    group.finish();
}

/// Benchmark the full pipeline on the sample log fixture.
fn bench_rasterize_document(c: &mut Criterion) {
    // Parse the fixture once (outside the timed region)
    let document = from_annotation_str(LOG_FIXTURE).expect("Failed to parse log fixture");
    let config = ClassConfig::default();

    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(document.objects.len() as u64));

    group.bench_function("rasterize_document", |b| {
        b.iter(|| {
            let out = rasterize_document(black_box(&document), &config).unwrap();
            black_box(out)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_bitmap_decode,
    bench_composite,
    bench_rasterize_document,
);
criterion_main!(benches);
