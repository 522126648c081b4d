//! Latency benchmarks for the signal extractors
//!
//! Measures the heuristic paths only; the pretrained text model and the
//! ffmpeg frame source are excluded so results do not depend on downloads or
//! installed tools.
//!
//! Run with: cargo bench -p provenant-detectors

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{ImageFormat, Rgb, RgbImage};
use provenant_core::{Capability, ImageInput};
use provenant_detectors::media::{pixels, ExifReader, MetadataReader, VideoInfo};
use provenant_detectors::video::FrameAccumulator;
use provenant_detectors::{ImageSignalExtractor, TextSignalExtractor};
use std::io::Cursor;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Benchmark the text heuristics over increasing input sizes
fn benchmark_text_extractor(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let extractor = TextSignalExtractor::heuristic();

    let paragraph = "Furthermore, it is crucial to delve into the multifaceted landscape of \
        modern technology. My neighbour's dog barked all night, so I barely slept. \
        Moreover, the comprehensive ecosystem leverages innovative paradigms. ";
    let test_cases = vec![
        ("short", paragraph.to_string()),
        ("medium", paragraph.repeat(10)),
        ("long", paragraph.repeat(100)),
    ];

    let mut group = c.benchmark_group("Text_Extractor");
    group.sample_size(100);

    for (name, text) in &test_cases {
        group.bench_with_input(BenchmarkId::new("analyze", name), text, |b, text| {
            b.iter(|| rt.block_on(async { extractor.analyze(black_box(text)).await }));
        });
    }

    group.finish();
}

fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode PNG fixture");
    out.into_inner()
}

/// Benchmark the full image path with metadata and pixel statistics
fn benchmark_image_extractor(c: &mut Criterion) {
    let extractor = ImageSignalExtractor::new(
        Capability::Available(Arc::new(ExifReader::new()) as Arc<dyn MetadataReader>),
        Capability::Available(()),
    );

    let mut group = c.benchmark_group("Image_Extractor");
    group.sample_size(20);

    for size in [256u32, 1024] {
        let input = ImageInput::new(png_fixture(size, size), "render.png", "image/png");
        group.bench_with_input(BenchmarkId::new("analyze", size), &input, |b, input| {
            b.iter(|| extractor.analyze(black_box(input)));
        });
    }

    let rgb = pixels::decode_rgb(&png_fixture(1024, 1024)).expect("Failed to decode fixture");
    group.bench_function("texture_uniformity_1024", |b| {
        b.iter(|| pixels::texture_uniformity(black_box(&rgb)))
    });

    group.finish();
}

/// Benchmark per-frame statistics at common resolutions
fn benchmark_frame_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("Frame_Statistics");
    group.sample_size(20);

    for (name, width, height) in [("480p", 854u32, 480u32), ("720p", 1280, 720)] {
        let frame = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let info = VideoInfo {
            width,
            height,
            fps: 30.0,
            frame_count: 2,
        };
        group.bench_with_input(BenchmarkId::new("two_frames", name), &frame, |b, frame| {
            b.iter(|| {
                let mut acc = FrameAccumulator::new();
                acc.push(black_box(frame), None);
                acc.push(black_box(frame), None);
                acc.finish(&info)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_text_extractor,
    benchmark_image_extractor,
    benchmark_frame_statistics
);
criterion_main!(benches);
