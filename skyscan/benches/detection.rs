//! Benchmark for point-source detection.
//!
//! Run with: cargo bench -p skyscan --features synthetic --bench detection

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use skyscan::{DaoKernel, StarDetector, background_stats, star_detection::matched_filter};

mod support;

fn detection_benchmarks(c: &mut Criterion) {
    let image = support::star_field(1024, 1024, 200, 7);
    let sanitized = image.sanitize();
    let kernel = DaoKernel::new(3.0, 1.5).expect("valid kernel");

    c.bench_function("background_stats_1k", |b| {
        b.iter(|| black_box(background_stats(black_box(&sanitized), 3.0)))
    });

    c.bench_function("matched_filter_1k", |b| {
        b.iter(|| black_box(matched_filter(black_box(sanitized.buffer()), &kernel)))
    });

    let mut group = c.benchmark_group("detect_1k");
    for fwhm in [3.0, 6.0] {
        let detector = StarDetector::new().with_fwhm(fwhm);
        group.bench_function(format!("fwhm_{}", fwhm), |b| {
            b.iter(|| black_box(detector.detect(black_box(&image))))
        });
    }
    group.finish();
}

criterion_group!(benches, detection_benchmarks);
criterion_main!(benches);
