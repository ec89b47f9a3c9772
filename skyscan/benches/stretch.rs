//! Benchmark for the percentile stretch.
//!
//! Run with: cargo bench -p skyscan --features synthetic --bench stretch

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use skyscan::{PercentileTable, StretchConfig, compute_stretch_window, render, render_preview};

mod support;

fn stretch_benchmarks(c: &mut Criterion) {
    let image = support::star_field(2048, 2048, 500, 42);
    let sanitized = image.sanitize();
    let window = compute_stretch_window(&sanitized, 1.0, 99.0).expect("non-degenerate field");
    let table = PercentileTable::new(&sanitized);

    c.bench_function("stretch_window_2k", |b| {
        b.iter(|| black_box(compute_stretch_window(black_box(&sanitized), 1.0, 99.0)))
    });

    c.bench_function("stretch_window_from_table_2k", |b| {
        b.iter(|| black_box(table.window(black_box(0.5), black_box(99.5))))
    });

    c.bench_function("render_2k", |b| {
        b.iter(|| black_box(render(black_box(&sanitized), black_box(&window))))
    });

    c.bench_function("preview_2k", |b| {
        let config = StretchConfig::default();
        b.iter(|| black_box(render_preview(black_box(&image), &config)))
    });
}

criterion_group!(benches, stretch_benchmarks);
criterion_main!(benches);
