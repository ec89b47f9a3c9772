//! Example: stretch and analyse a synthetic star field
//!
//! Builds a noisy frame with a handful of round stars and one elongated blob,
//! renders the percentile-stretched preview to a PNG and prints the detection
//! summary.
//!
//! Output:
//! ```text
//! test_output/
//!   synthetic_field.png
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run -p skyscan --features synthetic --example synthetic_field
//! RUST_LOG=skyscan=debug cargo run -p skyscan --features synthetic --example synthetic_field
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use common::{LogConfig, setup_logging};
use image::GrayImage;
use skyscan::synthetic::{Field, NoiseRng};
use skyscan::{Image, StarDetector, StretchConfig, render_preview};

const WIDTH: usize = 512;
const HEIGHT: usize = 384;
const SKY: f64 = 800.0;
const NOISE: f64 = 12.0;
const STAR_COUNT: usize = 40;
const FWHM: f64 = 3.0;

fn main() -> anyhow::Result<()> {
    setup_logging(&LogConfig {
        directory: None,
        ..Default::default()
    })?;

    let image = synthetic_field(0x5eed)?;
    tracing::info!(width = image.width(), height = image.height(), "Field generated");

    let start = Instant::now();
    let preview = render_preview(&image, &StretchConfig::default())?;
    tracing::info!(
        vmin = preview.window.vmin(),
        vmax = preview.window.vmax(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Preview rendered"
    );

    let output_dir = PathBuf::from("test_output");
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let output_path = output_dir.join("synthetic_field.png");
    let png = GrayImage::from_raw(
        preview.display.width() as u32,
        preview.display.height() as u32,
        preview.display.as_bytes().to_vec(),
    )
    .context("display buffer does not match its dimensions")?;
    png.save(&output_path)
        .with_context(|| format!("writing {}", output_path.display()))?;
    tracing::info!(path = %output_path.display(), "Preview saved");

    let busiest = preview
        .histogram
        .counts()
        .iter()
        .enumerate()
        .max_by_key(|(_, count)| **count)
        .map(|(bin, _)| preview.histogram.bin_range(bin));
    if let Some((lo, hi)) = busiest {
        tracing::info!(lo, hi, "Most populated histogram bin");
    }

    let start = Instant::now();
    let report = StarDetector::new().with_fwhm(FWHM).detect(&image)?;
    tracing::info!(
        count = report.result.count,
        background_median = report.background.median,
        background_std = report.background.std,
        threshold = report.threshold,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Detection finished"
    );

    for source in report.sources.iter().take(10) {
        tracing::info!(
            x = source.x,
            y = source.y,
            response = source.response,
            sharpness = source.sharpness,
            roundness1 = source.roundness1,
            roundness2 = source.roundness2,
            "Source"
        );
    }

    println!("{}", report.result);
    println!("{}", serde_json::to_string_pretty(&report.result)?);
    Ok(())
}

fn synthetic_field(seed: u64) -> anyhow::Result<Image> {
    let mut rng = NoiseRng::new(seed);
    let mut field = Field::new(WIDTH, HEIGHT)
        .background(SKY)
        .noise_from(NOISE, &mut rng);

    for _ in 0..STAR_COUNT {
        let cx = rng.uniform(10.0, (WIDTH - 10) as f64);
        let cy = rng.uniform(10.0, (HEIGHT - 10) as f64);
        let amplitude = rng.uniform(8.0, 200.0) * NOISE;
        field = field.star(cx, cy, FWHM, amplitude);
    }

    let sigma = skyscan::math::fwhm_to_sigma(FWHM);
    field = field.elliptical_star(
        WIDTH as f64 / 2.0,
        HEIGHT as f64 / 2.0,
        1.6 * sigma,
        sigma,
        0.0,
        60.0 * NOISE,
    );

    // A few bad pixels, as a detector with a masked column would deliver.
    for y in 100..110 {
        field = field.set(37, y, f64::NAN);
    }

    Ok(field.build()?)
}
