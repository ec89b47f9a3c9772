use super::*;

fn sanitized(width: usize, height: usize, pixels: Vec<f64>) -> SanitizedImage {
    Image::new(width, height, pixels).unwrap().sanitize()
}

/// 0, 1, ..., n-1 laid out in a single row.
fn ramp(n: usize) -> SanitizedImage {
    sanitized(n, 1, (0..n).map(|i| i as f64).collect())
}

/// Deterministic pseudo-random field spanning several orders of magnitude.
fn wild_field(width: usize, height: usize) -> SanitizedImage {
    let pixels = (0..width * height)
        .map(|i| {
            let h = (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 40;
            (h as f64 / 16_777_216.0).powi(3) * 1.0e5 - 250.0
        })
        .collect();
    sanitized(width, height, pixels)
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_defaults() {
    let config = StretchConfig::default();
    assert_eq!(config.low_percentile, 1.0);
    assert_eq!(config.high_percentile, 99.0);
    assert_eq!(config.histogram_bins, 128);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_rejects_bad_values() {
    let bad = [
        StretchConfig {
            low_percentile: 50.0,
            high_percentile: 50.0,
            ..Default::default()
        },
        StretchConfig {
            low_percentile: 60.0,
            high_percentile: 40.0,
            ..Default::default()
        },
        StretchConfig {
            low_percentile: -1.0,
            ..Default::default()
        },
        StretchConfig {
            high_percentile: 100.5,
            ..Default::default()
        },
        StretchConfig {
            low_percentile: f64::NAN,
            ..Default::default()
        },
        StretchConfig {
            histogram_bins: 0,
            ..Default::default()
        },
    ];
    for config in bad {
        assert!(
            matches!(config.validate(), Err(Error::InvalidConfiguration(_))),
            "{:?} should be rejected",
            config
        );
    }
}

#[test]
fn test_config_deserializes_partial_json() {
    let config: StretchConfig = serde_json::from_str(r#"{"high_percentile": 99.5}"#).unwrap();
    assert_eq!(config.low_percentile, 1.0);
    assert_eq!(config.high_percentile, 99.5);
    assert_eq!(config.histogram_bins, 128);
}

// ============================================================================
// StretchWindow
// ============================================================================

#[test]
fn test_window_equal_bounds_is_degenerate() {
    assert_eq!(
        StretchWindow::new(3.0, 3.0),
        Err(Error::DegenerateImage { value: 3.0 })
    );
}

#[test]
fn test_window_inverted_or_non_finite_is_invalid() {
    assert!(matches!(
        StretchWindow::new(5.0, 1.0),
        Err(Error::InvalidConfiguration(_))
    ));
    assert!(matches!(
        StretchWindow::new(f64::NEG_INFINITY, 1.0),
        Err(Error::InvalidConfiguration(_))
    ));
    assert!(matches!(
        StretchWindow::new(0.0, f64::NAN),
        Err(Error::InvalidConfiguration(_))
    ));
}

#[test]
fn test_window_map_formula() {
    let window = StretchWindow::new(0.0, 10.0).unwrap();
    assert_eq!(window.map(-3.0), 0);
    assert_eq!(window.map(0.0), 0);
    // 0.5 * 255 = 127.5 -> floor
    assert_eq!(window.map(5.0), 127);
    assert_eq!(window.map(9.99), 254);
    assert_eq!(window.map(10.0), 255);
    assert_eq!(window.map(1.0e9), 255);
}

// ============================================================================
// Window computation
// ============================================================================

#[test]
fn test_compute_window_on_ramp() {
    // 101 samples 0..=100: percentile p is exactly p
    let window = compute_stretch_window(&ramp(101), 1.0, 99.0).unwrap();
    assert!((window.vmin() - 1.0).abs() < 1e-9);
    assert!((window.vmax() - 99.0).abs() < 1e-9);
}

#[test]
fn test_compute_window_interpolates() {
    let image = sanitized(2, 2, vec![4.0, 1.0, 3.0, 2.0]);
    let window = compute_stretch_window(&image, 25.0, 50.0).unwrap();
    assert!((window.vmin() - 1.75).abs() < 1e-12);
    assert!((window.vmax() - 2.5).abs() < 1e-12);
}

#[test]
fn test_compute_window_constant_image_is_degenerate() {
    let image = sanitized(4, 4, vec![7.0; 16]);
    for (low, high) in [(0.0, 100.0), (1.0, 99.0), (40.0, 60.0)] {
        assert_eq!(
            compute_stretch_window(&image, low, high),
            Err(Error::DegenerateImage { value: 7.0 })
        );
    }
}

#[test]
fn test_compute_window_all_nan_is_degenerate() {
    let image = Image::new(3, 3, vec![f64::NAN; 9]).unwrap().sanitize();
    assert_eq!(
        compute_stretch_window(&image, 1.0, 99.0),
        Err(Error::DegenerateImage { value: 0.0 })
    );
}

#[test]
fn test_compute_window_rejects_bad_percentiles() {
    let image = ramp(10);
    assert!(matches!(
        compute_stretch_window(&image, 99.0, 1.0),
        Err(Error::InvalidConfiguration(_))
    ));
    assert!(matches!(
        compute_stretch_window(&image, 0.0, 101.0),
        Err(Error::InvalidConfiguration(_))
    ));
}

#[test]
fn test_percentile_table_is_monotone() {
    let table = PercentileTable::new(&wild_field(37, 23));
    let mut previous = table.min();
    for step in 0..=400 {
        let value = table.percentile(step as f64 / 4.0).unwrap();
        assert!(value >= previous);
        previous = value;
    }
    assert_eq!(previous, table.max());
    assert!(table.percentile(100.1).is_err());
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_render_full_range_hits_both_ends() {
    let image = wild_field(31, 17);
    let table = PercentileTable::new(&image);
    let window = StretchWindow::new(table.min(), table.max()).unwrap();
    let display = render(&image, &window);

    let min_idx = image
        .pixels()
        .iter()
        .position(|&v| v == table.min())
        .unwrap();
    let max_idx = image
        .pixels()
        .iter()
        .position(|&v| v == table.max())
        .unwrap();
    assert_eq!(display.as_bytes()[min_idx], 0);
    assert_eq!(display.as_bytes()[max_idx], 255);
}

#[test]
fn test_render_keeps_shape() {
    let image = wild_field(13, 29);
    let window = compute_stretch_window(&image, 1.0, 99.0).unwrap();
    let display = render(&image, &window);
    assert_eq!(display.width(), 13);
    assert_eq!(display.height(), 29);
    assert_eq!(display.stride(), 13);
    assert_eq!(display.as_bytes().len(), 13 * 29);
}

#[test]
fn test_render_matches_per_pixel_map() {
    // Tall enough to span many row chunks, with a partial final chunk.
    let image = wild_field(45, 70);
    let window = compute_stretch_window(&image, 2.0, 98.0).unwrap();
    let display = render(&image, &window);

    for y in 0..image.height() {
        for x in 0..image.width() {
            let value = *image.buffer().get(x, y);
            assert_eq!(display.get(x, y), window.map(value), "pixel ({}, {})", x, y);
        }
    }
}

// ============================================================================
// Histogram
// ============================================================================

#[test]
fn test_histogram_rejects_zero_bins() {
    let image = ramp(4);
    let display = render(&image, &StretchWindow::new(0.0, 3.0).unwrap());
    assert!(matches!(
        Histogram::from_display(&display, 0),
        Err(Error::InvalidConfiguration(_))
    ));
}

#[test]
fn test_histogram_bin_edges() {
    let image = ramp(256);
    let display = render(&image, &StretchWindow::new(0.0, 255.0).unwrap());
    let histogram = Histogram::from_display(&display, 128).unwrap();

    assert_eq!(histogram.bin_of(0), 0);
    assert_eq!(histogram.bin_of(1), 0);
    assert_eq!(histogram.bin_of(2), 1);
    assert_eq!(histogram.bin_of(254), 127);
    // Closed last bin
    assert_eq!(histogram.bin_of(255), 127);
    assert_eq!(histogram.total(), 256);
}

#[test]
fn test_histogram_single_bin_counts_everything() {
    let image = wild_field(10, 10);
    let window = compute_stretch_window(&image, 1.0, 99.0).unwrap();
    let display = render(&image, &window);
    let histogram = Histogram::from_display(&display, 1).unwrap();
    assert_eq!(histogram.counts(), &[100]);
}

#[test]
fn test_histogram_matches_display_buffer() {
    let image = wild_field(64, 48);
    for bins in [1, 7, 64, 128, 255, 256, 300] {
        let window = compute_stretch_window(&image, 0.5, 99.5).unwrap();
        let display = render(&image, &window);
        let histogram = Histogram::from_display(&display, bins).unwrap();

        assert_eq!(histogram.bins(), bins);
        assert_eq!(histogram.total(), (64 * 48) as u64);

        let mut expected = vec![0u64; bins];
        for &value in display.as_bytes() {
            let v = value as f64;
            let k = (0..bins)
                .find(|&k| {
                    let (lo, hi) = histogram.bin_range(k);
                    lo <= v && (v < hi || k == bins - 1)
                })
                .unwrap();
            expected[k] += 1;
        }
        assert_eq!(histogram.counts(), &expected[..], "bins = {}", bins);
    }
}

// ============================================================================
// Preview
// ============================================================================

#[test]
fn test_preview_treats_non_finite_as_zero() {
    let mut with_nan: Vec<f64> = (0..100).map(|i| i as f64 - 10.0).collect();
    let mut zero_filled = with_nan.clone();
    for i in [3, 17, 42, 99] {
        with_nan[i] = if i % 2 == 0 { f64::NAN } else { f64::INFINITY };
        zero_filled[i] = 0.0;
    }

    let config = StretchConfig::default();
    let a = render_preview(&Image::new(10, 10, with_nan).unwrap(), &config).unwrap();
    let b = render_preview(&Image::new(10, 10, zero_filled).unwrap(), &config).unwrap();

    assert_eq!(a.window, b.window);
    assert_eq!(a.display, b.display);
    assert_eq!(a.histogram, b.histogram);
}

#[test]
fn test_preview_constant_image_is_degenerate() {
    let image = Image::new(5, 5, vec![-2.5; 25]).unwrap();
    assert!(matches!(
        render_preview(&image, &StretchConfig::default()),
        Err(Error::DegenerateImage { .. })
    ));
}

#[test]
fn test_preview_with_explicit_window() {
    // A constant image is fine when the caller supplies the window.
    let image = Image::new(4, 2, vec![5.0; 8]).unwrap();
    let window = StretchWindow::new(0.0, 10.0).unwrap();
    let preview = render_preview_with_window(&image, window, 16).unwrap();

    assert!(preview.display.as_bytes().iter().all(|&v| v == 127));
    assert_eq!(preview.histogram.counts()[preview.histogram.bin_of(127)], 8);
}
