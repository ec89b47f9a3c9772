//! Tests for statistical functions.

use super::*;

// ---------------------------------------------------------------------------
// Median tests
// ---------------------------------------------------------------------------

#[test]
fn test_median_odd() {
    let mut values = [1.0, 3.0, 2.0, 5.0, 4.0];
    assert_eq!(median_mut(&mut values), 3.0);
}

#[test]
fn test_median_even_averages_middle_pair() {
    let mut values = [4.0, 1.0, 3.0, 2.0];
    assert_eq!(median_mut(&mut values), 2.5);
}

#[test]
fn test_median_single() {
    let mut values = [42.0];
    assert_eq!(median_mut(&mut values), 42.0);
}

#[test]
fn test_median_negative() {
    let mut values = [-5.0, -3.0, -1.0, 2.0, 4.0];
    assert_eq!(median_mut(&mut values), -1.0);
}

// ---------------------------------------------------------------------------
// Mean / std tests
// ---------------------------------------------------------------------------

#[test]
fn test_mean_and_std_known_values() {
    // Mean = 5, population variance = 4
    let (mean, std) = mean_and_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
    assert!((mean - 5.0).abs() < 1e-12);
    assert!((std - 2.0).abs() < 1e-12);
}

#[test]
fn test_mean_and_std_constant() {
    let (mean, std) = mean_and_std(&[3.5; 7]);
    assert_eq!(mean, 3.5);
    assert_eq!(std, 0.0);
}

#[test]
fn test_mean_and_std_empty() {
    assert_eq!(mean_and_std(&[]), (0.0, 0.0));
}

// ---------------------------------------------------------------------------
// Percentile tests
// ---------------------------------------------------------------------------

#[test]
fn test_percentile_endpoints() {
    let sorted = [1.0, 2.0, 3.0, 4.0];
    assert_eq!(percentile_sorted(&sorted, 0.0), 1.0);
    assert_eq!(percentile_sorted(&sorted, 100.0), 4.0);
}

#[test]
fn test_percentile_linear_interpolation() {
    let sorted = [1.0, 2.0, 3.0, 4.0];
    // rank = 0.5 * 3 = 1.5
    assert!((percentile_sorted(&sorted, 50.0) - 2.5).abs() < 1e-12);
    // rank = 0.25 * 3 = 0.75
    assert!((percentile_sorted(&sorted, 25.0) - 1.75).abs() < 1e-12);
    // rank = 0.99 * 3 = 2.97
    assert!((percentile_sorted(&sorted, 99.0) - 3.97).abs() < 1e-12);
}

#[test]
fn test_percentile_single_sample() {
    assert_eq!(percentile_sorted(&[7.0], 0.0), 7.0);
    assert_eq!(percentile_sorted(&[7.0], 63.0), 7.0);
    assert_eq!(percentile_sorted(&[7.0], 100.0), 7.0);
}

#[test]
fn test_percentile_is_monotone() {
    let mut sorted: Vec<f64> = (0..257)
        .map(|i| ((i * 7919) % 257) as f64 * 0.37 - 20.0)
        .collect();
    sorted.sort_by(f64::total_cmp);

    let mut previous = f64::NEG_INFINITY;
    for step in 0..=1000 {
        let p = step as f64 / 10.0;
        let value = percentile_sorted(&sorted, p);
        assert!(
            value >= previous,
            "percentile({}) = {} dropped below {}",
            p,
            value,
            previous
        );
        previous = value;
    }
}

// ---------------------------------------------------------------------------
// Sigma clipping tests
// ---------------------------------------------------------------------------

fn ramp_with_outlier() -> Vec<f64> {
    let mut values: Vec<f64> = (0..=100).map(f64::from).collect();
    values.push(1.0e6);
    values
}

#[test]
fn test_sigma_clip_empty_input() {
    assert!(sigma_clipped_stats(&[], &SigmaClip::default()).is_none());
}

#[test]
fn test_sigma_clip_rejects_outlier_and_converges() {
    let stats = sigma_clipped_stats(&ramp_with_outlier(), &SigmaClip::default()).unwrap();

    assert!(stats.converged);
    // First pass drops the outlier, second pass rejects nothing.
    assert_eq!(stats.iterations, 2);
    assert_eq!(stats.retained, 101);
    assert!((stats.mean - 50.0).abs() < 1e-9);
    assert!((stats.median - 50.0).abs() < 1e-9);
    // Population std of 0..=100 = sqrt((101² - 1) / 12)
    let expected_std = ((101.0f64 * 101.0 - 1.0) / 12.0).sqrt();
    assert!((stats.std - expected_std).abs() < 1e-9);
}

#[test]
fn test_sigma_clip_respects_iteration_cap() {
    let clip = SigmaClip {
        sigma: 3.0,
        max_iterations: 1,
    };
    let stats = sigma_clipped_stats(&ramp_with_outlier(), &clip).unwrap();

    assert!(!stats.converged, "cap reached after a rejecting iteration");
    assert_eq!(stats.iterations, 1);
    // Best effort: the one iteration that ran is still applied.
    assert_eq!(stats.retained, 101);
    assert!((stats.median - 50.0).abs() < 1e-9);
}

#[test]
fn test_sigma_clip_constant_data_converges_immediately() {
    let stats = sigma_clipped_stats(&[2.0; 50], &SigmaClip::default()).unwrap();
    assert!(stats.converged);
    assert_eq!(stats.iterations, 1);
    assert_eq!(stats.retained, 50);
    assert_eq!(stats.median, 2.0);
    assert_eq!(stats.std, 0.0);
}

#[test]
fn test_sigma_clip_heavy_tail_stops_at_cap() {
    // Geometric tail: every pass exposes a new outlier.
    let mut values = vec![0.0; 20];
    values.extend((0..40).map(|i| 2.0f64.powi(i)));
    let clip = SigmaClip {
        sigma: 1.0,
        max_iterations: 3,
    };
    let stats = sigma_clipped_stats(&values, &clip).unwrap();
    assert_eq!(stats.iterations, 3);
    assert!(!stats.converged);
    assert!(stats.retained < values.len());
}

#[test]
fn test_sigma_clip_validate() {
    assert!(SigmaClip::default().validate().is_ok());
    assert!(SigmaClip::new(0.0).validate().is_err());
    assert!(SigmaClip::new(f64::NAN).validate().is_err());
    let no_iterations = SigmaClip {
        sigma: 3.0,
        max_iterations: 0,
    };
    assert!(matches!(
        no_iterations.validate(),
        Err(Error::InvalidConfiguration(_))
    ));
}
