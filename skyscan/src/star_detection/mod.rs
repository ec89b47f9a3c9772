//! Point-source detection with DAOFIND-style shape statistics.
//!
//! # Algorithm Overview
//!
//! 1. **Sanitize**: replace non-finite samples with zero.
//!
//! 2. **Background**: sigma-clipped mean, median and std over the whole frame;
//!    the median is subtracted from every pixel.
//!
//! 3. **Matched filter**: correlate with a zero-mean truncated Gaussian kernel
//!    whose response is the amplitude of a star centered on each pixel.
//!
//! 4. **Peak search**: response maxima above `threshold_sigma · std · relerr`,
//!    thinned by non-maximum suppression within `min_separation`.
//!
//! 5. **Shape statistics**: sharpness, roundness1 (x/y marginal fits),
//!    roundness2 (diagonal marginal fits) and a sub-pixel centroid.
//!
//! 6. **Filtering and summary**: shape cuts, optional peak ceiling and
//!    brightest-N selection, then count and mean roundness.

mod background;
mod config;
mod convolution;
mod kernel;
mod measure;
mod peaks;
mod source;


use rayon::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::image::Image;

pub use background::{BackgroundStats, background_stats, robust_background_stats};
pub use config::{Config, DEFAULT_FWHM, DEFAULT_SIGMA_RADIUS, DEFAULT_THRESHOLD_SIGMA};
pub use convolution::matched_filter;
pub use kernel::DaoKernel;
pub use source::{DetectionResult, SourceRecord};

use measure::measure;
use peaks::find_peaks;

/// Everything one detection run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    /// Catalog ordered by response, brightest first; ties by `(y, x)`.
    pub sources: Vec<SourceRecord>,
    pub result: DetectionResult,
    pub background: BackgroundStats,
    /// Response threshold actually applied.
    pub threshold: f64,
    pub diagnostics: Diagnostics,
}

/// Counts from each pipeline stage, for tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Diagnostics {
    /// Non-finite input samples replaced by zero.
    pub sanitized_pixels: usize,
    /// Response maxima above threshold.
    pub local_maxima: usize,
    /// Maxima dropped by non-maximum suppression.
    pub rejected_duplicates: usize,
    pub rejected_border: usize,
    /// Shape fits that did not produce finite metrics.
    pub rejected_failed_fit: usize,
    pub rejected_sharpness: usize,
    pub rejected_roundness: usize,
    pub rejected_peak_max: usize,
    /// Sources dropped by the brightest-N cut.
    pub rejected_brightest: usize,
    pub final_count: usize,
}

/// Point-source detector with builder-style configuration.
///
/// # Example
///
/// ```rust,ignore
/// use skyscan::{Image, StarDetector};
///
/// let detector = StarDetector::new()
///     .with_fwhm(3.5)
///     .with_threshold_sigma(4.0);
/// let report = detector.detect(&image)?;
/// println!("{}", report.result);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StarDetector {
    config: Config,
}

impl StarDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn with_fwhm(mut self, fwhm: f64) -> Self {
        self.config.fwhm = fwhm;
        self
    }

    pub fn with_threshold_sigma(mut self, threshold_sigma: f64) -> Self {
        self.config.threshold_sigma = threshold_sigma;
        self
    }

    pub fn with_clip_sigma(mut self, clip_sigma: f64) -> Self {
        self.config.clip.sigma = clip_sigma;
        self
    }

    pub fn with_clip_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.clip.max_iterations = max_iterations;
        self
    }

    pub fn with_sigma_radius(mut self, sigma_radius: f64) -> Self {
        self.config.sigma_radius = sigma_radius;
        self
    }

    pub fn with_min_separation(mut self, min_separation: f64) -> Self {
        self.config.min_separation = Some(min_separation);
        self
    }

    pub fn with_exclude_border(mut self, exclude_border: bool) -> Self {
        self.config.exclude_border = exclude_border;
        self
    }

    pub fn with_sharpness_range(mut self, low: f64, high: f64) -> Self {
        self.config.sharpness_range = (low, high);
        self
    }

    pub fn with_roundness_range(mut self, low: f64, high: f64) -> Self {
        self.config.roundness_range = (low, high);
        self
    }

    pub fn with_peak_max(mut self, peak_max: f64) -> Self {
        self.config.peak_max = Some(peak_max);
        self
    }

    pub fn with_brightest(mut self, brightest: usize) -> Self {
        self.config.brightest = Some(brightest);
        self
    }

    /// Detect point sources in `image`.
    ///
    /// The image is not modified. Finding nothing is a normal `Ok` outcome.
    pub fn detect(&self, image: &Image) -> Result<DetectionReport> {
        let config = &self.config;
        config.validate()?;

        let sanitized = image.sanitize();
        let kernel = DaoKernel::new(config.fwhm, config.sigma_radius)?;

        // Step 1: Background statistics and subtraction
        let background = robust_background_stats(&sanitized, &config.clip)?;
        let working = sanitized.subtract(background.median);
        let threshold = config.threshold_sigma * background.std * kernel.relerr();

        tracing::debug!(
            fwhm = config.fwhm,
            radius = kernel.radius(),
            npixels = kernel.npixels(),
            relerr = kernel.relerr(),
            threshold,
            "Prepared matched filter"
        );

        // Step 2: Matched filter and peak search
        let response = matched_filter(&working, &kernel);
        let min_separation = config
            .min_separation
            .unwrap_or(kernel.size() as f64);
        let border = config.exclude_border.then_some(kernel.radius());
        let search = find_peaks(&response, threshold, min_separation, border);

        let mut diagnostics = Diagnostics {
            sanitized_pixels: sanitized.replaced(),
            local_maxima: search.local_maxima,
            rejected_duplicates: search.suppressed,
            rejected_border: search.near_border,
            ..Default::default()
        };

        // Step 3: Shape statistics (parallel, order preserved)
        let measured: Vec<SourceRecord> = search
            .peaks
            .par_iter()
            .map(|peak| measure(&working, &kernel, peak))
            .collect();

        // Step 4: Quality filters
        let (sharp_lo, sharp_hi) = config.sharpness_range;
        let (round_lo, round_hi) = config.roundness_range;
        let in_round = |r: f64| (round_lo..=round_hi).contains(&r);

        let mut sources: Vec<SourceRecord> = measured
            .into_iter()
            .filter(|s| {
                let keep = if !s.is_finite() {
                    diagnostics.rejected_failed_fit += 1;
                    false
                } else if !(sharp_lo..=sharp_hi).contains(&s.sharpness) {
                    diagnostics.rejected_sharpness += 1;
                    false
                } else if !in_round(s.roundness1) || !in_round(s.roundness2) {
                    diagnostics.rejected_roundness += 1;
                    false
                } else if config.peak_max.is_some_and(|max| s.peak > max) {
                    diagnostics.rejected_peak_max += 1;
                    false
                } else {
                    true
                };
                if !keep {
                    tracing::trace!(
                        x = s.x,
                        y = s.y,
                        sharpness = s.sharpness,
                        roundness1 = s.roundness1,
                        roundness2 = s.roundness2,
                        "Rejected candidate"
                    );
                }
                keep
            })
            .collect();

        // Step 5: Ordering and brightest-N
        sort_catalog(&mut sources);
        if let Some(n) = config.brightest
            && sources.len() > n
        {
            diagnostics.rejected_brightest = sources.len() - n;
            sources.truncate(n);
        }

        diagnostics.final_count = sources.len();
        let result = DetectionResult::from_sources(&sources);

        tracing::debug!(
            count = result.count,
            local_maxima = diagnostics.local_maxima,
            rejected_sharpness = diagnostics.rejected_sharpness,
            rejected_roundness = diagnostics.rejected_roundness,
            "Detection finished"
        );

        Ok(DetectionReport {
            sources,
            result,
            background,
            threshold,
            diagnostics,
        })
    }
}

/// Response descending. The sort is stable and peaks arrive in `(y, x)` order
/// among equal responses, so ties keep that order.
fn sort_catalog(sources: &mut [SourceRecord]) {
    sources.sort_by(|a, b| b.response.total_cmp(&a.response));
}

/// Detect sources with default settings apart from `fwhm` and `threshold_sigma`.
///
/// Returns the catalog and its summary.
pub fn detect_sources(
    image: &Image,
    fwhm: f64,
    threshold_sigma: f64,
) -> Result<(Vec<SourceRecord>, DetectionResult)> {
    let report = StarDetector::new()
        .with_fwhm(fwhm)
        .with_threshold_sigma(threshold_sigma)
        .detect(image)?;
    Ok((report.sources, report.result))
}
