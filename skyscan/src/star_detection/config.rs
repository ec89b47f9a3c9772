//! Configuration for point-source detection.
//!
//! Flat struct grouped by comments into sections. Defaults reproduce the
//! viewer's fixed detection settings: FWHM 3 px, 5σ threshold, 3σ clipping.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::SigmaClip;

/// Default expected FWHM of stars in pixels.
pub const DEFAULT_FWHM: f64 = 3.0;

/// Default detection threshold in units of background std.
pub const DEFAULT_THRESHOLD_SIGMA: f64 = 5.0;

/// Default kernel truncation radius in units of Gaussian sigma.
pub const DEFAULT_SIGMA_RADIUS: f64 = 1.5;

/// Point-source detection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // ------------------------------------------------------------------------
    // Kernel
    // ------------------------------------------------------------------------
    /// Expected full width at half maximum of stars, in pixels.
    pub fwhm: f64,
    /// Kernel truncation radius in Gaussian sigmas.
    pub sigma_radius: f64,

    // ------------------------------------------------------------------------
    // Background and threshold
    // ------------------------------------------------------------------------
    /// Detection threshold in multiples of the clipped background std.
    pub threshold_sigma: f64,
    /// Sigma clipping used for the background statistics.
    pub clip: SigmaClip,

    // ------------------------------------------------------------------------
    // Peak search
    // ------------------------------------------------------------------------
    /// Minimum distance between two detections in pixels.
    /// `None` uses the kernel width.
    pub min_separation: Option<f64>,
    /// Drop peaks closer than the kernel radius to the image edge.
    pub exclude_border: bool,

    // ------------------------------------------------------------------------
    // Shape filters
    // ------------------------------------------------------------------------
    /// Accepted `(low, high)` sharpness range, inclusive.
    pub sharpness_range: (f64, f64),
    /// Accepted `(low, high)` range for both roundness metrics, inclusive.
    pub roundness_range: (f64, f64),
    /// Reject sources whose background-subtracted peak exceeds this value.
    pub peak_max: Option<f64>,
    /// Keep only the N sources with the highest response.
    pub brightest: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fwhm: DEFAULT_FWHM,
            sigma_radius: DEFAULT_SIGMA_RADIUS,
            threshold_sigma: DEFAULT_THRESHOLD_SIGMA,
            clip: SigmaClip::default(),
            min_separation: None,
            exclude_border: false,
            sharpness_range: (0.2, 1.0),
            roundness_range: (-1.0, 1.0),
            peak_max: None,
            brightest: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        check_positive("fwhm", self.fwhm)?;
        check_positive("sigma_radius", self.sigma_radius)?;
        check_positive("threshold_sigma", self.threshold_sigma)?;
        self.clip.validate()?;

        if let Some(sep) = self.min_separation
            && (!sep.is_finite() || sep < 0.0)
        {
            return Err(Error::InvalidConfiguration(format!(
                "min_separation must be finite and non-negative, got {}",
                sep
            )));
        }
        check_range("sharpness_range", self.sharpness_range)?;
        check_range("roundness_range", self.roundness_range)?;
        if let Some(peak_max) = self.peak_max
            && peak_max.is_nan()
        {
            return Err(Error::InvalidConfiguration(
                "peak_max must not be NaN".to_string(),
            ));
        }
        if self.brightest == Some(0) {
            return Err(Error::InvalidConfiguration(
                "brightest must keep at least one source".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::InvalidConfiguration(format!(
            "{} must be finite and positive, got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_range(name: &str, (low, high): (f64, f64)) -> Result<()> {
    if low.is_nan() || high.is_nan() || low > high {
        return Err(Error::InvalidConfiguration(format!(
            "{} must be an ordered (low, high) pair, got ({}, {})",
            name, low, high
        )));
    }
    Ok(())
}
