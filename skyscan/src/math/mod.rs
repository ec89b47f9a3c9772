//! Numerical helpers shared by the renderer and the detector.

pub mod statistics;

pub use statistics::{
    ClippedStats, SigmaClip, mean_and_std, median_mut, percentile_sorted, sigma_clipped_stats,
};

/// FWHM to Gaussian sigma conversion factor, `2·sqrt(2·ln 2)`.
pub const FWHM_TO_SIGMA: f64 = 2.354_820_045_030_949;

/// Convert a full width at half maximum to a Gaussian sigma.
#[inline]
pub fn fwhm_to_sigma(fwhm: f64) -> f64 {
    fwhm / FWHM_TO_SIGMA
}
