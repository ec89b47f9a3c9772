//! Global background level and noise from sigma-clipped statistics.

use crate::error::{Error, Result};
use crate::image::SanitizedImage;
use crate::math::{ClippedStats, SigmaClip, sigma_clipped_stats};

/// Robust `(mean, median, std)` of the sky plus clipping metadata.
pub type BackgroundStats = ClippedStats;

/// Sigma-clipped background statistics over every pixel of `image`.
///
/// Zero-filled non-finite pixels take part like any other sample.
pub fn robust_background_stats(
    image: &SanitizedImage,
    clip: &SigmaClip,
) -> Result<BackgroundStats> {
    clip.validate()?;

    let stats = sigma_clipped_stats(image.pixels(), clip).ok_or_else(|| {
        Error::InvalidShape("background statistics need at least one pixel".to_string())
    })?;

    if !stats.converged {
        tracing::warn!(
            iterations = stats.iterations,
            retained = stats.retained,
            "Sigma clipping stopped at the iteration cap"
        );
    }
    tracing::debug!(
        mean = stats.mean,
        median = stats.median,
        std = stats.std,
        iterations = stats.iterations,
        "Background statistics"
    );

    Ok(stats)
}

/// [`robust_background_stats`] with the default iteration cap.
pub fn background_stats(image: &SanitizedImage, clip_sigma: f64) -> Result<BackgroundStats> {
    robust_background_stats(image, &SigmaClip::new(clip_sigma))
}
