//! Percentile stretch: linear remap of a high-dynamic-range image onto 8-bit
//! display values, using two percentiles of the data as black and white points.

#[cfg(test)]
mod tests;

mod histogram;

pub use histogram::{DEFAULT_HISTOGRAM_BINS, Histogram};

use common::Buffer2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image::{Image, SanitizedImage};
use crate::math::percentile_sorted;

/// Default black point percentile.
pub const DEFAULT_LOW_PERCENTILE: f64 = 1.0;

/// Default white point percentile.
pub const DEFAULT_HIGH_PERCENTILE: f64 = 99.0;

/// Rows handed to one rayon task while rendering.
const ROWS_PER_CHUNK: usize = 8;

/// Parameters of a preview refresh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StretchConfig {
    /// Black point percentile in `[0, 100)`.
    pub low_percentile: f64,
    /// White point percentile in `(low_percentile, 100]`.
    pub high_percentile: f64,
    /// Number of histogram bins over `[0, 255]`.
    pub histogram_bins: usize,
}

impl Default for StretchConfig {
    fn default() -> Self {
        Self {
            low_percentile: DEFAULT_LOW_PERCENTILE,
            high_percentile: DEFAULT_HIGH_PERCENTILE,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl StretchConfig {
    pub fn validate(&self) -> Result<()> {
        validate_percentiles(self.low_percentile, self.high_percentile)?;
        if self.histogram_bins == 0 {
            return Err(Error::InvalidConfiguration(
                "histogram needs at least one bin".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_percentiles(low: f64, high: f64) -> Result<()> {
    if !low.is_finite() || !high.is_finite() {
        return Err(Error::InvalidConfiguration(format!(
            "percentiles must be finite, got low={} high={}",
            low, high
        )));
    }
    if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low >= high {
        return Err(Error::InvalidConfiguration(format!(
            "percentiles must satisfy 0 <= low < high <= 100, got low={} high={}",
            low, high
        )));
    }
    Ok(())
}

/// Black and white points of a stretch. Always finite with `vmin < vmax`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StretchWindow {
    vmin: f64,
    vmax: f64,
}

impl StretchWindow {
    /// Window from explicit bounds, e.g. a user-dragged slider.
    ///
    /// Equal bounds are [`Error::DegenerateImage`]; inverted or non-finite
    /// bounds are [`Error::InvalidConfiguration`].
    pub fn new(vmin: f64, vmax: f64) -> Result<Self> {
        if !vmin.is_finite() || !vmax.is_finite() {
            return Err(Error::InvalidConfiguration(format!(
                "stretch bounds must be finite, got [{}, {}]",
                vmin, vmax
            )));
        }
        if vmin == vmax {
            return Err(Error::DegenerateImage { value: vmin });
        }
        if vmin > vmax {
            return Err(Error::InvalidConfiguration(format!(
                "stretch window is inverted: vmin={} > vmax={}",
                vmin, vmax
            )));
        }
        Ok(Self { vmin, vmax })
    }

    #[inline]
    pub fn vmin(&self) -> f64 {
        self.vmin
    }

    #[inline]
    pub fn vmax(&self) -> f64 {
        self.vmax
    }

    /// `vmax - vmin`, strictly positive.
    #[inline]
    pub fn span(&self) -> f64 {
        self.vmax - self.vmin
    }

    /// Display value of one sample: clip, normalize, scale to 255, floor.
    #[inline]
    pub fn map(&self, value: f64) -> u8 {
        let normalized = (value.clamp(self.vmin, self.vmax) - self.vmin) / self.span();
        (normalized * 255.0).floor().clamp(0.0, 255.0) as u8
    }
}

/// Sorted copy of an image's samples.
///
/// Sorting dominates window computation, so a slider that re-queries
/// percentiles should build one table per image and reuse it.
#[derive(Debug, Clone)]
pub struct PercentileTable {
    sorted: Vec<f64>,
}

impl PercentileTable {
    pub fn new(image: &SanitizedImage) -> Self {
        let mut sorted = image.pixels().to_vec();
        sorted.par_sort_unstable_by(f64::total_cmp);
        Self { sorted }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.sorted[0]
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.sorted[self.sorted.len() - 1]
    }

    /// Value at percentile `p` in `[0, 100]`, linearly interpolated.
    pub fn percentile(&self, p: f64) -> Result<f64> {
        if !(0.0..=100.0).contains(&p) {
            return Err(Error::InvalidConfiguration(format!(
                "percentile must be in [0, 100], got {}",
                p
            )));
        }
        Ok(percentile_sorted(&self.sorted, p))
    }

    /// Stretch window between percentiles `low` and `high`.
    pub fn window(&self, low: f64, high: f64) -> Result<StretchWindow> {
        validate_percentiles(low, high)?;
        let vmin = percentile_sorted(&self.sorted, low);
        let vmax = percentile_sorted(&self.sorted, high);
        StretchWindow::new(vmin, vmax)
    }
}

/// Stretch window between the `low` and `high` percentiles of `image`.
///
/// Fails with [`Error::DegenerateImage`] when both percentiles land on the
/// same value, e.g. for a constant image.
pub fn compute_stretch_window(
    image: &SanitizedImage,
    low: f64,
    high: f64,
) -> Result<StretchWindow> {
    validate_percentiles(low, high)?;
    let window = PercentileTable::new(image).window(low, high)?;

    tracing::debug!(
        low,
        high,
        vmin = window.vmin(),
        vmax = window.vmax(),
        "Computed stretch window"
    );

    Ok(window)
}

/// 8-bit grayscale rendering, same shape as the source image.
///
/// Rows are tightly packed: `stride() == width()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBuffer {
    data: Buffer2<u8>,
}

impl DisplayBuffer {
    #[inline]
    pub fn width(&self) -> usize {
        self.data.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.data.height()
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.data.stride()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        *self.data.get(x, y)
    }

    /// Row-major bytes, e.g. for `image::GrayImage::from_raw`.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.data.pixels()
    }

    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data.into_vec()
    }
}

/// Map every sample of `image` through `window`.
pub fn render(image: &SanitizedImage, window: &StretchWindow) -> DisplayBuffer {
    let width = image.width();
    let input = image.pixels();
    let mut data = Buffer2::new_filled(width, image.height(), 0u8);

    data.pixels_mut()
        .par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, out_chunk)| {
            let start = chunk_idx * width * ROWS_PER_CHUNK;
            let in_chunk = &input[start..start + out_chunk.len()];
            for (out, &value) in out_chunk.iter_mut().zip(in_chunk) {
                *out = window.map(value);
            }
        });

    DisplayBuffer { data }
}

/// Everything a viewer needs after one refresh.
#[derive(Debug, Clone)]
pub struct Preview {
    pub window: StretchWindow,
    pub display: DisplayBuffer,
    pub histogram: Histogram,
}

/// Sanitize, compute the percentile window, render and histogram in one call.
pub fn render_preview(image: &Image, config: &StretchConfig) -> Result<Preview> {
    config.validate()?;
    let sanitized = image.sanitize();
    let window =
        compute_stretch_window(&sanitized, config.low_percentile, config.high_percentile)?;
    preview_from_window(&sanitized, window, config.histogram_bins)
}

/// Like [`render_preview`] with a caller-chosen window instead of percentiles.
pub fn render_preview_with_window(
    image: &Image,
    window: StretchWindow,
    histogram_bins: usize,
) -> Result<Preview> {
    let sanitized = image.sanitize();
    preview_from_window(&sanitized, window, histogram_bins)
}

fn preview_from_window(
    image: &SanitizedImage,
    window: StretchWindow,
    histogram_bins: usize,
) -> Result<Preview> {
    let display = render(image, &window);
    let histogram = Histogram::from_display(&display, histogram_bins)?;
    Ok(Preview {
        window,
        display,
        histogram,
    })
}
