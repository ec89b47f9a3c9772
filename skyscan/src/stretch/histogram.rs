use rayon::prelude::*;
use serde::Serialize;

use super::DisplayBuffer;
use crate::error::{Error, Result};

/// Default histogram resolution of the preview.
pub const DEFAULT_HISTOGRAM_BINS: usize = 128;

/// Counts of display values over `bins` equal-width bins spanning `[0, 255]`.
///
/// Bin `k` covers `[255·k/bins, 255·(k+1)/bins)`; the last bin is closed so
/// that 255 is counted. Built from the display buffer itself, so the histogram
/// always describes exactly what is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    counts: Vec<u64>,
}

impl Histogram {
    pub fn from_display(display: &DisplayBuffer, bins: usize) -> Result<Self> {
        if bins == 0 {
            return Err(Error::InvalidConfiguration(
                "histogram needs at least one bin".to_string(),
            ));
        }

        let counts = display
            .as_bytes()
            .par_chunks(display.stride() * 64)
            .fold(
                || vec![0u64; bins],
                |mut counts, chunk| {
                    for &value in chunk {
                        counts[bin_index(value, bins)] += 1;
                    }
                    counts
                },
            )
            .reduce(
                || vec![0u64; bins],
                |mut a, b| {
                    a.iter_mut().zip(&b).for_each(|(a, b)| *a += b);
                    a
                },
            );

        Ok(Self { counts })
    }

    #[inline]
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Sum of all counts; equals the pixel count of the display buffer.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Bin that display value `value` falls into.
    #[inline]
    pub fn bin_of(&self, value: u8) -> usize {
        bin_index(value, self.counts.len())
    }

    /// Lower and upper edge of bin `k`.
    pub fn bin_range(&self, k: usize) -> (f64, f64) {
        let bins = self.counts.len() as f64;
        (255.0 * k as f64 / bins, 255.0 * (k + 1) as f64 / bins)
    }
}

#[inline]
fn bin_index(value: u8, bins: usize) -> usize {
    (value as usize * bins / 255).min(bins - 1)
}
