//! Statistical functions: median, mean/std, percentiles, sigma-clipped statistics.
//!
//! All reductions are sequential so repeated calls on the same data are
//! bit-identical.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default clipping threshold in standard deviations.
pub const DEFAULT_CLIP_SIGMA: f64 = 3.0;

/// Default cap on clipping iterations.
pub const DEFAULT_CLIP_MAX_ITERATIONS: usize = 5;

/// Median of `data`, reordering it in place (quickselect).
///
/// Even lengths average the two middle values.
pub fn median_mut(data: &mut [f64]) -> f64 {
    debug_assert!(!data.is_empty());

    let len = data.len();
    let mid = len / 2;
    let (left_part, median, _) = data.select_nth_unstable_by(mid, f64::total_cmp);
    let upper = *median;

    if len & 1 == 1 {
        upper
    } else {
        let lower = left_part
            .iter()
            .copied()
            .reduce(f64::max)
            .unwrap_or(upper);
        (lower + upper) * 0.5
    }
}

/// Arithmetic mean and population standard deviation (two passes).
pub fn mean_and_std(data: &[f64]) -> (f64, f64) {
    if data.is_empty() {
        return (0.0, 0.0);
    }

    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let variance = data
        .iter()
        .map(|&v| {
            let d = v - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    (mean, variance.sqrt())
}

/// Percentile of ascending `sorted` data with linear interpolation between
/// order statistics.
///
/// `rank = p / 100 · (n - 1)`; the result lies between the two neighbouring
/// order statistics, which keeps it monotone in `p`.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    debug_assert!((0.0..=100.0).contains(&p));

    let last = sorted.len() - 1;
    let rank = (p / 100.0 * last as f64).clamp(0.0, last as f64);
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(last);
    let frac = rank - lo as f64;

    let a = sorted[lo];
    let b = sorted[hi];
    (a + frac * (b - a)).clamp(a, b)
}

/// Iterative sigma-clipping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmaClip {
    /// Samples further than `sigma × std` from the median are rejected.
    pub sigma: f64,
    /// Hard cap on iterations so bimodal data cannot loop forever.
    pub max_iterations: usize,
}

impl Default for SigmaClip {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_CLIP_SIGMA,
            max_iterations: DEFAULT_CLIP_MAX_ITERATIONS,
        }
    }
}

impl SigmaClip {
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "clip sigma must be finite and positive, got {}",
                self.sigma
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfiguration(
                "sigma clipping needs at least one iteration".to_string(),
            ));
        }
        Ok(())
    }
}

/// Statistics of the samples that survived clipping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClippedStats {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Number of samples retained after the last iteration.
    pub retained: usize,
    /// Iterations actually performed.
    pub iterations: usize,
    /// `true` if the last iteration rejected nothing; `false` means the cap was hit.
    pub converged: bool,
}

/// Sigma-clipped mean, median and standard deviation.
///
/// Each iteration computes the median and std of the retained set and keeps
/// samples within `median ± sigma·std` (bounds inclusive). Stops when an
/// iteration rejects nothing or after `max_iterations`. An iteration that would
/// reject every sample is not applied.
///
/// Returns `None` for empty input.
pub fn sigma_clipped_stats(values: &[f64], clip: &SigmaClip) -> Option<ClippedStats> {
    if values.is_empty() {
        return None;
    }

    let mut work = values.to_vec();
    let mut iterations = 0;
    let mut converged = false;

    while iterations < clip.max_iterations {
        iterations += 1;

        let median = median_mut(&mut work);
        let (_, std) = mean_and_std(&work);
        let lower = median - clip.sigma * std;
        let upper = median + clip.sigma * std;

        let kept = work.iter().filter(|&&v| v >= lower && v <= upper).count();
        if kept == work.len() || kept == 0 {
            converged = kept == work.len();
            break;
        }
        work.retain(|&v| v >= lower && v <= upper);
    }

    let median = median_mut(&mut work);
    let (mean, std) = mean_and_std(&work);

    Some(ClippedStats {
        mean,
        median,
        std,
        retained: work.len(),
        iterations,
        converged,
    })
}
