//! Detected point sources and the catalog summary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A detected point source.
///
/// Coordinates are in pixels with pixel centers at integers: `x` is the
/// column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Column (sub-pixel).
    pub x: f64,
    /// Row (sub-pixel).
    pub y: f64,
    /// Background-subtracted value of the peak pixel.
    pub peak: f64,
    /// Background-subtracted sum inside the kernel mask.
    pub flux: f64,
    /// Matched-filter amplitude at the peak.
    pub response: f64,
    /// Peak height relative to its masked neighbourhood, over `response`.
    /// Hot pixels approach 1, well-sampled stars sit around 0.3-0.6.
    pub sharpness: f64,
    /// `2(hx - hy)/(hx + hy)` from the x and y marginal fits.
    /// Positive when the source is narrower along x than along y.
    pub roundness1: f64,
    /// Same statistic on the two diagonal marginal fits.
    pub roundness2: f64,
}

impl SourceRecord {
    /// Whether every metric is finite.
    pub fn is_finite(&self) -> bool {
        [
            self.x,
            self.y,
            self.peak,
            self.flux,
            self.response,
            self.sharpness,
            self.roundness1,
            self.roundness2,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Aggregated detection summary.
///
/// Means are `None` exactly when no source was found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub count: usize,
    pub mean_roundness1: Option<f64>,
    pub mean_roundness2: Option<f64>,
}

impl DetectionResult {
    pub fn from_sources(sources: &[SourceRecord]) -> Self {
        let count = sources.len();
        if count == 0 {
            return Self {
                count,
                mean_roundness1: None,
                mean_roundness2: None,
            };
        }

        let n = count as f64;
        let (r1, r2) = sources
            .iter()
            .fold((0.0, 0.0), |(r1, r2), s| (r1 + s.roundness1, r2 + s.roundness2));
        Self {
            count,
            mean_roundness1: Some(r1 / n),
            mean_roundness2: Some(r2 / n),
        }
    }
}

struct OptionalMetric(Option<f64>);

impl fmt::Display for OptionalMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.3}", v),
            None => f.write_str("-"),
        }
    }
}

impl fmt::Display for DetectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stars: {}, roundness1: {}, roundness2: {}",
            self.count,
            OptionalMetric(self.mean_roundness1),
            OptionalMetric(self.mean_roundness2)
        )
    }
}
