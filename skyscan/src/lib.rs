//! Skyscan - image analysis core of a FITS viewer.
//!
//! Two independent components work on a decoded 2-D pixel array:
//! - Percentile stretch rendering to an 8-bit display buffer plus histogram
//! - Point-source detection with DAOFIND-style sharpness and roundness
//!
//! FITS decoding, GUI rendering and persistence live elsewhere; this crate
//! only sees an [`Image`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use skyscan::{Image, StarDetector, StretchConfig, render_preview};
//!
//! let image = Image::from_shape(&[height, width], pixels)?;
//!
//! let preview = render_preview(&image, &StretchConfig::default())?;
//! let report = StarDetector::new().detect(&image)?;
//!
//! println!("{}", report.result);
//! ```

pub mod error;
pub mod image;
pub mod math;
pub mod star_detection;
pub mod stretch;

#[cfg(any(test, feature = "synthetic"))]
pub mod synthetic;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Input
// ============================================================================

pub use error::{Error, Result};
pub use crate::image::{Image, SanitizedImage};

// ============================================================================
// Statistics
// ============================================================================

pub use math::{ClippedStats, SigmaClip, sigma_clipped_stats};

// ============================================================================
// Percentile stretch
// ============================================================================

pub use stretch::{
    DisplayBuffer, Histogram, PercentileTable, Preview, StretchConfig, StretchWindow,
    compute_stretch_window, render, render_preview, render_preview_with_window,
};

// ============================================================================
// Point-source detection
// ============================================================================

pub use star_detection::{
    BackgroundStats, Config as DetectionConfig, DaoKernel, DetectionReport, DetectionResult,
    Diagnostics as DetectionDiagnostics, SourceRecord, StarDetector, background_stats,
    detect_sources, robust_background_stats,
};
