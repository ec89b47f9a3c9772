//! Synthetic star fields for tests, benchmarks and demos.
//!
//! Enabled with the `synthetic` feature; always available to unit tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::image::Image;
use crate::math::fwhm_to_sigma;

/// Stamps are evaluated out to this many sigmas from their center.
const STAMP_EXTENT_SIGMAS: f64 = 8.0;

/// Seeded generator with Gaussian sampling.
#[derive(Debug, Clone)]
pub struct NoiseRng {
    rng: StdRng,
}

impl NoiseRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Standard normal sample via Box–Muller.
    pub fn next_gaussian(&mut self) -> f64 {
        let u1 = self.rng.random::<f64>().max(f64::MIN_POSITIVE);
        let u2 = self.rng.random::<f64>();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    /// Uniform sample in `[low, high)`.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.rng.random_range(low..high)
    }
}

/// Builder for synthetic star fields.
///
/// ```rust,ignore
/// let image = Field::new(64, 64)
///     .background(100.0)
///     .noise(2.0, 7)
///     .star(32.0, 32.0, 3.0, 80.0)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    width: usize,
    height: usize,
    pixels: Vec<f64>,
}

impl Field {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0.0; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Add a constant level to every pixel.
    pub fn background(mut self, level: f64) -> Self {
        self.pixels.iter_mut().for_each(|p| *p += level);
        self
    }

    /// Add seeded Gaussian noise with standard deviation `std`.
    pub fn noise(self, std: f64, seed: u64) -> Self {
        self.noise_from(std, &mut NoiseRng::new(seed))
    }

    /// Add Gaussian noise drawn from `rng`.
    pub fn noise_from(mut self, std: f64, rng: &mut NoiseRng) -> Self {
        self.pixels
            .iter_mut()
            .for_each(|p| *p += std * rng.next_gaussian());
        self
    }

    /// Add a circular Gaussian star of the given FWHM and peak amplitude.
    pub fn star(self, cx: f64, cy: f64, fwhm: f64, amplitude: f64) -> Self {
        let sigma = fwhm_to_sigma(fwhm);
        self.elliptical_star(cx, cy, sigma, sigma, 0.0, amplitude)
    }

    /// Add an elliptical Gaussian with sigmas along its own axes, rotated by
    /// `angle` radians counter-clockwise from the x axis.
    pub fn elliptical_star(
        mut self,
        cx: f64,
        cy: f64,
        sigma_major: f64,
        sigma_minor: f64,
        angle: f64,
        amplitude: f64,
    ) -> Self {
        let (sin, cos) = angle.sin_cos();
        let two_a_sq = 2.0 * sigma_major * sigma_major;
        let two_b_sq = 2.0 * sigma_minor * sigma_minor;

        let extent = STAMP_EXTENT_SIGMAS * sigma_major.max(sigma_minor);
        let x_range = clamped_range(cx, extent, self.width);
        let y_range = clamped_range(cy, extent, self.height);

        for y in y_range {
            let dy = y as f64 - cy;
            for x in x_range.clone() {
                let dx = x as f64 - cx;
                let along = dx * cos + dy * sin;
                let across = -dx * sin + dy * cos;
                let value =
                    amplitude * (-(along * along / two_a_sq + across * across / two_b_sq)).exp();
                self.pixels[y * self.width + x] += value;
            }
        }
        self
    }

    /// Overwrite one pixel, e.g. with `NaN` or a hot-pixel spike.
    pub fn set(mut self, x: usize, y: usize, value: f64) -> Self {
        self.pixels[y * self.width + x] = value;
        self
    }

    pub fn pixels(&self) -> &[f64] {
        &self.pixels
    }

    /// Fails only for a zero-sized field.
    pub fn build(self) -> Result<Image> {
        Image::new(self.width, self.height, self.pixels)
    }
}

/// Pixel indices within `extent` of `center`, clipped to `0..len`.
fn clamped_range(center: f64, extent: f64, len: usize) -> std::ops::Range<usize> {
    let lo = (center - extent).floor().max(0.0) as usize;
    let hi = ((center + extent).ceil() + 1.0).clamp(0.0, len as f64) as usize;
    lo.min(hi)..hi
}
