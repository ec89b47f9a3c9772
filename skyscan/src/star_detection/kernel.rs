//! DAOFIND matched-filter kernel.
//!
//! A truncated circular Gaussian whose masked values are shifted to zero mean
//! and scaled so that correlating it with `A·G + B` (a star of amplitude `A`
//! on any constant sky `B`) yields exactly `A`.

use crate::error::{Error, Result};
use crate::math::fwhm_to_sigma;

/// Smallest kernel half-width regardless of FWHM.
const MIN_RADIUS: usize = 2;

/// One non-zero kernel entry, as an offset from the kernel center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Tap {
    pub dx: isize,
    pub dy: isize,
    pub weight: f64,
}

#[derive(Debug, Clone)]
pub struct DaoKernel {
    sigma: f64,
    radius: usize,
    /// Unmasked Gaussian, `size × size`, peak 1 at the center.
    gaussian: Vec<f64>,
    mask: Vec<bool>,
    /// Zero-mean, normalized weights; 0 outside the mask.
    weights: Vec<f64>,
    npixels: usize,
    relerr: f64,
}

impl DaoKernel {
    /// Kernel for stars of the given FWHM, truncated at `sigma_radius` sigmas.
    pub fn new(fwhm: f64, sigma_radius: f64) -> Result<Self> {
        if !fwhm.is_finite() || fwhm <= 0.0 || !sigma_radius.is_finite() || sigma_radius <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "kernel needs positive fwhm and sigma_radius, got {} and {}",
                fwhm, sigma_radius
            )));
        }

        let sigma = fwhm_to_sigma(fwhm);
        let radius = ((sigma_radius * sigma).floor() as usize).max(MIN_RADIUS);
        let size = 2 * radius + 1;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let mask_limit = sigma_radius * sigma_radius / 2.0;

        let mut gaussian = Vec::with_capacity(size * size);
        let mut mask = Vec::with_capacity(size * size);
        for ky in 0..size {
            for kx in 0..size {
                let dx = kx as f64 - radius as f64;
                let dy = ky as f64 - radius as f64;
                let r_sq = (dx * dx + dy * dy) / two_sigma_sq;
                gaussian.push((-r_sq).exp());
                mask.push(r_sq <= mask_limit);
            }
        }

        let npixels = mask.iter().filter(|&&m| m).count();
        if npixels < 2 {
            return Err(Error::InvalidConfiguration(format!(
                "kernel mask for fwhm={} sigma_radius={} covers {} pixel(s), need at least 2",
                fwhm, sigma_radius, npixels
            )));
        }

        let (sum, sum_sq) = gaussian
            .iter()
            .zip(&mask)
            .filter(|(_, m)| **m)
            .fold((0.0, 0.0), |(s, s2), (&g, _)| (s + g, s2 + g * g));
        let denom = sum_sq - sum * sum / npixels as f64;
        if denom <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "kernel for fwhm={} is flat over its mask",
                fwhm
            )));
        }

        let mean = sum / npixels as f64;
        let weights = gaussian
            .iter()
            .zip(&mask)
            .map(|(&g, &m)| if m { (g - mean) / denom } else { 0.0 })
            .collect();

        Ok(Self {
            sigma,
            radius,
            gaussian,
            mask,
            weights,
            npixels,
            relerr: 1.0 / denom.sqrt(),
        })
    }

    /// Gaussian sigma in pixels.
    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Half-width; the kernel spans `2·radius + 1` pixels.
    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    #[inline]
    pub fn size(&self) -> usize {
        2 * self.radius + 1
    }

    /// Number of pixels inside the circular mask.
    #[inline]
    pub fn npixels(&self) -> usize {
        self.npixels
    }

    /// Ratio between the noise of the amplitude estimate and the pixel noise.
    #[inline]
    pub fn relerr(&self) -> f64 {
        self.relerr
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[inline]
    pub fn gaussian(&self) -> &[f64] {
        &self.gaussian
    }

    #[inline]
    pub fn in_mask(&self, kx: usize, ky: usize) -> bool {
        self.mask[ky * self.size() + kx]
    }

    /// Masked entries in row-major order.
    pub(crate) fn taps(&self) -> Vec<Tap> {
        let size = self.size();
        let r = self.radius as isize;
        (0..size * size)
            .filter(|&i| self.mask[i])
            .map(|i| Tap {
                dx: (i % size) as isize - r,
                dy: (i / size) as isize - r,
                weight: self.weights[i],
            })
            .collect()
    }
}
