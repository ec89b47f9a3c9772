//! 2-D input images and the non-finite sanitization policy.
//!
//! Both the renderer and the detector read images through [`SanitizedImage`],
//! where every `NaN`/`±Inf` sample has been replaced by `0.0`. Keeping one
//! policy for both paths means the displayed image and the detection input
//! never disagree about bad pixels. Zero-filling biases statistics near masked
//! regions; that is the documented behavior and is kept on purpose.


use common::Buffer2;

use crate::error::{Error, Result};

/// Immutable `height × width` array of intensities, row-major.
///
/// May contain non-finite samples (saturation, masked regions, cosmic-ray flags).
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    data: Buffer2<f64>,
}

impl Image {
    /// Wrap `pixels` as a `width × height` image.
    pub fn new(width: usize, height: usize, pixels: Vec<f64>) -> Result<Self> {
        Ok(Self {
            data: Buffer2::try_new(width, height, pixels)?,
        })
    }

    /// Build from a numpy-style shape, `[height, width]`.
    ///
    /// Any other rank is rejected rather than reshaped.
    pub fn from_shape(shape: &[usize], pixels: Vec<f64>) -> Result<Self> {
        match *shape {
            [height, width] => Self::new(width, height, pixels),
            _ => Err(Error::InvalidShape(format!(
                "expected a 2-D array, got rank {} with shape {:?}",
                shape.len(),
                shape
            ))),
        }
    }

    /// Convert integer or single-precision samples as handed out by FITS decoders.
    pub fn from_samples<T>(width: usize, height: usize, samples: &[T]) -> Result<Self>
    where
        T: Copy + Into<f64>,
    {
        Self::new(width, height, samples.iter().map(|&v| v.into()).collect())
    }

    /// Pick one plane out of a `[planes, height, width]` cube.
    ///
    /// Multi-frame FITS cubes must be reduced to a single plane before analysis;
    /// this makes that reduction an explicit, validated step.
    pub fn from_cube_plane(shape: &[usize], pixels: &[f64], plane: usize) -> Result<Self> {
        let [planes, height, width] = *shape else {
            return Err(Error::InvalidShape(format!(
                "expected a 3-D cube, got rank {} with shape {:?}",
                shape.len(),
                shape
            )));
        };
        if planes == 0 || height == 0 || width == 0 {
            return Err(Error::InvalidShape(format!(
                "cube dimensions must be non-zero, got {:?}",
                shape
            )));
        }
        let plane_len = width * height;
        if pixels.len() != planes * plane_len {
            return Err(Error::InvalidShape(format!(
                "cube of shape {:?} needs {} samples, got {}",
                shape,
                planes * plane_len,
                pixels.len()
            )));
        }
        if plane >= planes {
            return Err(Error::InvalidShape(format!(
                "plane {} out of range for a cube with {} planes",
                plane, planes
            )));
        }

        let start = plane * plane_len;
        Self::new(width, height, pixels[start..start + plane_len].to_vec())
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.data.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.data.height()
    }

    #[inline]
    pub fn pixels(&self) -> &[f64] {
        self.data.pixels()
    }

    #[inline]
    pub fn buffer(&self) -> &Buffer2<f64> {
        &self.data
    }

    /// Copy of the image with non-finite samples replaced by `0.0`.
    pub fn sanitize(&self) -> SanitizedImage {
        let mut replaced = 0usize;
        let data = self.data.map(|&v| {
            if v.is_finite() {
                v
            } else {
                replaced += 1;
                0.0
            }
        });
        if replaced > 0 {
            tracing::debug!(
                replaced,
                total = data.len(),
                "Replaced non-finite samples with zero"
            );
        }
        SanitizedImage { data, replaced }
    }
}

/// Image whose samples are all finite.
///
/// Only obtainable through [`Image::sanitize`], so holding one proves the
/// zero-fill policy has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedImage {
    data: Buffer2<f64>,
    replaced: usize,
}

impl SanitizedImage {
    #[inline]
    pub fn width(&self) -> usize {
        self.data.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.data.height()
    }

    #[inline]
    pub fn pixels(&self) -> &[f64] {
        self.data.pixels()
    }

    #[inline]
    pub fn buffer(&self) -> &Buffer2<f64> {
        &self.data
    }

    /// Number of non-finite samples that were replaced by zero.
    #[inline]
    pub fn replaced(&self) -> usize {
        self.replaced
    }

    /// Same image shifted so that `offset` becomes zero.
    pub(crate) fn subtract(&self, offset: f64) -> Buffer2<f64> {
        self.data.map(|&v| v - offset)
    }
}
