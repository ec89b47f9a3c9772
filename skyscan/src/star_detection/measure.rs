//! Per-source shape statistics: sharpness, the two roundness metrics and the
//! sub-pixel centroid.
//!
//! Everything is computed on a kernel-sized cutout of the background-subtracted
//! image, zero-padded outside the frame. Roundness and centroid come from
//! weighted linear least-squares fits of the kernel's marginal profiles to the
//! data's marginal profiles, with triangular weights peaking at the center.

use common::Buffer2;

use super::kernel::DaoKernel;
use super::peaks::Peak;
use super::source::SourceRecord;

/// Square `n × n` window of the image centered on a peak.
struct Cutout {
    n: usize,
    values: Vec<f64>,
}

impl Cutout {
    fn extract(data: &Buffer2<f64>, cx: usize, cy: usize, radius: usize) -> Self {
        let n = 2 * radius + 1;
        let r = radius as isize;
        let mut values = Vec::with_capacity(n * n);
        for j in 0..n as isize {
            for i in 0..n as isize {
                let x = cx as isize + i - r;
                let y = cy as isize + j - r;
                values.push(data.get_signed(x, y).copied().unwrap_or(0.0));
            }
        }
        Self { n, values }
    }

    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        self.values[j * self.n + i]
    }
}

/// Triangular weight of index `i` in a profile centered on `center`.
#[inline]
fn triangle(i: usize, center: usize) -> f64 {
    (center + 1 - i.abs_diff(center)) as f64
}

/// Profiles of a square grid along x, y and both diagonals.
struct Marginals {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Along `u = i + j`.
    u: Vec<f64>,
    /// Along `v = i - j + (n - 1)`.
    v: Vec<f64>,
}

impl Marginals {
    /// Each pixel contributes with the triangular weight of its position
    /// across the profile direction.
    fn of(n: usize, value: impl Fn(usize, usize) -> f64) -> Self {
        let c = n / 2;
        let diag_c = n - 1;
        let mut m = Self {
            x: vec![0.0; n],
            y: vec![0.0; n],
            u: vec![0.0; 2 * n - 1],
            v: vec![0.0; 2 * n - 1],
        };
        for j in 0..n {
            for i in 0..n {
                let val = value(i, j);
                let u = i + j;
                let v = i + diag_c - j;
                m.x[i] += triangle(j, c) * val;
                m.y[j] += triangle(i, c) * val;
                m.u[u] += triangle(v, diag_c) * val;
                m.v[v] += triangle(u, diag_c) * val;
            }
        }
        m
    }
}

/// Weighted sums shared by the amplitude fit and the centroid step.
struct FitSums {
    w: f64,
    k: f64,
    d: f64,
    kk: f64,
    dk: f64,
}

impl FitSums {
    fn of(data: &[f64], model: &[f64]) -> Self {
        let c = data.len() / 2;
        let mut s = Self {
            w: 0.0,
            k: 0.0,
            d: 0.0,
            kk: 0.0,
            dk: 0.0,
        };
        for (i, (&d, &k)) in data.iter().zip(model).enumerate() {
            let w = triangle(i, c);
            s.w += w;
            s.k += w * k;
            s.d += w * d;
            s.kk += w * k * k;
            s.dk += w * d * k;
        }
        s
    }

    /// Amplitude `h` of the best fit `data ≈ h·model + sky`.
    ///
    /// `NaN` when the fit is not positive.
    fn amplitude(&self) -> f64 {
        let num = self.dk - self.d * self.k / self.w;
        let den = self.kk - self.k * self.k / self.w;
        if num > 0.0 && den > 0.0 {
            num / den
        } else {
            f64::NAN
        }
    }

    /// Constant term of the fit for a given amplitude.
    fn sky(&self, amplitude: f64) -> f64 {
        (self.d - amplitude * self.k) / self.w
    }
}

/// Sub-pixel shift of `data` relative to the Gaussian `model` along one axis.
///
/// One Gauss–Newton step of the shift parameter. Steps beyond half the profile
/// fall back to the first moment of the sky-subtracted data, then to 0.
fn centroid_offset(
    data: &[f64],
    model: &[f64],
    sums: &FitSums,
    amplitude: f64,
    sigma: f64,
) -> f64 {
    let n = data.len();
    let c = (n / 2) as f64;
    let limit = n as f64 / 2.0;
    let sky = sums.sky(amplitude);
    let sigma_sq = sigma * sigma;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, (&d, &k)) in data.iter().zip(model).enumerate() {
        let w = triangle(i, n / 2);
        let dk = k * (i as f64 - c) / sigma_sq;
        num += w * (d - amplitude * k - sky) * dk;
        den += w * dk * dk;
    }
    let step = num / (amplitude * den);
    if step.is_finite() && step.abs() <= limit {
        return step;
    }

    let (moment, mass) = data
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(moment, mass), (i, &d)| {
            let d = (d - sky).max(0.0);
            (moment + (i as f64 - c) * d, mass + d)
        });
    let first = moment / mass;
    if mass > 0.0 && first.abs() <= limit {
        first
    } else {
        0.0
    }
}

/// `2(a - b) / (a + b)`, non-finite when either amplitude failed.
#[inline]
fn roundness(a: f64, b: f64) -> f64 {
    2.0 * (a - b) / (a + b)
}

/// Shape statistics of the source at `peak`.
///
/// `data` is the background-subtracted image. Failed fits show up as
/// non-finite metrics; filtering is the caller's job.
pub(crate) fn measure(data: &Buffer2<f64>, kernel: &DaoKernel, peak: &Peak) -> SourceRecord {
    let radius = kernel.radius();
    let cutout = Cutout::extract(data, peak.x, peak.y, radius);
    let n = cutout.n;

    let peak_value = cutout.at(radius, radius);
    let flux: f64 = (0..n * n)
        .filter(|&idx| kernel.in_mask(idx % n, idx / n))
        .map(|idx| cutout.values[idx])
        .sum();
    let neighbours_mean = (flux - peak_value) / (kernel.npixels() - 1) as f64;
    let sharpness = (peak_value - neighbours_mean) / peak.response;

    let gaussian = kernel.gaussian();
    let data_marg = Marginals::of(n, |i, j| cutout.at(i, j));
    let model_marg = Marginals::of(n, |i, j| gaussian[j * n + i]);

    let x_sums = FitSums::of(&data_marg.x, &model_marg.x);
    let y_sums = FitSums::of(&data_marg.y, &model_marg.y);
    let hx = x_sums.amplitude();
    let hy = y_sums.amplitude();
    let hu = FitSums::of(&data_marg.u, &model_marg.u).amplitude();
    let hv = FitSums::of(&data_marg.v, &model_marg.v).amplitude();

    let (dx, dy) = if hx.is_finite() && hy.is_finite() {
        (
            centroid_offset(&data_marg.x, &model_marg.x, &x_sums, hx, kernel.sigma()),
            centroid_offset(&data_marg.y, &model_marg.y, &y_sums, hy, kernel.sigma()),
        )
    } else {
        (0.0, 0.0)
    };

    SourceRecord {
        x: peak.x as f64 + dx,
        y: peak.y as f64 + dy,
        peak: peak_value,
        flux,
        response: peak.response,
        sharpness,
        roundness1: roundness(hx, hy),
        roundness2: roundness(hu, hv),
    }
}
