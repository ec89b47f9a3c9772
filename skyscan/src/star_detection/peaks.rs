//! Local-maximum search on the matched-filter response with non-maximum
//! suppression.

use std::cmp::Ordering;

use common::Buffer2;
use rayon::prelude::*;

/// An accepted response maximum at integer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Peak {
    pub x: usize,
    pub y: usize,
    pub response: f64,
}

/// Peak search outcome with the counts needed for diagnostics.
#[derive(Debug, Clone, Default)]
pub(crate) struct PeakSearch {
    pub peaks: Vec<Peak>,
    /// Local maxima above threshold before suppression.
    pub local_maxima: usize,
    pub suppressed: usize,
    pub near_border: usize,
}

/// Descending response, then ascending `y`, then ascending `x`.
fn peak_order(a: &Peak, b: &Peak) -> Ordering {
    b.response
        .total_cmp(&a.response)
        .then(a.y.cmp(&b.y))
        .then(a.x.cmp(&b.x))
}

/// Half-widths of a disc of radius `radius`, indexed by `|dy|`: row `dy`
/// covers `dx` in `-half..=half`.
///
/// Both are capped at `limit`; anything further lies outside an image whose
/// larger side is `limit`.
fn disc_half_widths(radius: f64, limit: usize) -> Vec<usize> {
    let reach = radius.floor().min(limit as f64) as usize;
    let r_sq = radius * radius;
    (0..=reach)
        .map(|dy| {
            let dy_sq = (dy * dy) as f64;
            let mut half = (r_sq - dy_sq).max(0.0).sqrt().floor().min(limit as f64) as usize;
            while half < limit && ((half + 1) * (half + 1)) as f64 + dy_sq <= r_sq {
                half += 1;
            }
            while half > 0 && (half * half) as f64 + dy_sq > r_sq {
                half -= 1;
            }
            half
        })
        .collect()
}

/// Whether no pixel of the disc around `(x, y)` exceeds `value`.
fn is_disc_maximum(
    response: &Buffer2<f64>,
    x: usize,
    y: usize,
    value: f64,
    half_widths: &[usize],
) -> bool {
    let width = response.width();
    let height = response.height();
    let reach = half_widths.len() - 1;

    for yy in y.saturating_sub(reach)..=(y + reach).min(height - 1) {
        let half = half_widths[yy.abs_diff(y)];
        let x0 = x.saturating_sub(half);
        let x1 = (x + half).min(width - 1);
        if response.row(yy)[x0..=x1].iter().any(|&other| other > value) {
            return false;
        }
    }
    true
}

/// Smallest bucket side, keeps the grid coarse for tiny separations.
const MIN_GRID_CELL: f64 = 16.0;

/// Accepted peaks bucketed on a grid of cells at least `min_separation`
/// wide, so a crowding check only visits the 3×3 neighbouring cells.
struct AcceptedGrid {
    cell: f64,
    cols: usize,
    rows: usize,
    sep_sq: f64,
    cells: Vec<Vec<(usize, usize)>>,
}

impl AcceptedGrid {
    fn new(width: usize, height: usize, min_separation: f64) -> Self {
        let cell = min_separation.max(MIN_GRID_CELL);
        let cols = ((width as f64 / cell).ceil() as usize).max(1);
        let rows = ((height as f64 / cell).ceil() as usize).max(1);
        Self {
            cell,
            cols,
            rows,
            sep_sq: min_separation * min_separation,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    #[inline]
    fn cell_of(&self, x: usize, y: usize) -> (usize, usize) {
        let cx = ((x as f64 / self.cell) as usize).min(self.cols - 1);
        let cy = ((y as f64 / self.cell) as usize).min(self.rows - 1);
        (cx, cy)
    }

    fn is_crowded(&self, x: usize, y: usize) -> bool {
        let (cx, cy) = self.cell_of(x, y);
        for gy in cy.saturating_sub(1)..=(cy + 1).min(self.rows - 1) {
            for gx in cx.saturating_sub(1)..=(cx + 1).min(self.cols - 1) {
                let crowded = self.cells[gy * self.cols + gx].iter().any(|&(kx, ky)| {
                    let dx = kx as f64 - x as f64;
                    let dy = ky as f64 - y as f64;
                    dx * dx + dy * dy <= self.sep_sq
                });
                if crowded {
                    return true;
                }
            }
        }
        false
    }

    fn insert(&mut self, x: usize, y: usize) {
        let (cx, cy) = self.cell_of(x, y);
        self.cells[cy * self.cols + cx].push((x, y));
    }
}

/// Find source positions in `response`.
///
/// A pixel is a candidate if its response exceeds `threshold` and no pixel
/// within `min_separation` has a larger response. Candidates are then
/// accepted in [`peak_order`]; one that lies within `min_separation` of an
/// already accepted peak is dropped, so plateaus and ties resolve to the
/// top-most, then left-most pixel. With `border = Some(r)`, peaks closer than
/// `r` pixels to any edge are discarded.
pub(crate) fn find_peaks(
    response: &Buffer2<f64>,
    threshold: f64,
    min_separation: f64,
    border: Option<usize>,
) -> PeakSearch {
    let width = response.width();
    let height = response.height();
    let half_widths = disc_half_widths(min_separation, width.max(height));

    let mut candidates: Vec<Peak> = (0..height)
        .into_par_iter()
        .flat_map_iter(|y| {
            let row = response.row(y);
            let half_widths = &half_widths;
            row.iter().enumerate().filter_map(move |(x, &value)| {
                if value <= threshold {
                    return None;
                }
                let is_max = is_disc_maximum(response, x, y, value, half_widths);
                is_max.then_some(Peak {
                    x,
                    y,
                    response: value,
                })
            })
        })
        .collect();

    let local_maxima = candidates.len();
    candidates.sort_by(peak_order);

    let mut accepted = AcceptedGrid::new(width, height, min_separation);
    let mut peaks: Vec<Peak> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !accepted.is_crowded(candidate.x, candidate.y) {
            accepted.insert(candidate.x, candidate.y);
            peaks.push(candidate);
        }
    }
    let suppressed = local_maxima - peaks.len();

    let mut near_border = 0;
    if let Some(margin) = border {
        let before = peaks.len();
        peaks.retain(|p| {
            p.x >= margin
                && p.y >= margin
                && p.x + margin < width
                && p.y + margin < height
        });
        near_border = before - peaks.len();
    }

    tracing::debug!(
        local_maxima,
        suppressed,
        near_border,
        accepted = peaks.len(),
        "Peak search"
    );

    PeakSearch {
        peaks,
        local_maxima,
        suppressed,
        near_border,
    }
}
