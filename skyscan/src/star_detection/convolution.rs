//! Matched filter: direct correlation with the DAOFIND kernel.
//!
//! Samples outside the image count as zero. Each output pixel sums the kernel
//! taps in a fixed order, so the result does not depend on thread count.

use common::Buffer2;
use rayon::prelude::*;

use super::kernel::DaoKernel;

/// Rows handed to one rayon task.
const ROWS_PER_CHUNK: usize = 8;

/// Correlate background-subtracted `data` with `kernel`.
///
/// The value at a pixel is the amplitude of a kernel-shaped source centered
/// there, in the same units as `data`.
pub fn matched_filter(data: &Buffer2<f64>, kernel: &DaoKernel) -> Buffer2<f64> {
    let width = data.width();
    let taps = kernel.taps();
    let mut output = Buffer2::new_filled(width, data.height(), 0.0f64);

    output
        .pixels_mut()
        .par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, out_chunk)| {
            let y_start = chunk_idx * ROWS_PER_CHUNK;

            for (local_y, out_row) in out_chunk.chunks_exact_mut(width).enumerate() {
                let y = (y_start + local_y) as isize;
                for (x, out) in out_row.iter_mut().enumerate() {
                    let x = x as isize;
                    *out = taps
                        .iter()
                        .map(|tap| {
                            data.get_signed(x + tap.dx, y + tap.dy)
                                .map_or(0.0, |&v| v * tap.weight)
                        })
                        .sum();
                }
            }
        });

    output
}
