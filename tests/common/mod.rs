use std::ops::Range;

use tethys::{DayMask, Grid};

/// A mask with a single rectangular block on face 0.
pub fn block_mask(grid: &Grid, i_range: Range<usize>, j_range: Range<usize>) -> DayMask {
    let mut mask = DayMask::new(grid);
    mask.fill(0, i_range, j_range, true);
    mask
}

/// Evenly spaced coordinate vector `start, start + step, …` of length `n`.
pub fn lin_coords(n: usize, start: f64, step: f64) -> Vec<f64> {
    (0..n).map(|k| start + k as f64 * step).collect()
}
