//! Enumeration of the kernel window around one pixel.
//!
//! Kernel cells that map outside the image are skipped, not clamped or
//! mirrored, so boundary pixels see a truncated window with less weight mass.

use std::ops::Range;

use crate::error::{Error, Result};
use crate::kernel::Kernel;

/// One in-bounds kernel cell mapped onto the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tap {
    pub weight: f64,
    pub row: usize,
    pub col: usize,
}

/// Lazy iterator over the in-bounds taps of one window, kernel row by kernel row.
///
/// Clone it before iterating to walk the same window twice.
#[derive(Debug, Clone)]
pub struct Taps<'a> {
    kernel: &'a Kernel,
    // Kernel-space ranges whose cells land inside the image.
    kernel_rows: Range<usize>,
    kernel_cols: Range<usize>,
    // Window center in image coordinates. Offsets are added before the half
    // extents are subtracted so the arithmetic stays unsigned.
    center_row: usize,
    center_col: usize,
    next_row: usize,
    next_col: usize,
}

/// Taps of the window centered on `(row, col)` in an image of `rows x cols`.
pub fn taps(
    kernel: &Kernel,
    rows: usize,
    cols: usize,
    row: usize,
    col: usize,
) -> Result<Taps<'_>> {
    if row >= rows || col >= cols {
        return Err(Error::PixelOutOfBounds {
            row,
            col,
            rows,
            cols,
        });
    }
    Ok(window_taps(kernel, rows, cols, row, col))
}

/// Collects the window into `out`, reusing its allocation.
/// The center must lie inside the image.
pub(crate) fn collect_taps(
    kernel: &Kernel,
    rows: usize,
    cols: usize,
    row: usize,
    col: usize,
    out: &mut Vec<Tap>,
) {
    out.clear();
    out.extend(window_taps(kernel, rows, cols, row, col));
}

fn window_taps(kernel: &Kernel, rows: usize, cols: usize, row: usize, col: usize) -> Taps<'_> {
    debug_assert!(row < rows && col < cols);

    let (half_rows, half_cols) = kernel.half_extents();
    let kernel_rows = in_bounds_span(row, rows, half_rows, kernel.rows());
    let kernel_cols = in_bounds_span(col, cols, half_cols, kernel.cols());

    Taps {
        kernel,
        next_row: kernel_rows.start,
        next_col: kernel_cols.start,
        kernel_rows,
        kernel_cols,
        center_row: row,
        center_col: col,
    }
}

/// Kernel indices `k` with `0 <= center + k - half < extent`.
///
/// Never empty: the center cell itself is always in bounds.
#[inline]
fn in_bounds_span(center: usize, extent: usize, half: usize, kernel_len: usize) -> Range<usize> {
    let start = half.saturating_sub(center);
    let end = kernel_len.min(extent - center + half);
    start..end
}

impl Iterator for Taps<'_> {
    type Item = Tap;

    #[inline]
    fn next(&mut self) -> Option<Tap> {
        if self.next_row >= self.kernel_rows.end {
            return None;
        }

        let (half_rows, half_cols) = self.kernel.half_extents();
        let tap = Tap {
            weight: self.kernel.weight(self.next_row, self.next_col),
            row: self.center_row + self.next_row - half_rows,
            col: self.center_col + self.next_col - half_cols,
        };

        self.next_col += 1;
        if self.next_col >= self.kernel_cols.end {
            self.next_col = self.kernel_cols.start;
            self.next_row += 1;
        }

        Some(tap)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next_row >= self.kernel_rows.end {
            0
        } else {
            let full_rows = self.kernel_rows.end - self.next_row - 1;
            full_rows * self.kernel_cols.len() + (self.kernel_cols.end - self.next_col)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Taps<'_> {}
