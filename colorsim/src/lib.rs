//! Dense per-pixel comparison of a test image against a reference image.
//!
//! For every pixel two scores are computed over a weighted kernel window:
//!
//! - `ssim`: luminance structural similarity.
//! - `colordiff`: divergence between the local chrominance covariances,
//!   taken from the generalized eigenvalues of the two 2x2 covariance
//!   matrices on a log scale. It is invariant to rotations of the
//!   chrominance plane and zero for identical windows.
//!
//! Images are interleaved `(row, col, channel)` buffers with luminance in
//! channel 0 and chrominance in channels 1 and 2.
//!
//! ```rust,ignore
//! use colorsim::{compare, ImageView, Kernel};
//!
//! let test = ImageView::new(&test_data, rows, cols, 3)?;
//! let reference = ImageView::new(&reference_data, rows, cols, 3)?;
//! let maps = compare(&test, &reference, &Kernel::uniform(7, 7)?)?;
//! let worst = maps.colordiff.iter().cloned().fold(0.0, f64::max);
//! ```

pub mod compare;
pub mod config;
pub mod eigen;
mod error;
pub mod image;
pub mod kernel;
pub mod log_distance;
pub mod moments;
pub mod pixel;
pub mod window;

#[cfg(test)]
mod testing;

pub use compare::{compare, Comparator, MetricMaps};
pub use config::{MetricConfig, Parallelism, Stabilizers};
pub use error::{Error, Result};
pub use image::{ImageView, Sample};
pub use kernel::Kernel;
pub use pixel::{evaluate_pixel, PixelMetrics};
