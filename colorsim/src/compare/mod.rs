//! Full-image metric maps.
//!
//! The two output maps are split into bands of whole rows and each band is
//! filled by one rayon task, so every output cell has exactly one writer.


use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use common::Buffer2;
use rayon::prelude::*;

use crate::config::{MetricConfig, Parallelism, Stabilizers};
use crate::error::{Error, Result};
use crate::image::{ImageView, Sample};
use crate::kernel::Kernel;
use crate::pixel::{evaluate_pixel_with, PixelMetrics};

/// Bands per worker thread when `rows_per_band` is not configured.
/// Several bands per thread keep workers busy when some bands finish early.
const BANDS_PER_THREAD: usize = 3;

/// Per-pixel color divergence and SSIM, both `rows x cols`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricMaps {
    pub colordiff: Buffer2<f64>,
    pub ssim: Buffer2<f64>,
}

impl MetricMaps {
    pub fn dims(&self) -> (usize, usize) {
        self.ssim.dims()
    }

    pub fn get(&self, row: usize, col: usize) -> PixelMetrics {
        PixelMetrics {
            colordiff: self.colordiff[(row, col)],
            ssim: self.ssim[(row, col)],
        }
    }
}

/// Computes both maps with the default configuration.
pub fn compare<T: Sample>(
    test: &ImageView<'_, T>,
    reference: &ImageView<'_, T>,
    kernel: &Kernel,
) -> Result<MetricMaps> {
    Comparator::new(MetricConfig::default())?.compare(test, reference, kernel)
}

/// Reusable metric computation with a validated config and, for
/// [`Parallelism::Threads`], its own worker pool.
#[derive(Debug)]
pub struct Comparator {
    config: MetricConfig,
    pool: Option<rayon::ThreadPool>,
}

impl Comparator {
    pub fn new(config: MetricConfig) -> Result<Self> {
        config.validate()?;

        let pool = match config.parallelism {
            Parallelism::Threads(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|index| format!("colorsim-{}", index))
                    .build()?,
            ),
            Parallelism::Auto | Parallelism::Sequential => None,
        };

        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &MetricConfig {
        &self.config
    }

    pub fn compare<T: Sample>(
        &self,
        test: &ImageView<'_, T>,
        reference: &ImageView<'_, T>,
        kernel: &Kernel,
    ) -> Result<MetricMaps> {
        self.run(test, reference, kernel, None)
    }

    /// Like [`Comparator::compare`], but stops early once `cancel` is set.
    ///
    /// The flag is checked before every output row. A cancelled run discards
    /// the partially written maps and returns [`Error::Cancelled`].
    pub fn compare_cancellable<T: Sample>(
        &self,
        test: &ImageView<'_, T>,
        reference: &ImageView<'_, T>,
        kernel: &Kernel,
        cancel: &AtomicBool,
    ) -> Result<MetricMaps> {
        self.run(test, reference, kernel, Some(cancel))
    }

    fn run<T: Sample>(
        &self,
        test: &ImageView<'_, T>,
        reference: &ImageView<'_, T>,
        kernel: &Kernel,
        cancel: Option<&AtomicBool>,
    ) -> Result<MetricMaps> {
        if test.dims() != reference.dims() {
            return Err(Error::DimensionMismatch {
                test: test.dims(),
                reference: reference.dims(),
            });
        }

        let (rows, cols) = test.dims();
        let rows_per_band = self.rows_per_band(rows);
        let start = Instant::now();
        tracing::debug!(
            rows,
            cols,
            kernel_rows = kernel.rows(),
            kernel_cols = kernel.cols(),
            rows_per_band,
            parallelism = ?self.config.parallelism,
            "Computing metric maps"
        );

        let mut colordiff = vec![0.0; rows * cols];
        let mut ssim = vec![0.0; rows * cols];
        let job = BandJob {
            test,
            reference,
            kernel,
            stabilizers: &self.config.stabilizers,
            rows_per_band,
            cancel,
        };

        match (self.config.parallelism, &self.pool) {
            (Parallelism::Sequential, _) => job.run_sequential(&mut colordiff, &mut ssim),
            (_, Some(pool)) => pool.install(|| job.run_parallel(&mut colordiff, &mut ssim)),
            (_, None) => job.run_parallel(&mut colordiff, &mut ssim),
        }

        if job.is_cancelled() {
            tracing::warn!(
                rows,
                cols,
                elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Metric computation cancelled"
            );
            return Err(Error::Cancelled);
        }

        tracing::debug!(
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Metric maps computed"
        );

        Ok(MetricMaps {
            colordiff: Buffer2::new(rows, cols, colordiff),
            ssim: Buffer2::new(rows, cols, ssim),
        })
    }

    fn rows_per_band(&self, rows: usize) -> usize {
        if let Some(rows_per_band) = self.config.rows_per_band {
            return rows_per_band;
        }
        let threads = match (self.config.parallelism, &self.pool) {
            (Parallelism::Sequential, _) => 1,
            (_, Some(pool)) => pool.current_num_threads(),
            (_, None) => rayon::current_num_threads(),
        };
        (rows / (threads * BANDS_PER_THREAD)).max(1)
    }
}

/// Shared read-only inputs of one run. Bands borrow it from worker threads.
struct BandJob<'a, 'img, T> {
    test: &'a ImageView<'img, T>,
    reference: &'a ImageView<'img, T>,
    kernel: &'a Kernel,
    stabilizers: &'a Stabilizers,
    rows_per_band: usize,
    cancel: Option<&'a AtomicBool>,
}

impl<T: Sample> BandJob<'_, '_, T> {
    fn band_len(&self) -> usize {
        self.rows_per_band * self.test.cols()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn run_parallel(&self, colordiff: &mut [f64], ssim: &mut [f64]) {
        let band_len = self.band_len();
        colordiff
            .par_chunks_mut(band_len)
            .zip(ssim.par_chunks_mut(band_len))
            .enumerate()
            .for_each(|(band, (colordiff, ssim))| self.run_band(band, colordiff, ssim));
    }

    fn run_sequential(&self, colordiff: &mut [f64], ssim: &mut [f64]) {
        let band_len = self.band_len();
        colordiff
            .chunks_mut(band_len)
            .zip(ssim.chunks_mut(band_len))
            .enumerate()
            .for_each(|(band, (colordiff, ssim))| self.run_band(band, colordiff, ssim));
    }

    fn run_band(&self, band: usize, colordiff: &mut [f64], ssim: &mut [f64]) {
        let cols = self.test.cols();
        let first_row = band * self.rows_per_band;
        let mut scratch = Vec::with_capacity(self.kernel.len());

        for (local_row, (colordiff_row, ssim_row)) in colordiff
            .chunks_mut(cols)
            .zip(ssim.chunks_mut(cols))
            .enumerate()
        {
            if self.is_cancelled() {
                return;
            }
            let row = first_row + local_row;
            for (col, (colordiff, ssim)) in colordiff_row
                .iter_mut()
                .zip(ssim_row.iter_mut())
                .enumerate()
            {
                let px = evaluate_pixel_with(
                    &mut scratch,
                    self.test,
                    self.reference,
                    self.kernel,
                    row,
                    col,
                    self.stabilizers,
                );
                *colordiff = px.colordiff;
                *ssim = px.ssim;
            }
        }

        tracing::trace!(band, first_row, rows = colordiff.len() / cols, "Band done");
    }
}
