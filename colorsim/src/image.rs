//! Borrowed views over interleaved `(row, col, channel)` images.

use num_traits::AsPrimitive;

use crate::error::{Error, Result};

/// Luminance channel.
pub const LUMA: usize = 0;
/// First chrominance channel.
pub const CHROMA_A: usize = 1;
/// Second chrominance channel.
pub const CHROMA_B: usize = 2;
/// Channels read by the metrics; further channels are ignored.
pub const METRIC_CHANNELS: usize = 3;

/// Largest accepted sample magnitude. Together with
/// [`MAX_KERNEL_WEIGHT`](crate::kernel::MAX_KERNEL_WEIGHT) it keeps every
/// weighted product and squared deviation within `f64` range.
pub const MAX_SAMPLE_MAGNITUDE: f64 = 1e75;

/// Pixel sample types accepted by [`ImageView`]. All math runs in `f64`.
pub trait Sample: AsPrimitive<f64> + Send + Sync {}

impl<T: AsPrimitive<f64> + Send + Sync> Sample for T {}

/// Read-only, validated view over a dense row-major image with interleaved
/// channels: sample `(row, col, ch)` lives at `(row * cols + col) * channels + ch`.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    rows: usize,
    cols: usize,
    channels: usize,
}

impl<'a, T: Sample> ImageView<'a, T> {
    /// Validates shape and rejects non-finite samples, or samples above
    /// [`MAX_SAMPLE_MAGNITUDE`], up front so no NaN or infinity can reach the
    /// output maps.
    pub fn new(data: &'a [T], rows: usize, cols: usize, channels: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::EmptyImage { rows, cols });
        }
        if channels < METRIC_CHANNELS {
            return Err(Error::TooFewChannels { channels });
        }
        let expected = rows * cols * channels;
        if data.len() != expected {
            return Err(Error::DataLength {
                expected,
                actual: data.len(),
            });
        }
        let invalid = data
            .iter()
            .position(|&s| !(s.as_().abs() <= MAX_SAMPLE_MAGNITUDE));
        if let Some(index) = invalid {
            let (pixel, channel) = (index / channels, index % channels);
            let (row, col) = (pixel / cols, pixel % cols);
            let value = data[index].as_();
            return Err(if value.is_finite() {
                Error::SampleOutOfRange {
                    row,
                    col,
                    channel,
                    value,
                    limit: MAX_SAMPLE_MAGNITUDE,
                }
            } else {
                Error::NonFiniteSample { row, col, channel }
            });
        }

        Ok(Self {
            data,
            rows,
            cols,
            channels,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn sample(&self, row: usize, col: usize, channel: usize) -> f64 {
        debug_assert!(row < self.rows && col < self.cols && channel < self.channels);
        self.data[(row * self.cols + col) * self.channels + channel].as_()
    }

    /// Luminance and both chrominance samples of one pixel.
    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> [f64; METRIC_CHANNELS] {
        debug_assert!(row < self.rows && col < self.cols);
        let base = (row * self.cols + col) * self.channels;
        let px = &self.data[base..base + METRIC_CHANNELS];
        [px[LUMA].as_(), px[CHROMA_A].as_(), px[CHROMA_B].as_()]
    }
}
