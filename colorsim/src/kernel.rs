//! Weight kernels defining the local window.

use common::Buffer2;

use crate::error::{Error, Result};

/// Largest accepted kernel weight. See
/// [`MAX_SAMPLE_MAGNITUDE`](crate::image::MAX_SAMPLE_MAGNITUDE).
pub const MAX_KERNEL_WEIGHT: f64 = 1e75;

/// Non-negative 2-D weights. The kernel center is `(rows / 2, cols / 2)`, so
/// even-sized kernels are shifted toward the bottom-right.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Buffer2<f64>,
    half_rows: usize,
    half_cols: usize,
}

impl Kernel {
    pub fn new(rows: usize, cols: usize, weights: Vec<f64>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::EmptyKernel { rows, cols });
        }
        if weights.len() != rows * cols {
            return Err(Error::KernelDataLength {
                expected: rows * cols,
                actual: weights.len(),
            });
        }
        Self::from_buffer(Buffer2::new(rows, cols, weights))
    }

    pub fn from_buffer(weights: Buffer2<f64>) -> Result<Self> {
        let (rows, cols) = weights.dims();
        if weights.is_empty() {
            return Err(Error::EmptyKernel { rows, cols });
        }
        if let Some(index) = weights
            .iter()
            .position(|&w| !(0.0..=MAX_KERNEL_WEIGHT).contains(&w))
        {
            return Err(Error::InvalidKernelWeight {
                row: index / cols,
                col: index % cols,
                weight: weights.as_slice()[index],
            });
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(Error::ZeroKernelMass);
        }

        Ok(Self {
            half_rows: rows / 2,
            half_cols: cols / 2,
            weights,
        })
    }

    /// Box kernel with weight 1 everywhere.
    pub fn uniform(rows: usize, cols: usize) -> Result<Self> {
        Self::new(rows, cols, vec![1.0; rows * cols])
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.weights.rows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.weights.cols()
    }

    /// Number of kernel cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// `(rows / 2, cols / 2)`: offset of the center cell.
    #[inline]
    pub fn half_extents(&self) -> (usize, usize) {
        (self.half_rows, self.half_cols)
    }

    #[inline]
    pub fn weight(&self, row: usize, col: usize) -> f64 {
        *self.weights.get(row, col)
    }

    pub fn weights(&self) -> &Buffer2<f64> {
        &self.weights
    }
}
