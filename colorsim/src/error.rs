//! Error types for metric map computation.

use std::io;
use std::path::PathBuf;

use common::FileExtensionError;
use thiserror::Error;

/// Errors reported before any per-pixel work starts, plus cancellation.
///
/// Numeric degeneracies inside a window (empty window, singular covariance,
/// zero eigenvalue) are never errors; they map to finite per-pixel values.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Image has zero area: {rows}x{cols}")]
    EmptyImage { rows: usize, cols: usize },

    #[error("Image data length mismatch: expected {expected} samples, got {actual}")]
    DataLength { expected: usize, actual: usize },

    #[error("Image needs at least 3 channels (luminance + 2 chrominance), got {channels}")]
    TooFewChannels { channels: usize },

    #[error("Non-finite sample at row {row}, col {col}, channel {channel}")]
    NonFiniteSample {
        row: usize,
        col: usize,
        channel: usize,
    },

    #[error(
        "Sample {value} at row {row}, col {col}, channel {channel} exceeds the supported magnitude {limit}"
    )]
    SampleOutOfRange {
        row: usize,
        col: usize,
        channel: usize,
        value: f64,
        limit: f64,
    },

    #[error("Image dimension mismatch: test is {test:?}, reference is {reference:?}")]
    DimensionMismatch {
        test: (usize, usize),
        reference: (usize, usize),
    },

    #[error("Pixel ({row}, {col}) is outside the {rows}x{cols} image")]
    PixelOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Kernel has zero area: {rows}x{cols}")]
    EmptyKernel { rows: usize, cols: usize },

    #[error("Kernel data length mismatch: expected {expected} weights, got {actual}")]
    KernelDataLength { expected: usize, actual: usize },

    #[error(
        "Invalid kernel weight {weight} at row {row}, col {col}: weights must be non-negative and at most 1e75"
    )]
    InvalidKernelWeight { row: usize, col: usize, weight: f64 },

    #[error("Kernel weights sum to zero")]
    ZeroKernelMass,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to build worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported config file: {0}")]
    ConfigFormat(#[from] FileExtensionError),

    #[error("Failed to parse YAML config: {0}")]
    ConfigYaml(#[from] serde_yml::Error),

    #[error("Failed to parse JSON config: {0}")]
    ConfigJson(#[from] serde_json::Error),

    #[error("Metric computation was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
