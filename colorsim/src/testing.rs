//! Test helpers shared across colorsim modules.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::Rng;

/// Initialize tracing subscriber for tests.
/// Safe to call multiple times - will only initialize once.
/// Respects RUST_LOG env var, defaults to "info".
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Three-channel image whose luma and chroma channels all equal `gray`.
pub fn replicate_gray(gray: &[f64]) -> Vec<f64> {
    gray.iter().flat_map(|&v| [v, v, v]).collect()
}

/// Random image with luma in `[20, 230)` and chroma in `[-50, 50)`.
/// Channels past the third get luma-range noise.
pub fn random_image(rng: &mut StdRng, rows: usize, cols: usize, channels: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(rows * cols * channels);
    for _ in 0..rows * cols {
        for ch in 0..channels {
            let value = if ch == 1 || ch == 2 {
                rng.random_range(-50.0..50.0)
            } else {
                rng.random_range(20.0..230.0)
            };
            data.push(value);
        }
    }
    data
}
