//! Per-pixel composition of the color divergence and SSIM scores.

use crate::config::Stabilizers;
use crate::error::{Error, Result};
use crate::eigen::{generalized_eigenvalues, Roots};
use crate::image::{ImageView, Sample, LUMA};
use crate::kernel::Kernel;
use crate::log_distance::squared_log_distance;
use crate::moments::{Covariance2, LocalMoments};
use crate::window::{collect_taps, Tap};

/// Both scores of one output pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelMetrics {
    pub colordiff: f64,
    pub ssim: f64,
}

impl PixelMetrics {
    /// Written where the in-bounds window carries no weight: no local
    /// evidence of a difference.
    pub const EMPTY_WINDOW: Self = Self {
        colordiff: 0.0,
        ssim: 1.0,
    };
}

/// Rotation and scale invariant distance between two chrominance
/// covariances: the root of the summed squared log-eigenvalues of the pencil.
///
/// No real eigenvalue means no measurable divergence and gives `0`. A
/// singular test covariance puts the second eigenvalue at infinity, which
/// mirrors the zero eigenvalue seen with the images swapped.
pub fn color_divergence(test: &Covariance2, reference: &Covariance2) -> f64 {
    let sum: f64 = match generalized_eigenvalues(test, reference) {
        Roots::None => return 0.0,
        Roots::Single(x) => squared_log_distance(x) + squared_log_distance(f64::INFINITY),
        roots => roots.values().map(squared_log_distance).sum(),
    };
    sum.sqrt()
}

/// Luminance SSIM of one window.
///
/// Equals `(k1 + 2m²) / (k2 + 2m²)` rather than exactly 1 for identical
/// windows with local mean `m`, since `k1 != k2` by default.
pub fn structural_similarity(moments: &LocalMoments, stabilizers: &Stabilizers) -> f64 {
    let Stabilizers { k1, k2, k3 } = *stabilizers;
    let m0 = moments.mean[LUMA];
    let mr0 = moments.mean_reference[LUMA];
    let luma = &moments.luma;

    let luminance = (k1 + 2.0 * m0 * mr0) / (k2 + mr0 * mr0 + m0 * m0);
    let structure = (k3 + 2.0 * luma.covariance)
        / (k3 + luma.test_variance + luma.reference_variance);
    luminance * structure
}

/// Both scores from one window's moments.
pub fn compose(moments: &LocalMoments, stabilizers: &Stabilizers) -> PixelMetrics {
    PixelMetrics {
        colordiff: color_divergence(&moments.chroma, &moments.chroma_reference),
        ssim: structural_similarity(moments, stabilizers),
    }
}

/// Scores of the pixel at `(row, col)`.
pub fn evaluate_pixel<T: Sample>(
    test: &ImageView<'_, T>,
    reference: &ImageView<'_, T>,
    kernel: &Kernel,
    row: usize,
    col: usize,
    stabilizers: &Stabilizers,
) -> Result<PixelMetrics> {
    if test.dims() != reference.dims() {
        return Err(Error::DimensionMismatch {
            test: test.dims(),
            reference: reference.dims(),
        });
    }
    let (rows, cols) = test.dims();
    if row >= rows || col >= cols {
        return Err(Error::PixelOutOfBounds {
            row,
            col,
            rows,
            cols,
        });
    }

    let mut scratch = Vec::with_capacity(kernel.len());
    Ok(evaluate_pixel_with(
        &mut scratch,
        test,
        reference,
        kernel,
        row,
        col,
        stabilizers,
    ))
}

/// [`evaluate_pixel`] with a caller-owned tap buffer reused across pixels.
/// Dimensions and bounds are the caller's responsibility.
pub(crate) fn evaluate_pixel_with<T: Sample>(
    scratch: &mut Vec<Tap>,
    test: &ImageView<'_, T>,
    reference: &ImageView<'_, T>,
    kernel: &Kernel,
    row: usize,
    col: usize,
    stabilizers: &Stabilizers,
) -> PixelMetrics {
    let (rows, cols) = test.dims();
    collect_taps(kernel, rows, cols, row, col, scratch);
    match LocalMoments::accumulate(scratch, test, reference) {
        Some(moments) => compose(&moments, stabilizers),
        None => PixelMetrics::EMPTY_WINDOW,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::METRIC_CHANNELS;
    use crate::log_distance::MAX_LOG_MAGNITUDE;
    use std::f64::consts::LN_2;

    /// 3x3 image with luma `luma[i]` and chroma `(ch1[i], ch2[i])` per pixel.
    fn image3x3(luma: [f64; 9], ch1: [f64; 9], ch2: [f64; 9]) -> Vec<f64> {
        (0..9)
            .flat_map(|i| [luma[i], ch1[i], ch2[i]])
            .collect()
    }

    fn eval(
        test: &ImageView<'_, f64>,
        reference: &ImageView<'_, f64>,
        kernel: &Kernel,
        row: usize,
        col: usize,
    ) -> PixelMetrics {
        evaluate_pixel(test, reference, kernel, row, col, &Stabilizers::default()).unwrap()
    }

    const LUMA_3X3: [f64; 9] = [60.0, 80.0, 70.0, 90.0, 120.0, 100.0, 75.0, 65.0, 85.0];
    const CH1_3X3: [f64; 9] = [1.0, 3.0, -2.0, 4.0, 0.5, -1.0, 2.0, 6.0, -3.0];
    const CH2_3X3: [f64; 9] = [2.0, -1.0, 5.0, 0.0, 3.0, 1.5, -2.0, 4.0, 1.0];

    #[test]
    fn test_identical_images_have_zero_color_divergence() {
        let data = image3x3(LUMA_3X3, CH1_3X3, CH2_3X3);
        let image = ImageView::new(&data, 3, 3, METRIC_CHANNELS).unwrap();
        let kernel = Kernel::uniform(3, 3).unwrap();

        for row in 0..3 {
            for col in 0..3 {
                let px = eval(&image, &image, &kernel, row, col);
                assert_eq!(px.colordiff, 0.0, "colordiff at ({}, {})", row, col);
                assert!(
                    (px.ssim - 1.0).abs() < 1e-5,
                    "ssim at ({}, {}) = {}",
                    row,
                    col,
                    px.ssim
                );
            }
        }
    }

    #[test]
    fn test_equal_stabilizers_give_unit_ssim() {
        let data = image3x3(LUMA_3X3, CH1_3X3, CH2_3X3);
        let image = ImageView::new(&data, 3, 3, METRIC_CHANNELS).unwrap();
        let kernel = Kernel::uniform(3, 3).unwrap();
        let stabilizers = Stabilizers {
            k1: 0.01,
            k2: 0.01,
            k3: 0.03,
        };

        let px = evaluate_pixel(&image, &image, &kernel, 1, 1, &stabilizers).unwrap();
        assert!((px.ssim - 1.0).abs() < 1e-12, "ssim = {}", px.ssim);
    }

    #[test]
    fn test_doubled_chroma_gives_known_divergence() {
        // Doubling chroma scales both covariances by 4, so the pencil has the
        // double eigenvalue 1/4 and colordiff = sqrt(2 * ln(4)²) = 2·√2·ln 2.
        let doubled_ch1 = CH1_3X3.map(|v| 2.0 * v);
        let doubled_ch2 = CH2_3X3.map(|v| 2.0 * v);
        let test = image3x3(LUMA_3X3, doubled_ch1, doubled_ch2);
        let reference = image3x3(LUMA_3X3, CH1_3X3, CH2_3X3);
        let test = ImageView::new(&test, 3, 3, METRIC_CHANNELS).unwrap();
        let reference = ImageView::new(&reference, 3, 3, METRIC_CHANNELS).unwrap();
        let kernel = Kernel::uniform(3, 3).unwrap();

        let px = eval(&test, &reference, &kernel, 1, 1);
        let expected = 2.0 * std::f64::consts::SQRT_2 * LN_2;
        assert!(
            (px.colordiff - expected).abs() < 1e-9,
            "colordiff = {}, expected {}",
            px.colordiff,
            expected
        );

        // Same divergence in the other direction: the eigenvalue becomes 4.
        let swapped = eval(&reference, &test, &kernel, 1, 1);
        assert!((swapped.colordiff - expected).abs() < 1e-9);
    }

    #[test]
    fn test_flat_test_chroma_channel_is_swap_symmetric() {
        // The test window has a constant second chroma channel, so its
        // covariance is singular. Forward the pencil degenerates to linear
        // (eigenvalues 16/7 and infinity), swapped it has a zero root
        // (eigenvalues 7/16 and 0).
        let test = [50.0, 1.0, 0.0, 60.0, 3.0, 0.0, 70.0, 2.0, 0.0];
        let reference = [55.0, 1.0, 4.0, 65.0, 3.0, 1.0, 75.0, 5.0, 2.0];
        let test = ImageView::new(&test, 1, 3, 3).unwrap();
        let reference = ImageView::new(&reference, 1, 3, 3).unwrap();
        let kernel = Kernel::uniform(1, 3).unwrap();

        let forward = eval(&test, &reference, &kernel, 0, 1).colordiff;
        let backward = eval(&reference, &test, &kernel, 0, 1).colordiff;
        assert!(
            (forward - backward).abs() < 1e-9 * forward,
            "forward {} vs backward {}",
            forward,
            backward
        );

        let log_ratio = (16.0f64 / 7.0).ln();
        let expected = (log_ratio * log_ratio + MAX_LOG_MAGNITUDE * MAX_LOG_MAGNITUDE).sqrt();
        assert!((forward - expected).abs() < 1e-9 * expected, "colordiff = {}", forward);
    }

    #[test]
    fn test_ssim_matches_hand_computation() {
        // Test luma [1, 3], reference luma [5, 5]:
        // m0 = 2, mr0 = 5, v0 = 1, v1 = 9, cv = 0.
        let test = [1.0, 0.0, 0.0, 3.0, 0.0, 0.0];
        let reference = [5.0, 0.0, 0.0, 5.0, 0.0, 0.0];
        let test = ImageView::new(&test, 1, 2, 3).unwrap();
        let reference = ImageView::new(&reference, 1, 2, 3).unwrap();
        let kernel = Kernel::uniform(1, 3).unwrap();

        let px = eval(&test, &reference, &kernel, 0, 0);
        let expected = (0.001 + 20.0) / (0.01 + 29.0) * (0.03 / 10.03);
        assert!((px.ssim - expected).abs() < 1e-15, "ssim = {}", px.ssim);
        // Flat chroma: both covariances vanish and there are no roots.
        assert_eq!(px.colordiff, 0.0);
    }

    #[test]
    fn test_negative_correlation_lowers_ssim() {
        let test = [0.0, 0.0, 0.0, 10.0, 0.0, 0.0];
        let reference = [10.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let test = ImageView::new(&test, 1, 2, 3).unwrap();
        let reference = ImageView::new(&reference, 1, 2, 3).unwrap();
        let kernel = Kernel::uniform(1, 3).unwrap();

        let px = eval(&test, &reference, &kernel, 0, 1);
        assert!(px.ssim < 0.0, "ssim = {}", px.ssim);
    }

    #[test]
    fn test_largest_accepted_samples_stay_finite() {
        use crate::image::MAX_SAMPLE_MAGNITUDE;
        use crate::kernel::MAX_KERNEL_WEIGHT;

        let big = MAX_SAMPLE_MAGNITUDE;
        let test = [big, big, -big, -big, -big, big];
        let reference = [-big, big, big, big, -big, -big];
        let test = ImageView::new(&test, 1, 2, 3).unwrap();
        let reference = ImageView::new(&reference, 1, 2, 3).unwrap();
        let kernel = Kernel::new(1, 3, vec![MAX_KERNEL_WEIGHT; 3]).unwrap();

        for col in 0..2 {
            let px = eval(&test, &reference, &kernel, 0, col);
            assert!(px.ssim.is_finite(), "ssim = {}", px.ssim);
            assert!(px.colordiff.is_finite(), "colordiff = {}", px.colordiff);
        }
    }

    #[test]
    fn test_zero_mass_window_writes_empty_values() {
        let data = [9.0; 12];
        let image = ImageView::new(&data, 2, 2, 3).unwrap();
        let mut weights = vec![0.0; 9];
        weights[0] = 1.0;
        let kernel = Kernel::new(3, 3, weights).unwrap();

        let corner = eval(&image, &image, &kernel, 0, 0);
        assert_eq!(corner, PixelMetrics::EMPTY_WINDOW);

        // At (1, 1) the weighted cell lands on (0, 0).
        let inner = eval(&image, &image, &kernel, 1, 1);
        assert_eq!(inner.colordiff, 0.0);
        assert!(inner.ssim.is_finite());
    }

    #[test]
    fn test_color_divergence_without_roots_is_zero() {
        let zero = Covariance2::default();
        assert_eq!(color_divergence(&zero, &zero), 0.0);
    }

    #[test]
    fn test_color_divergence_singular_test_matrix() {
        // A = 0: eigenvalues 2 and infinity. Swapped: 0.5 and 0.
        let m = Covariance2::new(1.0, 0.0, 0.0);
        let r = Covariance2::new(2.0, 3.0, 0.0);
        let expected = (LN_2 * LN_2 + MAX_LOG_MAGNITUDE * MAX_LOG_MAGNITUDE).sqrt();

        let forward = color_divergence(&m, &r);
        let backward = color_divergence(&r, &m);
        assert!((forward - expected).abs() < 1e-12 * expected, "{}", forward);
        assert!((backward - expected).abs() < 1e-12 * expected, "{}", backward);
    }

    #[test]
    fn test_mismatched_dimensions_rejected() {
        let a = [0.0; 12];
        let b = [0.0; 18];
        let a = ImageView::new(&a, 2, 2, 3).unwrap();
        let b = ImageView::new(&b, 2, 3, 3).unwrap();
        let kernel = Kernel::uniform(1, 1).unwrap();

        let result = evaluate_pixel(&a, &b, &kernel, 0, 0, &Stabilizers::default());
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                test: (2, 2),
                reference: (2, 3)
            })
        ));
    }

    #[test]
    fn test_pixel_outside_image_rejected() {
        let data = [0.0; 12];
        let image = ImageView::new(&data, 2, 2, 3).unwrap();
        let kernel = Kernel::uniform(3, 3).unwrap();

        let result = evaluate_pixel(&image, &image, &kernel, 0, 2, &Stabilizers::default());
        assert!(matches!(
            result,
            Err(Error::PixelOutOfBounds {
                row: 0,
                col: 2,
                rows: 2,
                cols: 2
            })
        ));
    }
}
