//! Weighted local moments of a test/reference image pair over one window.

use crate::image::{ImageView, Sample, CHROMA_A, CHROMA_B, LUMA, METRIC_CHANNELS};
use crate::window::Tap;

/// Symmetric 2x2 covariance `[[a, c], [c, b]]` of the two chrominance channels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Covariance2 {
    /// Variance of the first chrominance channel.
    pub a: f64,
    /// Variance of the second chrominance channel.
    pub b: f64,
    /// Covariance between the chrominance channels.
    pub c: f64,
}

impl Covariance2 {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    #[inline]
    pub fn determinant(&self) -> f64 {
        self.a * self.b - self.c * self.c
    }

    #[inline]
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.a * factor, self.b * factor, self.c * factor)
    }
}

/// Luminance second moments shared between the two images.
///
/// All three are centered on the *test* image's luminance mean, including the
/// reference variance. The SSIM contrast/structure term depends on this.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LumaMoments {
    pub test_variance: f64,
    pub reference_variance: f64,
    pub covariance: f64,
}

/// Window statistics for one pixel. Second moments are population estimates
/// (normalized by `sum`, not `sum - 1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalMoments {
    /// Total weight mass of the in-bounds window.
    pub sum: f64,
    pub mean: [f64; METRIC_CHANNELS],
    pub mean_reference: [f64; METRIC_CHANNELS],
    pub chroma: Covariance2,
    pub chroma_reference: Covariance2,
    pub luma: LumaMoments,
}

impl LocalMoments {
    /// Two passes over the same taps: weighted means first, then centered
    /// second moments.
    ///
    /// Returns `None` when the window carries no weight, which happens when
    /// every in-bounds kernel cell has weight zero.
    pub fn accumulate<T: Sample>(
        taps: &[Tap],
        test: &ImageView<'_, T>,
        reference: &ImageView<'_, T>,
    ) -> Option<Self> {
        let mut sum = 0.0;
        let mut mean = [0.0; METRIC_CHANNELS];
        let mut mean_reference = [0.0; METRIC_CHANNELS];

        for tap in taps {
            let t = test.pixel(tap.row, tap.col);
            let r = reference.pixel(tap.row, tap.col);
            sum += tap.weight;
            for ch in 0..METRIC_CHANNELS {
                mean[ch] += tap.weight * t[ch];
                mean_reference[ch] += tap.weight * r[ch];
            }
        }

        if sum <= 0.0 {
            return None;
        }
        for ch in 0..METRIC_CHANNELS {
            mean[ch] /= sum;
            mean_reference[ch] /= sum;
        }

        let mut chroma = Covariance2::default();
        let mut chroma_reference = Covariance2::default();
        let mut luma = LumaMoments::default();

        for tap in taps {
            let t = test.pixel(tap.row, tap.col);
            let r = reference.pixel(tap.row, tap.col);
            add_chroma(&mut chroma, tap.weight, &t, &mean);
            add_chroma(&mut chroma_reference, tap.weight, &r, &mean_reference);

            let dt = t[LUMA] - mean[LUMA];
            let dr = r[LUMA] - mean[LUMA];
            luma.test_variance += tap.weight * dt * dt;
            luma.reference_variance += tap.weight * dr * dr;
            luma.covariance += tap.weight * dt * dr;
        }

        for cov in [&mut chroma, &mut chroma_reference] {
            cov.a /= sum;
            cov.b /= sum;
            cov.c /= sum;
        }
        luma.test_variance /= sum;
        luma.reference_variance /= sum;
        luma.covariance /= sum;

        Some(Self {
            sum,
            mean,
            mean_reference,
            chroma,
            chroma_reference,
            luma,
        })
    }
}

#[inline]
fn add_chroma(
    cov: &mut Covariance2,
    weight: f64,
    px: &[f64; METRIC_CHANNELS],
    mean: &[f64; METRIC_CHANNELS],
) {
    let d1 = px[CHROMA_A] - mean[CHROMA_A];
    let d2 = px[CHROMA_B] - mean[CHROMA_B];
    cov.a += weight * d1 * d1;
    cov.b += weight * d2 * d2;
    cov.c += weight * d1 * d2;
}
