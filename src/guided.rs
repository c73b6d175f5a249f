//! Color-guided filter (He et al.) used to refine coarse depth maps.
//!
//! Local statistics are box means over a `(2r + 1)²` window computed from an
//! integral image, so the cost is independent of the radius. With an RGB guide
//! the per-pixel linear model needs the 3×3 channel covariance, which is
//! inverted with `nalgebra`.
use crate::error::{PipelineError, Result};
use crate::image::{ImageF32, ImageView, RgbImageF32};
use nalgebra::{Matrix3, Vector3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GuidedFilter {
    pub radius: usize,
    pub epsilon: f64,
}

impl Default for GuidedFilter {
    fn default() -> Self {
        Self {
            radius: 60,
            epsilon: 1e-3,
        }
    }
}

impl GuidedFilter {
    pub fn new(radius: usize, epsilon: f64) -> Self {
        Self { radius, epsilon }
    }

    /// Smooth `input` while preserving the edges of `guide`.
    pub fn filter(&self, guide: &RgbImageF32, input: &ImageF32) -> Result<ImageF32> {
        if guide.shape() != input.shape() {
            return Err(PipelineError::ShapeMismatch {
                expected: guide.shape(),
                actual: input.shape(),
            });
        }
        let (w, h) = (input.w, input.h);
        let n = w * h;
        let mean = |values: &[f64]| box_mean(values, w, h, self.radius);

        let chan: [Vec<f64>; 3] =
            std::array::from_fn(|c| guide.data.iter().map(|px| px[c] as f64).collect());
        let p: Vec<f64> = input.data.iter().map(|&v| v as f64).collect();

        let mean_i: [Vec<f64>; 3] = std::array::from_fn(|c| mean(&chan[c]));
        let mean_p = mean(&p);
        let mean_ip: [Vec<f64>; 3] = std::array::from_fn(|c| {
            let prod: Vec<f64> = chan[c].iter().zip(&p).map(|(a, b)| a * b).collect();
            mean(&prod)
        });
        // Upper triangle of E[I Iᵀ]: rr, rg, rb, gg, gb, bb.
        const PAIRS: [(usize, usize); 6] = [(0, 0), (0, 1), (0, 2), (1, 1), (1, 2), (2, 2)];
        let mean_ii: [Vec<f64>; 6] = std::array::from_fn(|k| {
            let (a, b) = PAIRS[k];
            let prod: Vec<f64> = chan[a].iter().zip(&chan[b]).map(|(x, y)| x * y).collect();
            mean(&prod)
        });

        let mut coef_a: [Vec<f64>; 3] = std::array::from_fn(|_| vec![0.0; n]);
        let mut coef_b = vec![0.0; n];
        for i in 0..n {
            let mu = Vector3::new(mean_i[0][i], mean_i[1][i], mean_i[2][i]);
            let cov_ip = Vector3::new(
                mean_ip[0][i] - mu[0] * mean_p[i],
                mean_ip[1][i] - mu[1] * mean_p[i],
                mean_ip[2][i] - mu[2] * mean_p[i],
            );
            let var = |k: usize| {
                let (a, b) = PAIRS[k];
                mean_ii[k][i] - mu[a] * mu[b]
            };
            let sigma = Matrix3::new(
                var(0), var(1), var(2), //
                var(1), var(3), var(4), //
                var(2), var(4), var(5),
            ) + Matrix3::identity() * self.epsilon;
            let a = sigma
                .try_inverse()
                .map(|inv| inv * cov_ip)
                .unwrap_or_else(Vector3::zeros);
            for c in 0..3 {
                coef_a[c][i] = a[c];
            }
            coef_b[i] = mean_p[i] - a.dot(&mu);
        }

        let mean_a: [Vec<f64>; 3] = std::array::from_fn(|c| mean(&coef_a[c]));
        let mean_b = mean(&coef_b);
        let data = (0..n)
            .map(|i| {
                let q = mean_a[0][i] * chan[0][i]
                    + mean_a[1][i] * chan[1][i]
                    + mean_a[2][i] * chan[2][i]
                    + mean_b[i];
                q as f32
            })
            .collect();
        Ok(ImageF32 { w, h, data })
    }
}

/// Mean over the `(2r + 1)²` window around each pixel, clipped at the borders.
pub fn box_mean(values: &[f64], w: usize, h: usize, radius: usize) -> Vec<f64> {
    let stride = w + 1;
    let mut integral = vec![0.0f64; (h + 1) * stride];
    for y in 0..h {
        let mut row_sum = 0.0;
        for x in 0..w {
            row_sum += values[y * w + x];
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }
    let mut out = vec![0.0; w * h];
    for y in 0..h {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius + 1).min(h);
        for x in 0..w {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius + 1).min(w);
            let sum = integral[y1 * stride + x1] - integral[y0 * stride + x1]
                - integral[y1 * stride + x0]
                + integral[y0 * stride + x0];
            out[y * w + x] = sum / ((y1 - y0) * (x1 - x0)) as f64;
        }
    }
    out
}
