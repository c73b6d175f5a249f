//! Brute-force atmospheric-light search.
//!
//! For a candidate alpha `a` the haze model gives a per-channel transmission
//! `t_c = (haze_c - a) / (result_c - a)`. The true alpha makes the three
//! channel transmissions agree, so the loss is the summed squared deviation of
//! each `t_c` from the per-pixel channel mean. Saturated pixels divide by zero:
//! infinities count as full transmission (1) and NaN as none (0).
use super::{EstimationMode, Estimator};
use crate::error::{PipelineError, Result};
use crate::image::{ImageView, RgbImageF32};
use crate::types::{EstimationResult, Task};
use log::{debug, info};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSearchOptions {
    /// First candidate (inclusive).
    pub initial_alpha: f64,
    /// Last candidate (inclusive).
    pub final_alpha: f64,
    /// Candidate spacing. Candidates are rounded to three decimals.
    pub step: f64,
}

impl Default for GridSearchOptions {
    fn default() -> Self {
        Self {
            initial_alpha: 0.7,
            final_alpha: 1.0,
            step: 0.01,
        }
    }
}

impl GridSearchOptions {
    /// Finite bounds, `initial_alpha <= final_alpha` and a positive step.
    pub fn validate(&self) -> Result<()> {
        for (field, v) in [
            ("grid_search.initial_alpha", self.initial_alpha),
            ("grid_search.final_alpha", self.final_alpha),
            ("grid_search.step", self.step),
        ] {
            if !v.is_finite() {
                return invalid(field, format!("{v} is not finite"));
            }
        }
        if self.step <= 0.0 {
            return invalid("grid_search.step", format!("must be positive, got {}", self.step));
        }
        if round3(self.initial_alpha) > self.final_alpha {
            return invalid(
                "grid_search.initial_alpha",
                format!(
                    "{} exceeds final_alpha {}",
                    self.initial_alpha, self.final_alpha
                ),
            );
        }
        Ok(())
    }

    /// Candidate alphas in search order. A non-positive step yields only the
    /// initial candidate; [`validate`](Self::validate) rejects such options.
    pub fn candidates(&self) -> Vec<f64> {
        let mut out = Vec::new();
        let mut a = round3(self.initial_alpha);
        while a <= self.final_alpha {
            out.push(a);
            if self.step <= 0.0 {
                break;
            }
            a = round3(a + self.step);
        }
        out
    }
}

fn invalid(field: &'static str, reason: String) -> Result<()> {
    Err(PipelineError::InvalidOption { field, reason })
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[inline]
fn masked(t: f64) -> f64 {
    if t.is_infinite() {
        1.0
    } else if t.is_nan() {
        0.0
    } else {
        t
    }
}

/// Channel-disagreement loss of `alpha` for one haze/result pair.
pub fn transmission_loss(alpha: f64, result: &RgbImageF32, haze: &RgbImageF32) -> Result<f64> {
    if result.shape() != haze.shape() {
        return Err(PipelineError::ShapeMismatch {
            expected: haze.shape(),
            actual: result.shape(),
        });
    }
    let mut loss = 0.0f64;
    for (hz, rs) in haze.data.iter().zip(&result.data) {
        let mut t = [0.0f64; 3];
        for c in 0..3 {
            t[c] = masked((hz[c] as f64 - alpha) / (rs[c] as f64 - alpha));
        }
        // Equal to sum((t_c - mean)^2); the pairwise form is exactly zero when
        // the channels agree, where (t + t + t) / 3 can round away from t.
        let d01 = t[0] - t[1];
        let d12 = t[1] - t[2];
        let d02 = t[0] - t[2];
        loss += (d01 * d01 + d12 * d12 + d02 * d02) / 3.0;
    }
    Ok(loss)
}

/// Candidate with the smallest loss. Ties keep the earliest candidate.
pub fn find_best_alpha(
    result: &RgbImageF32,
    haze: &RgbImageF32,
    options: &GridSearchOptions,
) -> Result<f64> {
    options.validate()?;
    let candidates = options.candidates();
    let Some(&first) = candidates.first() else {
        return Err(PipelineError::InvalidOption {
            field: "grid_search",
            reason: "no candidates".to_string(),
        });
    };
    let mut best = first;
    let mut min_loss = f64::INFINITY;
    for a in candidates {
        let loss = transmission_loss(a, result, haze)?;
        debug!("a: {a:.3} loss: {loss}");
        if loss < min_loss {
            min_loss = loss;
            best = a;
        }
    }
    Ok(best)
}

#[derive(Clone, Debug, Default)]
pub struct GridSearchEstimator {
    pub options: GridSearchOptions,
}

impl GridSearchEstimator {
    pub fn new(options: GridSearchOptions) -> Self {
        Self { options }
    }
}

impl Estimator for GridSearchEstimator {
    fn mode(&self) -> EstimationMode {
        EstimationMode::GridSearch
    }

    fn estimate(&self, task: Task) -> Result<EstimationResult> {
        let Task::GridSearch(task) = task else {
            return Err(PipelineError::TaskMismatch(self.mode()));
        };
        let alpha = find_best_alpha(&task.result, &task.haze, &self.options)?;
        info!(
            "key={} estimate={alpha:.3} ground_truth={}",
            task.key, task.ground_truth
        );
        Ok(EstimationResult::Alpha {
            key: task.key,
            estimated_alpha: alpha,
            ground_truth_alpha: task.ground_truth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GridSearchTask;

    fn pixel(px: [f32; 3]) -> RgbImageF32 {
        RgbImageF32::filled(1, 1, px)
    }

    #[test]
    fn default_candidates_cover_closed_interval() {
        let c = GridSearchOptions::default().candidates();
        assert_eq!(c.len(), 31);
        assert_eq!(c[0], 0.7);
        assert_eq!(c[10], 0.8);
        assert_eq!(*c.last().unwrap(), 1.0);
    }

    #[test]
    fn all_ones_ties_everywhere_and_keeps_first_candidate() {
        let ones = RgbImageF32::filled(4, 3, [1.0; 3]);
        let options = GridSearchOptions::default();
        for a in options.candidates() {
            assert_eq!(transmission_loss(a, &ones, &ones).unwrap(), 0.0);
        }
        assert_eq!(find_best_alpha(&ones, &ones, &options).unwrap(), 0.7);
    }

    #[test]
    fn uniform_grey_pixel_reports_first_candidate() {
        let estimator = GridSearchEstimator::default();
        let task = Task::GridSearch(GridSearchTask {
            key: "0001".into(),
            ground_truth: 0.8,
            result: pixel([0.5; 3]),
            haze: pixel([0.9; 3]),
        });
        let result = estimator.estimate(task).unwrap();
        assert_eq!(result.estimated_alpha(), 0.7);
        assert_eq!(result.ground_truth_alpha(), 0.8);
    }

    #[test]
    fn recovers_alpha_of_synthetic_haze() {
        // haze = result * t + alpha * (1 - t) with a single shared t.
        let alpha = 0.85f32;
        let t = 0.6f32;
        let result = pixel([0.2, 0.4, 0.7]);
        let haze = pixel(result.data[0].map(|j| j * t + alpha * (1.0 - t)));
        let best = find_best_alpha(&result, &haze, &GridSearchOptions::default()).unwrap();
        assert!((best - 0.85).abs() < 1e-9, "best={best}");
    }

    #[test]
    fn degenerate_search_ranges_are_rejected() {
        let ones = pixel([1.0; 3]);
        for options in [
            GridSearchOptions { step: 0.0, ..Default::default() },
            GridSearchOptions { step: -0.01, ..Default::default() },
            GridSearchOptions { initial_alpha: 1.1, ..Default::default() },
            GridSearchOptions { final_alpha: f64::NAN, ..Default::default() },
        ] {
            assert!(matches!(
                options.validate(),
                Err(PipelineError::InvalidOption { .. })
            ));
            assert!(find_best_alpha(&ones, &ones, &options).is_err());
        }
        let single = GridSearchOptions {
            initial_alpha: 0.9,
            final_alpha: 0.9,
            step: 0.01,
        };
        assert!(single.validate().is_ok());
        assert_eq!(find_best_alpha(&ones, &ones, &single).unwrap(), 0.9);
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let a = RgbImageF32::filled(2, 2, [0.5; 3]);
        let b = RgbImageF32::filled(3, 2, [0.5; 3]);
        assert!(transmission_loss(0.8, &a, &b).is_err());
    }

    #[test]
    fn wrong_task_variant_is_rejected() {
        let task = Task::DepthMap(crate::types::DepthMapTask {
            transmission: crate::image::ImageF32::new(1, 1),
            source: "0001_0.8_0.9.png".into(),
        });
        assert!(GridSearchEstimator::default().estimate(task).is_err());
    }
}
