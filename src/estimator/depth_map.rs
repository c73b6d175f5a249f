//! Depth-guided atmospheric-light estimation.
//!
//! The haziest pixels are the ones with the lowest transmission. Among the
//! lowest 0.1 % (at least one pixel) the estimator picks the most achromatic
//! one, i.e. the smallest inter-channel distance, and reads the atmospheric
//! light off its brightest channel.
use super::{EstimationMode, Estimator};
use crate::depth::DepthEstimator;
use crate::error::{PipelineError, Result};
use crate::guided::GuidedFilter;
use crate::image::io::{load_rgb_normalized, ImageCodec};
use crate::image::{ImageF32, ImageView, RgbImageF32};
use crate::naming::FilenameParser;
use crate::types::{EstimationResult, Task};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::path::PathBuf;
use std::sync::Arc;

/// Where the transmission used for pixel selection comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransmissionSource {
    /// Color-attenuation depth, guided-filter refined, `t = exp(-d)`.
    ColorAttenuation,
    /// The precomputed map carried by the task.
    Artifact,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthMapOptions {
    /// Fraction of lowest-transmission pixels kept as candidates.
    pub quantile: f64,
    pub guided_radius: usize,
    pub guided_epsilon: f64,
    /// Minimum-filter window of the depth prior.
    pub depth_patch: usize,
    pub transmission_source: TransmissionSource,
}

impl Default for DepthMapOptions {
    fn default() -> Self {
        Self {
            quantile: 0.001,
            guided_radius: 60,
            guided_epsilon: 1e-3,
            depth_patch: 15,
            transmission_source: TransmissionSource::ColorAttenuation,
        }
    }
}

impl DepthMapOptions {
    /// Quantile in (0, 1] and a positive guided-filter epsilon.
    pub fn validate(&self) -> Result<()> {
        if !(self.quantile > 0.0 && self.quantile <= 1.0) {
            return Err(PipelineError::InvalidOption {
                field: "depth_map.quantile",
                reason: format!("must lie in (0, 1], got {}", self.quantile),
            });
        }
        if !(self.guided_epsilon > 0.0 && self.guided_epsilon.is_finite()) {
            return Err(PipelineError::InvalidOption {
                field: "depth_map.guided_epsilon",
                reason: format!("must be positive, got {}", self.guided_epsilon),
            });
        }
        Ok(())
    }
}

/// Ranked by transmission ascending; position breaks ties.
#[derive(Clone, Copy, Debug)]
struct Pixel {
    transmission: f32,
    h: usize,
    w: usize,
}

impl Ord for Pixel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.transmission
            .total_cmp(&other.transmission)
            .then_with(|| (self.h, self.w).cmp(&(other.h, other.w)))
    }
}

impl PartialOrd for Pixel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Pixel {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pixel {}

/// Ranked by inter-channel distance ascending; position breaks ties.
#[derive(Clone, Copy, Debug)]
struct ChannelDistanceSample {
    distance: f32,
    h: usize,
    w: usize,
}

impl Ord for ChannelDistanceSample {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| (self.h, self.w).cmp(&(other.h, other.w)))
    }
}

impl PartialOrd for ChannelDistanceSample {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ChannelDistanceSample {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ChannelDistanceSample {}

#[inline]
fn channel_distance([r, g, b]: [f32; 3]) -> f32 {
    (r - g) * (r - g) + (g - b) * (g - b) + (r - b) * (r - b)
}

/// Selected pixel and the atmospheric light read from it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtmosphericLight {
    pub alpha: f64,
    pub h: usize,
    pub w: usize,
    /// Size of the low-transmission candidate set.
    pub candidates: usize,
}

/// Pick the atmospheric light from the `quantile` lowest-transmission pixels.
pub fn select_atmospheric_light(
    transmission: &ImageF32,
    haze: &RgbImageF32,
    quantile: f64,
) -> Result<AtmosphericLight> {
    if transmission.shape() != haze.shape() {
        return Err(PipelineError::ShapeMismatch {
            expected: haze.shape(),
            actual: transmission.shape(),
        });
    }
    if transmission.is_empty() {
        return Err(PipelineError::EmptyImage("transmission map".to_string()));
    }
    let total = transmission.len();
    let count = ((total as f64 * quantile) as usize).clamp(1, total);

    let mut by_transmission: BinaryHeap<Reverse<Pixel>> = BinaryHeap::with_capacity(total);
    for (h, row) in transmission.rows().enumerate() {
        for (w, &t) in row.iter().enumerate() {
            by_transmission.push(Reverse(Pixel { transmission: t, h, w }));
        }
    }

    let mut by_distance: BinaryHeap<Reverse<ChannelDistanceSample>> =
        BinaryHeap::with_capacity(count);
    for _ in 0..count {
        let Some(Reverse(px)) = by_transmission.pop() else {
            break;
        };
        by_distance.push(Reverse(ChannelDistanceSample {
            distance: channel_distance(haze.at(px.h, px.w)),
            h: px.h,
            w: px.w,
        }));
    }

    let Reverse(best) = by_distance
        .pop()
        .ok_or_else(|| PipelineError::EmptyImage("candidate set".to_string()))?;
    Ok(AtmosphericLight {
        alpha: haze.max_channel(best.h, best.w) as f64,
        h: best.h,
        w: best.w,
        candidates: count,
    })
}

/// Relative error of an estimate, `|estimate - gt| / gt`.
pub fn error_rate(estimate: f64, ground_truth: f64) -> f64 {
    (estimate - ground_truth).abs() / ground_truth
}

pub struct DepthMapEstimator {
    pub options: DepthMapOptions,
    haze_dir: PathBuf,
    haze_extension: String,
    codec: Arc<dyn ImageCodec>,
    parser: Arc<dyn FilenameParser>,
    depth: Arc<dyn DepthEstimator>,
}

impl DepthMapEstimator {
    pub fn new(
        options: DepthMapOptions,
        haze_dir: impl Into<PathBuf>,
        haze_extension: impl Into<String>,
        codec: Arc<dyn ImageCodec>,
        parser: Arc<dyn FilenameParser>,
        depth: Arc<dyn DepthEstimator>,
    ) -> Self {
        Self {
            options,
            haze_dir: haze_dir.into(),
            haze_extension: haze_extension.into(),
            codec,
            parser,
            depth,
        }
    }

    /// Haze image sharing the artifact's stem.
    pub fn haze_path_for(&self, source: &std::path::Path) -> Result<PathBuf> {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| PipelineError::FileName {
                name: source.display().to_string(),
                reason: "artifact has no file stem".to_string(),
            })?;
        Ok(self
            .haze_dir
            .join(format!("{stem}.{}", self.haze_extension)))
    }

    /// Refined transmission `exp(-depth)` for a haze image.
    pub fn estimate_transmission(&self, haze: &RgbImageF32) -> Result<ImageF32> {
        let coarse = self.depth.depth_map(haze);
        let filter = GuidedFilter::new(self.options.guided_radius, self.options.guided_epsilon);
        let refined = filter.filter(haze, &coarse)?;
        Ok(refined.map(|d| (-d).exp()))
    }
}

impl Estimator for DepthMapEstimator {
    fn mode(&self) -> EstimationMode {
        EstimationMode::DepthMap
    }

    fn estimate(&self, task: Task) -> Result<EstimationResult> {
        let Task::DepthMap(task) = task else {
            return Err(PipelineError::TaskMismatch(self.mode()));
        };
        let name = self.parser.parse(&task.source)?;
        let haze = load_rgb_normalized(self.codec.as_ref(), &self.haze_path_for(&task.source)?)?;
        let transmission = match self.options.transmission_source {
            TransmissionSource::ColorAttenuation => self.estimate_transmission(&haze)?,
            TransmissionSource::Artifact => task.transmission,
        };
        let light = select_atmospheric_light(&transmission, &haze, self.options.quantile)?;
        debug!(
            "{}: picked ({}, {}) out of {} candidates",
            task.source.display(),
            light.h,
            light.w,
            light.candidates
        );
        let rate = error_rate(light.alpha, name.alpha);
        info!(
            "GT: {:.6} Estimate Alpha: {:.5} Error rate: {:.3}%",
            name.alpha,
            light.alpha,
            rate * 100.0
        );
        Ok(EstimationResult::ErrorRate {
            source: task.source.display().to_string(),
            estimated_alpha: light.alpha,
            ground_truth_alpha: name.alpha,
            error_rate: rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_haze() -> RgbImageF32 {
        RgbImageF32::from_pixels(
            2,
            2,
            vec![
                [0.80, 0.81, 0.82],
                [0.10, 0.60, 0.90],
                [0.30, 0.30, 0.30],
                [0.20, 0.50, 0.70],
            ],
        )
        .unwrap()
    }

    #[test]
    fn lowest_transmission_pixel_is_selected_when_count_rounds_to_zero() {
        let t = ImageF32::from_rows(&[vec![0.001, 0.002], vec![0.5, 0.9]]).unwrap();
        let light = select_atmospheric_light(&t, &quad_haze(), 0.001).unwrap();
        assert_eq!(light.candidates, 1);
        assert_eq!((light.h, light.w), (0, 0));
        assert_eq!(light.alpha, 0.82f32 as f64);
    }

    #[test]
    fn greyest_candidate_at_the_origin_sets_the_estimate() {
        // Candidates (0,0) and (0,1); (0,0) has the smaller channel distance.
        let t = ImageF32::from_rows(&[vec![0.001, 0.002], vec![0.5, 0.9]]).unwrap();
        let light = select_atmospheric_light(&t, &quad_haze(), 0.5).unwrap();
        assert_eq!(light.candidates, 2);
        assert_eq!((light.h, light.w), (0, 0));
        assert_eq!(light.alpha, quad_haze().max_channel(0, 0) as f64);
    }

    #[test]
    fn minimum_distance_wins_within_the_candidate_set_only() {
        let t = ImageF32::from_rows(&[vec![0.3, 0.1], vec![0.2, 0.9]]).unwrap();
        // Two candidates: (0,1) and (1,0). (1,0) is grey, so it wins even
        // though (0,0) is closer to grey than (0,1) but sits outside the set.
        let light = select_atmospheric_light(&t, &quad_haze(), 0.5).unwrap();
        assert_eq!(light.candidates, 2);
        assert_eq!((light.h, light.w), (1, 0));
        assert_eq!(light.alpha, 0.3f32 as f64);
    }

    #[test]
    fn single_pixel_estimate_is_its_brightest_channel() {
        let haze = RgbImageF32::filled(1, 1, [0.2, 0.9, 0.95]);
        let t = ImageF32::filled(1, 1, 0.4);
        let light = select_atmospheric_light(&t, &haze, 0.001).unwrap();
        assert_eq!(light.alpha, 0.95f32 as f64);
    }

    #[test]
    fn error_rate_is_relative_and_non_negative() {
        assert!((error_rate(0.9, 0.8) - 0.125).abs() < 1e-12);
        assert!((error_rate(0.7, 0.8) - 0.125).abs() < 1e-12);
        assert_eq!(error_rate(0.8, 0.8), 0.0);
        for gt in [0.01, 0.5, 1.0] {
            let r = error_rate(0.95, gt);
            assert!(r >= 0.0 && r.is_finite());
        }
    }

    #[test]
    fn options_outside_their_ranges_are_rejected() {
        assert!(DepthMapOptions::default().validate().is_ok());
        for options in [
            DepthMapOptions { quantile: 0.0, ..Default::default() },
            DepthMapOptions { quantile: 1.5, ..Default::default() },
            DepthMapOptions { guided_epsilon: 0.0, ..Default::default() },
        ] {
            assert!(options.validate().is_err(), "{options:?}");
        }
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let t = ImageF32::new(3, 1);
        assert!(select_atmospheric_light(&t, &quad_haze(), 0.001).is_err());
    }
}
