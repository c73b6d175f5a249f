use crate::image::{ImageF32, RgbImageF32};
use serde::Serialize;
use std::path::PathBuf;

/// Work item for the grid-search estimator: a haze image and its dehazed
/// result, both normalized to [0, 1] and of identical shape.
#[derive(Clone, Debug)]
pub struct GridSearchTask {
    pub key: String,
    pub ground_truth: f64,
    pub result: RgbImageF32,
    pub haze: RgbImageF32,
}

/// Work item for the depth-map estimator: a precomputed transmission map and
/// the artifact it was read from. The file name carries the ground truth.
#[derive(Clone, Debug)]
pub struct DepthMapTask {
    pub transmission: ImageF32,
    pub source: PathBuf,
}

/// Created by exactly one producer, consumed by exactly one consumer.
#[derive(Clone, Debug)]
pub enum Task {
    GridSearch(GridSearchTask),
    DepthMap(DepthMapTask),
}

/// Outcome of one estimation, appended once to the result queue.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EstimationResult {
    #[serde(rename_all = "camelCase")]
    Alpha {
        key: String,
        estimated_alpha: f64,
        ground_truth_alpha: f64,
    },
    #[serde(rename_all = "camelCase")]
    ErrorRate {
        source: String,
        estimated_alpha: f64,
        ground_truth_alpha: f64,
        error_rate: f64,
    },
}

impl EstimationResult {
    pub fn estimated_alpha(&self) -> f64 {
        match self {
            Self::Alpha {
                estimated_alpha, ..
            }
            | Self::ErrorRate {
                estimated_alpha, ..
            } => *estimated_alpha,
        }
    }

    pub fn ground_truth_alpha(&self) -> f64 {
        match self {
            Self::Alpha {
                ground_truth_alpha,
                ..
            }
            | Self::ErrorRate {
                ground_truth_alpha,
                ..
            } => *ground_truth_alpha,
        }
    }

    pub fn error_rate(&self) -> Option<f64> {
        match self {
            Self::ErrorRate { error_rate, .. } => Some(*error_rate),
            Self::Alpha { .. } => None,
        }
    }
}
