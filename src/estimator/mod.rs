//! Estimation strategies applied by the consumer pool.
//!
//! The mode is a closed enum chosen by the caller; [`build_estimator`] is the
//! single dispatch point and rejects modes that have no estimator.
pub mod depth_map;
pub mod grid_search;

pub use self::depth_map::{
    error_rate, select_atmospheric_light, AtmosphericLight, DepthMapEstimator, DepthMapOptions,
    TransmissionSource,
};
pub use self::grid_search::{find_best_alpha, transmission_loss, GridSearchEstimator, GridSearchOptions};

use crate::config::PipelineConfig;
use crate::context::Collaborators;
use crate::error::{PipelineError, Result};
use crate::types::{EstimationResult, Task};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMode {
    /// Brute-force alpha search over haze/result pairs.
    GridSearch,
    /// Depth-guided priority selection over transmission artifacts.
    DepthMap,
    CloseZeroTransmission,
    CloseChannelHistogram,
    TransmissionHistogram,
    DehazeWithTransmission,
    LowTransmissionCloseChannels,
}

impl EstimationMode {
    pub fn is_implemented(self) -> bool {
        matches!(self, Self::GridSearch | Self::DepthMap)
    }

    /// Grid-search consumers hold until the first task has been produced.
    pub fn uses_start_gate(self) -> bool {
        self == Self::GridSearch
    }

    pub fn ensure_implemented(self) -> Result<Self> {
        if self.is_implemented() {
            Ok(self)
        } else {
            Err(PipelineError::NotImplemented(self))
        }
    }
}

/// One estimation algorithm. Each task is processed sequentially by the
/// consumer thread that dequeued it.
pub trait Estimator: Send + Sync {
    fn mode(&self) -> EstimationMode;

    fn estimate(&self, task: Task) -> Result<EstimationResult>;
}

/// Build the estimator for `config.mode`, failing fast on modes without one
/// and on invalid options.
pub fn build_estimator(
    config: &PipelineConfig,
    collaborators: &Collaborators,
) -> Result<Arc<dyn Estimator>> {
    let mode = config.mode.ensure_implemented()?;
    config.validate()?;
    match mode {
        EstimationMode::GridSearch => Ok(Arc::new(GridSearchEstimator::new(config.grid_search))),
        EstimationMode::DepthMap => Ok(Arc::new(DepthMapEstimator::new(
            config.depth_map,
            config.haze_dir.clone(),
            config.haze_extension.clone(),
            Arc::clone(&collaborators.codec),
            Arc::clone(&collaborators.parser),
            Arc::clone(&collaborators.depth),
        ))),
        other => Err(PipelineError::NotImplemented(other)),
    }
}
