//! State shared by every worker of one pipeline run.
use crate::config::PipelineConfig;
use crate::depth::{ColorAttenuationDepth, DepthEstimator};
use crate::estimator::EstimationMode;
use crate::gate::StartGate;
use crate::image::io::{FsCodec, ImageCodec};
use crate::naming::{FilenameParser, UnderscoreNameParser};
use crate::queue::{TerminationBarrier, WorkQueue};
use crate::types::{EstimationResult, Task};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// External collaborators, shared read-only by producers and consumers.
#[derive(Clone)]
pub struct Collaborators {
    pub codec: Arc<dyn ImageCodec>,
    pub parser: Arc<dyn FilenameParser>,
    pub depth: Arc<dyn DepthEstimator>,
}

impl Collaborators {
    /// Filesystem codec, underscore file names and the color-attenuation
    /// prior, parameterized from `config`.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            codec: Arc::new(FsCodec),
            parser: Arc::new(UnderscoreNameParser::new(config.index_width)),
            depth: Arc::new(ColorAttenuationDepth::new(config.depth_map.depth_patch)),
        }
    }

    pub fn with_codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_depth(mut self, depth: Arc<dyn DepthEstimator>) -> Self {
        self.depth = depth;
        self
    }
}

/// Queues, termination barrier, start gate and lookup table of one run.
/// Built once by the pipeline and handed to every worker.
pub struct PipelineContext {
    pub mode: EstimationMode,
    pub inputs: WorkQueue<PathBuf>,
    pub tasks: WorkQueue<Task>,
    pub results: WorkQueue<EstimationResult>,
    pub barrier: TerminationBarrier,
    /// Present only for modes whose consumers wait for the first task.
    pub gate: Option<StartGate>,
    /// Index key -> haze image path (grid-search mode).
    pub haze_lookup: HashMap<String, PathBuf>,
    pub collaborators: Collaborators,
}

impl PipelineContext {
    pub fn new(
        mode: EstimationMode,
        producers: usize,
        haze_lookup: HashMap<String, PathBuf>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            mode,
            inputs: WorkQueue::new(),
            tasks: WorkQueue::new(),
            results: WorkQueue::new(),
            barrier: TerminationBarrier::new(producers),
            gate: mode.uses_start_gate().then(StartGate::new),
            haze_lookup,
            collaborators,
        }
    }

    /// Enqueue every input followed by the single input sentinel.
    pub fn enqueue_inputs(&self, inputs: impl IntoIterator<Item = PathBuf>) {
        for input in inputs {
            self.inputs.put(input);
        }
        self.inputs.put_sentinel();
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.open();
        }
    }

    pub fn wait_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.wait();
        }
    }
}
