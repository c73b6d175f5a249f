//! Atmospheric-light ("alpha") estimation over batches of haze images.
//!
//! A run enumerates inputs for one [`EstimationMode`], turns them into tasks
//! on a producer pool, estimates alpha on a consumer pool and aggregates the
//! drained results into a [`RunReport`].

// Public modules (stable-ish surface)
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod estimator;
pub mod image;
pub mod pipeline;
pub mod types;

// Worker plumbing and numeric building blocks.
pub mod aggregate;
pub mod consumer;
pub mod context;
pub mod depth;
pub mod gate;
pub mod guided;
pub mod inputs;
pub mod naming;
pub mod producer;
pub mod queue;

// --- High-level re-exports -------------------------------------------------

pub use crate::config::{load_config, PipelineConfig};
pub use crate::context::Collaborators;
pub use crate::error::{PipelineError, Result};
pub use crate::estimator::{EstimationMode, Estimator};
pub use crate::pipeline::Pipeline;
pub use crate::types::{EstimationResult, Task};

pub use crate::diagnostics::{AggregateSummary, RunReport};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use alpha_estimator::prelude::*;
///
/// # fn main() -> Result<()> {
/// let config = PipelineConfig {
///     mode: EstimationMode::DepthMap,
///     ..Default::default()
/// };
/// let report = Pipeline::new(config)?.with_workers(4, 4).run()?;
/// println!("results={} mean={:?}", report.results.len(), report.summary.mean_error_percent);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::{
        EstimationMode, EstimationResult, Pipeline, PipelineConfig, PipelineError, Result,
        RunReport,
    };
}
