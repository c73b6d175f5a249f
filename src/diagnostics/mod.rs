//! Serializable report of one pipeline run.
//!
//! `RunReport` is returned by [`Pipeline::run`](crate::Pipeline::run) and is
//! what the binary prints and optionally writes as JSON.

pub mod pipeline;
pub mod timing;

pub use pipeline::{AggregateSummary, RunReport};
pub use timing::{StageTiming, TimingBreakdown};
