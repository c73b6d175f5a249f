use super::TimingBreakdown;
use crate::estimator::EstimationMode;
use crate::types::EstimationResult;
use serde::Serialize;

/// Scalar summary of the drained result queue.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub count: usize,
    /// Mean relative error in percent; `None` for modes that do not report
    /// an error rate or when nothing was estimated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_error_percent: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub mode: EstimationMode,
    pub producers: usize,
    pub consumers: usize,
    pub inputs: usize,
    pub timings: TimingBreakdown,
    /// In arrival order, which is not input order.
    pub results: Vec<EstimationResult>,
    pub summary: AggregateSummary,
}
