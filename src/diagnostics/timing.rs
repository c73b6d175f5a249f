use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Wall-clock duration of one stage of a pipeline run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

impl StageTiming {
    pub fn new(label: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            label: label.into(),
            elapsed_ms,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn push(&mut self, label: impl Into<String>, elapsed_ms: f64) {
        self.stages.push(StageTiming::new(label, elapsed_ms));
    }

    /// Run `f`, record its duration under `label` and pass its output through.
    pub fn measure<T>(&mut self, label: impl Into<String>, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.push(label, elapsed_ms(start));
        out
    }

    pub fn stage_ms(&self, label: &str) -> Option<f64> {
        self.stages
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.elapsed_ms)
    }
}

pub fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_records_stage_and_returns_value() {
        let mut timing = TimingBreakdown::default();
        let v = timing.measure("enumerate", || 7);
        assert_eq!(v, 7);
        assert!(timing.stage_ms("enumerate").unwrap() >= 0.0);
        assert!(timing.stage_ms("workers").is_none());
    }
}
