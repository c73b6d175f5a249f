//! Result aggregation after every worker has joined.
use crate::diagnostics::{AggregateSummary, RunReport};
use crate::estimator::EstimationMode;
use crate::queue::WorkQueue;
use crate::types::EstimationResult;

/// Take everything currently on the result queue, in arrival order.
pub fn drain_results(queue: &WorkQueue<EstimationResult>) -> Vec<EstimationResult> {
    queue.drain()
}

/// Arithmetic mean of the error rates, in percent.
pub fn mean_error_percent(results: &[EstimationResult]) -> Option<f64> {
    let rates: Vec<f64> = results.iter().filter_map(EstimationResult::error_rate).collect();
    if rates.is_empty() {
        return None;
    }
    Some(rates.iter().sum::<f64>() / rates.len() as f64 * 100.0)
}

pub fn summarize(results: &[EstimationResult]) -> AggregateSummary {
    AggregateSummary {
        count: results.len(),
        mean_error_percent: mean_error_percent(results),
    }
}

/// Lines the binary prints for a finished run.
pub fn render_report(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();
    match report.mode {
        EstimationMode::GridSearch => {
            for r in &report.results {
                lines.push(format!(
                    "Estimate alpha: {:.3} Groundtruth: {}",
                    r.estimated_alpha(),
                    r.ground_truth_alpha()
                ));
            }
        }
        _ => match report.summary.mean_error_percent {
            Some(mean) => lines.push(format!(" Error rate: {mean:.5}%")),
            None => lines.push(" Error rate: n/a (no results)".to_string()),
        },
    }
    lines.push(format!(
        "{} result(s) from {} input(s), {} producer(s) / {} consumer(s), {:.3} ms",
        report.summary.count,
        report.inputs,
        report.producers,
        report.consumers,
        report.timings.total_ms
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(r: f64) -> EstimationResult {
        EstimationResult::ErrorRate {
            source: "t".into(),
            estimated_alpha: 0.0,
            ground_truth_alpha: 1.0,
            error_rate: r,
        }
    }

    #[test]
    fn mean_is_reported_in_percent() {
        let results = [rate(0.1), rate(0.3)];
        let mean = mean_error_percent(&results).unwrap();
        assert!((mean - 20.0).abs() < 1e-9);
        assert_eq!(summarize(&results).count, 2);
    }

    #[test]
    fn alpha_pairs_carry_no_error_rate() {
        let results = [EstimationResult::Alpha {
            key: "0001".into(),
            estimated_alpha: 0.7,
            ground_truth_alpha: 0.8,
        }];
        assert_eq!(mean_error_percent(&results), None);
        assert_eq!(mean_error_percent(&[]), None);
    }

    #[test]
    fn drain_empties_the_queue() {
        let q = WorkQueue::new();
        q.put(rate(0.5));
        q.put(rate(0.25));
        assert_eq!(drain_results(&q).len(), 2);
        assert!(q.is_empty());
    }
}
