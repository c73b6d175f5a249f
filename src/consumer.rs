//! Consumer pool: drain tasks through an estimator.
use crate::context::PipelineContext;
use crate::error::Result;
use crate::estimator::Estimator;
use crate::queue::{SentinelAction, Slot};
use log::{debug, error, info};

/// Drain the task queue until this consumer retires on a sentinel.
///
/// A failing estimation aborts this consumer only; the remaining consumers
/// keep draining and still retire through the barrier.
pub fn run_consumer(id: usize, ctx: &PipelineContext, estimator: &dyn Estimator) -> Result<()> {
    ctx.wait_gate();
    info!("consumer {id} started");
    let mut processed = 0usize;
    loop {
        let action = match ctx.tasks.get() {
            Slot::End => ctx.barrier.observe_end(),
            Slot::Relay => ctx.barrier.observe_relay(),
            Slot::Item(task) => {
                let result = estimator.estimate(task).map_err(|err| {
                    error!("consumer {id} aborted: {err}");
                    err
                })?;
                ctx.results.put(result);
                processed += 1;
                continue;
            }
        };
        match action {
            SentinelAction::Forward => ctx.tasks.put_relay(),
            SentinelAction::Park => debug!("consumer {id} parked a relay"),
            SentinelAction::Retire { release } => {
                for _ in 0..release {
                    ctx.tasks.put_relay();
                }
                break;
            }
        }
    }
    info!("consumer {id} finished after {processed} task(s)");
    Ok(())
}
