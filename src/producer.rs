//! Producer pool: turn enumerated inputs into tasks.
use crate::context::PipelineContext;
use crate::error::{PipelineError, Result};
use crate::estimator::EstimationMode;
use crate::image::io::load_rgb_normalized;
use crate::image::ImageView;
use crate::inputs::ImageRecord;
use crate::queue::Slot;
use crate::types::{DepthMapTask, GridSearchTask, Task};
use log::{debug, error, info};
use std::path::Path;

/// Pushes the producer's task sentinel and opens the start gate when the
/// producer leaves its loop, whether it finished, failed or panicked.
struct ProducerExit<'a> {
    ctx: &'a PipelineContext,
}

impl Drop for ProducerExit<'_> {
    fn drop(&mut self) {
        self.ctx.tasks.put_sentinel();
        self.ctx.open_gate();
    }
}

/// Drain the input queue until the sentinel. The first failing input aborts
/// this producer; its siblings keep going.
pub fn run_producer(id: usize, ctx: &PipelineContext) -> Result<()> {
    let _exit = ProducerExit { ctx };
    info!("producer {id} started");
    let mut emitted = 0usize;
    loop {
        match ctx.inputs.get() {
            Slot::End | Slot::Relay => {
                ctx.inputs.put_sentinel();
                break;
            }
            Slot::Item(path) => {
                let task = produce_task(ctx, &path).map_err(|err| {
                    error!("producer {id} aborted on {}: {err}", path.display());
                    err
                })?;
                ctx.tasks.put(task);
                emitted += 1;
                if emitted == 1 {
                    ctx.open_gate();
                }
            }
        }
    }
    info!("producer {id} finished after {emitted} task(s)");
    Ok(())
}

pub fn produce_task(ctx: &PipelineContext, input: &Path) -> Result<Task> {
    match ctx.mode {
        EstimationMode::GridSearch => grid_search_task(ctx, input).map(Task::GridSearch),
        EstimationMode::DepthMap => depth_map_task(ctx, input).map(Task::DepthMap),
        other => Err(PipelineError::NotImplemented(other)),
    }
}

fn load_record(ctx: &PipelineContext, path: &Path, key: String) -> Result<ImageRecord> {
    let tensor = load_rgb_normalized(ctx.collaborators.codec.as_ref(), path)?;
    Ok(ImageRecord {
        path: path.to_path_buf(),
        key,
        tensor,
    })
}

/// Pair a dehazed result with its haze image and ground truth.
fn grid_search_task(ctx: &PipelineContext, result_path: &Path) -> Result<GridSearchTask> {
    let parser = ctx.collaborators.parser.as_ref();
    let key = parser.index_key(result_path)?;
    let haze_path = ctx
        .haze_lookup
        .get(&key)
        .ok_or_else(|| PipelineError::MissingIndexKey(key.clone()))?;
    let ground_truth = parser.parse(haze_path)?.alpha;

    let result = load_record(ctx, result_path, key.clone())?;
    let haze = load_record(ctx, haze_path, key)?;
    if result.tensor.shape() != haze.tensor.shape() {
        return Err(PipelineError::ShapeMismatch {
            expected: haze.tensor.shape(),
            actual: result.tensor.shape(),
        });
    }
    debug!(
        "task {}: {} + {}",
        haze.key,
        result.path.display(),
        haze.path.display()
    );
    Ok(GridSearchTask {
        key: haze.key,
        ground_truth,
        result: result.tensor,
        haze: haze.tensor,
    })
}

fn depth_map_task(ctx: &PipelineContext, artifact: &Path) -> Result<DepthMapTask> {
    let transmission = ctx.collaborators.codec.decode_map(artifact)?;
    Ok(DepthMapTask {
        transmission,
        source: artifact.to_path_buf(),
    })
}
