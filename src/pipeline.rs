//! Producer/consumer pipeline runner.
//!
//! `Pipeline::run` enumerates the inputs for the configured mode, starts the
//! producer and consumer pools on named threads, joins them and aggregates the
//! result queue into a [`RunReport`].
//!
//! Termination follows the sentinel protocol in [`crate::queue`]. Each
//! producer leaves exactly one task sentinel; a consumer retires by dropping
//! one sentinel once every producer is known to have finished. When there are
//! more consumers than producers the runner adds relays after the producers
//! have joined, so every consumer finds one to retire on. A producer that
//! could not be spawned is accounted for with a sentinel of its own.
use crate::aggregate::{drain_results, summarize};
use crate::config::PipelineConfig;
use crate::consumer::run_consumer;
use crate::context::{Collaborators, PipelineContext};
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{RunReport, TimingBreakdown};
use crate::error::{PipelineError, Result};
use crate::estimator::{build_estimator, EstimationMode, Estimator};
use crate::inputs::{enumerate_grid_search_inputs, enumerate_transmission_inputs};
use crate::producer::run_producer;
use log::{info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

type Worker = (String, JoinHandle<Result<()>>);

pub struct Pipeline {
    config: PipelineConfig,
    collaborators: Collaborators,
    estimator: Arc<dyn Estimator>,
    producers: usize,
    consumers: usize,
}

impl Pipeline {
    /// Pipeline with the filesystem collaborators derived from `config`.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let collaborators = Collaborators::from_config(&config);
        Self::with_collaborators(config, collaborators)
    }

    /// Fails with [`PipelineError::NotImplemented`] when the configured mode
    /// has no estimator.
    pub fn with_collaborators(config: PipelineConfig, collaborators: Collaborators) -> Result<Self> {
        let estimator = build_estimator(&config, &collaborators)?;
        let workers = config.worker_count();
        Ok(Self {
            config,
            collaborators,
            estimator,
            producers: workers,
            consumers: workers,
        })
    }

    /// Override the pool sizes. Zero is raised to one.
    pub fn with_workers(mut self, producers: usize, consumers: usize) -> Self {
        self.producers = producers.max(1);
        self.consumers = consumers.max(1);
        self
    }

    pub fn mode(&self) -> EstimationMode {
        self.config.mode
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Enumerate the configured folders and run the pools over them.
    pub fn run(&self) -> Result<RunReport> {
        let start = Instant::now();
        let mut timings = TimingBreakdown::default();
        let (inputs, haze_lookup) = timings.measure("enumerate", || self.enumerate())?;
        self.execute(inputs, haze_lookup, timings, start)
    }

    /// Run the pools over already enumerated inputs. `haze_lookup` maps index
    /// keys to haze images and is only consulted in grid-search mode.
    pub fn run_with_inputs(
        &self,
        inputs: Vec<PathBuf>,
        haze_lookup: HashMap<String, PathBuf>,
    ) -> Result<RunReport> {
        self.execute(inputs, haze_lookup, TimingBreakdown::default(), Instant::now())
    }

    fn enumerate(&self) -> Result<(Vec<PathBuf>, HashMap<String, PathBuf>)> {
        match self.config.mode {
            EstimationMode::GridSearch => {
                let found = enumerate_grid_search_inputs(
                    &self.config.haze_dir,
                    &self.config.result_dir,
                    self.collaborators.parser.as_ref(),
                )?;
                Ok((found.results, found.haze_lookup))
            }
            EstimationMode::DepthMap => Ok((
                enumerate_transmission_inputs(&self.config.transmission_dir)?,
                HashMap::new(),
            )),
            other => Err(PipelineError::NotImplemented(other)),
        }
    }

    fn execute(
        &self,
        inputs: Vec<PathBuf>,
        haze_lookup: HashMap<String, PathBuf>,
        mut timings: TimingBreakdown,
        start: Instant,
    ) -> Result<RunReport> {
        let mode = self.config.mode;
        let input_count = inputs.len();
        let ctx = Arc::new(PipelineContext::new(
            mode,
            self.producers,
            haze_lookup,
            self.collaborators.clone(),
        ));
        ctx.enqueue_inputs(inputs);
        info!(
            "{mode:?}: {input_count} input(s), {} producer(s), {} consumer(s)",
            self.producers, self.consumers
        );

        let workers_start = Instant::now();
        let mut first_error: Option<PipelineError> = None;

        let mut producers: Vec<Worker> = Vec::with_capacity(self.producers);
        for id in 0..self.producers {
            let worker_ctx = Arc::clone(&ctx);
            match spawn(format!("producer-{id}"), move || run_producer(id, &worker_ctx)) {
                Ok(worker) => producers.push(worker),
                Err(err) => {
                    first_error.get_or_insert(err);
                    break;
                }
            }
        }

        let mut consumers: Vec<Worker> = Vec::with_capacity(self.consumers);
        for id in 0..self.consumers {
            let worker_ctx = Arc::clone(&ctx);
            let estimator = Arc::clone(&self.estimator);
            match spawn(format!("consumer-{id}"), move || {
                run_consumer(id, &worker_ctx, estimator.as_ref())
            }) {
                Ok(worker) => consumers.push(worker),
                Err(err) => {
                    first_error.get_or_insert(err);
                    break;
                }
            }
        }

        for _ in producers.len()..self.producers {
            ctx.tasks.put_sentinel();
        }
        join_all(producers, &mut first_error);
        // Gated consumers must not outlive a run in which nothing was produced.
        ctx.open_gate();
        for _ in self.producers..consumers.len() {
            ctx.tasks.put_relay();
        }
        join_all(consumers, &mut first_error);
        timings.push("workers", elapsed_ms(workers_start));

        if let Some(err) = first_error {
            return Err(err);
        }

        let results = timings.measure("aggregate", || drain_results(&ctx.results));
        let summary = summarize(&results);
        timings.total_ms = elapsed_ms(start);
        Ok(RunReport {
            mode,
            producers: self.producers,
            consumers: self.consumers,
            inputs: input_count,
            timings,
            results,
            summary,
        })
    }
}

fn spawn<F>(name: String, f: F) -> Result<Worker>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(f)
        .map(|handle| (name.clone(), handle))
        .map_err(|source| PipelineError::Spawn { name, source })
}

fn join_all(workers: Vec<Worker>, first_error: &mut Option<PipelineError>) {
    for (name, handle) in workers {
        let outcome = handle
            .join()
            .unwrap_or_else(|_| Err(PipelineError::WorkerPanicked(name.clone())));
        if let Err(err) = outcome {
            warn!("{name} failed: {err}");
            first_error.get_or_insert(err);
        }
    }
}
