//! Spawns one worker thread per start point and mirrors their paths onto a
//! display surface until every worker has finished and the channel is empty.

use crate::{DisplaySurface, RenderProgress, RunSummary, SurfaceError, TraceWindow, WorkerInfo};
use serde::{Deserialize, Serialize};
use simplexwatch_compute::{
    path_channel, run_worker, CancelToken, Objective, PathReceiver, PathSender,
};
use simplexwatch_core::{
    ChannelCapacity, ConfigError, OptimizerConfig, Path, PathUpdate, Point, RunFailure, RunResult,
    RunStatus, WorkerId,
};
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(std::io::Error),

    #[error("display surface failed: {0}")]
    Surface(#[from] SurfaceError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderLoopConfig {
    /// How long one poll waits for an update before checking the workers.
    pub poll_interval_ms: u64,
    pub capacity: ChannelCapacity,
    pub trace_window: TraceWindow,
}

impl Default for RenderLoopConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            capacity: ChannelCapacity::Unbounded,
            trace_window: TraceWindow::Full,
        }
    }
}

impl RenderLoopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::out_of_range(
                "poll_interval_ms",
                ">= 1",
                self.poll_interval_ms,
            ));
        }
        self.capacity.validate()?;
        self.trace_window.validate()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

struct SpawnedWorker {
    id: WorkerId,
    start: Point,
    handle: JoinHandle<RunResult>,
}

pub struct RenderLoop<S: DisplaySurface> {
    surface: S,
    config: RenderLoopConfig,
    cancel: CancelToken,
    traces: BTreeMap<WorkerId, Path>,
    progress: RenderProgress,
    updates_ignored: u32,
    maximized: bool,
}

impl<S: DisplaySurface> RenderLoop<S> {
    pub fn new(surface: S, config: RenderLoopConfig) -> Self {
        Self {
            surface,
            config,
            cancel: CancelToken::new(),
            traces: BTreeMap::new(),
            progress: RenderProgress::default(),
            updates_ignored: 0,
            maximized: false,
        }
    }

    /// Mark summaries as coming from a negated objective.
    pub fn with_maximized(mut self, maximized: bool) -> Self {
        self.maximized = maximized;
        self
    }

    /// Handle for stopping all workers early, e.g. from a signal handler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn progress(&self) -> &RenderProgress {
        &self.progress
    }

    /// Latest path received from each worker.
    pub fn traces(&self) -> &BTreeMap<WorkerId, Path> {
        &self.traces
    }

    /// Run one worker per start point to completion.
    ///
    /// Individual worker failures are reported in the summary. An error is
    /// returned only for invalid configuration, a failed thread spawn or a
    /// failing surface; in the latter two cases the remaining workers are
    /// cancelled and joined before returning.
    pub fn run(
        &mut self,
        objective: Arc<dyn Objective>,
        starts: Vec<Point>,
        optimizer: &OptimizerConfig,
    ) -> Result<RunSummary, RenderError> {
        self.config.validate()?;
        optimizer.validate()?;
        validate_starts(&starts)?;

        let started = Instant::now();
        self.traces.clear();
        self.updates_ignored = 0;
        self.progress = RenderProgress::new(starts.len() as u32, optimizer.max_iterations);

        let (sender, receiver) = path_channel(self.config.capacity);
        let mut workers = Vec::with_capacity(starts.len());
        if let Err(e) = self.spawn_workers(&objective, starts, optimizer, sender, &mut workers) {
            log::error!("Could not spawn worker {}: {e}", workers.len());
            self.abort(receiver, workers);
            return Err(RenderError::Spawn(e));
        }

        log::info!(
            "Started {} workers on {} (poll {} ms, {:?} channel)",
            workers.len(),
            objective.id(),
            self.config.poll_interval_ms,
            self.config.capacity
        );

        let infos: Vec<WorkerInfo> = workers
            .iter()
            .map(|w| WorkerInfo::new(w.id, w.start.clone()))
            .collect();

        if let Err(e) = self.surface.begin(&infos).map_err(RenderError::from) {
            self.abort(receiver, workers);
            return Err(e);
        }
        if let Err(e) = self.poll_until_done(&receiver, &workers, started) {
            self.abort(receiver, workers);
            return Err(e);
        }

        let results: Vec<RunResult> = workers.into_iter().map(join_worker).collect();
        for result in results.iter().filter(|r| r.status.is_failed()) {
            if let Some(failure) = result.failure() {
                log::warn!("Worker {} failed: {failure}", result.worker_id);
            }
        }

        self.progress.finished_workers = results.len() as u32;
        self.progress.elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.progress.is_complete = true;
        self.surface.progress(&self.progress);

        let summary = RunSummary {
            objective: objective.id().to_string(),
            maximized: self.maximized,
            results,
            updates_received: self.progress.updates_received,
            updates_ignored: self.updates_ignored,
            elapsed_ms: self.progress.elapsed_ms,
        };
        self.surface.finish(&summary)?;
        Ok(summary)
    }

    fn spawn_workers(
        &self,
        objective: &Arc<dyn Objective>,
        starts: Vec<Point>,
        optimizer: &OptimizerConfig,
        sender: PathSender,
        workers: &mut Vec<SpawnedWorker>,
    ) -> std::io::Result<()> {
        for (index, start) in starts.into_iter().enumerate() {
            let id = WorkerId(index as u32);
            let objective = Arc::clone(objective);
            let worker_sender = sender.clone();
            let cancel = self.cancel.clone();
            let config = *optimizer;
            let worker_start = start.clone();

            let handle = thread::Builder::new()
                .name(format!("simplex-worker-{index}"))
                .spawn(move || {
                    run_worker(
                        objective.as_ref(),
                        worker_start,
                        id,
                        &worker_sender,
                        &config,
                        &cancel,
                    )
                })?;
            workers.push(SpawnedWorker { id, start, handle });
        }
        Ok(())
    }

    fn poll_until_done(
        &mut self,
        receiver: &PathReceiver,
        workers: &[SpawnedWorker],
        started: Instant,
    ) -> Result<(), RenderError> {
        let poll = self.config.poll_interval();
        // Checking liveness before emptiness: once every worker has
        // returned, all of their updates are already queued.
        while workers.iter().any(|w| !w.handle.is_finished()) || !receiver.is_empty() {
            if let Some(update) = receiver.try_take(poll) {
                self.apply(update)?;
                self.progress.elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                self.progress.finished_workers =
                    workers.iter().filter(|w| w.handle.is_finished()).count() as u32;
                self.surface.progress(&self.progress);
            }
        }
        Ok(())
    }

    fn apply(&mut self, update: PathUpdate) -> Result<(), SurfaceError> {
        let id = update.worker_id;
        if let Some(current) = self.traces.get(&id) {
            if update.path.len() <= current.len() {
                log::warn!(
                    "Ignoring stale update for worker {id}: length {} after {}",
                    update.path.len(),
                    current.len()
                );
                self.updates_ignored += 1;
                return Ok(());
            }
        }

        let window = self.config.trace_window;
        self.surface.set_trace(id, &window.apply(update.path.points()))?;
        self.surface.set_trace_values(id, &window.apply(update.path.values()))?;
        self.surface.refresh()?;

        self.traces.insert(id, update.path);
        self.progress.updates_received += 1;
        self.progress.completed_steps = self
            .traces
            .values()
            .map(|p| p.len().saturating_sub(1) as u32)
            .sum();
        Ok(())
    }

    /// Stop every worker after a loop failure. Dropping the receiver
    /// unblocks workers waiting on a full bounded channel.
    fn abort(&mut self, receiver: PathReceiver, workers: Vec<SpawnedWorker>) {
        log::warn!("Cancelling {} workers", workers.len());
        self.cancel.cancel();
        drop(receiver);
        for worker in workers {
            join_worker(worker);
        }
    }
}

fn validate_starts(starts: &[Point]) -> Result<(), ConfigError> {
    let first = starts.first().ok_or(ConfigError::NoStartPoints)?;
    let expected = first.dim();
    if expected == 0 {
        return Err(ConfigError::StartDimension {
            index: 0,
            expected: 1,
            actual: 0,
        });
    }
    for (index, start) in starts.iter().enumerate() {
        if start.dim() != expected {
            return Err(ConfigError::StartDimension {
                index,
                expected,
                actual: start.dim(),
            });
        }
        if !start.is_finite() {
            return Err(ConfigError::out_of_range(
                "start point",
                "finite",
                format!("{:?}", start.coords()),
            ));
        }
    }
    Ok(())
}

fn join_worker(worker: SpawnedWorker) -> RunResult {
    let SpawnedWorker { id, start, handle } = worker;
    match handle.join() {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::error!("Worker {id} panicked: {message}");
            RunResult {
                worker_id: id,
                final_point: start.clone(),
                start,
                final_value: None,
                iterations: 0,
                evaluations: 0,
                updates_published: 0,
                elapsed_ms: 0.0,
                status: RunStatus::failed(RunFailure::Panicked(message)),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
