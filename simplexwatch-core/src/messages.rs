use crate::{EvaluationError, Path, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifies one optimization run. Routes updates to the right trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub u32);

impl WorkerId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of a worker's path, sent from worker to render loop.
///
/// The snapshot is a copy; the worker keeps appending to its own path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathUpdate {
    pub worker_id: WorkerId,
    pub path: Path,
}

impl PathUpdate {
    pub fn new(worker_id: WorkerId, path: Path) -> Self {
        Self { worker_id, path }
    }
}

/// Why a run ended without a usable result.
#[derive(Clone, Debug, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum RunFailure {
    #[error("evaluation failed: {0}")]
    Evaluation(EvaluationError),

    #[error("published after the path channel was closed")]
    ChannelClosed,

    #[error("worker panicked: {0}")]
    Panicked(String),
}

/// Terminal state of one worker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RunStatus {
    /// Both tolerances satisfied.
    Converged,
    /// Stopped at `max_iterations` before the tolerances were met.
    IterationLimit,
    /// Stopped by the cooperative cancellation flag.
    Cancelled,
    /// Aborted; other workers are unaffected.
    Failed { failure: RunFailure },
}

impl RunStatus {
    pub fn failed(failure: RunFailure) -> Self {
        Self::Failed { failure }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Converged => "converged",
            Self::IterationLimit => "iteration limit",
            Self::Cancelled => "cancelled",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Result of one worker's search, produced exactly once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub worker_id: WorkerId,
    pub start: Point,
    /// Best point found. Equals the last point of the last published path,
    /// or the start when nothing was published.
    pub final_point: Point,
    /// None when any vertex of the initial simplex could not be evaluated.
    pub final_value: Option<f64>,
    pub iterations: u32,
    pub evaluations: u32,
    pub updates_published: u32,
    pub elapsed_ms: f64,
    pub status: RunStatus,
}

impl RunResult {
    pub fn converged(&self) -> bool {
        matches!(self.status, RunStatus::Converged)
    }

    pub fn failure(&self) -> Option<&RunFailure> {
        match &self.status {
            RunStatus::Failed { failure } => Some(failure),
            _ => None,
        }
    }
}
