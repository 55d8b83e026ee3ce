//! Display surfaces driven by the render loop.
//!
//! A surface is only ever touched from the render loop's thread, so
//! implementations keep plain mutable state with no locking.

use crate::{RenderProgress, RunSummary};
use simplexwatch_core::{Point, WorkerId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("drawing failed: {0}")]
    Draw(String),
}

/// What a surface needs to know about each worker before traces arrive.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerInfo {
    pub id: WorkerId,
    pub start: Point,
    pub label: String,
}

impl WorkerInfo {
    pub fn new(id: WorkerId, start: Point) -> Self {
        Self {
            label: format!("Simplex {}", id.0 + 1),
            id,
            start,
        }
    }
}

pub trait DisplaySurface {
    /// Called once, after workers are spawned and before any trace.
    fn begin(&mut self, workers: &[WorkerInfo]) -> Result<(), SurfaceError> {
        let _ = workers;
        Ok(())
    }

    /// Replace the visible trace of one worker.
    fn set_trace(&mut self, id: WorkerId, trace: &[Point]) -> Result<(), SurfaceError>;

    /// Objective values for the trace last given to `set_trace`, point for
    /// point. Surfaces that only draw coordinates ignore them.
    fn set_trace_values(&mut self, id: WorkerId, values: &[f64]) -> Result<(), SurfaceError> {
        let _ = (id, values);
        Ok(())
    }

    /// Redraw after one or more `set_trace` calls.
    fn refresh(&mut self) -> Result<(), SurfaceError>;

    /// Latest progress numbers; surfaces may show them on the next refresh.
    fn progress(&mut self, progress: &RenderProgress) {
        let _ = progress;
    }

    /// Final state, including every worker's result.
    fn finish(&mut self, summary: &RunSummary) -> Result<(), SurfaceError> {
        let _ = summary;
        Ok(())
    }
}

impl<S: DisplaySurface + ?Sized> DisplaySurface for Box<S> {
    fn begin(&mut self, workers: &[WorkerInfo]) -> Result<(), SurfaceError> {
        (**self).begin(workers)
    }

    fn set_trace(&mut self, id: WorkerId, trace: &[Point]) -> Result<(), SurfaceError> {
        (**self).set_trace(id, trace)
    }

    fn set_trace_values(&mut self, id: WorkerId, values: &[f64]) -> Result<(), SurfaceError> {
        (**self).set_trace_values(id, values)
    }

    fn refresh(&mut self) -> Result<(), SurfaceError> {
        (**self).refresh()
    }

    fn progress(&mut self, progress: &RenderProgress) {
        (**self).progress(progress)
    }

    fn finish(&mut self, summary: &RunSummary) -> Result<(), SurfaceError> {
        (**self).finish(summary)
    }
}

/// Surface without output; traces are only logged.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    refreshes: u64,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }
}

impl DisplaySurface for HeadlessSurface {
    fn set_trace(&mut self, id: WorkerId, trace: &[Point]) -> Result<(), SurfaceError> {
        if let Some(last) = trace.last() {
            log::trace!("Worker {id} trace length {} at {:?}", trace.len(), last.coords());
        }
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), SurfaceError> {
        self.refreshes += 1;
        Ok(())
    }

    fn finish(&mut self, summary: &RunSummary) -> Result<(), SurfaceError> {
        log::info!("Run finished after {} refreshes\n{}", self.refreshes, summary.report());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_labels_are_one_based() {
        let info = WorkerInfo::new(WorkerId(0), Point::xy(3.0, 3.0));
        assert_eq!(info.label, "Simplex 1");
    }

    #[test]
    fn boxed_surface_forwards_calls() {
        let mut surface: Box<dyn DisplaySurface> = Box::new(HeadlessSurface::new());
        surface.set_trace(WorkerId(0), &[Point::xy(0.0, 0.0)]).unwrap();
        surface.refresh().unwrap();
        surface.refresh().unwrap();
    }

    #[test]
    fn headless_counts_refreshes() {
        let mut surface = HeadlessSurface::new();
        surface.refresh().unwrap();
        assert_eq!(surface.refreshes(), 1);
    }
}
