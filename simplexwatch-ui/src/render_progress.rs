/// Progress of a multi-worker run as seen by the render loop.
///
/// Steps are iterations; the total is the iteration budget of all workers,
/// so runs that converge early finish below 100% until marked complete.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderProgress {
    pub completed_steps: u32,
    pub total_steps: u32,
    pub updates_received: u32,
    pub finished_workers: u32,
    pub total_workers: u32,
    pub elapsed_ms: f64,
    pub is_complete: bool,
}

impl RenderProgress {
    pub fn new(total_workers: u32, max_iterations: u32) -> Self {
        Self {
            total_steps: total_workers.saturating_mul(max_iterations),
            total_workers,
            ..Default::default()
        }
    }

    /// Completion percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f32 {
        if self.is_complete {
            100.0
        } else if self.total_steps == 0 {
            0.0
        } else {
            (self.completed_steps as f32 / self.total_steps as f32 * 100.0).min(100.0)
        }
    }
}
