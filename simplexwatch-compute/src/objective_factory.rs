use crate::objectives::{Booth, Himmelblau, Rastrigin, Rosenbrock, Sphere};
use crate::Objective;
use std::sync::Arc;

/// Create a built-in objective by registry id.
pub fn create_objective(objective_id: &str) -> Option<Arc<dyn Objective>> {
    match objective_id {
        "himmelblau" => Some(Arc::new(Himmelblau)),
        "rosenbrock" => Some(Arc::new(Rosenbrock)),
        "sphere" => Some(Arc::new(Sphere)),
        "booth" => Some(Arc::new(Booth)),
        "rastrigin" => Some(Arc::new(Rastrigin)),
        _ => None,
    }
}
