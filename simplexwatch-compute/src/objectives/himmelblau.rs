use crate::Objective;
use simplexwatch_core::{EvaluationError, Point};

/// Himmelblau's function: four minima of value 0, one per quadrant.
#[derive(Clone, Copy, Debug, Default)]
pub struct Himmelblau;

impl Himmelblau {
    pub fn value(x: f64, y: f64) -> f64 {
        (x * x + y - 11.0).powi(2) + (x + y * y - 7.0).powi(2)
    }
}

impl Objective for Himmelblau {
    fn id(&self) -> &str {
        "himmelblau"
    }

    fn dimension(&self) -> Option<usize> {
        Some(2)
    }

    fn evaluate(&self, point: &Point) -> Result<f64, EvaluationError> {
        Ok(Self::value(point[0], point[1]))
    }
}
