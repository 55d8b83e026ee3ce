//! Standard test functions. Except for Booth, these accept any dimension.

use crate::Objective;
use simplexwatch_core::{EvaluationError, Point};
use std::f64::consts::TAU;

/// Generalized Rosenbrock valley, minimum 0 at (1, ..., 1).
#[derive(Clone, Copy, Debug, Default)]
pub struct Rosenbrock;

impl Objective for Rosenbrock {
    fn id(&self) -> &str {
        "rosenbrock"
    }

    fn evaluate(&self, point: &Point) -> Result<f64, EvaluationError> {
        let x = point.coords();
        Ok(x.windows(2)
            .map(|w| 100.0 * (w[1] - w[0] * w[0]).powi(2) + (1.0 - w[0]).powi(2))
            .sum())
    }
}

/// Sum of squares, minimum 0 at the origin.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sphere;

impl Objective for Sphere {
    fn id(&self) -> &str {
        "sphere"
    }

    fn evaluate(&self, point: &Point) -> Result<f64, EvaluationError> {
        Ok(point.coords().iter().map(|c| c * c).sum())
    }
}

/// Booth's function, minimum 0 at (1, 3).
#[derive(Clone, Copy, Debug, Default)]
pub struct Booth;

impl Objective for Booth {
    fn id(&self) -> &str {
        "booth"
    }

    fn dimension(&self) -> Option<usize> {
        Some(2)
    }

    fn evaluate(&self, point: &Point) -> Result<f64, EvaluationError> {
        let (x, y) = (point[0], point[1]);
        Ok((x + 2.0 * y - 7.0).powi(2) + (2.0 * x + y - 5.0).powi(2))
    }
}

/// Rastrigin's function. Highly multimodal; local searches stall in the
/// nearest basin.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rastrigin;

impl Objective for Rastrigin {
    fn id(&self) -> &str {
        "rastrigin"
    }

    fn evaluate(&self, point: &Point) -> Result<f64, EvaluationError> {
        let x = point.coords();
        Ok(10.0 * x.len() as f64
            + x.iter().map(|c| c * c - 10.0 * (TAU * c).cos()).sum::<f64>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rosenbrock_minimum_any_dimension() {
        assert_eq!(Rosenbrock.evaluate(&Point::xy(1.0, 1.0)).unwrap(), 0.0);
        let p = Point::new(vec![1.0; 5]);
        assert_eq!(Rosenbrock.evaluate(&p).unwrap(), 0.0);
        assert_eq!(Rosenbrock.evaluate(&Point::xy(0.0, 0.0)).unwrap(), 1.0);
    }

    #[test]
    fn sphere_is_squared_norm() {
        assert_eq!(Sphere.evaluate(&Point::new(vec![1.0, 2.0, 2.0])).unwrap(), 9.0);
    }

    #[test]
    fn booth_minimum() {
        assert_eq!(Booth.evaluate(&Point::xy(1.0, 3.0)).unwrap(), 0.0);
    }

    #[test]
    fn rastrigin_origin_is_zero() {
        let value = Rastrigin.evaluate(&Point::xy(0.0, 0.0)).unwrap();
        assert!(value.abs() < 1e-12);
        assert!(Rastrigin.evaluate(&Point::xy(0.5, 0.5)).unwrap() > 30.0);
    }
}
