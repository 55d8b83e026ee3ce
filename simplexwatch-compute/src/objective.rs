//! Objective evaluators.
//!
//! An objective maps a point to a scalar cost. Implementations must be pure:
//! workers share one instance through `Arc<dyn Objective>` and call it
//! concurrently without locking.

use simplexwatch_core::{EvaluationError, Point};

pub trait Objective: Send + Sync {
    /// Registry id, or a descriptive name for ad-hoc objectives.
    fn id(&self) -> &str {
        "custom"
    }

    /// Required point dimension, if the objective is not dimension-agnostic.
    fn dimension(&self) -> Option<usize> {
        None
    }

    /// Raw evaluation. May return any `f64`; use [`Objective::evaluate_checked`]
    /// when non-finite values must be treated as failures.
    fn evaluate(&self, point: &Point) -> Result<f64, EvaluationError>;

    /// Evaluate, rejecting dimension mismatches and non-finite results.
    fn evaluate_checked(&self, point: &Point) -> Result<f64, EvaluationError> {
        if let Some(expected) = self.dimension() {
            if point.dim() != expected {
                return Err(EvaluationError::DimensionMismatch {
                    expected,
                    actual: point.dim(),
                });
            }
        }
        let value = self.evaluate(point)?;
        if !value.is_finite() {
            return Err(EvaluationError::NonFinite { value });
        }
        Ok(value)
    }
}

impl<O: Objective + ?Sized> Objective for std::sync::Arc<O> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn dimension(&self) -> Option<usize> {
        (**self).dimension()
    }

    fn evaluate(&self, point: &Point) -> Result<f64, EvaluationError> {
        (**self).evaluate(point)
    }
}

/// Objective backed by an infallible closure over the coordinates.
pub struct FnObjective<F> {
    name: String,
    dimension: Option<usize>,
    f: F,
}

impl<F> FnObjective<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            dimension: None,
            f,
        }
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }
}

impl<F> Objective for FnObjective<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn id(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn evaluate(&self, point: &Point) -> Result<f64, EvaluationError> {
        Ok((self.f)(point.coords()))
    }
}

/// Objective backed by a closure that can fail.
pub struct TryFnObjective<F> {
    name: String,
    f: F,
}

impl<F> TryFnObjective<F>
where
    F: Fn(&[f64]) -> Result<f64, EvaluationError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Objective for TryFnObjective<F>
where
    F: Fn(&[f64]) -> Result<f64, EvaluationError> + Send + Sync,
{
    fn id(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, point: &Point) -> Result<f64, EvaluationError> {
        (self.f)(point.coords())
    }
}

/// Turns a maximization problem into a minimization by negating the inner
/// objective.
pub struct Maximize<O>(pub O);

impl<O: Objective> Objective for Maximize<O> {
    fn id(&self) -> &str {
        self.0.id()
    }

    fn dimension(&self) -> Option<usize> {
        self.0.dimension()
    }

    fn evaluate(&self, point: &Point) -> Result<f64, EvaluationError> {
        self.0.evaluate(point).map(|v| -v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_objective_evaluates_closure() {
        let objective = FnObjective::new("sum", |x: &[f64]| x.iter().sum());
        assert_eq!(objective.id(), "sum");
        assert_eq!(objective.evaluate_checked(&Point::xy(1.0, 2.5)).unwrap(), 3.5);
    }

    #[test]
    fn non_finite_value_is_an_error() {
        let objective = FnObjective::new("nan", |_: &[f64]| f64::NAN);
        assert!(objective.evaluate(&Point::xy(0.0, 0.0)).unwrap().is_nan());
        assert!(matches!(
            objective.evaluate_checked(&Point::xy(0.0, 0.0)),
            Err(EvaluationError::NonFinite { .. })
        ));
    }

    #[test]
    fn dimension_mismatch_is_checked_before_evaluation() {
        let objective =
            FnObjective::new("first", |x: &[f64]| x[0]).with_dimension(3);
        let err = objective.evaluate_checked(&Point::xy(1.0, 2.0)).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn try_fn_objective_propagates_errors() {
        let objective = TryFnObjective::new("guarded", |x: &[f64]| {
            if x[0] < 0.0 {
                Err(EvaluationError::Failed("negative x".into()))
            } else {
                Ok(x[0].sqrt())
            }
        });
        assert_eq!(objective.evaluate_checked(&Point::xy(4.0, 0.0)).unwrap(), 2.0);
        assert!(objective.evaluate_checked(&Point::xy(-1.0, 0.0)).is_err());
    }

    #[test]
    fn maximize_negates() {
        let objective = Maximize(FnObjective::new("id", |x: &[f64]| x[0]));
        assert_eq!(objective.evaluate(&Point::xy(2.0, 0.0)).unwrap(), -2.0);
    }

    #[test]
    fn maximize_wraps_shared_objectives() {
        let shared: std::sync::Arc<dyn Objective> =
            std::sync::Arc::new(FnObjective::new("id", |x: &[f64]| x[0]).with_dimension(2));
        let objective = Maximize(shared);
        assert_eq!(objective.id(), "id");
        assert_eq!(objective.dimension(), Some(2));
        assert_eq!(objective.evaluate(&Point::xy(3.0, 0.0)).unwrap(), -3.0);
    }
}
