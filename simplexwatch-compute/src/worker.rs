//! One optimization trajectory.
//!
//! The worker owns its path exclusively and publishes a copy after every
//! iteration, so nothing it shares with other threads is ever mutated.

use crate::{CancellationChecker, NelderMead, Objective, PathSender};
use simplexwatch_core::{
    ChannelError, OptimizerConfig, Path, PathUpdate, Point, RunFailure, RunResult, RunStatus,
    WorkerId,
};
use std::time::Instant;

/// Run Nelder-Mead from `start` until convergence, the iteration limit,
/// cancellation, or failure.
///
/// Publishes `[start]` once the initial simplex evaluates, then one snapshot
/// per iteration. Never publishes after returning. Evaluation errors and a
/// closed channel end this run only; they are reported in the result status.
pub fn run_worker<C: CancellationChecker>(
    objective: &dyn Objective,
    start: Point,
    id: WorkerId,
    channel: &PathSender,
    config: &OptimizerConfig,
    cancel: &C,
) -> RunResult {
    let started = Instant::now();
    let mut simplex = NelderMead::new(objective, &start, config);

    log::debug!("Worker {id} starting at {:?}", start.coords());

    let start_value = match simplex.initialize() {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Worker {id} failed evaluating initial simplex: {e}");
            return RunResult {
                worker_id: id,
                final_point: start.clone(),
                start,
                final_value: None,
                iterations: 0,
                evaluations: simplex.evaluations(),
                updates_published: 0,
                elapsed_ms: elapsed_ms(started),
                status: RunStatus::failed(RunFailure::Evaluation(e)),
            };
        }
    };

    let mut path = Path::new();
    let mut published = 0u32;
    let mut iterations = 0u32;

    // A point joins the path only once a snapshot containing it is out.
    let mut extend = |path: &mut Path, point: Point, value: f64| -> Result<(), ChannelError> {
        let mut snapshot = path.clone();
        snapshot.push(point.clone(), value);
        channel.publish(PathUpdate::new(id, snapshot))?;
        path.push(point, value);
        published += 1;
        Ok(())
    };
    let closed = |e: ChannelError| {
        log::warn!("Worker {id}: {e}");
        RunStatus::failed(RunFailure::ChannelClosed)
    };

    let mut status = extend(&mut path, start.clone(), start_value).err().map(closed);

    while status.is_none() {
        if simplex.has_converged(config.x_tolerance, config.f_tolerance) {
            status = Some(RunStatus::Converged);
            break;
        }
        if iterations >= config.max_iterations {
            status = Some(RunStatus::IterationLimit);
            break;
        }
        if cancel.is_cancelled() {
            status = Some(RunStatus::Cancelled);
            break;
        }

        match simplex.step() {
            Ok(kind) => {
                iterations += 1;
                let (best, value) = simplex.best();
                log::trace!("Worker {id} iteration {iterations}: {kind:?}, f = {value:e}");
                status = extend(&mut path, best.clone(), value).err().map(closed);
            }
            Err(e) => {
                log::warn!("Worker {id} aborted at iteration {iterations}: {e}");
                status = Some(RunStatus::failed(RunFailure::Evaluation(e)));
            }
        }
    }
    let mut status = status.unwrap_or(RunStatus::IterationLimit);

    // Without any iteration the best vertex may differ from the start.
    if !status.is_failed() {
        let (best, value) = simplex.best();
        if path.last().map(|(p, _)| p) != Some(best) {
            if let Err(e) = extend(&mut path, best.clone(), value) {
                status = closed(e);
            }
        }
    }

    let (final_point, final_value) = match path.last() {
        Some((point, value)) => (point.clone(), Some(value)),
        None => (start.clone(), Some(start_value)),
    };

    let result = RunResult {
        worker_id: id,
        start,
        final_point,
        final_value,
        iterations,
        evaluations: simplex.evaluations(),
        updates_published: published,
        elapsed_ms: elapsed_ms(started),
        status,
    };

    log::info!(
        "Worker {id} {} after {} iterations ({} evaluations): f({:?}) = {:?}",
        result.status.label(),
        result.iterations,
        result.evaluations,
        result.final_point.coords(),
        result.final_value
    );

    result
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objectives::{Himmelblau, Sphere};
    use crate::{path_channel, CancelToken, NeverCancel, TryFnObjective};
    use simplexwatch_core::{ChannelCapacity, EvaluationError};
    use std::time::Duration;

    fn drain(rx: &crate::PathReceiver) -> Vec<PathUpdate> {
        let mut updates = Vec::new();
        while let Some(u) = rx.try_take(Duration::from_millis(1)) {
            updates.push(u);
        }
        updates
    }

    #[test]
    fn converged_run_publishes_growing_prefixes() {
        let (tx, rx) = path_channel(ChannelCapacity::Unbounded);
        let config = OptimizerConfig::default();
        let result = run_worker(&Sphere, Point::xy(2.0, 1.0), WorkerId(0), &tx, &config, &NeverCancel);

        assert!(result.converged());
        let updates = drain(&rx);
        assert_eq!(updates.len() as u32, result.updates_published);
        assert_eq!(updates[0].path.points(), &[Point::xy(2.0, 1.0)]);
        for pair in updates.windows(2) {
            assert_eq!(pair[1].path.len(), pair[0].path.len() + 1);
            assert!(pair[0].path.is_prefix_of(&pair[1].path));
        }
        let last = updates.last().unwrap();
        assert_eq!(last.path.last().unwrap().0, &result.final_point);
    }

    #[test]
    fn iteration_limit_is_respected() {
        let (tx, rx) = path_channel(ChannelCapacity::Unbounded);
        let config = OptimizerConfig {
            max_iterations: 5,
            ..Default::default()
        };
        let result = run_worker(&Himmelblau, Point::xy(-3.0, -3.0), WorkerId(1), &tx, &config, &NeverCancel);

        assert_eq!(result.status, RunStatus::IterationLimit);
        assert_eq!(result.iterations, 5);
        assert_eq!(drain(&rx).len(), 6);
    }

    #[test]
    fn zero_iterations_still_reports_best_vertex_as_last_point() {
        let (tx, rx) = path_channel(ChannelCapacity::Unbounded);
        let config = OptimizerConfig {
            max_iterations: 0,
            ..Default::default()
        };
        // The perturbed vertex (2.1, 2.0) is better than the start.
        let objective = TryFnObjective::new("neg-x", |x: &[f64]| Ok(-x[0]));
        let result = run_worker(&objective, Point::xy(2.0, 2.0), WorkerId(0), &tx, &config, &NeverCancel);

        let updates = drain(&rx);
        assert_eq!(updates.len(), 2);
        assert_eq!(result.final_point, Point::xy(2.1, 2.0));
        assert_eq!(updates[1].path.last().unwrap().0, &result.final_point);
    }

    #[test]
    fn failure_on_first_evaluation_publishes_nothing() {
        let (tx, rx) = path_channel(ChannelCapacity::Unbounded);
        let objective = TryFnObjective::new("broken", |_: &[f64]| {
            Err(EvaluationError::Failed("no data".into()))
        });
        let result = run_worker(
            &objective,
            Point::xy(1.0, 1.0),
            WorkerId(3),
            &tx,
            &OptimizerConfig::default(),
            &NeverCancel,
        );

        assert!(result.status.is_failed());
        assert_eq!(result.final_point, Point::xy(1.0, 1.0));
        assert_eq!(result.final_value, None);
        assert_eq!(result.evaluations, 1);
        assert_eq!(result.updates_published, 0);
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn failing_perturbed_vertex_leaves_no_final_value() {
        let (tx, rx) = path_channel(ChannelCapacity::Unbounded);
        // Only the start column is defined.
        let objective = TryFnObjective::new("column", |x: &[f64]| {
            if x[0] == 2.0 {
                Ok(x[1])
            } else {
                Err(EvaluationError::Failed("off the column".into()))
            }
        });
        let result = run_worker(
            &objective,
            Point::xy(2.0, 2.0),
            WorkerId(0),
            &tx,
            &OptimizerConfig::default(),
            &NeverCancel,
        );

        assert!(matches!(result.failure(), Some(RunFailure::Evaluation(_))));
        assert_eq!(result.evaluations, 2);
        assert_eq!(result.final_point, Point::xy(2.0, 2.0));
        assert_eq!(result.final_value, None);
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn non_finite_midway_keeps_last_valid_point() {
        let (tx, rx) = path_channel(ChannelCapacity::Unbounded);
        // Finite in a band around the start; the search walks out of it.
        let objective = TryFnObjective::new("cliff", |x: &[f64]| {
            Ok(if x[0] < 4.0 { -x[0] } else { f64::NAN })
        });
        let result = run_worker(
            &objective,
            Point::xy(3.0, 0.5),
            WorkerId(0),
            &tx,
            &OptimizerConfig::default(),
            &NeverCancel,
        );

        assert!(matches!(
            result.failure(),
            Some(RunFailure::Evaluation(EvaluationError::NonFinite { .. }))
        ));
        let updates = drain(&rx);
        assert_eq!(updates.len() as u32, result.updates_published);
        assert_eq!(updates.last().unwrap().path.last().unwrap().0, &result.final_point);
        assert!(result.final_point.x() < 4.0);
    }

    #[test]
    fn cancelled_before_first_iteration() {
        let (tx, _rx) = path_channel(ChannelCapacity::Unbounded);
        let token = CancelToken::new();
        token.cancel();
        let result = run_worker(
            &Himmelblau,
            Point::xy(3.0, 3.0),
            WorkerId(0),
            &tx,
            &OptimizerConfig::default(),
            &token,
        );
        assert_eq!(result.status, RunStatus::Cancelled);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn final_point_closed_out_by_consumer_fails_the_run() {
        let (tx, rx) = path_channel(ChannelCapacity::Bounded(1));
        let config = OptimizerConfig {
            max_iterations: 0,
            ..Default::default()
        };
        let objective = TryFnObjective::new("neg-x", |x: &[f64]| Ok(-x[0]));

        // `[start]` fills the buffer, so the best-vertex snapshot cannot
        // go out before the receiver is dropped.
        let worker = std::thread::spawn(move || {
            run_worker(&objective, Point::xy(2.0, 2.0), WorkerId(0), &tx, &config, &NeverCancel)
        });
        while rx.is_empty() {
            std::thread::sleep(Duration::from_millis(1));
        }
        drop(rx);
        let result = worker.join().unwrap();

        assert_eq!(result.failure(), Some(&RunFailure::ChannelClosed));
        assert_eq!(result.updates_published, 1);
        assert_eq!(result.final_point, Point::xy(2.0, 2.0));
        assert_eq!(result.final_value, Some(-2.0));
    }

    #[test]
    fn closed_channel_fails_the_run() {
        let (tx, rx) = path_channel(ChannelCapacity::Unbounded);
        drop(rx);
        let result = run_worker(
            &Himmelblau,
            Point::xy(3.0, 3.0),
            WorkerId(0),
            &tx,
            &OptimizerConfig::default(),
            &NeverCancel,
        );
        assert_eq!(result.failure(), Some(&RunFailure::ChannelClosed));
        assert_eq!(result.updates_published, 0);
    }
}
