use simplexwatch_compute::{
    CancellationChecker, FixedStarts, Himmelblau, Objective, StartPointGenerator, TryFnObjective,
};
use simplexwatch_core::{
    default_objective_config, ChannelCapacity, EvaluationError, OptimizerConfig, Point,
    RunFailure, WorkerId,
};
use simplexwatch_ui::{
    DisplaySurface, PlotSettings, PlotSurface, RenderLoop, RenderLoopConfig, RunSummary,
    SurfaceError, TraceWindow, WorkerInfo,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Records every call the render loop makes.
#[derive(Default)]
struct RecordingSurface {
    workers: Vec<WorkerInfo>,
    traces: HashMap<WorkerId, Vec<Vec<Point>>>,
    values: HashMap<WorkerId, Vec<Vec<f64>>>,
    refreshes: u32,
    finished: bool,
    fail_after: Option<u32>,
}

impl DisplaySurface for RecordingSurface {
    fn begin(&mut self, workers: &[WorkerInfo]) -> Result<(), SurfaceError> {
        self.workers = workers.to_vec();
        Ok(())
    }

    fn set_trace(&mut self, id: WorkerId, trace: &[Point]) -> Result<(), SurfaceError> {
        self.traces.entry(id).or_default().push(trace.to_vec());
        Ok(())
    }

    fn set_trace_values(&mut self, id: WorkerId, values: &[f64]) -> Result<(), SurfaceError> {
        self.values.entry(id).or_default().push(values.to_vec());
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), SurfaceError> {
        self.refreshes += 1;
        if self.fail_after.is_some_and(|n| self.refreshes >= n) {
            return Err(SurfaceError::Draw("display went away".into()));
        }
        Ok(())
    }

    fn finish(&mut self, _summary: &RunSummary) -> Result<(), SurfaceError> {
        self.finished = true;
        Ok(())
    }
}

fn fast(capacity: ChannelCapacity) -> RenderLoopConfig {
    RenderLoopConfig {
        poll_interval_ms: 10,
        capacity,
        trace_window: TraceWindow::Full,
    }
}

fn corners() -> Vec<Point> {
    FixedStarts::corners(3.0).generate(4)
}

#[test]
fn himmelblau_quadrant_runs_find_all_four_minima() {
    let mut render = RenderLoop::new(RecordingSurface::default(), fast(ChannelCapacity::Unbounded));
    let summary = render
        .run(Arc::new(Himmelblau), corners(), &OptimizerConfig::default())
        .unwrap();

    assert_eq!(summary.results.len(), 4);
    assert_eq!(summary.converged_count(), 4);
    assert!(!summary.has_failures());

    let minima = default_objective_config().known_minima();
    for (result, minimum) in summary.results.iter().zip(&minima) {
        assert!(result.final_point.max_abs_diff(minimum) < 1e-3, "{result:?}");
    }

    let surface = render.surface();
    assert!(surface.finished);
    assert_eq!(surface.workers.len(), 4);
    for result in &summary.results {
        let drawn = &surface.traces[&result.worker_id];
        // Every drawn trace extends the previous one.
        for pair in drawn.windows(2) {
            assert!(pair[1].len() > pair[0].len());
            assert_eq!(&pair[1][..pair[0].len()], &pair[0][..]);
        }
        assert_eq!(drawn.last().unwrap().last().unwrap(), &result.final_point);
    }
}

#[test]
fn failing_first_evaluation_is_isolated() {
    let objective: Arc<dyn Objective> = Arc::new(TryFnObjective::new("guarded", |x: &[f64]| {
        if x[0] < -10.0 {
            Err(EvaluationError::Failed("undefined left of the wall".into()))
        } else {
            Ok(x[0] * x[0] + x[1] * x[1])
        }
    }));
    let starts = vec![Point::xy(1.0, 1.0), Point::xy(-20.0, 0.0), Point::xy(-1.0, 2.0)];

    let mut render = RenderLoop::new(RecordingSurface::default(), fast(ChannelCapacity::Unbounded));
    let summary = render.run(objective, starts, &OptimizerConfig::default()).unwrap();

    assert_eq!(summary.failures().count(), 1);
    let failed = &summary.results[1];
    assert!(matches!(failed.failure(), Some(RunFailure::Evaluation(_))));
    assert_eq!(failed.updates_published, 0);
    assert!(summary.results[0].converged());
    assert!(summary.results[2].converged());

    let surface = render.into_surface();
    assert!(!surface.traces.contains_key(&WorkerId(1)));
    assert!(surface.finished);
}

#[test]
fn bounded_channel_delivers_every_update() {
    let mut render = RenderLoop::new(RecordingSurface::default(), fast(ChannelCapacity::Bounded(1)));
    let starts = vec![Point::xy(3.0, 3.0), Point::xy(-3.0, -3.0)];
    let summary = render
        .run(Arc::new(Himmelblau), starts, &OptimizerConfig::default())
        .unwrap();

    let published: u32 = summary.results.iter().map(|r| r.updates_published).sum();
    assert_eq!(summary.updates_received, published);
    assert_eq!(summary.updates_ignored, 0);
    assert_eq!(render.surface().refreshes, published);
}

#[test]
fn surface_failure_cancels_the_run() {
    let surface = RecordingSurface {
        fail_after: Some(3),
        ..Default::default()
    };
    // A bounded channel keeps workers blocked on publish when the loop stops.
    let mut render = RenderLoop::new(surface, fast(ChannelCapacity::Bounded(1)));
    let err = render
        .run(Arc::new(Himmelblau), corners(), &OptimizerConfig::default())
        .unwrap_err();

    assert!(err.to_string().contains("display went away"));
    assert!(!render.surface().finished);
    assert!(render.cancel_token().is_cancelled());
}

#[test]
fn simplex_window_hands_closed_polygons_to_the_surface() {
    let config = RenderLoopConfig {
        trace_window: TraceWindow::Simplex(3),
        ..fast(ChannelCapacity::Unbounded)
    };
    let mut render = RenderLoop::new(RecordingSurface::default(), config);
    render
        .run(
            Arc::new(Himmelblau),
            vec![Point::xy(3.0, 3.0)],
            &OptimizerConfig::default(),
        )
        .unwrap();

    let drawn = &render.surface().traces[&WorkerId(0)];
    let last = drawn.last().unwrap();
    assert_eq!(last.len(), 4);
    assert_eq!(last.first(), last.last());

    // Values are windowed the same way, point for point.
    let values = &render.surface().values[&WorkerId(0)];
    assert_eq!(values.len(), drawn.len());
    for (trace, values) in drawn.iter().zip(values) {
        assert_eq!(trace.len(), values.len());
    }
    let last_values = values.last().unwrap();
    assert_eq!(last_values.first(), last_values.last());
}

#[test]
fn values_match_the_objective_along_each_trace() {
    let mut render = RenderLoop::new(RecordingSurface::default(), fast(ChannelCapacity::Unbounded));
    render
        .run(Arc::new(Himmelblau), corners(), &OptimizerConfig::default())
        .unwrap();

    let surface = render.surface();
    for (id, traces) in &surface.traces {
        let trace = traces.last().unwrap();
        let values = surface.values[id].last().unwrap();
        assert_eq!(trace.len(), values.len());
        for (point, value) in trace.iter().zip(values) {
            assert_eq!(Himmelblau.evaluate(point).unwrap(), *value);
        }
        assert!(values.windows(2).all(|w| w[1] <= w[0]), "{id}: {values:?}");
    }
}

#[test]
fn plot_surface_writes_png_for_a_full_run() {
    let dir = tempfile::tempdir().unwrap();
    let settings = PlotSettings {
        width: 120,
        height: 120,
        labels: false,
        output: dir.path().join("himmelblau.png"),
        frames_dir: Some(dir.path().join("frames")),
        frame_every: 25,
        bounds: default_objective_config().default_bounds(),
        ..Default::default()
    };
    let surface = PlotSurface::new(&Himmelblau, settings)
        .unwrap()
        .with_minima(default_objective_config().known_minima());

    let mut render = RenderLoop::new(surface, fast(ChannelCapacity::Unbounded));
    let summary = render
        .run(Arc::new(Himmelblau), corners(), &OptimizerConfig::default())
        .unwrap();

    let image = std::fs::read(dir.path().join("himmelblau.png")).unwrap();
    assert_eq!(&image[1..4], b"PNG");
    let expected_frames = summary.updates_received / 25;
    assert_eq!(render.surface().frames_written(), expected_frames);
}
