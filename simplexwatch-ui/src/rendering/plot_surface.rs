//! PNG output through plotters: one colored trace per worker over either a
//! contour background or a 3D terrain, optionally dumped as numbered frames
//! while running.

use super::color::trace_color;
use super::contours::{ContourCell, ContourSettings, ObjectiveField, TerrainQuad};
use crate::{DisplaySurface, RunSummary, SurfaceError, WorkerInfo};
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use simplexwatch_compute::Objective;
use simplexwatch_core::{ConfigError, PlotBounds, Point, WorkerId};
use std::collections::BTreeMap;
use std::path::{Path as FsPath, PathBuf};

/// How the landscape is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotView {
    /// Top-down contour bands.
    #[default]
    Contour,
    /// Perspective surface with traces lifted to their objective values.
    Terrain,
}

/// Grid cells per axis for the terrain mesh; the contour resolution is
/// capped to this.
const TERRAIN_RESOLUTION: u32 = 48;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    pub view: PlotView,
    pub width: u32,
    pub height: u32,
    pub bounds: PlotBounds,
    pub contours: ContourSettings,
    /// Caption, axes and legend. Needs a system font.
    pub labels: bool,
    pub caption: String,
    /// Final image, written when the run finishes.
    pub output: PathBuf,
    /// Directory for intermediate frames; none are written when unset.
    pub frames_dir: Option<PathBuf>,
    /// Write a frame every this many refreshes.
    pub frame_every: u32,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            view: PlotView::Contour,
            width: 800,
            height: 800,
            bounds: PlotBounds::default(),
            contours: ContourSettings::default(),
            labels: true,
            caption: String::new(),
            output: PathBuf::from("simplexwatch.png"),
            frames_dir: None,
            frame_every: 1,
        }
    }
}

impl PlotSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 16 || self.height < 16 {
            return Err(ConfigError::out_of_range(
                "plot size",
                "at least 16x16",
                format!("{}x{}", self.width, self.height),
            ));
        }
        if self.frame_every == 0 {
            return Err(ConfigError::out_of_range("frame_every", ">= 1", 0));
        }
        let is_png = self
            .output
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if !is_png {
            return Err(ConfigError::out_of_range(
                "output",
                "a .png file",
                self.output.display(),
            ));
        }
        self.bounds.validate()?;
        self.contours.validate()
    }
}

pub struct PlotSurface {
    settings: PlotSettings,
    background: Vec<ContourCell>,
    /// Sampled only for the terrain view.
    terrain: Option<(ObjectiveField, Vec<TerrainQuad>)>,
    minima: Vec<Point>,
    workers: Vec<WorkerInfo>,
    traces: BTreeMap<WorkerId, Vec<Point>>,
    values: BTreeMap<WorkerId, Vec<f64>>,
    refreshes: u64,
    frames_written: u32,
}

impl PlotSurface {
    /// Samples the objective once for the background.
    pub fn new(objective: &dyn Objective, settings: PlotSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let (background, terrain) = match settings.view {
            PlotView::Contour => {
                let resolution = settings.contours.resolution;
                let field = ObjectiveField::sample(objective, settings.bounds, resolution, resolution);
                let background = field.cells(&settings.contours);
                log::debug!(
                    "Sampled {} background cells for {} (range {:?})",
                    background.len(),
                    objective.id(),
                    field.range()
                );
                (background, None)
            }
            PlotView::Terrain => {
                let resolution = settings.contours.resolution.min(TERRAIN_RESOLUTION);
                let field = ObjectiveField::sample(objective, settings.bounds, resolution, resolution);
                let quads = field.terrain(&settings.contours);
                log::debug!(
                    "Sampled {} terrain quads for {} (range {:?})",
                    quads.len(),
                    objective.id(),
                    field.range()
                );
                (Vec::new(), Some((field, quads)))
            }
        };
        Ok(Self {
            settings,
            background,
            terrain,
            minima: Vec::new(),
            workers: Vec::new(),
            traces: BTreeMap::new(),
            values: BTreeMap::new(),
            refreshes: 0,
            frames_written: 0,
        })
    }

    /// Mark these points, typically the objective's known minima.
    pub fn with_minima(mut self, minima: Vec<Point>) -> Self {
        self.minima = minima;
        self
    }

    pub fn frames_written(&self) -> u32 {
        self.frames_written
    }

    pub fn settings(&self) -> &PlotSettings {
        &self.settings
    }

    fn write_image(&mut self, target: &FsPath, summary: Option<&RunSummary>) -> Result<(), SurfaceError> {
        if !self.settings.labels {
            return self.render(target, false, summary);
        }
        match self.render(target, true, summary) {
            Ok(()) => Ok(()),
            Err(e) => {
                log::warn!("Drawing labels failed ({e}); continuing without labels");
                self.settings.labels = false;
                self.render(target, false, summary)
            }
        }
    }

    fn caption(&self, summary: Option<&RunSummary>) -> String {
        match summary {
            Some(s) => format!(
                "{} ({} of {} converged)",
                self.settings.caption,
                s.converged_count(),
                s.results.len()
            ),
            None => self.settings.caption.clone(),
        }
    }

    fn render(&self, target: &FsPath, labels: bool, summary: Option<&RunSummary>) -> Result<(), SurfaceError> {
        match &self.terrain {
            Some((field, quads)) => self.render_terrain(field, quads, target, labels, summary),
            None => self.render_contour(target, labels, summary),
        }
    }

    fn render_contour(&self, target: &FsPath, labels: bool, summary: Option<&RunSummary>) -> Result<(), SurfaceError> {
        let root = BitMapBackend::new(target, (self.settings.width, self.settings.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(draw_error)?;

        let bounds = self.settings.bounds;
        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if labels {
            builder
                .caption(self.caption(summary), ("sans-serif", 20))
                .x_label_area_size(30)
                .y_label_area_size(40);
        }
        let mut chart = builder
            .build_cartesian_2d(bounds.x_min..bounds.x_max, bounds.y_min..bounds.y_max)
            .map_err(draw_error)?;

        if labels {
            chart
                .configure_mesh()
                .disable_mesh()
                .x_desc("x")
                .y_desc("y")
                .draw()
                .map_err(draw_error)?;
        }

        chart
            .draw_series(self.background.iter().map(|cell| {
                let [r, g, b] = cell.color;
                Rectangle::new([cell.top_left, cell.bottom_right], RGBColor(r, g, b).filled())
            }))
            .map_err(draw_error)?;
        chart
            .draw_series(
                self.minima
                    .iter()
                    .map(|m| Cross::new((m.x(), m.y()), 5, WHITE.stroke_width(2))),
            )
            .map_err(draw_error)?;

        for (index, worker) in self.workers.iter().enumerate() {
            let [r, g, b] = trace_color(index);
            let color = RGBColor(r, g, b);
            let trace = self.traces.get(&worker.id).map(Vec::as_slice).unwrap_or(&[]);

            let series = chart
                .draw_series(LineSeries::new(
                    trace.iter().map(|p| (p.x(), p.y())),
                    color.stroke_width(2),
                ))
                .map_err(draw_error)?;
            if labels {
                series
                    .label(worker.label.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }

            chart
                .draw_series(std::iter::once(Circle::new(
                    (worker.start.x(), worker.start.y()),
                    4,
                    color.filled(),
                )))
                .map_err(draw_error)?;
            if let Some(best) = trace.last() {
                chart
                    .draw_series(std::iter::once(Cross::new(
                        (best.x(), best.y()),
                        7,
                        color.stroke_width(3),
                    )))
                    .map_err(draw_error)?;
            }
        }

        if labels && !self.workers.is_empty() {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(draw_error)?;
        }

        root.present().map_err(draw_error)?;
        Ok(())
    }

    /// Landscape in perspective; each trace point sits at its objective
    /// value on the same relative scale as the mesh.
    fn render_terrain(
        &self,
        field: &ObjectiveField,
        quads: &[TerrainQuad],
        target: &FsPath,
        labels: bool,
        summary: Option<&RunSummary>,
    ) -> Result<(), SurfaceError> {
        let root = BitMapBackend::new(target, (self.settings.width, self.settings.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(draw_error)?;

        let bounds = self.settings.bounds;
        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if labels {
            builder.caption(self.caption(summary), ("sans-serif", 20));
        }
        let mut chart = builder
            .build_cartesian_3d(bounds.x_min..bounds.x_max, 0.0..1.0, bounds.y_min..bounds.y_max)
            .map_err(draw_error)?;
        chart.with_projection(|mut pb| {
            pb.yaw = 0.6;
            pb.pitch = 0.45;
            pb.scale = 0.8;
            pb.into_matrix()
        });

        if labels {
            chart.configure_axes().draw().map_err(draw_error)?;
        }

        chart
            .draw_series(quads.iter().map(|quad| {
                let [r, g, b] = quad.color;
                Polygon::new(quad.corners.to_vec(), RGBColor(r, g, b).mix(0.85).filled())
            }))
            .map_err(draw_error)?;

        let log_scale = self.settings.contours.log_scale;
        for (index, worker) in self.workers.iter().enumerate() {
            let [r, g, b] = trace_color(index);
            let color = RGBColor(r, g, b);
            let trace = self.traces.get(&worker.id).map(Vec::as_slice).unwrap_or(&[]);
            let values = self.values.get(&worker.id).map(Vec::as_slice).unwrap_or(&[]);
            let lifted: Vec<(f64, f64, f64)> = trace
                .iter()
                .zip(values)
                .map(|(p, &v)| (p.x(), field.relative_height(v, log_scale).unwrap_or(0.0), p.y()))
                .collect();

            let series = chart
                .draw_series(LineSeries::new(lifted.iter().copied(), color.stroke_width(2)))
                .map_err(draw_error)?;
            if labels {
                series
                    .label(worker.label.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }
            if let Some(&best) = lifted.last() {
                chart
                    .draw_series(std::iter::once(Circle::new(best, 4, color.filled())))
                    .map_err(draw_error)?;
            }
        }

        if labels && !self.workers.is_empty() {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(draw_error)?;
        }

        root.present().map_err(draw_error)?;
        Ok(())
    }
}

fn draw_error<E: std::fmt::Display>(e: E) -> SurfaceError {
    SurfaceError::Draw(e.to_string())
}

impl DisplaySurface for PlotSurface {
    fn begin(&mut self, workers: &[WorkerInfo]) -> Result<(), SurfaceError> {
        self.workers = workers.to_vec();
        self.traces.clear();
        self.values.clear();
        if let Some(dir) = &self.settings.frames_dir {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    fn set_trace(&mut self, id: WorkerId, trace: &[Point]) -> Result<(), SurfaceError> {
        self.traces.insert(id, trace.to_vec());
        Ok(())
    }

    fn set_trace_values(&mut self, id: WorkerId, values: &[f64]) -> Result<(), SurfaceError> {
        self.values.insert(id, values.to_vec());
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), SurfaceError> {
        self.refreshes += 1;
        let Some(dir) = self.settings.frames_dir.clone() else {
            return Ok(());
        };
        if self.refreshes % self.settings.frame_every as u64 != 0 {
            return Ok(());
        }
        let frame = dir.join(format!("frame_{:05}.png", self.frames_written));
        self.write_image(&frame, None)?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self, summary: &RunSummary) -> Result<(), SurfaceError> {
        let output = self.settings.output.clone();
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.write_image(&output, Some(summary))?;
        log::info!(
            "Wrote {} ({} frames)",
            output.display(),
            self.frames_written
        );
        Ok(())
    }
}
