//! Character-grid rendering for terminals and logs.

use super::contours::{ContourSettings, ObjectiveField};
use crate::{DisplaySurface, RenderProgress, RunSummary, SurfaceError, WorkerInfo};
use serde::{Deserialize, Serialize};
use simplexwatch_compute::Objective;
use simplexwatch_core::{ConfigError, PlotBounds, Point, WorkerId};
use std::collections::BTreeMap;
use std::io::Write;

/// Background shading from low to high objective values.
const SHADES: [char; 8] = [' ', '.', ',', ':', ';', '-', '=', '+'];
const BEST_MARK: char = '@';

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalSettings {
    pub columns: u32,
    pub rows: u32,
    pub bounds: PlotBounds,
    /// Clear the screen before each frame.
    pub ansi: bool,
    /// Draw a frame every this many refreshes.
    pub redraw_every: u32,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            columns: 72,
            rows: 32,
            bounds: PlotBounds::default(),
            ansi: true,
            redraw_every: 1,
        }
    }
}

impl TerminalSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns < 8 || self.rows < 4 {
            return Err(ConfigError::out_of_range(
                "terminal size",
                "at least 8x4",
                format!("{}x{}", self.columns, self.rows),
            ));
        }
        if self.redraw_every == 0 {
            return Err(ConfigError::out_of_range("redraw_every", ">= 1", 0));
        }
        self.bounds.validate()
    }
}

pub struct TerminalSurface<W: Write> {
    out: W,
    settings: TerminalSettings,
    background: Vec<Vec<char>>,
    workers: Vec<WorkerInfo>,
    traces: BTreeMap<WorkerId, Vec<Point>>,
    progress: RenderProgress,
    refreshes: u64,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(objective: &dyn Objective, settings: TerminalSettings, out: W) -> Result<Self, ConfigError> {
        settings.validate()?;
        let field = ObjectiveField::sample(objective, settings.bounds, settings.columns, settings.rows);
        let contours = ContourSettings::default();
        let background = (0..settings.rows)
            .map(|row| {
                (0..settings.columns)
                    .map(|column| {
                        field
                            .band(column, row, SHADES.len(), contours.log_scale)
                            .map_or(' ', |band| SHADES[band])
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            out,
            settings,
            background,
            workers: Vec::new(),
            traces: BTreeMap::new(),
            progress: RenderProgress::default(),
            refreshes: 0,
        })
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    fn cell(&self, point: &Point) -> Option<(usize, usize)> {
        if !self.settings.bounds.contains(point) {
            return None;
        }
        let (columns, rows) = (self.settings.columns, self.settings.rows);
        let (x, y) = self.settings.bounds.to_pixel(point, columns, rows);
        let column = (x.floor() as i64).clamp(0, columns as i64 - 1) as usize;
        let row = (y.floor() as i64).clamp(0, rows as i64 - 1) as usize;
        Some((column, row))
    }

    /// The current frame as text, without screen control codes.
    pub fn frame(&self) -> String {
        let mut grid = self.background.clone();

        for (index, worker) in self.workers.iter().enumerate() {
            let mark = worker_mark(index);
            let Some(trace) = self.traces.get(&worker.id) else {
                continue;
            };
            let cells: Vec<(usize, usize)> = trace.iter().filter_map(|p| self.cell(p)).collect();
            for pair in cells.windows(2) {
                for (column, row) in line_cells(pair[0], pair[1]) {
                    grid[row][column] = mark;
                }
            }
            if let Some(&(column, row)) = cells.last() {
                grid[row][column] = BEST_MARK;
            }
        }

        let mut text = String::with_capacity(grid.len() * (grid[0].len() + 3));
        let border = format!("+{}+\n", "-".repeat(self.settings.columns as usize));
        text.push_str(&border);
        for line in &grid {
            text.push('|');
            text.extend(line.iter());
            text.push_str("|\n");
        }
        text.push_str(&border);

        for (index, worker) in self.workers.iter().enumerate() {
            let trace = self.traces.get(&worker.id);
            let length = trace.map_or(0, Vec::len);
            let best = trace
                .and_then(|t| t.last())
                .map_or_else(|| "-".to_string(), |p| format!("({:.4}, {:.4})", p.x(), p.y()));
            text.push_str(&format!(
                "{} {}: {} points, best {}\n",
                worker_mark(index),
                worker.label,
                length,
                best
            ));
        }
        text.push_str(&format!(
            "{:.0}% {} updates, {}/{} workers finished\n",
            self.progress.percentage(),
            self.progress.updates_received,
            self.progress.finished_workers,
            self.progress.total_workers
        ));
        text
    }

    fn draw(&mut self) -> Result<(), SurfaceError> {
        let frame = self.frame();
        if self.settings.ansi {
            write!(self.out, "\x1b[H\x1b[2J")?;
        }
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

fn worker_mark(index: usize) -> char {
    char::from_digit((index % 9) as u32 + 1, 10).unwrap_or('*')
}

/// Grid cells on the straight segment from `a` to `b`, both ends included.
fn line_cells(a: (usize, usize), b: (usize, usize)) -> Vec<(usize, usize)> {
    let (dx, dy) = (b.0 as f64 - a.0 as f64, b.1 as f64 - a.1 as f64);
    let steps = dx.abs().max(dy.abs()).max(1.0) as usize;
    (0..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            (
                (a.0 as f64 + t * dx).round() as usize,
                (a.1 as f64 + t * dy).round() as usize,
            )
        })
        .collect()
}

impl<W: Write> DisplaySurface for TerminalSurface<W> {
    fn begin(&mut self, workers: &[WorkerInfo]) -> Result<(), SurfaceError> {
        self.workers = workers.to_vec();
        self.traces.clear();
        Ok(())
    }

    fn set_trace(&mut self, id: WorkerId, trace: &[Point]) -> Result<(), SurfaceError> {
        self.traces.insert(id, trace.to_vec());
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), SurfaceError> {
        self.refreshes += 1;
        if self.refreshes % self.settings.redraw_every as u64 == 0 {
            self.draw()?;
        }
        Ok(())
    }

    fn progress(&mut self, progress: &RenderProgress) {
        self.progress = *progress;
    }

    fn finish(&mut self, summary: &RunSummary) -> Result<(), SurfaceError> {
        self.draw()?;
        self.out.write_all(summary.report().as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}
