//! Sampled objective landscape used as the plot and terminal background.

use super::color::Colormap;
use serde::{Deserialize, Serialize};
use simplexwatch_compute::Objective;
use simplexwatch_core::{ConfigError, PlotBounds, Point};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourSettings {
    /// Grid cells per axis.
    pub resolution: u32,
    /// Number of contour bands.
    pub levels: usize,
    pub colormap: Colormap,
    /// Compress large values with `ln(1 + v - min)`; most benchmark
    /// landscapes are unreadable on a linear scale.
    pub log_scale: bool,
}

impl Default for ContourSettings {
    fn default() -> Self {
        Self {
            resolution: 120,
            levels: 50,
            colormap: Colormap::Viridis,
            log_scale: true,
        }
    }
}

impl ContourSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution < 2 {
            return Err(ConfigError::out_of_range("contour resolution", ">= 2", self.resolution));
        }
        if self.levels < 2 {
            return Err(ConfigError::out_of_range("contour levels", ">= 2", self.levels));
        }
        Ok(())
    }
}

/// One background rectangle in objective coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContourCell {
    pub top_left: (f64, f64),
    pub bottom_right: (f64, f64),
    pub color: [u8; 3],
}

/// One patch of the 3D landscape. Corners are `(x, height, y)` with the
/// height in `0..=1`, matching a chart whose vertical axis is the value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainQuad {
    pub corners: [(f64, f64, f64); 4],
    pub color: [u8; 3],
}

fn level_of(t: f64, levels: usize) -> usize {
    ((t * levels as f64) as usize).min(levels.saturating_sub(1))
}

/// Objective values on a regular grid over the plot bounds.
///
/// Row 0 is the top of the plot (`y_max`). Cells whose evaluation failed
/// hold `None` and are left blank.
#[derive(Clone, Debug)]
pub struct ObjectiveField {
    bounds: PlotBounds,
    columns: u32,
    rows: u32,
    values: Vec<Option<f64>>,
    range: Option<(f64, f64)>,
}

impl ObjectiveField {
    /// Evaluate the objective at every cell center. Objectives of higher
    /// dimension are sliced through the plane where the remaining
    /// coordinates are zero.
    pub fn sample(objective: &dyn Objective, bounds: PlotBounds, columns: u32, rows: u32) -> Self {
        let dimension = objective.dimension().unwrap_or(2);
        let mut values = Vec::with_capacity(columns as usize * rows as usize);

        if dimension < 2 {
            log::warn!(
                "Objective {} has dimension {dimension}; no background drawn",
                objective.id()
            );
            values.resize(columns as usize * rows as usize, None);
        } else {
            for row in 0..rows {
                for column in 0..columns {
                    let center = bounds.from_pixel(column, row, columns, rows);
                    let mut coords = vec![0.0; dimension];
                    coords[0] = center.x();
                    coords[1] = center.y();
                    values.push(objective.evaluate_checked(&Point::new(coords)).ok());
                }
            }
        }

        let range = values.iter().flatten().fold(None, |acc: Option<(f64, f64)>, &v| {
            Some(match acc {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            })
        });

        Self {
            bounds,
            columns,
            rows,
            values,
            range,
        }
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Smallest and largest sampled value.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.range
    }

    pub fn value(&self, column: u32, row: u32) -> Option<f64> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.values[(row * self.columns + column) as usize]
    }

    /// Position of `value` within the sampled range, clamped to `0..=1`.
    pub fn relative_height(&self, value: f64, log_scale: bool) -> Option<f64> {
        let (lo, hi) = self.range?;
        if !value.is_finite() {
            return None;
        }
        let value = value.clamp(lo, hi);
        let t = if hi <= lo {
            0.0
        } else if log_scale {
            (value - lo).ln_1p() / (hi - lo).ln_1p()
        } else {
            (value - lo) / (hi - lo)
        };
        Some(t)
    }

    /// Contour band of a cell in `0..levels`.
    pub fn band(&self, column: u32, row: u32, levels: usize, log_scale: bool) -> Option<usize> {
        let t = self.relative_height(self.value(column, row)?, log_scale)?;
        Some(level_of(t, levels))
    }

    /// Quads joining neighbouring cell centers, lifted to their relative
    /// heights. Quads touching a failed cell are left out.
    pub fn terrain(&self, settings: &ContourSettings) -> Vec<TerrainQuad> {
        let lut = settings.colormap.gradient().to_lut(settings.levels);
        let corner = |column: u32, row: u32| {
            let t = self.relative_height(self.value(column, row)?, settings.log_scale)?;
            let center = self.bounds.from_pixel(column, row, self.columns, self.rows);
            Some((center.x(), t, center.y()))
        };

        let mut quads = Vec::new();
        for row in 0..self.rows.saturating_sub(1) {
            for column in 0..self.columns.saturating_sub(1) {
                let corners = [
                    corner(column, row),
                    corner(column + 1, row),
                    corner(column + 1, row + 1),
                    corner(column, row + 1),
                ];
                let [Some(a), Some(b), Some(c), Some(d)] = corners else {
                    continue;
                };
                let mean = (a.1 + b.1 + c.1 + d.1) / 4.0;
                quads.push(TerrainQuad {
                    corners: [a, b, c, d],
                    color: lut[level_of(mean, settings.levels)],
                });
            }
        }
        quads
    }

    /// Colored rectangles for every evaluable cell. Cells on a band
    /// boundary are darkened so that the bands read as contour lines.
    pub fn cells(&self, settings: &ContourSettings) -> Vec<ContourCell> {
        let lut = settings.colormap.gradient().to_lut(settings.levels);
        let band = |c, r| self.band(c, r, settings.levels, settings.log_scale);
        let cell_width = self.bounds.width() / self.columns as f64;
        let cell_height = self.bounds.height() / self.rows as f64;

        let mut cells = Vec::with_capacity(self.values.len());
        for row in 0..self.rows {
            for column in 0..self.columns {
                let Some(level) = band(column, row) else {
                    continue;
                };
                let on_edge = [band(column + 1, row), band(column, row + 1)]
                    .into_iter()
                    .flatten()
                    .any(|other| other != level);
                let mut color = lut[level];
                if on_edge {
                    color = color.map(|c| (c as f64 * 0.75) as u8);
                }

                let x0 = self.bounds.x_min + column as f64 * cell_width;
                let y0 = self.bounds.y_max - row as f64 * cell_height;
                cells.push(ContourCell {
                    top_left: (x0, y0),
                    bottom_right: (x0 + cell_width, y0 - cell_height),
                    color,
                });
            }
        }
        cells
    }
}
