use crate::{ConfigError, Point};
use serde::{Deserialize, Serialize};

/// Rectangle in objective space shown by a display surface.
///
/// Pixel space has its origin at the top-left corner with y growing
/// downwards, so `y_max` maps to pixel row 0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl PlotBounds {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Square window centered on the origin.
    pub fn symmetric(half_extent: f64) -> Self {
        Self::new(-half_extent, half_extent, -half_extent, half_extent)
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [self.x_min, self.x_max, self.y_min, self.y_max]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.width() <= 0.0 || self.height() <= 0.0 {
            return Err(ConfigError::out_of_range(
                "plot bounds",
                "finite with min < max",
                format!("{self:?}"),
            ));
        }
        Ok(())
    }

    pub fn contains(&self, point: &Point) -> bool {
        let (x, y) = (point.x(), point.y());
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// Map a point's first two coordinates to fractional pixel coordinates.
    pub fn to_pixel(&self, point: &Point, canvas_width: u32, canvas_height: u32) -> (f64, f64) {
        let nx = (point.x() - self.x_min) / self.width();
        let ny = (self.y_max - point.y()) / self.height();
        (nx * canvas_width as f64, ny * canvas_height as f64)
    }

    /// Objective-space coordinates of a pixel's center.
    pub fn from_pixel(&self, px: u32, py: u32, canvas_width: u32, canvas_height: u32) -> Point {
        let x = self.x_min + self.width() * ((px as f64 + 0.5) / canvas_width as f64);
        let y = self.y_max - self.height() * ((py as f64 + 0.5) / canvas_height as f64);
        Point::xy(x, y)
    }
}

impl Default for PlotBounds {
    fn default() -> Self {
        Self::symmetric(6.0)
    }
}
