//! Optimizer settings and the objective registry.
//!
//! The registry holds display metadata for the built-in objectives; the
//! compute crate maps the same ids to evaluators.

use crate::{ConfigError, PlotBounds, Point};
use serde::{Deserialize, Serialize};

/// Termination settings for one Nelder-Mead run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Upper bound on simplex iterations.
    pub max_iterations: u32,
    /// Largest allowed vertex distance from the best vertex at convergence.
    pub x_tolerance: f64,
    /// Largest allowed objective spread across the simplex at convergence.
    pub f_tolerance: f64,
    /// Relative perturbation used to build the initial simplex.
    pub initial_step: f64,
    /// Use dimension-dependent coefficients (helps for dim > 2).
    pub adaptive: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            x_tolerance: 1e-6,
            f_tolerance: 1e-6,
            initial_step: 0.05,
            adaptive: false,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.x_tolerance.is_finite() && self.x_tolerance >= 0.0) {
            return Err(ConfigError::out_of_range(
                "x_tolerance",
                "finite and non-negative",
                self.x_tolerance,
            ));
        }
        if !(self.f_tolerance.is_finite() && self.f_tolerance >= 0.0) {
            return Err(ConfigError::out_of_range(
                "f_tolerance",
                "finite and non-negative",
                self.f_tolerance,
            ));
        }
        if !(self.initial_step.is_finite() && self.initial_step > 0.0) {
            return Err(ConfigError::out_of_range(
                "initial_step",
                "finite and positive",
                self.initial_step,
            ));
        }
        Ok(())
    }
}

/// Buffering policy of the path channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelCapacity {
    #[default]
    Unbounded,
    /// Publishers block while `n` updates are pending.
    Bounded(usize),
}

impl ChannelCapacity {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Bounded(0) => Err(ConfigError::out_of_range(
                "channel capacity",
                "at least 1",
                0,
            )),
            _ => Ok(()),
        }
    }
}

/// Static description of a built-in objective.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectiveConfig {
    /// Unique identifier (matches the evaluator id in the compute crate)
    pub id: &'static str,
    /// Human-readable name for plot captions
    pub display_name: &'static str,
    /// Formula shown in `objectives` listings
    pub formula: &'static str,
    pub dimension: usize,
    /// Default plot window as (x_min, x_max, y_min, y_max).
    pub default_bounds: (f64, f64, f64, f64),
    /// Known global/local minima in the plot window.
    pub known_minima: &'static [[f64; 2]],
}

impl ObjectiveConfig {
    pub fn default_bounds(&self) -> PlotBounds {
        let (x_min, x_max, y_min, y_max) = self.default_bounds;
        PlotBounds::new(x_min, x_max, y_min, y_max)
    }

    pub fn known_minima(&self) -> Vec<Point> {
        self.known_minima.iter().map(|&m| Point::from(m)).collect()
    }

    /// Closest known minimum to `point`, with its L-infinity distance.
    pub fn nearest_minimum(&self, point: &Point) -> Option<(Point, f64)> {
        self.known_minima()
            .into_iter()
            .map(|m| {
                let d = m.max_abs_diff(point);
                (m, d)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// Registry of available objectives.
pub static OBJECTIVE_CONFIGS: &[ObjectiveConfig] = &[
    ObjectiveConfig {
        id: "himmelblau",
        display_name: "Himmelblau",
        formula: "(x^2 + y - 11)^2 + (x + y^2 - 7)^2",
        dimension: 2,
        default_bounds: (-6.0, 6.0, -6.0, 6.0),
        known_minima: &[
            [3.0, 2.0],
            [-2.805118, 3.131312],
            [-3.779310, -3.283186],
            [3.584428, -1.848126],
        ],
    },
    ObjectiveConfig {
        id: "rosenbrock",
        display_name: "Rosenbrock",
        formula: "(1 - x)^2 + 100 (y - x^2)^2",
        dimension: 2,
        default_bounds: (-2.0, 2.0, -1.0, 3.0),
        known_minima: &[[1.0, 1.0]],
    },
    ObjectiveConfig {
        id: "sphere",
        display_name: "Sphere",
        formula: "x^2 + y^2",
        dimension: 2,
        default_bounds: (-5.0, 5.0, -5.0, 5.0),
        known_minima: &[[0.0, 0.0]],
    },
    ObjectiveConfig {
        id: "booth",
        display_name: "Booth",
        formula: "(x + 2y - 7)^2 + (2x + y - 5)^2",
        dimension: 2,
        default_bounds: (-10.0, 10.0, -10.0, 10.0),
        known_minima: &[[1.0, 3.0]],
    },
    ObjectiveConfig {
        id: "rastrigin",
        display_name: "Rastrigin",
        formula: "20 + x^2 + y^2 - 10 (cos 2πx + cos 2πy)",
        dimension: 2,
        default_bounds: (-5.12, 5.12, -5.12, 5.12),
        known_minima: &[[0.0, 0.0]],
    },
];

/// Look up an objective configuration by ID.
pub fn get_objective_config(id: &str) -> Option<&'static ObjectiveConfig> {
    OBJECTIVE_CONFIGS.iter().find(|c| c.id == id)
}

/// Get the default objective configuration.
pub fn default_objective_config() -> &'static ObjectiveConfig {
    &OBJECTIVE_CONFIGS[0]
}
