//! Run configuration: which objective, where the workers start, how the
//! optimizer stops and how the run is displayed.
//!
//! Loaded from JSON; every field has a default so a config file only needs
//! the values it changes.

use crate::rendering::{PlotSettings, PlotView, TerminalSettings};
use crate::RenderLoopConfig;
use serde::{Deserialize, Serialize};
use simplexwatch_compute::{
    create_objective, FixedStarts, Maximize, Objective, QuadrantStarts, StartPointGenerator,
};
use simplexwatch_core::{
    get_objective_config, ConfigError, ObjectiveConfig, OptimizerConfig, PlotBounds, Point,
};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Where traces are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DisplayKind {
    /// PNG image through plotters.
    #[default]
    Plot,
    /// PNG image of the 3D landscape with paths drawn at their values.
    Terrain,
    /// Character grid on stdout.
    Terminal,
    /// No drawing; results are only logged.
    Headless,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Registry id of the objective.
    pub objective: String,
    /// Search for maxima by negating the objective.
    pub maximize: bool,
    /// Number of workers when start points are generated.
    pub workers: usize,
    /// Explicit start points, one worker each. Overrides `workers`.
    pub starts: Vec<Vec<f64>>,
    /// Generated starts have coordinate magnitudes in `[1, scale)`.
    pub scale: f64,
    pub seed: Option<u64>,
    pub optimizer: OptimizerConfig,
    pub render: RenderLoopConfig,
    pub display: DisplayKind,
    /// Plot window; the objective's default window when unset.
    pub bounds: Option<PlotBounds>,
    pub plot: PlotSettings,
    pub terminal: TerminalSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            objective: "himmelblau".to_string(),
            maximize: false,
            workers: 4,
            starts: Vec::new(),
            scale: 5.0,
            seed: None,
            optimizer: OptimizerConfig::default(),
            render: RenderLoopConfig::default(),
            display: DisplayKind::default(),
            bounds: None,
            plot: PlotSettings::default(),
            terminal: TerminalSettings::default(),
        }
    }
}

impl RunConfig {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &FsPath) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::debug!("Loaded run config from {}", path.display());
        Ok(config)
    }

    pub fn objective_config(&self) -> Result<&'static ObjectiveConfig, ConfigError> {
        get_objective_config(&self.objective)
            .ok_or_else(|| ConfigError::UnknownObjective(self.objective.clone()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let objective = self.objective_config()?;
        if self.starts.is_empty() && self.workers == 0 {
            return Err(ConfigError::NoStartPoints);
        }
        if self.starts.is_empty() && objective.dimension != 2 {
            // Generated starts are planar.
            return Err(ConfigError::StartDimension {
                index: 0,
                expected: objective.dimension,
                actual: 2,
            });
        }
        for (index, start) in self.starts.iter().enumerate() {
            if start.len() != objective.dimension {
                return Err(ConfigError::StartDimension {
                    index,
                    expected: objective.dimension,
                    actual: start.len(),
                });
            }
        }
        if !(self.scale.is_finite() && self.scale > 1.0) {
            return Err(ConfigError::out_of_range("scale", "finite and > 1", self.scale));
        }
        self.optimizer.validate()?;
        self.render.validate()?;
        self.bounds().validate()?;
        match self.display {
            DisplayKind::Plot | DisplayKind::Terrain => self.plot.validate(),
            DisplayKind::Terminal => self.terminal.validate(),
            DisplayKind::Headless => Ok(()),
        }
    }

    pub fn bounds(&self) -> PlotBounds {
        self.bounds.unwrap_or_else(|| {
            self.objective_config()
                .map(|c| c.default_bounds())
                .unwrap_or_default()
        })
    }

    /// The evaluator, negated when maximizing.
    pub fn build_objective(&self) -> Result<Arc<dyn Objective>, ConfigError> {
        let objective = create_objective(&self.objective)
            .ok_or_else(|| ConfigError::UnknownObjective(self.objective.clone()))?;
        Ok(if self.maximize {
            Arc::new(Maximize(objective))
        } else {
            objective
        })
    }

    pub fn start_points(&self) -> Result<Vec<Point>, ConfigError> {
        if !self.starts.is_empty() {
            let points: Vec<Point> = self.starts.iter().cloned().map(Point::new).collect();
            let count = points.len();
            return Ok(FixedStarts::new(points).generate(count));
        }
        let mut generator = QuadrantStarts::new(self.scale, self.seed)?;
        Ok(generator.generate(self.workers))
    }

    /// Plot settings with the resolved bounds and a default caption.
    pub fn plot_settings(&self) -> PlotSettings {
        let mut plot = self.plot.clone();
        plot.bounds = self.bounds();
        if self.display == DisplayKind::Terrain {
            plot.view = PlotView::Terrain;
        }
        if plot.caption.is_empty() {
            let name = self
                .objective_config()
                .map(|c| c.display_name)
                .unwrap_or(self.objective.as_str());
            plot.caption = if self.maximize {
                format!("Nelder-Mead on -{name}")
            } else {
                format!("Nelder-Mead on {name}")
            };
        }
        plot
    }

    pub fn terminal_settings(&self) -> TerminalSettings {
        TerminalSettings {
            bounds: self.bounds(),
            ..self.terminal.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TraceWindow;
    use simplexwatch_core::ChannelCapacity;

    #[test]
    fn defaults_are_valid() {
        let config = RunConfig::default();
        config.validate().unwrap();
        assert_eq!(config.bounds(), PlotBounds::symmetric(6.0));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = RunConfig::from_json(
            r#"{
                "objective": "rosenbrock",
                "starts": [[-1.5, 2.0], [1.5, -0.5]],
                "optimizer": { "max_iterations": 500 },
                "render": { "capacity": { "bounded": 1 }, "trace_window": { "mode": "tail", "points": 20 } },
                "display": "headless"
            }"#,
        )
        .unwrap();

        config.validate().unwrap();
        assert_eq!(config.optimizer.max_iterations, 500);
        assert_eq!(config.optimizer.x_tolerance, 1e-6);
        assert_eq!(config.render.capacity, ChannelCapacity::Bounded(1));
        assert_eq!(config.render.trace_window, TraceWindow::Tail(20));
        assert_eq!(config.render.poll_interval_ms, 100);
        assert_eq!(config.start_points().unwrap().len(), 2);
        assert_eq!(config.bounds(), PlotBounds::new(-2.0, 2.0, -1.0, 3.0));
    }

    #[test]
    fn unknown_objective_is_rejected() {
        let config = RunConfig {
            objective: "ackley".into(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownObjective("ackley".into()))
        );
        assert!(config.build_objective().is_err());
    }

    #[test]
    fn start_dimension_must_match_objective() {
        let config = RunConfig {
            starts: vec![vec![1.0, 2.0], vec![1.0, 2.0, 3.0]],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StartDimension { index: 1, .. })
        ));
    }

    #[test]
    fn generated_starts_follow_worker_count() {
        let config = RunConfig {
            workers: 6,
            seed: Some(3),
            ..Default::default()
        };
        let starts = config.start_points().unwrap();
        assert_eq!(starts.len(), 6);
        assert_eq!(starts, config.start_points().unwrap());
    }

    #[test]
    fn maximize_negates_and_captions() {
        let config = RunConfig {
            objective: "sphere".into(),
            maximize: true,
            ..Default::default()
        };
        let objective = config.build_objective().unwrap();
        assert_eq!(objective.evaluate(&Point::xy(1.0, 2.0)).unwrap(), -5.0);
        assert_eq!(config.plot_settings().caption, "Nelder-Mead on -Sphere");
    }

    #[test]
    fn terrain_display_selects_the_terrain_view() {
        let config = RunConfig {
            display: DisplayKind::Terrain,
            ..Default::default()
        };
        config.validate().unwrap();
        assert_eq!(config.plot_settings().view, PlotView::Terrain);
        assert_eq!(RunConfig::default().plot_settings().view, PlotView::Contour);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = RunConfig::load(FsPath::new("/nonexistent/run.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/run.json"));
    }
}
