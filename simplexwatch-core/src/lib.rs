pub mod bounds;
pub mod config;
pub mod error;
pub mod messages;
pub mod point;

pub use bounds::PlotBounds;
pub use config::{
    default_objective_config, get_objective_config, ChannelCapacity, ObjectiveConfig,
    OptimizerConfig, OBJECTIVE_CONFIGS,
};
pub use error::{ChannelError, ConfigError, EvaluationError};
pub use messages::{PathUpdate, RunFailure, RunResult, RunStatus, WorkerId};
pub use point::{Path, Point};
