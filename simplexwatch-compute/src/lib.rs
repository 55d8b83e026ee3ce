pub mod cancellation;
pub mod channel;
pub mod neldermead;
pub mod objective;
pub mod objective_factory;
pub mod objectives;
pub mod start_points;
pub mod worker;

pub use cancellation::{CancelToken, CancellationChecker, NeverCancel};
pub use channel::{path_channel, PathReceiver, PathSender};
pub use neldermead::{Coefficients, NelderMead, StepKind};
pub use objective::{FnObjective, Maximize, Objective, TryFnObjective};
pub use objective_factory::create_objective;
pub use objectives::{Booth, Himmelblau, Rastrigin, Rosenbrock, Sphere};
pub use start_points::{FixedStarts, QuadrantStarts, StartPointGenerator};
pub use worker::run_worker;

// Re-export core types for convenience
pub use simplexwatch_core::*;
