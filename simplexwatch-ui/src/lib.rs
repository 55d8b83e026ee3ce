pub mod render_loop;
pub mod render_progress;
pub mod rendering;
pub mod settings;
pub mod summary;
pub mod surface;
pub mod trace_window;

pub use render_loop::{RenderError, RenderLoop, RenderLoopConfig};
pub use render_progress::RenderProgress;
pub use rendering::{PlotSettings, PlotSurface, PlotView, TerminalSettings, TerminalSurface};
pub use settings::{DisplayKind, RunConfig, SettingsError};
pub use summary::RunSummary;
pub use surface::{DisplaySurface, HeadlessSurface, SurfaceError, WorkerInfo};
pub use trace_window::TraceWindow;
