pub mod color;
pub mod contours;
pub mod plot_surface;
pub mod terminal_surface;

pub use color::{trace_color, ColorStop, Colormap, Gradient, Oklab};
pub use contours::{ContourCell, ContourSettings, ObjectiveField, TerrainQuad};
pub use plot_surface::{PlotSettings, PlotSurface, PlotView};
pub use terminal_surface::{TerminalSettings, TerminalSurface};
