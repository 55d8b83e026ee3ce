use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use simplexwatch_core::{ChannelCapacity, PlotBounds, OBJECTIVE_CONFIGS};
use simplexwatch_ui::{
    DisplayKind, DisplaySurface, HeadlessSurface, PlotSurface, RenderLoop, RunConfig,
    TerminalSurface, TraceWindow,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "simplexwatch")]
#[command(version, about = "Watch concurrent Nelder-Mead searches converge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// More log output (repeat for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run one worker per start point and draw their paths
    Run(RunArgs),

    /// List the built-in objectives
    Objectives,
}

#[derive(Args)]
struct RunArgs {
    /// JSON run config; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Objective id (see `simplexwatch objectives`)
    #[arg(long)]
    objective: Option<String>,

    /// Search for maxima instead of minima
    #[arg(long)]
    maximize: bool,

    /// Number of generated start points
    #[arg(short, long)]
    workers: Option<usize>,

    /// Explicit start point as comma-separated coordinates; repeatable
    #[arg(long = "start", value_name = "X,Y", allow_hyphen_values = true)]
    starts: Vec<CliPoint>,

    /// Coordinate magnitude bound for generated start points
    #[arg(long)]
    scale: Option<f64>,

    /// Seed for generated start points
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    max_iterations: Option<u32>,

    #[arg(long)]
    x_tolerance: Option<f64>,

    #[arg(long)]
    f_tolerance: Option<f64>,

    /// Use dimension-dependent simplex coefficients
    #[arg(long)]
    adaptive: bool,

    /// Channel capacity: a positive number or "unbounded"
    #[arg(long, value_parser = parse_capacity)]
    capacity: Option<ChannelCapacity>,

    /// Render loop poll interval in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Visible part of each path: full, tail:K or simplex:K
    #[arg(long)]
    window: Option<TraceWindow>,

    #[arg(long, value_enum)]
    display: Option<DisplayKind>,

    /// Plot window as x_min,x_max,y_min,y_max
    #[arg(long, value_name = "BOUNDS", allow_hyphen_values = true)]
    bounds: Option<CliPoint>,

    /// Final PNG path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for intermediate PNG frames
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Write a frame every N updates
    #[arg(long)]
    frame_every: Option<u32>,

    /// Omit caption, axes and legend
    #[arg(long)]
    no_labels: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

/// Comma-separated list of numbers.
#[derive(Clone, Debug)]
struct CliPoint(Vec<f64>);

impl FromStr for CliPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|e| format!("invalid number '{part}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(CliPoint)
    }
}

fn parse_capacity(s: &str) -> Result<ChannelCapacity, String> {
    if s.eq_ignore_ascii_case("unbounded") {
        return Ok(ChannelCapacity::Unbounded);
    }
    match s.parse::<usize>() {
        Ok(0) => Err("capacity must be at least 1".to_string()),
        Ok(n) => Ok(ChannelCapacity::Bounded(n)),
        Err(_) => Err(format!("expected a positive number or 'unbounded', got '{s}'")),
    }
}

impl RunArgs {
    fn apply(self, config: &mut RunConfig) -> anyhow::Result<()> {
        if let Some(objective) = self.objective {
            config.objective = objective;
        }
        config.maximize |= self.maximize;
        if let Some(workers) = self.workers {
            config.workers = workers;
            config.starts.clear();
        }
        if !self.starts.is_empty() {
            config.starts = self.starts.into_iter().map(|p| p.0).collect();
        }
        if let Some(scale) = self.scale {
            config.scale = scale;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(max_iterations) = self.max_iterations {
            config.optimizer.max_iterations = max_iterations;
        }
        if let Some(x_tolerance) = self.x_tolerance {
            config.optimizer.x_tolerance = x_tolerance;
        }
        if let Some(f_tolerance) = self.f_tolerance {
            config.optimizer.f_tolerance = f_tolerance;
        }
        config.optimizer.adaptive |= self.adaptive;
        if let Some(capacity) = self.capacity {
            config.render.capacity = capacity;
        }
        if let Some(poll_ms) = self.poll_ms {
            config.render.poll_interval_ms = poll_ms;
        }
        if let Some(window) = self.window {
            config.render.trace_window = window;
        }
        if let Some(display) = self.display {
            config.display = display;
        }
        if let Some(CliPoint(b)) = self.bounds {
            let [x_min, x_max, y_min, y_max] = b[..] else {
                bail!("--bounds takes four numbers, got {}", b.len());
            };
            config.bounds = Some(PlotBounds::new(x_min, x_max, y_min, y_max));
        }
        if let Some(output) = self.output {
            config.plot.output = output;
        }
        if self.frames_dir.is_some() {
            config.plot.frames_dir = self.frames_dir;
        }
        if let Some(frame_every) = self.frame_every {
            config.plot.frame_every = frame_every;
        }
        if self.no_labels {
            config.plot.labels = false;
        }
        Ok(())
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn list_objectives() {
    println!("{:<12} {:<40} {:<28} minima", "id", "formula", "default bounds");
    for config in OBJECTIVE_CONFIGS {
        let b = config.default_bounds();
        println!(
            "{:<12} {:<40} {:<28} {}",
            config.id,
            config.formula,
            format!("[{}, {}] x [{}, {}]", b.x_min, b.x_max, b.y_min, b.y_max),
            config.known_minima.len()
        );
    }
}

fn run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("loading run config {}", path.display()))?,
        None => RunConfig::default(),
    };
    let json = args.json;
    args.apply(&mut config)?;
    config.validate().context("invalid run configuration")?;

    let objective = config.build_objective()?;
    let starts = config.start_points()?;
    log::info!(
        "Optimizing {} from {} start points",
        config.objective,
        starts.len()
    );

    let surface: Box<dyn DisplaySurface> = match config.display {
        DisplayKind::Plot | DisplayKind::Terrain => {
            let minima = if config.maximize {
                Vec::new()
            } else {
                config.objective_config()?.known_minima()
            };
            Box::new(PlotSurface::new(objective.as_ref(), config.plot_settings())?.with_minima(minima))
        }
        DisplayKind::Terminal => Box::new(TerminalSurface::new(
            objective.as_ref(),
            config.terminal_settings(),
            std::io::stdout(),
        )?),
        DisplayKind::Headless => Box::new(HeadlessSurface::new()),
    };

    let mut render = RenderLoop::new(surface, config.render.clone()).with_maximized(config.maximize);
    let summary = render
        .run(objective, starts, &config.optimizer)
        .context("optimization run aborted")?;

    if json {
        println!("{}", summary.to_json()?);
    } else if config.display != DisplayKind::Terminal {
        print!("{}", summary.report());
    }

    if summary.has_failures() {
        log::warn!("{} of {} workers failed", summary.failures().count(), summary.results.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Objectives => {
            list_objectives();
            Ok(ExitCode::SUCCESS)
        }
        Command::Run(args) => run(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn capacity_parsing() {
        assert_eq!(parse_capacity("unbounded"), Ok(ChannelCapacity::Unbounded));
        assert_eq!(parse_capacity("3"), Ok(ChannelCapacity::Bounded(3)));
        assert!(parse_capacity("0").is_err());
        assert!(parse_capacity("lots").is_err());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "simplexwatch",
            "run",
            "--start",
            "3,3",
            "--start",
            "-3,3",
            "--capacity",
            "1",
            "--window",
            "simplex:3",
            "--display",
            "headless",
            "--bounds",
            "-4,4,-4,4",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let mut config = RunConfig::default();
        args.apply(&mut config).unwrap();

        assert_eq!(config.starts, vec![vec![3.0, 3.0], vec![-3.0, 3.0]]);
        assert_eq!(config.render.capacity, ChannelCapacity::Bounded(1));
        assert_eq!(config.render.trace_window, TraceWindow::Simplex(3));
        assert_eq!(config.display, DisplayKind::Headless);
        assert_eq!(config.bounds(), PlotBounds::symmetric(4.0));
        config.validate().unwrap();
    }

    #[test]
    fn bounds_need_four_numbers() {
        let cli = Cli::try_parse_from(["simplexwatch", "run", "--bounds", "1,2,3"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(args.apply(&mut RunConfig::default()).is_err());
    }
}
