//! Derivative-free Nelder-Mead simplex stepper.
//!
//! The stepper owns the simplex and advances it one iteration at a time so
//! the worker can publish progress and check for cancellation between steps.
//! Vertices are kept sorted by objective value, best first.

use crate::Objective;
use simplexwatch_core::{EvaluationError, OptimizerConfig, Point};

/// Absolute step used for coordinates that start at exactly zero.
const ZERO_COORD_STEP: f64 = 0.00025;

/// Reflection, expansion, contraction and shrink coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficients {
    pub reflection: f64,
    pub expansion: f64,
    pub contraction: f64,
    pub shrink: f64,
}

impl Coefficients {
    pub fn standard() -> Self {
        Self {
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
        }
    }

    /// Dimension-dependent coefficients (Gao & Han, 2012).
    pub fn adaptive(dimension: usize) -> Self {
        let n = dimension.max(1) as f64;
        Self {
            reflection: 1.0,
            expansion: 1.0 + 2.0 / n,
            contraction: 0.75 - 1.0 / (2.0 * n),
            shrink: 1.0 - 1.0 / n,
        }
    }
}

/// Which move an iteration made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    Reflect,
    Expand,
    ContractOutside,
    ContractInside,
    Shrink,
}

pub struct NelderMead<'a> {
    objective: &'a dyn Objective,
    vertices: Vec<Point>,
    values: Vec<f64>,
    coefficients: Coefficients,
    evaluations: u32,
    initialized: bool,
}

impl<'a> NelderMead<'a> {
    /// Build the initial simplex around `start` without evaluating it.
    ///
    /// Vertex `k + 1` is `start` with coordinate `k` scaled by
    /// `1 + initial_step` (or set to a small absolute step when zero).
    pub fn new(objective: &'a dyn Objective, start: &Point, config: &OptimizerConfig) -> Self {
        let dim = start.dim();
        let mut vertices = Vec::with_capacity(dim + 1);
        vertices.push(start.clone());
        for k in 0..dim {
            let mut coords = start.coords().to_vec();
            coords[k] = if coords[k] != 0.0 {
                coords[k] * (1.0 + config.initial_step)
            } else {
                ZERO_COORD_STEP
            };
            vertices.push(Point::new(coords));
        }

        let coefficients = if config.adaptive {
            Coefficients::adaptive(dim)
        } else {
            Coefficients::standard()
        };

        Self {
            objective,
            values: vec![f64::NAN; vertices.len()],
            vertices,
            coefficients,
            evaluations: 0,
            initialized: false,
        }
    }

    /// Evaluate every vertex and sort the simplex.
    ///
    /// The start point is evaluated first so a failure there is reported
    /// before any other evaluation. Returns the start point's value.
    pub fn initialize(&mut self) -> Result<f64, EvaluationError> {
        for i in 0..self.vertices.len() {
            self.values[i] = self.evaluate(&self.vertices[i].clone())?;
        }
        let start_value = self.values[0];
        self.sort();
        self.initialized = true;
        Ok(start_value)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Best vertex and its value.
    pub fn best(&self) -> (&Point, f64) {
        (&self.vertices[0], self.values[0])
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn evaluations(&self) -> u32 {
        self.evaluations
    }

    /// Largest distance of any vertex from the best, per coordinate.
    pub fn x_spread(&self) -> f64 {
        let best = &self.vertices[0];
        self.vertices[1..]
            .iter()
            .map(|v| v.max_abs_diff(best))
            .fold(0.0, f64::max)
    }

    /// Largest objective gap between the best vertex and any other.
    pub fn f_spread(&self) -> f64 {
        let best = self.values[0];
        self.values[1..]
            .iter()
            .map(|v| (v - best).abs())
            .fold(0.0, f64::max)
    }

    /// Both spreads within tolerance. A degenerate zero-dimensional simplex
    /// is trivially converged.
    pub fn has_converged(&self, x_tolerance: f64, f_tolerance: f64) -> bool {
        self.initialized && self.x_spread() <= x_tolerance && self.f_spread() <= f_tolerance
    }

    /// Perform one Nelder-Mead iteration.
    pub fn step(&mut self) -> Result<StepKind, EvaluationError> {
        debug_assert!(self.initialized, "step() called before initialize()");
        debug_assert!(self.vertices.len() >= 2, "simplex needs at least one dimension");

        let Coefficients {
            reflection: rho,
            expansion: chi,
            contraction: psi,
            shrink: sigma,
        } = self.coefficients;

        let last = self.vertices.len() - 1;
        let worst = self.vertices[last].clone();
        let centroid = self.centroid();

        let reflected = combine(&centroid, 1.0 + rho, &worst, -rho);
        let f_reflected = self.evaluate(&reflected)?;

        let kind = if f_reflected < self.values[0] {
            let expanded = combine(&centroid, 1.0 + rho * chi, &worst, -rho * chi);
            let f_expanded = self.evaluate(&expanded)?;
            if f_expanded < f_reflected {
                self.replace_worst(expanded, f_expanded);
                StepKind::Expand
            } else {
                self.replace_worst(reflected, f_reflected);
                StepKind::Reflect
            }
        } else if f_reflected < self.values[last - 1] {
            self.replace_worst(reflected, f_reflected);
            StepKind::Reflect
        } else if f_reflected < self.values[last] {
            let contracted = combine(&centroid, 1.0 + psi * rho, &worst, -psi * rho);
            let f_contracted = self.evaluate(&contracted)?;
            if f_contracted <= f_reflected {
                self.replace_worst(contracted, f_contracted);
                StepKind::ContractOutside
            } else {
                self.shrink(sigma)?;
                StepKind::Shrink
            }
        } else {
            let contracted = combine(&centroid, 1.0 - psi, &worst, psi);
            let f_contracted = self.evaluate(&contracted)?;
            if f_contracted < self.values[last] {
                self.replace_worst(contracted, f_contracted);
                StepKind::ContractInside
            } else {
                self.shrink(sigma)?;
                StepKind::Shrink
            }
        };

        self.sort();
        Ok(kind)
    }

    fn evaluate(&mut self, point: &Point) -> Result<f64, EvaluationError> {
        self.evaluations += 1;
        self.objective.evaluate_checked(point)
    }

    /// Centroid of all vertices except the worst.
    fn centroid(&self) -> Point {
        let keep = &self.vertices[..self.vertices.len() - 1];
        let mut sum = vec![0.0; keep[0].dim()];
        for vertex in keep {
            for (s, c) in sum.iter_mut().zip(vertex.coords()) {
                *s += c;
            }
        }
        let n = keep.len() as f64;
        Point::new(sum.into_iter().map(|s| s / n).collect())
    }

    fn replace_worst(&mut self, point: Point, value: f64) {
        let last = self.vertices.len() - 1;
        self.vertices[last] = point;
        self.values[last] = value;
    }

    fn shrink(&mut self, sigma: f64) -> Result<(), EvaluationError> {
        let best = self.vertices[0].clone();
        for i in 1..self.vertices.len() {
            let shrunk = combine(&best, 1.0 - sigma, &self.vertices[i], sigma);
            self.values[i] = self.evaluate(&shrunk)?;
            self.vertices[i] = shrunk;
        }
        Ok(())
    }

    fn sort(&mut self) {
        let mut order: Vec<usize> = (0..self.vertices.len()).collect();
        order.sort_by(|&a, &b| self.values[a].total_cmp(&self.values[b]));
        self.vertices = order.iter().map(|&i| self.vertices[i].clone()).collect();
        self.values = order.iter().map(|&i| self.values[i]).collect();
    }
}

/// `wa * a + wb * b`, coordinate-wise.
fn combine(a: &Point, wa: f64, b: &Point, wb: f64) -> Point {
    Point::new(
        a.coords()
            .iter()
            .zip(b.coords())
            .map(|(x, y)| wa * x + wb * y)
            .collect(),
    )
}
