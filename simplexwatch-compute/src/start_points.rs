//! Start-point generators.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simplexwatch_core::{ConfigError, Point};

/// Supplies the initial points, one per worker.
pub trait StartPointGenerator {
    fn generate(&mut self, count: usize) -> Vec<Point>;
}

/// A fixed list of points, cycled if more are requested than given.
#[derive(Clone, Debug)]
pub struct FixedStarts {
    points: Vec<Point>,
}

impl FixedStarts {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// The four quadrant corners `(±d, ±d)`, counter-clockwise from (d, d).
    pub fn corners(d: f64) -> Self {
        Self::new(vec![
            Point::xy(d, d),
            Point::xy(-d, d),
            Point::xy(-d, -d),
            Point::xy(d, -d),
        ])
    }
}

impl StartPointGenerator for FixedStarts {
    fn generate(&mut self, count: usize) -> Vec<Point> {
        self.points.iter().cycle().take(count).cloned().collect()
    }
}

/// One uniformly random point per quadrant, visiting quadrants I, II, III,
/// IV in turn. Each coordinate's magnitude lies in `[1, scale)`.
pub struct QuadrantStarts {
    rng: StdRng,
    scale: f64,
}

impl QuadrantStarts {
    pub fn new(scale: f64, seed: Option<u64>) -> Result<Self, ConfigError> {
        if !(scale.is_finite() && scale > 1.0) {
            return Err(ConfigError::out_of_range("scale", "finite and > 1", scale));
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { rng, scale })
    }

    fn sample(&mut self, quadrant: usize) -> Point {
        let x = self.rng.gen_range(1.0..self.scale);
        let y = self.rng.gen_range(1.0..self.scale);
        match quadrant % 4 {
            0 => Point::xy(x, y),
            1 => Point::xy(-x, y),
            2 => Point::xy(-x, -y),
            _ => Point::xy(x, -y),
        }
    }
}

impl StartPointGenerator for QuadrantStarts {
    fn generate(&mut self, count: usize) -> Vec<Point> {
        (0..count).map(|i| self.sample(i)).collect()
    }
}
