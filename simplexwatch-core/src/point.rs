use serde::{Deserialize, Serialize};
use std::ops::Index;

/// A coordinate in the objective's search space.
///
/// The dimension is fixed for a run; every point a worker records has the
/// same length as its start point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    coords: Vec<f64>,
}

impl Point {
    pub fn new(coords: Vec<f64>) -> Self {
        Self { coords }
    }

    /// Convenience constructor for the common two-dimensional case.
    pub fn xy(x: f64, y: f64) -> Self {
        Self { coords: vec![x, y] }
    }

    pub fn dim(&self) -> usize {
        self.coords.len()
    }

    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    /// First coordinate, or 0.0 for an empty point.
    pub fn x(&self) -> f64 {
        self.coords.first().copied().unwrap_or(0.0)
    }

    /// Second coordinate, or 0.0 for points with fewer than two dimensions.
    pub fn y(&self) -> f64 {
        self.coords.get(1).copied().unwrap_or(0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.coords.iter().all(|c| c.is_finite())
    }

    /// Largest absolute coordinate difference (L-infinity distance).
    pub fn max_abs_diff(&self, other: &Point) -> f64 {
        self.coords
            .iter()
            .zip(&other.coords)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

impl From<Vec<f64>> for Point {
    fn from(coords: Vec<f64>) -> Self {
        Self::new(coords)
    }
}

impl From<[f64; 2]> for Point {
    fn from(coords: [f64; 2]) -> Self {
        Self::new(coords.to_vec())
    }
}

impl Index<usize> for Point {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.coords[index]
    }
}

/// Ordered history of points visited by one optimization run.
///
/// Append-only. `values[i]` is the objective value at `points[i]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    points: Vec<Point>,
    values: Vec<f64>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a path at its first point.
    pub fn starting_at(point: Point, value: f64) -> Self {
        Self {
            points: vec![point],
            values: vec![value],
        }
    }

    pub fn push(&mut self, point: Point, value: f64) {
        self.points.push(point);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn last(&self) -> Option<(&Point, f64)> {
        self.points.last().zip(self.values.last().copied())
    }

    /// True if `self` is a (not necessarily strict) prefix of `other`.
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        self.len() <= other.len()
            && self.points.iter().zip(&other.points).all(|(a, b)| a == b)
    }
}
