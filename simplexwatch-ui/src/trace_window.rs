use serde::{Deserialize, Serialize};
use simplexwatch_core::ConfigError;
use std::fmt;
use std::str::FromStr;

/// How much of a worker's path a surface is given to draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "points")]
pub enum TraceWindow {
    /// The whole path from the start point.
    #[default]
    Full,
    /// Only the most recent `k` points.
    Tail(usize),
    /// The most recent `k` points closed into a polygon, which for
    /// `k = dim + 1` outlines the current simplex.
    Simplex(usize),
}

impl TraceWindow {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            TraceWindow::Full => Ok(()),
            TraceWindow::Tail(0) => Err(ConfigError::out_of_range("trace_window.tail", ">= 1", 0)),
            TraceWindow::Simplex(k) if k < 2 => {
                Err(ConfigError::out_of_range("trace_window.simplex", ">= 2", k))
            }
            _ => Ok(()),
        }
    }

    /// The part of a path to draw. Paths shorter than the window are
    /// returned whole and left open. Applies equally to a path's points
    /// and to its per-point values.
    pub fn apply<T: Clone>(&self, points: &[T]) -> Vec<T> {
        match *self {
            TraceWindow::Full => points.to_vec(),
            TraceWindow::Tail(k) => tail(points, k).to_vec(),
            TraceWindow::Simplex(k) => {
                if points.len() < k {
                    return points.to_vec();
                }
                let mut polygon = tail(points, k).to_vec();
                if let Some(first) = polygon.first().cloned() {
                    polygon.push(first);
                }
                polygon
            }
        }
    }
}

fn tail<T>(points: &[T], k: usize) -> &[T] {
    &points[points.len().saturating_sub(k)..]
}

impl fmt::Display for TraceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceWindow::Full => write!(f, "full"),
            TraceWindow::Tail(k) => write!(f, "tail:{k}"),
            TraceWindow::Simplex(k) => write!(f, "simplex:{k}"),
        }
    }
}

/// Parses `full`, `tail:K` or `simplex:K`.
impl FromStr for TraceWindow {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::out_of_range("trace_window", "full, tail:K or simplex:K", s);
        let window = match s.split_once(':') {
            None if s.eq_ignore_ascii_case("full") => TraceWindow::Full,
            Some((mode, k)) => {
                let k: usize = k.trim().parse().map_err(|_| invalid())?;
                match mode.trim().to_ascii_lowercase().as_str() {
                    "tail" => TraceWindow::Tail(k),
                    "simplex" => TraceWindow::Simplex(k),
                    _ => return Err(invalid()),
                }
            }
            None => return Err(invalid()),
        };
        window.validate()?;
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simplexwatch_core::Point;

    fn path(n: usize) -> Vec<Point> {
        (0..n).map(|i| Point::xy(i as f64, 0.0)).collect()
    }

    #[test]
    fn full_keeps_everything() {
        assert_eq!(TraceWindow::Full.apply(&path(5)).len(), 5);
    }

    #[test]
    fn tail_keeps_latest_points() {
        let window = TraceWindow::Tail(2).apply(&path(5));
        assert_eq!(window, vec![Point::xy(3.0, 0.0), Point::xy(4.0, 0.0)]);
    }

    #[test]
    fn simplex_closes_the_polygon() {
        let window = TraceWindow::Simplex(3).apply(&path(5));
        assert_eq!(window.len(), 4);
        assert_eq!(window.first(), window.last());
        assert_eq!(window[0], Point::xy(2.0, 0.0));
    }

    #[test]
    fn values_follow_the_same_window() {
        let values = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert_eq!(TraceWindow::Simplex(3).apply(&values), vec![3.0, 2.0, 1.0, 3.0]);
        assert_eq!(TraceWindow::Tail(2).apply(&values), vec![2.0, 1.0]);
    }

    #[test]
    fn short_paths_are_left_open() {
        assert_eq!(TraceWindow::Simplex(3).apply(&path(2)).len(), 2);
        assert_eq!(TraceWindow::Tail(3).apply(&path(1)).len(), 1);
    }

    #[test]
    fn parses_cli_forms() {
        assert_eq!("full".parse::<TraceWindow>().unwrap(), TraceWindow::Full);
        assert_eq!("tail:10".parse::<TraceWindow>().unwrap(), TraceWindow::Tail(10));
        assert_eq!("simplex:3".parse::<TraceWindow>().unwrap(), TraceWindow::Simplex(3));
        assert!("tail:0".parse::<TraceWindow>().is_err());
        assert!("ring:3".parse::<TraceWindow>().is_err());
        assert!("tail".parse::<TraceWindow>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for window in [TraceWindow::Full, TraceWindow::Tail(4), TraceWindow::Simplex(3)] {
            assert_eq!(window.to_string().parse::<TraceWindow>().unwrap(), window);
        }
    }

    #[test]
    fn serde_uses_tagged_form() {
        let json = serde_json::to_string(&TraceWindow::Tail(3)).unwrap();
        assert_eq!(json, r#"{"mode":"tail","points":3}"#);
        let full: TraceWindow = serde_json::from_str(r#"{"mode":"full"}"#).unwrap();
        assert_eq!(full, TraceWindow::Full);
    }
}
