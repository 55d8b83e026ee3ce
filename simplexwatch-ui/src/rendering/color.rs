//! Colormaps for the objective background and the per-worker trace colors.
//!
//! Gradients interpolate in OKLAB so that equal steps in value look like
//! equal steps in color.

use serde::{Deserialize, Serialize};

/// A color in the OKLAB space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Oklab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Oklab {
    pub fn from_srgb(rgb: [u8; 3]) -> Self {
        let [r, g, b] = rgb.map(|c| decode_gamma(c as f64 / 255.0));

        let l = (0.4122214708 * r + 0.5363325363 * g + 0.0514459929 * b).cbrt();
        let m = (0.2119034982 * r + 0.6806995451 * g + 0.1073969566 * b).cbrt();
        let s = (0.0883024619 * r + 0.2817188376 * g + 0.6299787005 * b).cbrt();

        Self {
            l: 0.2104542553 * l + 0.7936177850 * m - 0.0040720468 * s,
            a: 1.9779984951 * l - 2.4285922050 * m + 0.4505937099 * s,
            b: 0.0259040371 * l + 0.7827717662 * m - 0.8086757660 * s,
        }
    }

    pub fn to_srgb(self) -> [u8; 3] {
        let l = (self.l + 0.3963377774 * self.a + 0.2158037573 * self.b).powi(3);
        let m = (self.l - 0.1055613458 * self.a - 0.0638541728 * self.b).powi(3);
        let s = (self.l - 0.0894841775 * self.a - 1.2914855480 * self.b).powi(3);

        let linear = [
            4.0767416621 * l - 3.3077115913 * m + 0.2309699292 * s,
            -1.2684380046 * l + 2.6097574011 * m - 0.3413193965 * s,
            -0.0041960863 * l - 0.7034186147 * m + 1.7076147010 * s,
        ];
        linear.map(|c| (encode_gamma(c.clamp(0.0, 1.0)) * 255.0).round().clamp(0.0, 255.0) as u8)
    }

    pub fn lerp(self, other: Oklab, t: f64) -> Oklab {
        Oklab {
            l: self.l + t * (other.l - self.l),
            a: self.a + t * (other.a - self.a),
            b: self.b + t * (other.b - self.b),
        }
    }
}

fn decode_gamma(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn encode_gamma(c: f64) -> f64 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub position: f64,
    pub color: [u8; 3],
}

/// Named background colormaps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    #[default]
    Viridis,
    Terrain,
    Grayscale,
}

impl Colormap {
    pub fn gradient(self) -> Gradient {
        let stops: &[(f64, [u8; 3])] = match self {
            Colormap::Viridis => &[
                (0.0, [68, 1, 84]),
                (0.25, [59, 82, 139]),
                (0.5, [33, 145, 140]),
                (0.75, [94, 201, 98]),
                (1.0, [253, 231, 37]),
            ],
            Colormap::Terrain => &[
                (0.0, [51, 51, 153]),
                (0.15, [0, 153, 255]),
                (0.25, [0, 204, 102]),
                (0.5, [255, 255, 153]),
                (0.75, [128, 92, 84]),
                (1.0, [255, 255, 255]),
            ],
            Colormap::Grayscale => &[(0.0, [20, 20, 20]), (1.0, [240, 240, 240])],
        };
        Gradient::new(
            stops
                .iter()
                .map(|&(position, color)| ColorStop { position, color })
                .collect(),
        )
    }
}

/// Piecewise gradient through positioned stops.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    stops: Vec<ColorStop>,
}

impl Gradient {
    /// Stops are sorted by position. An empty gradient samples as black.
    pub fn new(mut stops: Vec<ColorStop>) -> Self {
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        Self { stops }
    }

    /// Precompute `size` evenly spaced samples over `[0, 1]`.
    pub fn to_lut(&self, size: usize) -> Vec<[u8; 3]> {
        let lab: Vec<(f64, Oklab)> = self
            .stops
            .iter()
            .map(|s| (s.position, Oklab::from_srgb(s.color)))
            .collect();
        let last = size.saturating_sub(1).max(1) as f64;
        (0..size)
            .map(|i| sample(&lab, i as f64 / last))
            .collect()
    }
}

fn sample(stops: &[(f64, Oklab)], t: f64) -> [u8; 3] {
    match stops {
        [] => [0, 0, 0],
        [(_, only)] => only.to_srgb(),
        _ => {
            let segment = stops
                .windows(2)
                .position(|w| t <= w[1].0)
                .unwrap_or(stops.len() - 2);
            let (p0, c0) = stops[segment];
            let (p1, c1) = stops[segment + 1];
            let local = if (p1 - p0).abs() < 1e-12 {
                0.0
            } else {
                ((t - p0) / (p1 - p0)).clamp(0.0, 1.0)
            };
            c0.lerp(c1, local).to_srgb()
        }
    }
}

/// Trace color for the `index`-th worker: red, blue, orange, magenta, then a
/// fixed set of further distinct colors, repeating.
pub fn trace_color(index: usize) -> [u8; 3] {
    const COLORS: [[u8; 3]; 8] = [
        [220, 20, 60],
        [30, 80, 220],
        [255, 140, 0],
        [200, 0, 200],
        [0, 160, 80],
        [0, 190, 210],
        [140, 80, 20],
        [90, 90, 90],
    ];
    COLORS[index % COLORS.len()]
}
