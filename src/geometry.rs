//! Angle, distance and direction primitives shared by every recognizer.

use serde::{Deserialize, Serialize};

/// Distances at or below this are treated as coincident.
pub const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Dominant-axis quantization of a motion vector. Surface coordinates grow
/// rightwards and downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    None,
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Horizontal wins ties; a zero vector maps to `None`.
    pub fn from_vector(dx: f64, dy: f64) -> Self {
        let ax = dx.abs();
        let ay = dy.abs();
        if ax <= EPSILON && ay <= EPSILON {
            return Direction::None;
        }
        if ax >= ay {
            if dx > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if dy > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::None => "none",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

pub fn distance(a: Point, b: Point) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Angle of the line `from -> to` in degrees, normalized to (-180, 180].
pub fn angle(from: Point, to: Point) -> f64 {
    normalize_degrees((to.y - from.y).atan2(to.x - from.x).to_degrees())
}

pub fn normalize_degrees(deg: f64) -> f64 {
    let mut r = deg % 360.0;
    if r <= -180.0 {
        r += 360.0;
    } else if r > 180.0 {
        r -= 360.0;
    }
    r
}

/// Signed rotation taking `start` to `current` along the shorter arc.
pub fn shortest_angular_delta(current: f64, start: f64) -> f64 {
    normalize_degrees(current - start)
}

pub fn centroid<I>(points: I) -> Option<Point>
where
    I: IntoIterator<Item = Point>,
{
    let mut n = 0usize;
    let mut sx = 0.0;
    let mut sy = 0.0;
    for p in points {
        sx += p.x;
        sy += p.y;
        n += 1;
    }
    if n == 0 {
        return None;
    }
    Some(Point::new(sx / n as f64, sy / n as f64))
}

/// `num / den`, or `fallback` when the denominator is degenerate.
pub(crate) fn ratio_or(num: f64, den: f64, fallback: f64) -> f64 {
    if den.abs() <= EPSILON || !den.is_finite() {
        fallback
    } else {
        num / den
    }
}
