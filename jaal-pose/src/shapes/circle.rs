//! Circular part (spider root).

use std::f64::consts::PI;

use super::Region;
use crate::core::types::Point2D;

/// Smallest allowed radius.
pub const RADIUS_MIN: f64 = 5.0;
/// Largest allowed radius.
pub const RADIUS_MAX: f64 = 14.0;

/// Circle with its radius clamped to [`RADIUS_MIN`, `RADIUS_MAX`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    x: f64,
    y: f64,
    radius: f64,
}

impl Default for Circle {
    fn default() -> Self {
        Self::new(0.0, 0.0, 10.0)
    }
}

impl Circle {
    /// Create a circle, clamping the radius.
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self {
            x,
            y,
            radius: radius.clamp(RADIUS_MIN, RADIUS_MAX),
        }
    }

    /// Move the center.
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// Change the radius (clamped).
    pub fn set_radius(&mut self, radius: f64) {
        self.radius = radius.clamp(RADIUS_MIN, RADIUS_MAX);
    }

    /// Clamped radius.
    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// `[x, y, r]`
    pub fn params(&self) -> [f64; 3] {
        [self.x, self.y, self.radius]
    }
}

impl Region for Circle {
    fn center(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    #[inline]
    fn contains(&self, x: f64, y: f64) -> bool {
        Point2D::new(x, y).distance_squared(&self.center()) <= self.radius * self.radius
    }

    fn window(&self) -> f64 {
        self.radius
    }

    fn max_area(&self) -> f64 {
        PI * RADIUS_MAX * RADIUS_MAX
    }
}
