//! Point and rigid-transform types in grid-cell units.

use serde::{Deserialize, Serialize};

use crate::core::math::normalize_angle;

/// A 2D point in grid cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// Column coordinate
    pub x: f64,
    /// Row coordinate
    pub y: f64,
}

impl Point2D {
    /// Create a new point.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point (avoids sqrt).
    #[inline]
    pub fn distance_squared(&self, other: &Point2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Planar rigid transform `T(x, y) · R(theta)`.
///
/// Theta is normalized to [0, 2π).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X translation
    pub x: f64,
    /// Y translation
    pub y: f64,
    /// Rotation in radians, normalized to [0, 2π)
    pub theta: f64,
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose2D {
    /// Create a new pose with theta normalized to [0, 2π).
    #[inline]
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// Identity transform.
    #[inline]
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }

    /// Pure translation.
    #[inline]
    pub fn translation(x: f64, y: f64) -> Self {
        Self { x, y, theta: 0.0 }
    }

    /// Pure rotation.
    #[inline]
    pub fn rotation(theta: f64) -> Self {
        Self::new(0.0, 0.0, theta)
    }

    /// Compose two transforms: self ⊕ other
    ///
    /// ```text
    /// C = A ⊕ B:
    ///   C.x = A.x + B.x * cos(A.θ) - B.y * sin(A.θ)
    ///   C.y = A.y + B.x * sin(A.θ) + B.y * cos(A.θ)
    ///   C.θ = normalize(A.θ + B.θ)
    /// ```
    #[inline]
    pub fn compose(&self, other: &Pose2D) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            self.x + other.x * cos_t - other.y * sin_t,
            self.y + other.x * sin_t + other.y * cos_t,
            self.theta + other.theta,
        )
    }

    /// Transform a point from the local frame to the global frame.
    #[inline]
    pub fn transform_point(&self, point: &Point2D) -> Point2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Point2D::new(
            self.x + point.x * cos_t - point.y * sin_t,
            self.y + point.x * sin_t + point.y * cos_t,
        )
    }
}
