//! Rectangular part (spider leg link).
//!
//! Containment uses even-odd ray crossing from the query point to a
//! reference point outside the corners' bounding box. The segment test is
//! the orientation-sign comparison
//!
//! ```text
//! ccw(A, B, C) = (C.y - A.y)(B.x - A.x) >= (B.y - A.y)(C.x - A.x)
//! cross(AB, CD) = ccw(A, C, D) != ccw(B, C, D) && ccw(A, B, C) != ccw(A, B, D)
//! ```

use super::Region;
use crate::core::math::normalize_angle;
use crate::core::types::{Point2D, Pose2D};

/// Smallest allowed width.
pub const WIDTH_MIN: f64 = 12.0;
/// Largest allowed width.
pub const WIDTH_MAX: f64 = 42.0;
/// Smallest allowed height.
pub const HEIGHT_MIN: f64 = 2.0;
/// Largest allowed height.
pub const HEIGHT_MAX: f64 = 15.0;
/// Normalizing area for rectangle likelihoods.
pub const RECT_MAX_AREA: f64 = 500.0;

/// Oriented rectangle. `width` runs along `theta`, `height` across it.
///
/// Width and height are clamped to their bounds; corners are recomputed
/// whenever the pose or size changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    x: f64,
    y: f64,
    theta: f64,
    width: f64,
    height: f64,
    corners: [Point2D; 4],
    reference: Point2D,
}

impl Default for Rectangle {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 27.0, 8.0)
    }
}

impl Rectangle {
    /// Create a rectangle centered at `(x, y)`.
    pub fn new(x: f64, y: f64, theta: f64, width: f64, height: f64) -> Self {
        let mut rect = Self {
            x,
            y,
            theta: normalize_angle(theta),
            width: width.clamp(WIDTH_MIN, WIDTH_MAX),
            height: height.clamp(HEIGHT_MIN, HEIGHT_MAX),
            corners: [Point2D::default(); 4],
            reference: Point2D::default(),
        };
        rect.update_corners();
        rect
    }

    /// Move and rotate.
    pub fn set_pose(&mut self, x: f64, y: f64, theta: f64) {
        self.x = x;
        self.y = y;
        self.theta = normalize_angle(theta);
        self.update_corners();
    }

    /// Resize (clamped).
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width.clamp(WIDTH_MIN, WIDTH_MAX);
        self.height = height.clamp(HEIGHT_MIN, HEIGHT_MAX);
        self.update_corners();
    }

    /// Heading in [0, 2π).
    #[inline]
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Clamped width.
    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Clamped height.
    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Corners in polygon order: near-left, far-left, far-right, near-right.
    pub fn corners(&self) -> &[Point2D; 4] {
        &self.corners
    }

    /// `[x, y, theta, w, h]`
    pub fn params(&self) -> [f64; 5] {
        [self.x, self.y, self.theta, self.width, self.height]
    }

    fn update_corners(&mut self) {
        let frame = Pose2D::new(self.x, self.y, self.theta);
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        let at = |u: f64, v: f64| frame.transform_point(&Point2D::new(u, v));
        self.corners = [at(-hw, hh), at(hw, hh), at(hw, -hh), at(-hw, -hh)];

        let min_x = self.corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = self.corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        // Half-cell offset keeps the ray off lattice-aligned corners
        self.reference = Point2D::new(min_x - 1.0, min_y - 0.5);
    }
}

#[inline]
fn ccw(a: &Point2D, b: &Point2D, c: &Point2D) -> bool {
    (c.y - a.y) * (b.x - a.x) >= (b.y - a.y) * (c.x - a.x)
}

#[inline]
fn segments_cross(a: &Point2D, b: &Point2D, c: &Point2D, d: &Point2D) -> bool {
    ccw(a, c, d) != ccw(b, c, d) && ccw(a, b, c) != ccw(a, b, d)
}

impl Region for Rectangle {
    fn center(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        let p = Point2D::new(x, y);
        let crossings = (0..4)
            .filter(|&k| {
                segments_cross(
                    &self.reference,
                    &p,
                    &self.corners[k],
                    &self.corners[(k + 1) % 4],
                )
            })
            .count();
        crossings % 2 == 1
    }

    fn window(&self) -> f64 {
        self.width.max(self.height)
    }

    fn max_area(&self) -> f64 {
        RECT_MAX_AREA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    #[test]
    fn test_size_clamped() {
        let r = Rectangle::new(0.0, 0.0, 0.0, 100.0, 0.5);
        assert_relative_eq!(r.width(), WIDTH_MAX);
        assert_relative_eq!(r.height(), HEIGHT_MIN);

        let mut r = Rectangle::default();
        r.set_size(1.0, 99.0);
        assert_relative_eq!(r.width(), WIDTH_MIN);
        assert_relative_eq!(r.height(), HEIGHT_MAX);
    }

    #[test]
    fn test_corners_axis_aligned() {
        let r = Rectangle::new(10.0, 20.0, 0.0, 20.0, 6.0);
        let c = r.corners();
        assert_relative_eq!(c[0].x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(c[0].y, 23.0, epsilon = 1e-9);
        assert_relative_eq!(c[2].x, 20.0, epsilon = 1e-9);
        assert_relative_eq!(c[2].y, 17.0, epsilon = 1e-9);
    }

    #[test]
    fn test_contains_own_center() {
        for &theta in &[0.0, 0.3, FRAC_PI_4, FRAC_PI_2, 2.0, 4.0, 5.9] {
            let r = Rectangle::new(33.3, 47.1, theta, 27.0, 8.0);
            assert!(r.contains(33.3, 47.1), "theta = {}", theta);
        }
    }

    #[test]
    fn test_rejects_far_points() {
        let r = Rectangle::new(50.0, 50.0, 0.7, 27.0, 8.0);
        assert!(!r.contains(0.0, 0.0));
        assert!(!r.contains(200.0, 50.0));
        assert!(!r.contains(50.0, -100.0));
        assert!(!r.contains(-5.0, 90.0));
    }

    #[test]
    fn test_contains_matches_local_frame() {
        let r = Rectangle::new(40.0, 40.0, 0.6, 24.0, 10.0);
        let (sin_t, cos_t) = r.theta().sin_cos();
        for i in 10..70 {
            for j in 10..70 {
                let (dx, dy) = (i as f64 - 40.0, j as f64 - 40.0);
                let u = dx * cos_t + dy * sin_t;
                let v = -dx * sin_t + dy * cos_t;
                // Skip a thin band around the boundary
                if u.abs() < 11.5 && v.abs() < 4.5 {
                    assert!(r.contains(i as f64, j as f64), "({}, {})", i, j);
                } else if u.abs() > 12.5 || v.abs() > 5.5 {
                    assert!(!r.contains(i as f64, j as f64), "({}, {})", i, j);
                }
            }
        }
    }

    #[test]
    fn test_set_pose_moves_corners() {
        let mut r = Rectangle::new(0.0, 0.0, 0.0, 20.0, 4.0);
        r.set_pose(100.0, 100.0, FRAC_PI_2);
        assert!(r.contains(100.0, 108.0));
        assert!(!r.contains(108.0, 100.0));
        assert!(!r.contains(0.0, 0.0));
    }
}
