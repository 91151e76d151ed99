//! Planar part shapes and their observation likelihood.
//!
//! # Likelihood
//!
//! Every grid cell inside a shape votes `+k` when occupied and `-k` when
//! free (`k = 0.1`). The sum is normalized by `k · max_area` and floored at
//! [`LIKELIHOOD_FLOOR`], so a shape lying entirely in free space (or off the
//! map) still has a finite log-likelihood.
//!
//! ```text
//! score = max(ε, Σ_{cells inside} ±k / (k · max_area))
//! ```

mod circle;
mod rectangle;

pub use circle::{Circle, RADIUS_MAX, RADIUS_MIN};
pub use rectangle::{HEIGHT_MAX, HEIGHT_MIN, RECT_MAX_AREA, Rectangle, WIDTH_MAX, WIDTH_MIN};

use crate::core::types::Point2D;
use crate::error::{Error, Result};
use crate::map::{OccupancyMap, VisitedMask};

/// Per-cell vote.
pub const PER_CELL: f64 = 0.1;

/// Lower bound of a shape likelihood.
pub const LIKELIHOOD_FLOOR: f64 = 1e-4;

/// Geometric capabilities shared by every part shape.
pub trait Region {
    /// Shape center.
    fn center(&self) -> Point2D;

    /// Point containment test.
    fn contains(&self, x: f64, y: f64) -> bool;

    /// Half-size of the square scan window around the center.
    fn window(&self) -> f64;

    /// Normalizing area for the likelihood.
    fn max_area(&self) -> f64;
}

/// Part shape: the spider root is a circle, every link a rectangle.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Root body
    Circle(Circle),
    /// Leg segment
    Rectangle(Rectangle),
}

impl Shape {
    /// Build a shape from its parameter vector.
    ///
    /// `[x, y, r]` gives a circle, `[x, y, theta, w, h]` a rectangle.
    pub fn from_params(params: &[f64]) -> Result<Self> {
        match *params {
            [x, y, r] => Ok(Shape::Circle(Circle::new(x, y, r))),
            [x, y, theta, w, h] => Ok(Shape::Rectangle(Rectangle::new(x, y, theta, w, h))),
            _ => Err(Error::InvalidParameter(format!(
                "shape needs 3 or 5 parameters, got {}",
                params.len()
            ))),
        }
    }

    /// Parameter vector (`[x, y, r]` or `[x, y, theta, w, h]`).
    pub fn params(&self) -> Vec<f64> {
        match self {
            Shape::Circle(c) => c.params().to_vec(),
            Shape::Rectangle(r) => r.params().to_vec(),
        }
    }

    /// Observation likelihood of this shape.
    pub fn likelihood(&self, map: &OccupancyMap) -> f64 {
        likelihood(self, map, None)
    }

    /// Average cell value over the cells inside the shape.
    ///
    /// Returns 0.0 when no cell falls inside.
    pub fn mean_occupancy(&self, map: &OccupancyMap) -> f64 {
        mean_occupancy(self, map)
    }

    fn region(&self) -> &dyn Region {
        match self {
            Shape::Circle(c) => c,
            Shape::Rectangle(r) => r,
        }
    }
}

impl Region for Shape {
    fn center(&self) -> Point2D {
        self.region().center()
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        self.region().contains(x, y)
    }

    fn window(&self) -> f64 {
        self.region().window()
    }

    fn max_area(&self) -> f64 {
        self.region().max_area()
    }
}

/// Cell range `[floor(c - w), ceil(c + w))` clipped to `[0, limit)`.
fn window_range(center: f64, half: f64, limit: usize) -> std::ops::Range<i64> {
    let start = ((center - half).floor() as i64).max(0);
    let end = ((center + half).ceil() as i64).min(limit as i64);
    start..end.max(start)
}

/// Score a shape against the map.
///
/// When `visited` is given, cells already claimed by an earlier shape of
/// the same evaluation are skipped and newly counted cells are claimed.
pub fn likelihood<R: Region + ?Sized>(
    shape: &R,
    map: &OccupancyMap,
    mut visited: Option<&mut VisitedMask>,
) -> f64 {
    let c = shape.center();
    let w = shape.window();
    let mut sum = 0.0;

    for i in window_range(c.x, w, map.width()) {
        for j in window_range(c.y, w, map.height()) {
            if !shape.contains(i as f64, j as f64) {
                continue;
            }
            if let Some(mask) = visited.as_deref_mut()
                && !mask.mark(i, j)
            {
                continue;
            }
            if map.occupied(i, j) {
                sum += PER_CELL;
            } else {
                sum -= PER_CELL;
            }
        }
    }

    (sum / (PER_CELL * shape.max_area())).max(LIKELIHOOD_FLOOR)
}

/// Average cell value inside a shape, scanning one cell past its window.
pub fn mean_occupancy<R: Region + ?Sized>(shape: &R, map: &OccupancyMap) -> f64 {
    let c = shape.center();
    let w = shape.window();
    let mut sum = 0.0;
    let mut count = 0usize;

    for i in (c.x - w) as i64 - 1..(c.x + w) as i64 + 2 {
        for j in (c.y - w) as i64 - 1..(c.y + w) as i64 + 2 {
            if shape.contains(i as f64, j as f64) {
                sum += map.cell(i, j) as f64;
                count += 1;
            }
        }
    }

    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn full_map(size: usize) -> OccupancyMap {
        OccupancyMap::from_fn(size, size, |_, _| true).unwrap()
    }

    #[test]
    fn test_from_params() {
        assert!(matches!(Shape::from_params(&[1.0, 2.0, 8.0]), Ok(Shape::Circle(_))));
        assert!(matches!(
            Shape::from_params(&[1.0, 2.0, 0.0, 20.0, 5.0]),
            Ok(Shape::Rectangle(_))
        ));
        assert!(Shape::from_params(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_circle_on_full_map() {
        let map = full_map(60);
        let circle = Shape::Circle(Circle::new(30.0, 30.0, RADIUS_MAX));
        let score = circle.likelihood(&map);
        // Lattice points inside a radius-14 disc approximate its area
        assert!(score > 0.9 && score < 1.1, "score = {}", score);
    }

    #[test]
    fn test_free_map_hits_floor() {
        let map = OccupancyMap::new(40, 40).unwrap();
        let circle = Shape::Circle(Circle::new(20.0, 20.0, 8.0));
        assert_relative_eq!(circle.likelihood(&map), LIKELIHOOD_FLOOR);
    }

    #[test]
    fn test_off_map_window_hits_floor() {
        let map = full_map(20);
        let circle = Shape::Circle(Circle::new(500.0, -300.0, 8.0));
        assert_relative_eq!(circle.likelihood(&map), LIKELIHOOD_FLOOR);

        let empty = OccupancyMap::empty();
        assert_relative_eq!(circle.likelihood(&empty), LIKELIHOOD_FLOOR);
    }

    #[test]
    fn test_visited_suppresses_double_count() {
        let map = full_map(60);
        let circle = Shape::Circle(Circle::new(30.0, 30.0, 10.0));
        let mut mask = VisitedMask::for_map(&map);

        let first = likelihood(&circle, &map, Some(&mut mask));
        let second = likelihood(&circle, &map, Some(&mut mask));
        assert!(first > LIKELIHOOD_FLOOR);
        assert_relative_eq!(second, LIKELIHOOD_FLOOR);
        assert_relative_eq!(first, likelihood(&circle, &map, None));
    }

    #[test]
    fn test_mean_occupancy() {
        let half = OccupancyMap::from_fn(40, 40, |i, _| i < 20).unwrap();
        let circle = Shape::Circle(Circle::new(20.0, 20.0, 6.0));
        let mean = circle.mean_occupancy(&half);
        assert!(mean > 0.4 && mean < 0.6, "mean = {}", mean);

        assert_relative_eq!(circle.mean_occupancy(&full_map(40)), 1.0);
    }

    #[test]
    fn test_rectangle_partial_overlap_scores_lower() {
        let map = OccupancyMap::from_fn(80, 80, |i, _| i < 40).unwrap();
        let inside = Shape::Rectangle(Rectangle::new(20.0, 40.0, 0.0, 20.0, 8.0));
        let straddling = Shape::Rectangle(Rectangle::new(40.0, 40.0, 0.0, 20.0, 8.0));
        assert!(inside.likelihood(&map) > straddling.likelihood(&map));
    }
}
