//! Spider pose and forward kinematics.

use std::f64::consts::FRAC_PI_2;

use crate::core::types::{Point2D, Pose2D};
use crate::map::{OccupancyMap, VisitedMask};
use crate::shapes::{self, Circle, HEIGHT_MAX, HEIGHT_MIN, Rectangle, Region, Shape, WIDTH_MAX, WIDTH_MIN};

/// Number of joints (one per link).
pub const NUM_JOINTS: usize = 8;
/// Number of links attached directly to the root.
pub const NUM_INNER: usize = 4;
/// Root plus links.
pub const NUM_PARTS: usize = NUM_JOINTS + 1;

/// Articulated pose: root position, part sizes and eight joint angles.
///
/// Joint `i < 4` is an offset from the quadrant heading `i·π/2`; joint
/// `i >= 4` is relative to its parent link `i - 4`. The root circle and
/// link rectangles are rebuilt on every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiderPose {
    x: f64,
    y: f64,
    radius: f64,
    width: f64,
    height: f64,
    joints: [f64; NUM_JOINTS],
    root: Circle,
    links: [Rectangle; NUM_JOINTS],
}

impl SpiderPose {
    /// Create a pose and run forward kinematics.
    pub fn new(
        x: f64,
        y: f64,
        radius: f64,
        width: f64,
        height: f64,
        joints: [f64; NUM_JOINTS],
    ) -> Self {
        let mut pose = Self {
            x,
            y,
            radius,
            width,
            height,
            joints,
            root: Circle::default(),
            links: [Rectangle::default(); NUM_JOINTS],
        };
        pose.update_parts();
        pose
    }

    /// Root x.
    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Root y.
    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Nominal root radius (unclamped).
    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Nominal link width (unclamped).
    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Nominal link height (unclamped).
    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Joint parameters.
    #[inline]
    pub fn joints(&self) -> &[f64; NUM_JOINTS] {
        &self.joints
    }

    /// Root shape.
    pub fn root(&self) -> &Circle {
        &self.root
    }

    /// Link shapes, `l1`..`l8` in order.
    pub fn links(&self) -> &[Rectangle; NUM_JOINTS] {
        &self.links
    }

    /// Move the root.
    pub fn set_root(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
        self.update_parts();
    }

    /// Change root radius and link size.
    pub fn set_size(&mut self, radius: f64, width: f64, height: f64) {
        self.radius = radius;
        self.width = width;
        self.height = height;
        self.update_parts();
    }

    /// Replace all joint parameters.
    pub fn set_joints(&mut self, joints: [f64; NUM_JOINTS]) {
        self.joints = joints;
        self.update_parts();
    }

    /// Heading of inner link `i` (`i < 4`) before normalization.
    fn inner_heading(&self, i: usize) -> f64 {
        i as f64 * FRAC_PI_2 + self.joints[i]
    }

    fn update_parts(&mut self) {
        self.root = Circle::new(self.x, self.y, self.radius);

        let w = self.width.clamp(WIDTH_MIN, WIDTH_MAX);
        let h = self.height.clamp(HEIGHT_MIN, HEIGHT_MAX);
        let base = Pose2D::translation(self.x, self.y);
        let center_offset = Pose2D::translation(1.5 * w, 0.0);
        let joint_offset = Pose2D::translation(2.0 * w, 0.0);

        for i in 0..NUM_INNER {
            let inner = base.compose(&Pose2D::rotation(self.inner_heading(i)));
            let outer = inner
                .compose(&joint_offset)
                .compose(&Pose2D::rotation(self.joints[i + NUM_INNER]));

            for (slot, frame) in [(i, inner), (i + NUM_INNER, outer)] {
                let c = frame.compose(&center_offset);
                self.links[slot] = Rectangle::new(c.x, c.y, frame.theta, w, h);
            }
        }
    }

    /// All nine parts, root first.
    pub fn parts(&self) -> Vec<Shape> {
        std::iter::once(Shape::Circle(self.root))
            .chain(self.links.iter().map(|r| Shape::Rectangle(*r)))
            .collect()
    }

    fn regions(&self) -> impl Iterator<Item = &dyn Region> {
        std::iter::once(&self.root as &dyn Region).chain(self.links.iter().map(|r| r as &dyn Region))
    }

    /// Joint log-likelihood: sum of the log part likelihoods.
    pub fn log_likelihood(&self, map: &OccupancyMap) -> f64 {
        self.regions()
            .map(|r| shapes::likelihood(r, map, None).ln())
            .sum()
    }

    /// Joint log-likelihood where each cell counts toward one part only.
    ///
    /// The mask is reset before scoring.
    pub fn log_likelihood_exclusive(&self, map: &OccupancyMap, visited: &mut VisitedMask) -> f64 {
        visited.reset(map);
        self.regions()
            .map(|r| shapes::likelihood(r, map, Some(&mut *visited)).ln())
            .sum()
    }

    /// True if any part contains the point.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.regions().any(|r| r.contains(x, y))
    }

    /// True if every part center lies inside a `width × height` extent.
    pub fn in_bounds(&self, width: f64, height: f64) -> bool {
        self.regions().all(|r| {
            let Point2D { x, y } = r.center();
            x >= 0.0 && x < width && y >= 0.0 && y < height
        })
    }

    /// Intersection over union of the footprint and the occupied cells,
    /// within a `4·w` window around the root.
    pub fn iou(&self, map: &OccupancyMap) -> f64 {
        let half = (self.width * 4.0).trunc();
        let start_x = ((self.x - half).floor() as i64).max(0);
        let start_y = ((self.y - half).floor() as i64).max(0);
        let end_x = ((self.x + half).ceil() as i64).min(map.width() as i64);
        let end_y = ((self.y + half).ceil() as i64).min(map.height() as i64);

        let mut intersection = 0usize;
        let mut union = 0usize;
        for i in start_x..end_x {
            for j in start_y..end_y {
                let inside = self.contains(i as f64, j as f64);
                let occupied = map.occupied(i, j);
                if inside && occupied {
                    intersection += 1;
                }
                if inside || occupied {
                    union += 1;
                }
            }
        }

        if union == 0 {
            0.0
        } else {
            intersection as f64 / union as f64
        }
    }

    /// Per-part parameter vectors, root first:
    /// `[x, y, r]` then eight `[x, y, theta, w, h]`.
    pub fn part_states(&self) -> [Vec<f64>; NUM_PARTS] {
        std::array::from_fn(|k| {
            if k == 0 {
                self.root.params().to_vec()
            } else {
                self.links[k - 1].params().to_vec()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::normalize_angle;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn straight(x: f64, y: f64) -> SpiderPose {
        SpiderPose::new(x, y, 10.0, 20.0, 6.0, [0.0; NUM_JOINTS])
    }

    #[test]
    fn test_inner_link_centers() {
        let pose = straight(100.0, 100.0);
        let l1 = pose.links()[0].params();
        assert_relative_eq!(l1[0], 130.0, epsilon = 1e-9);
        assert_relative_eq!(l1[1], 100.0, epsilon = 1e-9);
        assert_relative_eq!(l1[2], 0.0, epsilon = 1e-9);

        let l2 = pose.links()[1].params();
        assert_relative_eq!(l2[0], 100.0, epsilon = 1e-9);
        assert_relative_eq!(l2[1], 130.0, epsilon = 1e-9);
        assert_relative_eq!(l2[2], PI / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_inner_link_corners() {
        let pose = straight(0.0, 0.0);
        let corners = pose.links()[0].corners();
        // Local (w, ±h/2) and (2w, ±h/2)
        let mut xs: Vec<f64> = corners.iter().map(|p| p.x).collect();
        xs.sort_by(f64::total_cmp);
        assert_relative_eq!(xs[0], 20.0, epsilon = 1e-9);
        assert_relative_eq!(xs[3], 40.0, epsilon = 1e-9);
        assert!(corners.iter().all(|p| (p.y.abs() - 3.0).abs() < 1e-9));
    }

    #[test]
    fn test_outer_link_follows_parent() {
        let mut joints = [0.0; NUM_JOINTS];
        joints[4] = PI / 2.0;
        let pose = SpiderPose::new(0.0, 0.0, 10.0, 20.0, 6.0, joints);
        let l5 = pose.links()[4].params();
        // Joint at (2w, 0), then turned a quarter: center at (40, 30)
        assert_relative_eq!(l5[0], 40.0, epsilon = 1e-9);
        assert_relative_eq!(l5[1], 30.0, epsilon = 1e-9);
        assert_relative_eq!(l5[2], PI / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_outer_heading_normalized() {
        let mut joints = [0.0; NUM_JOINTS];
        joints[3] = 0.5;
        joints[7] = 2.0;
        let pose = SpiderPose::new(0.0, 0.0, 10.0, 20.0, 6.0, joints);
        let expected = normalize_angle(1.5 * PI + 0.5 + 2.0);
        assert_relative_eq!(pose.links()[7].theta(), expected, epsilon = 1e-9);
        assert!(pose.links().iter().all(|l| (0.0..2.0 * PI).contains(&l.theta())));
    }

    #[test]
    fn test_kinematics_use_clamped_size() {
        let pose = SpiderPose::new(0.0, 0.0, 10.0, 100.0, 6.0, [0.0; NUM_JOINTS]);
        let l1 = pose.links()[0].params();
        assert_relative_eq!(l1[0], 1.5 * WIDTH_MAX, epsilon = 1e-9);
        assert_relative_eq!(l1[3], WIDTH_MAX);
    }

    #[test]
    fn test_mutation_recomputes_parts() {
        let mut pose = straight(0.0, 0.0);
        pose.set_root(10.0, 5.0);
        assert_relative_eq!(pose.root().params()[0], 10.0);
        assert_relative_eq!(pose.links()[0].params()[0], 40.0, epsilon = 1e-9);

        pose.set_size(3.0, 12.0, 4.0);
        assert_relative_eq!(pose.root().radius(), 5.0);
        assert_relative_eq!(pose.links()[0].params()[0], 28.0, epsilon = 1e-9);

        let mut joints = [0.0; NUM_JOINTS];
        joints[0] = PI;
        pose.set_joints(joints);
        assert_relative_eq!(pose.links()[0].params()[0], -8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_contains_and_bounds() {
        let pose = straight(100.0, 100.0);
        assert!(pose.contains(100.0, 100.0));
        assert!(pose.contains(130.0, 100.0));
        assert!(!pose.contains(115.0, 115.0));

        assert!(pose.in_bounds(200.0, 200.0));
        assert!(!pose.in_bounds(150.0, 200.0));
        assert!(!straight(10.0, 100.0).in_bounds(200.0, 200.0));
    }

    #[test]
    fn test_part_states_layout() {
        let states = straight(1.0, 2.0).part_states();
        assert_eq!(states[0], vec![1.0, 2.0, 10.0]);
        assert!(states[1..].iter().all(|s| s.len() == 5));
    }

    #[test]
    fn test_log_likelihood_prefers_matching_map() {
        let pose = straight(100.0, 100.0);
        let footprint = OccupancyMap::from_fn(200, 200, |i, j| pose.contains(i as f64, j as f64)).unwrap();
        let free = OccupancyMap::new(200, 200).unwrap();

        let matched = pose.log_likelihood(&footprint);
        let unmatched = pose.log_likelihood(&free);
        assert_relative_eq!(unmatched, NUM_PARTS as f64 * shapes::LIKELIHOOD_FLOOR.ln());
        assert!(matched > unmatched);
    }

    #[test]
    fn test_exclusive_scoring_never_exceeds_shared() {
        let pose = SpiderPose::new(50.0, 50.0, 14.0, 12.0, 8.0, [0.0; NUM_JOINTS]);
        let map = OccupancyMap::from_fn(100, 100, |_, _| true).unwrap();
        let mut mask = VisitedMask::default();
        let exclusive = pose.log_likelihood_exclusive(&map, &mut mask);
        assert!(exclusive <= pose.log_likelihood(&map) + 1e-12);
        // Mask is reset per call
        assert_relative_eq!(exclusive, pose.log_likelihood_exclusive(&map, &mut mask));
    }

    #[test]
    fn test_iou() {
        let pose = straight(100.0, 100.0);
        let footprint = OccupancyMap::from_fn(200, 200, |i, j| pose.contains(i as f64, j as f64)).unwrap();
        assert_relative_eq!(pose.iou(&footprint), 1.0);
        assert_relative_eq!(pose.iou(&OccupancyMap::new(200, 200).unwrap()), 0.0);
    }
}
