//! Core data types for planar kinematics.
//!
//! - [`Point2D`]: 2D point in grid cells
//! - [`Pose2D`]: Rigid transform (x, y, theta) used for forward kinematics

mod pose;

pub use pose::{Point2D, Pose2D};
