//! Core foundation layer.
//!
//! Bottom layer of the estimator with no internal dependencies.
//!
//! # Contents
//!
//! - [`types`]: Planar points and rigid transforms
//! - [`math`]: Angle normalization and Gaussian density helpers

pub mod math;
pub mod types;
