//! # Jaal
//!
//! Pose estimation for an articulated spider-shaped model on a static
//! occupancy map.
//!
//! ## Overview
//!
//! The model is a circular root with eight rectangular links: four inner
//! links, one per quadrant, each carrying an outer link. Two estimators fit
//! it to the occupied cells of a map:
//!
//! - **Particle filter**: Sequential Monte Carlo over complete poses with
//!   elitism, Gaussian diffusion and low-variance resampling
//! - **NBP**: Nonparametric belief propagation over a nine-node tree with
//!   Gaussian-mixture beliefs and Gibbs-sampled mixture products
//!
//! Both report a [`PartLists`]: per-part parameter vectors keyed `circles`,
//! `l1`..`l8`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use jaal_pose::{Estimator, JaalConfig, OccupancyMap, ParticleFilter};
//!
//! let config = JaalConfig::load_or_default("jaal.toml");
//! let map = Arc::new(OccupancyMap::load("observation.txt")?);
//!
//! let mut filter = ParticleFilter::new(config.filter, map);
//! filter.init(50, false)?;
//! for _ in 0..20 {
//!     filter.update()?;
//! }
//! let parts = filter.estimate()?;
//! ```
//!
//! ## Coordinate System
//!
//! - X: Column index, increasing to the right
//! - Y: Row index
//! - Theta: Radians in [0, 2π), counter-clockwise from +X

#![warn(missing_docs)]

// ============================================================================
// Layer 1: Foundation
// ============================================================================

pub mod core;
pub mod error;

// ============================================================================
// Layer 2: Observation and geometry
// ============================================================================

pub mod map;
pub mod shapes;
pub mod spider;

// ============================================================================
// Layer 3: Estimation
// ============================================================================

pub mod inference;

// ============================================================================
// Layer 4: Configuration and I/O
// ============================================================================

pub mod config;
pub mod io;

// Re-export commonly used types
pub use config::JaalConfig;
pub use core::math::normalize_angle;
pub use core::types::{Point2D, Pose2D};
pub use error::{Error, Result};
pub use inference::{
    Estimator, Gaussian, GibbsSampler, Mixture, NbpConfig, NbpEstimator, ParticleFilter,
    ParticleFilterConfig, PotentialNoise, ResamplingStrategy, SpiderGraph,
};
pub use map::{OccupancyMap, VisitedMask};
pub use shapes::{Circle, Rectangle, Region, Shape};
pub use spider::{PART_KEYS, PartLists, Priors, SpiderPose};
