//! Static occupancy map and per-evaluation scratch state.
//!
//! # Components
//!
//! - [`OccupancyMap`]: Row-major grid of cell values in [0, 1]
//! - [`VisitedMask`]: One bit per cell, used while scoring one pose so
//!   overlapping parts do not count the same cell twice
//! - [`Sentinel`]: Value returned for out-of-bounds queries

mod occupancy;
mod visited;

pub use occupancy::{OCCUPIED, OccupancyMap, Sentinel};
pub use visited::VisitedMask;
