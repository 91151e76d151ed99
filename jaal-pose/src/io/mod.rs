//! File loaders for observations and annotations.
//!
//! - **Occupancy text**: header line, `width height` line, then one row of
//!   whitespace-separated cell values per image row
//! - **Priors JSON**: `{"circles": [[x, y, r]], "rectangles": [[x, y, theta, w, h]]}`

mod occupancy;
mod priors;

pub use occupancy::{load_occupancy, parse_occupancy};
pub use priors::{load_priors, parse_priors};
