//! Articulated spider model.
//!
//! A circular root carries four inner links, one per quadrant; each inner
//! link carries one outer link.
//!
//! ```text
//!              l6
//!              │
//!              l2
//!              │
//!   l7 ── l3 ─(root)─ l1 ── l5
//!              │
//!              l4
//!              │
//!              l8
//! ```
//!
//! - [`SpiderPose`]: parameters plus the derived part shapes
//! - [`PartLists`]: per-part parameter vectors keyed `circles`, `l1`..`l8`
//! - [`Priors`]: annotated circles and rectangles for informed starts

mod parts;
mod pose;
mod priors;

pub use parts::{PART_KEYS, PartLists};
pub use priors::Priors;
pub use pose::{NUM_INNER, NUM_JOINTS, NUM_PARTS, SpiderPose};
