//! Directional pairwise potentials between spider parts.
//!
//! Each potential predicts a neighbour's parameter vector from a sample of
//! this node, with independent position / size / angle noise. Headings are
//! left unwrapped.
//!
//! Size ratios between the root radius and the link size:
//!
//! ```text
//! δw = 28/5, δh = 4/5, C = 7
//! w = 2·C·r·δw·δh / (C·δh + δw)
//! h = 2·r·δw·δh / (C·δh + δw)
//! r = (w/δw + h/δh) / 2
//! ```

use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::DVector;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::math::sample_normal;
use crate::error::{Error, Result};
use crate::shapes::{WIDTH_MAX, WIDTH_MIN};

/// Width-per-radius ratio.
pub const DELTA_W: f64 = 28.0 / 5.0;
/// Height-per-radius ratio.
pub const DELTA_H: f64 = 4.0 / 5.0;
/// Width to height aspect.
pub const ASPECT: f64 = 7.0;

/// Noise standard deviations of a potential.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PotentialNoise {
    /// Position noise (cells).
    pub position: f64,
    /// Radius / width / height noise (cells).
    pub size: f64,
    /// Heading noise (radians, about 15°).
    pub angle: f64,
}

impl Default for PotentialNoise {
    fn default() -> Self {
        Self {
            position: 10.0,
            size: 2.0,
            angle: 0.26,
        }
    }
}

/// Relation a potential encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PotentialKind {
    /// Root circle to inner link `joint` (0..4).
    RootToLink {
        /// Quadrant of the link
        joint: usize,
    },
    /// Inner link to root circle.
    LinkToRoot,
    /// Inner link to its outer link.
    InnerToOuter,
    /// Outer link to its inner link.
    OuterToInner,
}

impl PotentialKind {
    /// Expected (parent, child) dimensions.
    pub fn dims(&self) -> (usize, usize) {
        match self {
            PotentialKind::RootToLink { .. } => (3, 5),
            PotentialKind::LinkToRoot => (5, 3),
            PotentialKind::InnerToOuter | PotentialKind::OuterToInner => (5, 5),
        }
    }
}

/// Point `dist` along `heading` from `(x, y)`.
fn along(x: f64, y: f64, heading: f64, dist: f64) -> (f64, f64) {
    (x + dist * heading.cos(), y + dist * heading.sin())
}

/// A directional potential with its noise model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairwisePotential {
    /// Relation.
    pub kind: PotentialKind,
    /// Noise model.
    pub noise: PotentialNoise,
}

impl PairwisePotential {
    /// Create a potential.
    pub fn new(kind: PotentialKind, noise: PotentialNoise) -> Self {
        Self { kind, noise }
    }

    /// Link size implied by a root radius.
    pub fn link_size_from_radius(r: f64) -> (f64, f64) {
        let denom = ASPECT * DELTA_H + DELTA_W;
        let w = 2.0 * ASPECT * r * DELTA_W * DELTA_H / denom;
        let h = 2.0 * r * DELTA_W * DELTA_H / denom;
        (w, h)
    }

    /// Root radius implied by a link size.
    pub fn radius_from_link_size(w: f64, h: f64) -> f64 {
        0.5 * (w / DELTA_W + h / DELTA_H)
    }

    /// Predict a neighbour sample from `parent`.
    pub fn sample<R: Rng + ?Sized>(&self, parent: &DVector<f64>, rng: &mut R) -> Result<DVector<f64>> {
        let (parent_dim, _) = self.kind.dims();
        Error::check_dim(parent_dim, parent.len(), "PairwisePotential::sample")?;
        let n = &self.noise;
        let p = parent.as_slice();

        let child = match self.kind {
            PotentialKind::RootToLink { joint } => {
                let (x, y, r) = (p[0], p[1], p[2]);
                let theta = sample_normal(rng, joint as f64 * FRAC_PI_2, n.angle);
                let (w, h) = Self::link_size_from_radius(r);
                let w = sample_normal(rng, w, n.size);
                let h = sample_normal(rng, h, n.size);
                // Link center sits 1.5 widths out along its heading
                let offset = 1.5 * w.clamp(WIDTH_MIN, WIDTH_MAX);
                vec![
                    sample_normal(rng, x + offset * theta.cos(), n.position),
                    sample_normal(rng, y + offset * theta.sin(), n.position),
                    theta,
                    w,
                    h,
                ]
            }
            PotentialKind::LinkToRoot => {
                let (x, y, theta, w, h) = (p[0], p[1], p[2], p[3], p[4]);
                let offset = 1.5 * w.clamp(WIDTH_MIN, WIDTH_MAX);
                vec![
                    sample_normal(rng, x - offset * theta.cos(), n.position),
                    sample_normal(rng, y - offset * theta.sin(), n.position),
                    sample_normal(rng, Self::radius_from_link_size(w, h), n.size),
                ]
            }
            PotentialKind::InnerToOuter => {
                let (x, y, theta, w, h) = (p[0], p[1], p[2], p[3], p[4]);
                let outer = sample_normal(rng, theta, n.angle);
                // Inner center to joint is 0.5 w, joint to outer center 1.5 w
                let wc = w.clamp(WIDTH_MIN, WIDTH_MAX);
                let (jx, jy) = along(x, y, theta, 0.5 * wc);
                let (cx, cy) = along(jx, jy, outer, 1.5 * wc);
                vec![
                    sample_normal(rng, cx, n.position),
                    sample_normal(rng, cy, n.position),
                    outer,
                    sample_normal(rng, w, n.size),
                    sample_normal(rng, h, n.size),
                ]
            }
            PotentialKind::OuterToInner => {
                let (x, y, theta, w, h) = (p[0], p[1], p[2], p[3], p[4]);
                let inner = sample_normal(rng, theta, n.angle);
                let wc = w.clamp(WIDTH_MIN, WIDTH_MAX);
                let (jx, jy) = along(x, y, theta + PI, 1.5 * wc);
                let (cx, cy) = along(jx, jy, inner + PI, 0.5 * wc);
                vec![
                    sample_normal(rng, cx, n.position),
                    sample_normal(rng, cy, n.position),
                    inner,
                    sample_normal(rng, w, n.size),
                    sample_normal(rng, h, n.size),
                ]
            }
        };
        Ok(DVector::from_vec(child))
    }
}
