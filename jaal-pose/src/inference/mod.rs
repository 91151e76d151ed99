//! Pose estimators and the probabilistic machinery behind them.
//!
//! # Components
//!
//! - [`Estimator`]: `init` / `update` / `estimate` seam shared by both strategies
//! - [`ParticleFilter`]: Sequential Monte Carlo over whole spider poses
//! - [`NbpEstimator`]: Nonparametric belief propagation over [`SpiderGraph`]
//! - [`Mixture`], [`Gaussian`]: Diagonal Gaussian mixtures used as beliefs and messages
//! - [`GibbsSampler`]: Sampled approximation of mixture products
//! - [`PairwisePotential`]: Geometric couplings between neighbouring parts
//!
//! # Data Flow
//!
//! ```text
//! OccupancyMap ──► SpiderPose::log_likelihood ──► ParticleFilter
//!      │
//!      └──► Shape::likelihood (unary) ──► GibbsSampler ──► SpiderGraph ──► NbpEstimator
//! ```

mod estimator;
mod gibbs;
mod graph;
mod mixture;
mod nbp;
mod particle_filter;
mod potentials;
mod resampling;
mod weights;

pub use estimator::Estimator;
pub use gibbs::GibbsSampler;
pub use graph::{CIRCLE_COV, Edge, HEADING_AXIS, Node, NodeId, NodeKind, RECT_COV, ROOT, SpiderGraph};
pub use mixture::{Gaussian, Mixture};
pub use nbp::{NbpConfig, NbpEstimator};
pub use particle_filter::{FilterStats, Particle, ParticleFilter, ParticleFilterConfig};
pub use potentials::{ASPECT, DELTA_H, DELTA_W, PairwisePotential, PotentialKind, PotentialNoise};
pub use resampling::{ResamplingStrategy, importance_sample, low_variance_sample, sample_index};
pub use weights::{argmax, effective_sample_size, normalize_log_weights, normalize_weights};
