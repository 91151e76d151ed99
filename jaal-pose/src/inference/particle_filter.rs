//! Particle filter over whole spider poses.
//!
//! Each particle is a complete [`SpiderPose`] weighted by its joint
//! log-likelihood against the map. An update keeps the best particle
//! untouched, diffuses the rest with Gaussian noise, reweights and
//! resamples back to the configured count.

use std::f64::consts::PI;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::estimator::Estimator;
use super::resampling::ResamplingStrategy;
use super::weights::{argmax, effective_sample_size, normalize_log_weights};
use crate::core::math::sample_normal;
use crate::error::{Error, Result};
use crate::map::{OccupancyMap, VisitedMask};
use crate::spider::{NUM_JOINTS, PartLists, Priors, SpiderPose};

/// Nominal root radius and spread for uninformed starts.
const RADIUS_PRIOR: (f64, f64) = (10.0, 2.0);
/// Nominal link width and spread.
const WIDTH_PRIOR: (f64, f64) = (27.0, 5.0);
/// Nominal link height and spread.
const HEIGHT_PRIOR: (f64, f64) = (8.0, 2.0);
/// Spread of the initial joint offsets.
const JOINT_SPREAD: f64 = PI / 8.0;
/// Jitter around an annotated circle: position, radius.
const CIRCLE_PRIOR_JITTER: (f64, f64) = (10.0, 2.0);
/// Jitter around an annotated rectangle size.
const RECT_SIZE_JITTER: f64 = 2.0;

/// Configuration for the particle filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleFilterConfig {
    /// Number of particles used when the caller does not choose.
    pub num_particles: usize,

    /// Std-dev of root position diffusion per update (cells).
    pub position_jitter: f64,

    /// Std-dev of joint angle diffusion per update (radians).
    pub angle_jitter: f64,

    /// Std-dev of radius / width / height diffusion per update (cells).
    pub size_jitter: f64,

    /// Resampling algorithm.
    pub resampling: ResamplingStrategy,

    /// Count each cell toward one part only when scoring a pose.
    pub suppress_overlap: bool,

    /// Random seed for deterministic behavior (0 for OS entropy).
    pub seed: u64,
}

impl Default for ParticleFilterConfig {
    fn default() -> Self {
        Self {
            num_particles: 50,
            position_jitter: 2.0,
            angle_jitter: 0.1,
            size_jitter: 2.0,
            resampling: ResamplingStrategy::LowVariance,
            suppress_overlap: true,
            seed: 0,
        }
    }
}

/// A particle: pose plus raw joint log-likelihood.
#[derive(Debug, Clone, Copy)]
pub struct Particle<'a> {
    /// Hypothesized pose.
    pub pose: &'a SpiderPose,
    /// Unnormalized log-likelihood.
    pub weight: f64,
}

/// Filter diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterStats {
    /// Completed updates since the last `init`.
    pub generation: u64,
    /// Effective sample size of the last weighting.
    pub effective_sample_size: f64,
    /// Best joint log-likelihood in the current set.
    pub best_log_likelihood: f64,
}

pub(crate) fn seeded_rng(seed: u64) -> StdRng {
    if seed == 0 {
        StdRng::from_os_rng()
    } else {
        StdRng::seed_from_u64(seed)
    }
}

/// Sequential Monte Carlo estimator.
#[derive(Debug)]
pub struct ParticleFilter {
    config: ParticleFilterConfig,
    map: Arc<OccupancyMap>,
    priors: Priors,
    poses: Vec<SpiderPose>,
    log_weights: Vec<f64>,
    rng: StdRng,
    visited: VisitedMask,
    stats: FilterStats,
}

impl ParticleFilter {
    /// Create an uninitialized filter over `map`.
    pub fn new(config: ParticleFilterConfig, map: Arc<OccupancyMap>) -> Self {
        let rng = seeded_rng(config.seed);
        let visited = VisitedMask::for_map(&map);
        Self {
            config,
            map,
            priors: Priors::default(),
            poses: Vec::new(),
            log_weights: Vec::new(),
            rng,
            visited,
            stats: FilterStats::default(),
        }
    }

    /// Attach annotated priors for informed initialization.
    pub fn with_priors(mut self, priors: Priors) -> Self {
        self.priors = priors;
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &ParticleFilterConfig {
        &self.config
    }

    /// Get current filter statistics.
    pub fn stats(&self) -> &FilterStats {
        &self.stats
    }

    /// Number of particles.
    pub fn num_particles(&self) -> usize {
        self.poses.len()
    }

    /// True once `init` (or `set_particles`) has populated the filter.
    pub fn is_initialized(&self) -> bool {
        !self.poses.is_empty()
    }

    /// Current particles.
    pub fn particles(&self) -> impl Iterator<Item = Particle<'_>> {
        self.poses
            .iter()
            .zip(&self.log_weights)
            .map(|(pose, &weight)| Particle { pose, weight })
    }

    /// Replace the particle set. Poses and log-weights must pair up.
    pub fn set_particles(&mut self, poses: Vec<SpiderPose>, log_weights: Vec<f64>) -> Result<()> {
        if poses.len() != log_weights.len() {
            return Err(Error::InconsistentState {
                particles: poses.len(),
                weights: log_weights.len(),
            });
        }
        self.poses = poses;
        self.log_weights = log_weights;
        self.stats = FilterStats {
            best_log_likelihood: self.best_log_likelihood(),
            ..Default::default()
        };
        Ok(())
    }

    /// Score a pose against the map.
    fn score(&mut self, pose: &SpiderPose) -> f64 {
        if self.config.suppress_overlap {
            pose.log_likelihood_exclusive(&self.map, &mut self.visited)
        } else {
            pose.log_likelihood(&self.map)
        }
    }

    fn best_log_likelihood(&self) -> f64 {
        self.log_weights
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Index of the highest-weight particle.
    fn best_index(&self) -> Result<usize> {
        if self.poses.len() != self.log_weights.len() {
            return Err(Error::InconsistentState {
                particles: self.poses.len(),
                weights: self.log_weights.len(),
            });
        }
        argmax(&self.log_weights).ok_or(Error::NotInitialized)
    }

    /// Highest-weight pose.
    pub fn best_pose(&self) -> Result<&SpiderPose> {
        Ok(&self.poses[self.best_index()?])
    }

    /// Pose spread uniformly over the map with nominal sizes.
    fn random_pose<R: Rng + ?Sized>(&self, rng: &mut R) -> SpiderPose {
        let x = uniform_coordinate(rng, self.map.width());
        let y = uniform_coordinate(rng, self.map.height());
        let r = sample_normal(rng, RADIUS_PRIOR.0, RADIUS_PRIOR.1);
        let w = sample_normal(rng, WIDTH_PRIOR.0, WIDTH_PRIOR.1);
        let h = sample_normal(rng, HEIGHT_PRIOR.0, HEIGHT_PRIOR.1);
        SpiderPose::new(x, y, r, w, h, random_joints(rng))
    }

    /// Pose jittered around a random annotated circle (and rectangle size).
    fn informed_pose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<SpiderPose> {
        let circle = pick(&self.priors.circles, rng)?;
        let (pos_std, r_std) = CIRCLE_PRIOR_JITTER;
        let x = sample_normal(rng, circle[0], pos_std);
        let y = sample_normal(rng, circle[1], pos_std);
        let r = sample_normal(rng, circle[2], r_std);

        let (w, h) = match pick(&self.priors.rectangles, rng) {
            Some(rect) => (
                sample_normal(rng, rect[3], RECT_SIZE_JITTER),
                sample_normal(rng, rect[4], RECT_SIZE_JITTER),
            ),
            None => (
                sample_normal(rng, WIDTH_PRIOR.0, WIDTH_PRIOR.1),
                sample_normal(rng, HEIGHT_PRIOR.0, HEIGHT_PRIOR.1),
            ),
        };
        Some(SpiderPose::new(x, y, r, w, h, random_joints(rng)))
    }

    /// Diffuse a pose with the configured jitter.
    fn jitter<R: Rng + ?Sized>(&self, pose: &SpiderPose, rng: &mut R) -> SpiderPose {
        let c = &self.config;
        let mut joints = *pose.joints();
        for j in &mut joints {
            *j = sample_normal(rng, *j, c.angle_jitter);
        }
        SpiderPose::new(
            sample_normal(rng, pose.x(), c.position_jitter),
            sample_normal(rng, pose.y(), c.position_jitter),
            sample_normal(rng, pose.radius(), c.size_jitter),
            sample_normal(rng, pose.width(), c.size_jitter),
            sample_normal(rng, pose.height(), c.size_jitter),
            joints,
        )
    }
}

impl Estimator for ParticleFilter {
    fn name(&self) -> &'static str {
        "pf"
    }

    fn init(&mut self, num_particles: usize, informed: bool) -> Result<PartLists> {
        let informed = if informed && self.priors.circles.is_empty() {
            log::warn!("Informed init requested without circle priors, sampling uniformly");
            false
        } else {
            informed
        };

        let mut rng = StdRng::seed_from_u64(self.rng.random());
        let poses: Vec<SpiderPose> = (0..num_particles)
            .map(|_| {
                let informed_pose = if informed { self.informed_pose(&mut rng) } else { None };
                informed_pose.unwrap_or_else(|| self.random_pose(&mut rng))
            })
            .collect();

        let mut log_weights = Vec::with_capacity(poses.len());
        for pose in &poses {
            log_weights.push(self.score(pose));
        }
        self.poses = poses;
        self.log_weights = log_weights;

        let probs = normalize_log_weights(&self.log_weights);
        self.stats = FilterStats {
            generation: 0,
            effective_sample_size: effective_sample_size(&probs),
            best_log_likelihood: self.best_log_likelihood(),
        };
        log::info!(
            "Particle filter initialized: {} particles ({}), best log-likelihood {:.3}",
            num_particles,
            if informed { "informed" } else { "uniform" },
            self.stats.best_log_likelihood
        );

        Ok(PartLists::from_poses(&self.poses))
    }

    fn update(&mut self) -> Result<PartLists> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }
        let n = self.poses.len();
        let best = self.best_index()?;

        // Elite particle first, unmodified; every other one diffused with
        // its own generator
        let mut candidates = Vec::with_capacity(n);
        candidates.push(self.poses[best].clone());
        for (i, pose) in self.poses.iter().enumerate() {
            if i == best {
                continue;
            }
            let mut child = StdRng::seed_from_u64(self.rng.random());
            candidates.push(self.jitter(pose, &mut child));
        }

        let mut log_weights = Vec::with_capacity(n);
        for pose in &candidates {
            log_weights.push(self.score(pose));
        }

        let probs = normalize_log_weights(&log_weights);
        let keep = self.config.resampling.sample(&probs, n, &mut self.rng);

        self.poses = keep.iter().map(|&i| candidates[i].clone()).collect();
        self.log_weights = keep.iter().map(|&i| log_weights[i]).collect();

        self.stats.generation += 1;
        self.stats.effective_sample_size = effective_sample_size(&probs);
        self.stats.best_log_likelihood = self.best_log_likelihood();
        log::debug!(
            "Generation {}: ESS {:.1}/{}, best log-likelihood {:.3}",
            self.stats.generation,
            self.stats.effective_sample_size,
            n,
            self.stats.best_log_likelihood
        );

        Ok(PartLists::from_poses(&self.poses))
    }

    fn estimate(&self) -> Result<PartLists> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }
        let best = self.best_pose()?;
        Ok(PartLists::from_poses([best]))
    }
}

/// Uniform coordinate in `[0, extent - 1)`, or 0 for degenerate extents.
pub(crate) fn uniform_coordinate<R: Rng + ?Sized>(rng: &mut R, extent: usize) -> f64 {
    let hi = extent as f64 - 1.0;
    if hi > 0.0 { rng.random_range(0.0..hi) } else { 0.0 }
}

/// Inner joints as small offsets from their quadrant, outer joints near
/// straight.
fn random_joints<R: Rng + ?Sized>(rng: &mut R) -> [f64; NUM_JOINTS] {
    std::array::from_fn(|_| sample_normal(rng, 0.0, JOINT_SPREAD))
}

pub(crate) fn pick<'a, T, R: Rng + ?Sized>(items: &'a [T], rng: &mut R) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        Some(&items[rng.random_range(0..items.len())])
    }
}
