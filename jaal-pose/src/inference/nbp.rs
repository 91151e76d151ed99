//! Nonparametric belief propagation over the spider graph.
//!
//! Beliefs and messages are Gaussian mixtures. One `update` runs a fixed
//! two-pass schedule followed by a belief refresh:
//!
//! ```text
//! upward:    outer → inner (5..8 → 1..4), inner → root (1..4 → 0)
//! downward:  root → inner (0 → 1..4),     inner → outer (1..4 → 5..8)
//! beliefs:   b_t ← Gibbs( b_t · Π_s m_{s→t} ) scored by the unary of t
//! ```
//!
//! A message `s → t` is the Gibbs product of `b_s` with every message into
//! `s` except the one from `t`, each component pushed through `ψ_{s→t}`.

use std::sync::Arc;

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::estimator::Estimator;
use super::gibbs::GibbsSampler;
use super::graph::{NodeId, NodeKind, ROOT, SpiderGraph};
use super::mixture::{Gaussian, Mixture};
use super::particle_filter::{pick, seeded_rng, uniform_coordinate};
use super::potentials::PotentialNoise;
use crate::core::math::sample_normal;
use crate::error::{Error, Result};
use crate::map::OccupancyMap;
use crate::shapes::{LIKELIHOOD_FLOOR, Shape};
use crate::spider::{NUM_INNER, NUM_PARTS, PartLists, Priors};

/// Initialization jitter for root means `[x, y, r]`.
const CIRCLE_JITTER: [f64; 3] = [10.0, 10.0, 2.0];
/// Initialization jitter for link means `[x, y, theta, w, h]`.
const RECT_JITTER: [f64; 5] = [10.0, 10.0, 0.2, 2.0, 2.0];
/// Root radius for uninformed starts.
const DEFAULT_RADIUS: f64 = 10.0;
/// Link `[theta, w, h]` for uninformed starts.
const DEFAULT_LINK: [f64; 3] = [0.0, 27.0, 8.0];

/// Configuration for NBP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NbpConfig {
    /// Components per belief when the caller does not choose.
    pub num_particles: usize,

    /// Gibbs label sweeps per product sample.
    pub gibbs_sweeps: usize,

    /// Variance of each Gibbs output component.
    pub sample_variance: f64,

    /// Message component variance `[x, y, theta, w, h]`.
    /// Root messages use the x, y and w entries.
    pub message_variance: Vec<f64>,

    /// Random seed for deterministic behavior (0 for OS entropy).
    pub seed: u64,
}

impl Default for NbpConfig {
    fn default() -> Self {
        Self {
            num_particles: 20,
            gibbs_sweeps: 3,
            sample_variance: 0.1,
            message_variance: vec![4.0, 4.0, 0.1, 2.0, 2.0],
            seed: 0,
        }
    }
}

impl NbpConfig {
    /// Message covariance for a node of the given kind.
    fn message_cov(&self, kind: NodeKind) -> Result<DVector<f64>> {
        let mv = &self.message_variance;
        Error::check_dim(5, mv.len(), "NbpConfig::message_variance")?;
        if let Some(bad) = mv.iter().find(|v| !(**v > 0.0 && v.is_finite())) {
            return Err(Error::InvalidParameter(format!(
                "message_variance entries must be positive and finite, got {}",
                bad
            )));
        }
        Ok(match kind {
            NodeKind::Root => DVector::from_vec(vec![mv[0], mv[1], mv[3]]),
            NodeKind::Inner | NodeKind::Outer => DVector::from_column_slice(mv),
        })
    }
}

/// Part likelihood of a parameter vector, floored on malformed input.
fn unary(map: &OccupancyMap, x: &DVector<f64>) -> f64 {
    Shape::from_params(x.as_slice())
        .map(|s| s.likelihood(map))
        .unwrap_or(LIKELIHOOD_FLOOR)
}

/// Copy `inputs` with headings unwrapped around the circular mean of the
/// first mixture, so Gaussian products never straddle the 0/2π seam.
fn aligned(kind: NodeKind, inputs: &[&Mixture]) -> Result<Vec<Mixture>> {
    let mut out: Vec<Mixture> = inputs.iter().map(|&m| m.clone()).collect();
    let Some(axis) = kind.heading_axis() else {
        return Ok(out);
    };
    let reference = out
        .iter()
        .find_map(|m| m.circular_mean(axis))
        .unwrap_or(0.0);
    for m in &mut out {
        m.unwrap_axis(axis, reference)?;
    }
    Ok(out)
}

/// Jitter each coordinate of `mean` independently.
fn jitter<R: Rng + ?Sized>(rng: &mut R, mean: &[f64], std: &[f64]) -> DVector<f64> {
    DVector::from_iterator(
        mean.len(),
        mean.iter().zip(std).map(|(&m, &s)| sample_normal(rng, m, s)),
    )
}

/// NBP pose estimator.
#[derive(Debug)]
pub struct NbpEstimator {
    config: NbpConfig,
    map: Arc<OccupancyMap>,
    priors: Priors,
    graph: SpiderGraph,
    rng: StdRng,
    num_particles: usize,
    generation: u64,
}

impl NbpEstimator {
    /// Create an uninitialized estimator.
    pub fn new(config: NbpConfig, noise: PotentialNoise, map: Arc<OccupancyMap>) -> Self {
        let rng = seeded_rng(config.seed);
        Self {
            config,
            map,
            priors: Priors::default(),
            graph: SpiderGraph::new(noise),
            rng,
            num_particles: 0,
            generation: 0,
        }
    }

    /// Attach annotated priors for informed initialization.
    pub fn with_priors(mut self, priors: Priors) -> Self {
        self.priors = priors;
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &NbpConfig {
        &self.config
    }

    /// Underlying graph.
    pub fn graph(&self) -> &SpiderGraph {
        &self.graph
    }

    /// Completed updates since the last `init`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn is_initialized(&self) -> bool {
        self.num_particles > 0
    }

    fn gibbs(&self) -> GibbsSampler {
        GibbsSampler {
            num_samples: self.num_particles,
            sweeps: self.config.gibbs_sweeps,
            sample_variance: self.config.sample_variance,
        }
    }

    fn uniform_xy(&mut self) -> (f64, f64) {
        let (width, height) = self.map.dimensions();
        let x = uniform_coordinate(&mut self.rng, width);
        let y = uniform_coordinate(&mut self.rng, height);
        (x, y)
    }

    fn root_means(&mut self, n: usize, informed: bool) -> Vec<DVector<f64>> {
        let mut means = Vec::with_capacity(n);
        for _ in 0..n {
            let prior = if informed { pick(&self.priors.circles, &mut self.rng).copied() } else { None };
            let center = match prior {
                Some(c) => c,
                None => {
                    let (x, y) = self.uniform_xy();
                    [x, y, DEFAULT_RADIUS]
                }
            };
            means.push(jitter(&mut self.rng, &center, &CIRCLE_JITTER));
        }
        means
    }

    fn link_means(&mut self, n: usize, informed: bool) -> Vec<DVector<f64>> {
        let mut means = Vec::with_capacity(n);
        for _ in 0..n {
            let prior = if informed { pick(&self.priors.rectangles, &mut self.rng).copied() } else { None };
            let center = match prior {
                Some(r) => r,
                None => {
                    let (x, y) = self.uniform_xy();
                    let [theta, w, h] = DEFAULT_LINK;
                    [x, y, theta, w, h]
                }
            };
            means.push(jitter(&mut self.rng, &center, &RECT_JITTER));
        }
        means
    }

    /// Compute and store the message `from → to`.
    fn send_message(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let psi = *self.graph.potential(from, to).ok_or_else(|| {
            Error::InvalidParameter(format!("no edge {} -> {}", from, to))
        })?;
        let gibbs = self.gibbs();

        let product = {
            let mut inputs = vec![self.graph.belief(from)?];
            inputs.extend(self.graph.neighbour_msgs(from, Some(to)));
            let inputs = aligned(NodeKind::of(from), &inputs)?;
            let refs: Vec<&Mixture> = inputs.iter().collect();
            let map = &self.map;
            gibbs.product(&refs, |x| unary(map, x), &mut self.rng)?
        };

        let cov = self.config.message_cov(NodeKind::of(to))?;
        let mut components = Vec::with_capacity(product.len());
        for mean in product.means() {
            let predicted = psi.sample(&mean, &mut self.rng)?;
            components.push(Gaussian::new(predicted, cov.clone())?);
        }
        let message = Mixture::from_components(components, product.weights().to_vec())?;
        self.graph.update_message(from, to, message)
    }

    /// Refresh the belief of `id` from its incoming messages.
    fn update_belief(&mut self, id: NodeId) -> Result<()> {
        let gibbs = self.gibbs();
        let product = {
            let mut inputs = vec![self.graph.belief(id)?];
            inputs.extend(self.graph.neighbour_msgs(id, None));
            let inputs = aligned(NodeKind::of(id), &inputs)?;
            let refs: Vec<&Mixture> = inputs.iter().collect();
            let map = &self.map;
            gibbs.product(&refs, |x| unary(map, x), &mut self.rng)?
        };

        // Widen back to the node's default spread so the next pass can move
        let cov = NodeKind::of(id).default_cov();
        let components = product
            .means()
            .into_iter()
            .map(|m| Gaussian::new(m, cov.clone()))
            .collect::<Result<Vec<_>>>()?;
        let belief = Mixture::from_components(components, product.weights().to_vec())?;
        self.graph.set_belief(id, belief)
    }
}

impl Estimator for NbpEstimator {
    fn name(&self) -> &'static str {
        "nbp"
    }

    fn init(&mut self, num_particles: usize, informed: bool) -> Result<PartLists> {
        self.config.message_cov(NodeKind::Inner)?;

        let informed = if informed && self.priors.is_empty() {
            log::warn!("Informed init requested without priors, sampling uniformly");
            false
        } else {
            informed
        };

        self.graph.clear_messages();
        let root = self.root_means(num_particles, informed);
        self.graph.set_belief_from_means(ROOT, &root)?;
        for id in 1..NUM_PARTS {
            let means = self.link_means(num_particles, informed);
            self.graph.set_belief_from_means(id, &means)?;
        }

        self.num_particles = num_particles;
        self.generation = 0;
        log::info!(
            "NBP initialized: {} components per node ({})",
            num_particles,
            if informed { "informed" } else { "uniform" }
        );
        Ok(self.graph.to_part_lists())
    }

    fn update(&mut self) -> Result<PartLists> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }

        for inner in 1..=NUM_INNER {
            self.send_message(inner + NUM_INNER, inner)?;
        }
        for inner in 1..=NUM_INNER {
            self.send_message(inner, ROOT)?;
        }
        for inner in 1..=NUM_INNER {
            self.send_message(ROOT, inner)?;
        }
        for inner in 1..=NUM_INNER {
            self.send_message(inner, inner + NUM_INNER)?;
        }
        for id in 0..NUM_PARTS {
            self.update_belief(id)?;
        }

        self.generation += 1;
        log::debug!("NBP generation {} complete", self.generation);
        Ok(self.graph.to_part_lists())
    }

    fn estimate(&self) -> Result<PartLists> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }
        let mut lists = PartLists::new();
        for node in self.graph.nodes() {
            let best = node.belief().best_component().ok_or(Error::NotInitialized)?;
            lists.push(node.id(), node.kind().reported(best.mean()));
        }
        Ok(lists)
    }
}
