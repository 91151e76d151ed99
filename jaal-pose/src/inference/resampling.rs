//! Resampling strategies.
//!
//! Both samplers return indices into the weight slice. Weights need not be
//! normalized; non-positive totals are treated as uniform.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::weights::argmax;

/// Resampling algorithm used by the particle filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResamplingStrategy {
    /// Systematic (low-variance) resampling
    #[default]
    LowVariance,
    /// Independent categorical draws, best index kept first
    Multinomial,
}

impl ResamplingStrategy {
    /// Draw `n` indices according to this strategy.
    pub fn sample<R: Rng + ?Sized>(self, weights: &[f64], n: usize, rng: &mut R) -> Vec<usize> {
        match self {
            ResamplingStrategy::LowVariance => low_variance_sample(weights, n, rng),
            ResamplingStrategy::Multinomial => importance_sample(weights, n, true, rng),
        }
    }
}

/// Cumulative weights scaled to end at 1.0.
fn cumulative(weights: &[f64]) -> Vec<f64> {
    let n = weights.len();
    let total: f64 = weights.iter().sum();
    let mut acc = 0.0;
    if total > 0.0 && total.is_finite() {
        weights
            .iter()
            .map(|w| {
                acc += w / total;
                acc
            })
            .collect()
    } else {
        (1..=n).map(|i| i as f64 / n as f64).collect()
    }
}

/// First index whose cumulative weight exceeds `target`, clamped to the last.
#[inline]
fn select(cumulative: &[f64], target: f64) -> usize {
    cumulative
        .partition_point(|&c| c <= target)
        .min(cumulative.len() - 1)
}

/// Low-variance (systematic) resampling.
///
/// One uniform offset `u ∈ [0, 1/n)`; index `i` picks the first particle
/// whose cumulative weight exceeds `u + i/n`.
pub fn low_variance_sample<R: Rng + ?Sized>(weights: &[f64], n: usize, rng: &mut R) -> Vec<usize> {
    if weights.is_empty() || n == 0 {
        return Vec::new();
    }
    let cumulative = cumulative(weights);
    let step = 1.0 / n as f64;
    let u = rng.random::<f64>() * step;

    (0..n)
        .map(|i| select(&cumulative, u + i as f64 * step))
        .collect()
}

/// Multinomial importance sampling.
///
/// With `keep_best`, the index of the largest weight is always the first
/// entry and the remaining `n - 1` are drawn independently.
pub fn importance_sample<R: Rng + ?Sized>(
    weights: &[f64],
    n: usize,
    keep_best: bool,
    rng: &mut R,
) -> Vec<usize> {
    if weights.is_empty() || n == 0 {
        return Vec::new();
    }
    let cumulative = cumulative(weights);
    let mut indices = Vec::with_capacity(n);

    if keep_best && let Some(best) = argmax(weights) {
        indices.push(best);
    }
    while indices.len() < n {
        indices.push(select(&cumulative, rng.random::<f64>()));
    }
    indices
}

/// Draw a single categorical index.
pub fn sample_index<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    importance_sample(weights, 1, false, rng).first().copied()
}
