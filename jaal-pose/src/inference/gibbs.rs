//! Gibbs-sampling approximation of a product of Gaussian mixtures.
//!
//! The exact product of `d` mixtures with `M` components each has `M^d`
//! components. Instead, each output sample runs a short Gibbs chain over
//! one component label per input mixture:
//!
//! ```text
//! for sweep in 0..k:
//!     for j in 0..d:
//!         N* = Π_{l ≠ j} N_l[label_l]
//!         p(label_j = i) ∝ w_i · N_i(μ) · N*(μ) / N_{i*}(μ) · f(μ),  μ = mean(N_i · N*)
//! x ~ Π_j N_j[label_j],  weight = f(x) / f(mean)
//! ```
//!
//! `f` is an external score (the unary likelihood of the node). Output
//! components are isotropic with the configured sample variance.

use nalgebra::DVector;
use rand::Rng;

use super::mixture::{Gaussian, Mixture};
use super::resampling::sample_index;
use super::weights::normalize_log_weights;
use crate::error::{Error, Result};

/// Parameters of the Gibbs product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GibbsSampler {
    /// Output components `M`.
    pub num_samples: usize,
    /// Label sweeps `k` per output sample.
    pub sweeps: usize,
    /// Variance of every output component.
    pub sample_variance: f64,
}

impl Default for GibbsSampler {
    fn default() -> Self {
        Self {
            num_samples: 20,
            sweeps: 3,
            sample_variance: 0.1,
        }
    }
}

impl GibbsSampler {
    /// Approximate the product of `mixtures`, reweighted by `score`.
    ///
    /// Every mixture must be non-empty and share one dimension.
    pub fn product<F, R>(&self, mixtures: &[&Mixture], mut score: F, rng: &mut R) -> Result<Mixture>
    where
        F: FnMut(&DVector<f64>) -> f64,
        R: Rng + ?Sized,
    {
        let first = mixtures
            .first()
            .ok_or_else(|| Error::InvalidParameter("Gibbs product of zero mixtures".to_string()))?;
        let dim = first.dim();
        for m in mixtures {
            Error::check_dim(dim, m.dim(), "GibbsSampler::product")?;
            if m.is_empty() {
                return Err(Error::InvalidParameter(
                    "Gibbs product over an empty mixture".to_string(),
                ));
            }
        }

        let mut components = Vec::with_capacity(self.num_samples);
        let mut weights = Vec::with_capacity(self.num_samples);

        for _ in 0..self.num_samples {
            let labels = self.run_chain(mixtures, &mut score, rng)?;
            let selected = Gaussian::product_all(
                mixtures.iter().zip(&labels).map(|(m, &l)| &m.components()[l]),
            )?;

            let x = selected.sample(rng);
            let at_mean = score(selected.mean());
            let w = if at_mean > 0.0 { score(&x) / at_mean } else { 0.0 };

            components.push(Gaussian::isotropic(x, self.sample_variance)?);
            weights.push(if w.is_finite() && w > 0.0 { w } else { 0.0 });
        }

        if components.is_empty() {
            return Ok(Mixture::new(dim));
        }
        Mixture::from_components(components, weights)
    }

    /// One Gibbs chain; returns a component label per mixture.
    fn run_chain<F, R>(&self, mixtures: &[&Mixture], score: &mut F, rng: &mut R) -> Result<Vec<usize>>
    where
        F: FnMut(&DVector<f64>) -> f64,
        R: Rng + ?Sized,
    {
        let mut labels = Vec::with_capacity(mixtures.len());
        for m in mixtures {
            labels.push(sample_index(m.weights(), rng).unwrap_or(0));
        }

        for _ in 0..self.sweeps {
            for j in 0..mixtures.len() {
                let others: Vec<&Gaussian> = mixtures
                    .iter()
                    .zip(&labels)
                    .enumerate()
                    .filter(|(l, _)| *l != j)
                    .map(|(_, (m, &label))| &m.components()[label])
                    .collect();
                // With a single mixture there is nothing to condition on
                let star = if others.is_empty() {
                    None
                } else {
                    Some(Gaussian::product_all(others)?)
                };

                let mixture = mixtures[j];
                let mut log_weights = Vec::with_capacity(mixture.len());
                for (comp, &w) in mixture.components().iter().zip(mixture.weights()) {
                    let lw = match &star {
                        Some(star) => {
                            let joint = comp.product(star)?;
                            let f = score(joint.mean());
                            w.ln() + Gaussian::log_product_weight(comp, star, &joint)? + f.ln()
                        }
                        None => w.ln() + score(comp.mean()).ln(),
                    };
                    log_weights.push(if lw.is_nan() { f64::NEG_INFINITY } else { lw });
                }

                let probs = normalize_log_weights(&log_weights);
                labels[j] = sample_index(&probs, rng).unwrap_or(0);
            }
        }
        Ok(labels)
    }
}
