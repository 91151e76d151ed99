//! Diagonal Gaussians and Gaussian mixtures.
//!
//! Covariances are stored as their diagonal. Mixture weights are kept
//! normalized after every mutation.

use nalgebra::DVector;
use rand::Rng;
use rand_distr::StandardNormal;

use super::resampling::sample_index;
use super::weights::{argmax, normalize_weights};
use crate::core::math::{circular_mean, normal_log_pdf, unwrap_angle};
use crate::error::{Error, Result};

// ============================================================================
// Gaussian
// ============================================================================

/// Multivariate normal with diagonal covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct Gaussian {
    mean: DVector<f64>,
    cov: DVector<f64>,
}

impl Gaussian {
    /// Create a Gaussian. Variances must be positive and match the mean.
    pub fn new(mean: DVector<f64>, cov: DVector<f64>) -> Result<Self> {
        Error::check_dim(mean.len(), cov.len(), "Gaussian::new")?;
        if let Some(bad) = cov.iter().find(|v| !(**v > 0.0 && v.is_finite())) {
            return Err(Error::InvalidParameter(format!(
                "variance must be positive and finite, got {}",
                bad
            )));
        }
        Ok(Self { mean, cov })
    }

    /// Create a Gaussian from slices.
    pub fn from_slices(mean: &[f64], cov: &[f64]) -> Result<Self> {
        Self::new(DVector::from_column_slice(mean), DVector::from_column_slice(cov))
    }

    /// Same variance on every axis.
    pub fn isotropic(mean: DVector<f64>, variance: f64) -> Result<Self> {
        let cov = DVector::from_element(mean.len(), variance);
        Self::new(mean, cov)
    }

    /// Dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Mean vector.
    #[inline]
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Covariance diagonal.
    #[inline]
    pub fn cov(&self) -> &DVector<f64> {
        &self.cov
    }

    /// Log-density at `x`.
    pub fn log_pdf(&self, x: &DVector<f64>) -> Result<f64> {
        Error::check_dim(self.dim(), x.len(), "Gaussian::pdf")?;
        Ok(x.iter()
            .zip(self.mean.iter())
            .zip(self.cov.iter())
            .map(|((&xi, &mi), &vi)| normal_log_pdf(xi, mi, vi))
            .sum())
    }

    /// Density at `x`.
    pub fn pdf(&self, x: &DVector<f64>) -> Result<f64> {
        Ok(self.log_pdf(x)?.exp())
    }

    /// Draw `mean + sqrt(cov) ⊙ z` with `z ~ N(0, I)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> DVector<f64> {
        DVector::from_iterator(
            self.dim(),
            self.mean.iter().zip(self.cov.iter()).map(|(m, v)| {
                let z: f64 = rng.sample(StandardNormal);
                m + v.sqrt() * z
            }),
        )
    }

    /// Exact product of two diagonal Gaussians (precision-weighted).
    ///
    /// ```text
    /// Σ = (Σa⁻¹ + Σb⁻¹)⁻¹
    /// μ = Σ (Σa⁻¹ μa + Σb⁻¹ μb)
    /// ```
    pub fn product(&self, other: &Gaussian) -> Result<Gaussian> {
        Self::product_all([self, other])
    }

    /// Exact product of any number of diagonal Gaussians.
    pub fn product_all<'a>(gaussians: impl IntoIterator<Item = &'a Gaussian>) -> Result<Gaussian> {
        let mut iter = gaussians.into_iter();
        let first = iter.next().ok_or_else(|| {
            Error::InvalidParameter("product of zero Gaussians".to_string())
        })?;

        let mut precision = first.cov.map(|v| 1.0 / v);
        let mut weighted = first.mean.component_div(&first.cov);
        for g in iter {
            Error::check_dim(first.dim(), g.dim(), "Gaussian::product")?;
            precision += g.cov.map(|v| 1.0 / v);
            weighted += g.mean.component_div(&g.cov);
        }

        let cov = precision.map(|p| 1.0 / p);
        let mean = weighted.component_mul(&cov);
        Ok(Gaussian { mean, cov })
    }

    /// Log of the product-weight identity
    /// `N_a(μ) · N_b(μ) / N_c(μ)` evaluated at the product mean `μ`.
    pub fn log_product_weight(a: &Gaussian, b: &Gaussian, c: &Gaussian) -> Result<f64> {
        let mu = c.mean();
        Ok(a.log_pdf(mu)? + b.log_pdf(mu)? - c.log_pdf(mu)?)
    }
}

// ============================================================================
// Mixture
// ============================================================================

/// Weighted mixture of diagonal Gaussians of a fixed dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Mixture {
    dim: usize,
    components: Vec<Gaussian>,
    weights: Vec<f64>,
}

impl Mixture {
    /// Empty mixture over `dim`-dimensional vectors.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            components: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Build from components and (unnormalized) weights.
    pub fn from_components(components: Vec<Gaussian>, weights: Vec<f64>) -> Result<Self> {
        Error::check_dim(components.len(), weights.len(), "Mixture::from_components")?;
        let dim = components
            .first()
            .map(Gaussian::dim)
            .ok_or_else(|| Error::InvalidParameter("mixture needs a component".to_string()))?;
        for g in &components {
            Error::check_dim(dim, g.dim(), "Mixture::from_components")?;
        }
        let weights = normalize_weights(&weights)?;
        Ok(Self {
            dim,
            components,
            weights,
        })
    }

    /// Equal-weight mixture with the same variance around each mean.
    pub fn from_means(means: &[DVector<f64>], cov: &DVector<f64>) -> Result<Self> {
        let components = means
            .iter()
            .map(|m| Gaussian::new(m.clone(), cov.clone()))
            .collect::<Result<Vec<_>>>()?;
        let n = components.len();
        Self::from_components(components, vec![1.0; n])
    }

    /// Dimension of every component.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of components.
    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True when there are no components.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Components.
    pub fn components(&self) -> &[Gaussian] {
        &self.components
    }

    /// Normalized weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Component means.
    pub fn means(&self) -> Vec<DVector<f64>> {
        self.components.iter().map(|g| g.mean().clone()).collect()
    }

    /// Highest-weight component.
    pub fn best_component(&self) -> Option<&Gaussian> {
        argmax(&self.weights).map(|i| &self.components[i])
    }

    /// Weighted circular mean of the component means along `axis`.
    pub fn circular_mean(&self, axis: usize) -> Option<f64> {
        if axis >= self.dim {
            return None;
        }
        circular_mean(
            self.components
                .iter()
                .zip(&self.weights)
                .map(|(g, &w)| (g.mean[axis], w)),
        )
    }

    /// Shift every mean's `axis` entry by whole turns into
    /// `(reference - π, reference + π]`.
    pub fn unwrap_axis(&mut self, axis: usize, reference: f64) -> Result<()> {
        if axis >= self.dim {
            return Err(Error::InvalidParameter(format!(
                "axis {} out of range for dimension {}",
                axis, self.dim
            )));
        }
        for g in &mut self.components {
            g.mean[axis] = unwrap_angle(g.mean[axis], reference);
        }
        Ok(())
    }

    fn renormalize(&mut self) -> Result<()> {
        self.weights = normalize_weights(&self.weights)?;
        Ok(())
    }

    /// Add a component with a raw weight relative to the current
    /// normalized weights, then renormalize.
    pub fn push(&mut self, component: Gaussian, weight: f64) -> Result<()> {
        Error::check_dim(self.dim, component.dim(), "Mixture::push")?;
        if !(weight >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "weight must be non-negative, got {}",
                weight
            )));
        }
        self.components.push(component);
        self.weights.push(weight);
        self.renormalize()
    }

    /// Append every component of `other`, keeping component and weight
    /// order aligned, then renormalize.
    pub fn extend(&mut self, other: &Mixture) -> Result<()> {
        if other.is_empty() {
            return Ok(());
        }
        Error::check_dim(self.dim, other.dim, "Mixture::extend")?;
        self.components.extend(other.components.iter().cloned());
        self.weights.extend_from_slice(&other.weights);
        self.renormalize()
    }

    /// Mixture density at `x`.
    pub fn pdf(&self, x: &DVector<f64>) -> Result<f64> {
        Error::check_dim(self.dim, x.len(), "Mixture::pdf")?;
        let mut p = 0.0;
        for (g, w) in self.components.iter().zip(&self.weights) {
            p += w * g.pdf(x)?;
        }
        Ok(p)
    }

    /// Pick a component by weight and draw from it.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<DVector<f64>> {
        let idx = sample_index(&self.weights, rng)
            .ok_or_else(|| Error::InvalidParameter("cannot sample an empty mixture".to_string()))?;
        Ok(self.components[idx].sample(rng))
    }

    /// Exact pairwise product: one component per pair `(i, j)`, weighted
    /// `w_i · N_i(μ) · w_j · N_j(μ) / N_ij(μ)`.
    pub fn product(&self, other: &Mixture) -> Result<Mixture> {
        Error::check_dim(self.dim, other.dim, "Mixture::product")?;
        let mut components = Vec::with_capacity(self.len() * other.len());
        let mut log_weights = Vec::with_capacity(self.len() * other.len());

        for (a, wa) in self.components.iter().zip(&self.weights) {
            for (b, wb) in other.components.iter().zip(&other.weights) {
                let c = a.product(b)?;
                log_weights.push(wa.ln() + wb.ln() + Gaussian::log_product_weight(a, b, &c)?);
                components.push(c);
            }
        }

        if components.is_empty() {
            return Ok(Mixture::new(self.dim));
        }
        let weights = super::weights::normalize_log_weights(&log_weights);
        Mixture::from_components(components, weights)
    }
}
