//! Weight normalization.

use crate::error::{Error, Result};

/// Turn log-likelihoods into probabilities.
///
/// Uses the log-sum-exp shift: subtract the maximum, exponentiate, divide.
/// Falls back to uniform weights when the maximum is not finite or the
/// sum vanishes.
pub fn normalize_log_weights(log_weights: &[f64]) -> Vec<f64> {
    if log_weights.is_empty() {
        return Vec::new();
    }

    let max_log_weight = log_weights
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    let uniform = || vec![1.0 / log_weights.len() as f64; log_weights.len()];

    if !max_log_weight.is_finite() {
        log::warn!("No finite log-weight, using uniform weights");
        return uniform();
    }

    let exp: Vec<f64> = log_weights
        .iter()
        .map(|&lw| (lw - max_log_weight).exp())
        .collect();
    let sum: f64 = exp.iter().sum();

    if sum == 0.0 || !sum.is_finite() {
        return uniform();
    }
    exp.into_iter().map(|w| w / sum).collect()
}

/// Normalize non-negative linear weights to sum to one.
///
/// Negative or NaN weights are rejected. A zero sum yields uniform weights.
pub fn normalize_weights(weights: &[f64]) -> Result<Vec<f64>> {
    if let Some(bad) = weights.iter().find(|w| !(**w >= 0.0)) {
        return Err(Error::InvalidParameter(format!(
            "weights must be non-negative, got {}",
            bad
        )));
    }

    let sum: f64 = weights.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        let n = weights.len() as f64;
        return Ok(vec![1.0 / n; weights.len()]);
    }
    Ok(weights.iter().map(|w| w / sum).collect())
}

/// Effective sample size `1 / Σ wᵢ²` of normalized weights.
pub fn effective_sample_size(weights: &[f64]) -> f64 {
    let sum_sq: f64 = weights.iter().map(|w| w * w).sum();
    if sum_sq > 1e-300 { 1.0 / sum_sq } else { 0.0 }
}

/// Index of the largest weight (first one on ties).
pub fn argmax(weights: &[f64]) -> Option<usize> {
    weights
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &w)| match best {
            Some((_, bw)) if bw >= w => best,
            _ => Some((i, w)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_log_weights_sums_to_one() {
        let w = normalize_log_weights(&[-1000.0, -1001.0, -999.5, -1200.0]);
        assert_relative_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(w[2] > w[0] && w[0] > w[1] && w[1] > w[3]);
    }

    #[test]
    fn test_normalize_log_weights_ratio() {
        let w = normalize_log_weights(&[0.0, 2.0_f64.ln()]);
        assert_relative_eq!(w[0], 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(w[1], 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_log_weights_uniform_fallback() {
        let w = normalize_log_weights(&[f64::NEG_INFINITY; 4]);
        assert_eq!(w, vec![0.25; 4]);
        assert!(normalize_log_weights(&[]).is_empty());
    }

    #[test]
    fn test_normalize_weights() {
        let w = normalize_weights(&[1.0, 3.0]).unwrap();
        assert_eq!(w, vec![0.25, 0.75]);
        assert_eq!(normalize_weights(&[0.0, 0.0]).unwrap(), vec![0.5, 0.5]);
        assert!(normalize_weights(&[1.0, -0.1]).is_err());
        assert!(normalize_weights(&[f64::NAN]).is_err());
    }

    #[test]
    fn test_effective_sample_size() {
        assert_relative_eq!(effective_sample_size(&[0.25; 4]), 4.0);
        assert_relative_eq!(effective_sample_size(&[1.0, 0.0, 0.0]), 1.0);
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 0.5, 0.5, 0.2]), Some(1));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[-3.0, -1.0]), Some(1));
    }
}
