//! Mathematical primitives.
//!
//! Angles in this crate live in `[0, 2π)`; link headings are reported in
//! that range.

use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::{PI, TAU};

/// Normalize angle to [0, 2π).
///
/// # Example
/// ```
/// use jaal_pose::core::math::normalize_angle;
/// use std::f64::consts::PI;
///
/// assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-9);
/// assert!((normalize_angle(-PI / 2.0) - 1.5 * PI).abs() < 1e-9);
/// ```
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if a >= TAU { 0.0 } else { a }
}

/// Shift `angle` by whole turns into `(reference - π, reference + π]`.
///
/// Headings multiplied as linear quantities must first be brought onto
/// the same branch, or values either side of 0/2π average to about π.
#[inline]
pub fn unwrap_angle(angle: f64, reference: f64) -> f64 {
    let d = normalize_angle(angle - reference);
    if d > PI { reference + d - TAU } else { reference + d }
}

/// Weighted circular mean of `(angle, weight)` pairs.
///
/// Returns `None` when the weighted unit vectors cancel out.
pub fn circular_mean(angles: impl IntoIterator<Item = (f64, f64)>) -> Option<f64> {
    let (mut s, mut c) = (0.0, 0.0);
    for (a, w) in angles {
        s += w * a.sin();
        c += w * a.cos();
    }
    if s.hypot(c) < 1e-12 {
        None
    } else {
        Some(normalize_angle(s.atan2(c)))
    }
}

/// Log-density of a 1-D normal at `x`.
#[inline]
pub fn normal_log_pdf(x: f64, mean: f64, variance: f64) -> f64 {
    let d = x - mean;
    -0.5 * (d * d / variance + (TAU * variance).ln())
}

/// Draw from `N(mean, std²)`. A non-positive `std` returns `mean`.
#[inline]
pub fn sample_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std: f64) -> f64 {
    if std <= 0.0 {
        return mean;
    }
    let z: f64 = rng.sample(StandardNormal);
    mean + std * z
}
