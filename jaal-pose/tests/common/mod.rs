//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use jaal_pose::{NbpConfig, NbpEstimator, OccupancyMap, ParticleFilter, ParticleFilterConfig, PotentialNoise};

/// Route `log` output to the test harness once.
pub fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

/// Map with every cell occupied.
pub fn full_map(width: usize, height: usize) -> OccupancyMap {
    OccupancyMap::from_fn(width, height, |_, _| true).unwrap()
}

/// Map with one occupied disc.
pub fn disc_map(width: usize, height: usize, cx: f64, cy: f64, radius: f64) -> OccupancyMap {
    OccupancyMap::from_fn(width, height, |i, j| {
        let dx = i as f64 - cx;
        let dy = j as f64 - cy;
        dx * dx + dy * dy <= radius * radius
    }).unwrap()
}

/// Seeded particle filter over `map`.
pub fn seeded_filter(map: OccupancyMap, seed: u64) -> ParticleFilter {
    let config = ParticleFilterConfig {
        seed,
        ..Default::default()
    };
    ParticleFilter::new(config, Arc::new(map))
}

/// Seeded NBP estimator over `map` with a light Gibbs schedule.
pub fn seeded_nbp(map: OccupancyMap, seed: u64) -> NbpEstimator {
    let config = NbpConfig {
        gibbs_sweeps: 1,
        seed,
        ..Default::default()
    };
    NbpEstimator::new(config, PotentialNoise::default(), Arc::new(map))
}
