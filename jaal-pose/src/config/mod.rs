//! Unified configuration loading.
//!
//! Every section is optional and falls back to its defaults, so an empty
//! file is a valid configuration.
//!
//! ## Configuration Sections
//!
//! | Section | Type |
//! |---------|------|
//! | `[filter]` | [`ParticleFilterConfig`] |
//! | `[nbp]` | [`NbpConfig`] |
//! | `[potential]` | [`PotentialNoise`] |
//!
//! ## Example TOML
//!
//! ```toml
//! [filter]
//! num_particles = 50
//! resampling = "low_variance"   # or "multinomial"
//! seed = 0                      # 0 = OS entropy
//!
//! [nbp]
//! gibbs_sweeps = 3
//! message_variance = [4.0, 4.0, 0.1, 2.0, 2.0]
//!
//! [potential]
//! position = 10.0
//! angle = 0.26
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::inference::{NbpConfig, ParticleFilterConfig, PotentialNoise};

/// Full estimator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JaalConfig {
    /// Particle filter settings
    #[serde(default)]
    pub filter: ParticleFilterConfig,

    /// NBP settings
    #[serde(default)]
    pub nbp: NbpConfig,

    /// Pairwise potential noise
    #[serde(default)]
    pub potential: PotentialNoise,
}

impl JaalConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load from `path` if it exists and parses, otherwise use defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Using default config ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml: &str) -> Result<Self> {
        Ok(toml::from_str(toml)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::inference::ResamplingStrategy;
    use std::io::Write;

    #[test]
    fn test_empty_is_default() {
        assert_eq!(JaalConfig::from_toml("").unwrap(), JaalConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = JaalConfig::from_toml(
            r#"
            [filter]
            num_particles = 12
            resampling = "multinomial"

            [potential]
            angle = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.filter.num_particles, 12);
        assert_eq!(config.filter.resampling, ResamplingStrategy::Multinomial);
        assert_eq!(config.filter.angle_jitter, 0.1);
        assert_eq!(config.potential.angle, 0.5);
        assert_eq!(config.potential.position, 10.0);
        assert_eq!(config.nbp, NbpConfig::default());
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = JaalConfig::from_toml("[filter]\nnum_particles = \"many\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[nbp]\ngibbs_sweeps = 5\nseed = 9").unwrap();
        let config = JaalConfig::load(file.path()).unwrap();
        assert_eq!(config.nbp.gibbs_sweeps, 5);
        assert_eq!(config.nbp.seed, 9);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = JaalConfig::load_or_default(dir.path().join("missing.toml"));
        assert_eq!(config, JaalConfig::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = JaalConfig::default();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(JaalConfig::from_toml(&text).unwrap(), config);
    }
}
