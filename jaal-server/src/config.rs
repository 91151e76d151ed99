//! Server configuration.
//!
//! The `[server]` section configures the listener and inputs; the
//! estimator sections (`[filter]`, `[nbp]`, `[potential]`) are shared with
//! the library.
//!
//! ```toml
//! [server]
//! bind_address = "127.0.0.1:8080"
//! map_path = "observation.txt"
//! priors_path = "priors.json"
//! algorithm = "pf"            # or "nbp"
//! default_particles = 10
//! max_particles = 10000
//!
//! [filter]
//! num_particles = 50
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use jaal_pose::JaalConfig;

/// Estimation strategy served to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Particle filter
    #[default]
    Pf,
    /// Nonparametric belief propagation
    Nbp,
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// TCP bind address
    pub bind_address: String,

    /// Occupancy text file (empty map when unset or unreadable)
    pub map_path: Option<PathBuf>,

    /// Annotated priors JSON
    pub priors_path: Option<PathBuf>,

    /// Strategy behind every connection
    pub algorithm: Algorithm,

    /// Particle count for `init` requests that omit `num_particles`
    pub default_particles: usize,

    /// Largest particle count a client may request
    pub max_particles: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            map_path: None,
            priors_path: None,
            algorithm: Algorithm::Pf,
            default_particles: 10,
            max_particles: 10_000,
        }
    }
}

/// Full server configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listener and inputs
    #[serde(default)]
    pub server: ServerSection,

    /// Estimator settings
    #[serde(flatten)]
    pub estimator: JaalConfig,
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load `path` when it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            log::info!("Using config: {}", path.display());
            Self::load(path)
        } else {
            log::warn!("Config {} not found, using defaults", path.display());
            Ok(Self::default())
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
    use crate::error::ServerError;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
        assert_eq!(config.server.algorithm, Algorithm::Pf);
        assert_eq!(config.server.default_particles, 10);
        assert_eq!(config.server.max_particles, 10_000);
    }

    #[test]
    fn test_sections() {
        let config = ServerConfig::from_toml(
            r#"
            [server]
            algorithm = "nbp"
            map_path = "maps/spider.txt"
            max_particles = 500

            [filter]
            num_particles = 64

            [nbp]
            gibbs_sweeps = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.server.algorithm, Algorithm::Nbp);
        assert_eq!(config.server.max_particles, 500);
        assert_eq!(config.server.map_path, Some(PathBuf::from("maps/spider.txt")));
        assert_eq!(config.estimator.filter.num_particles, 64);
        assert_eq!(config.estimator.nbp.gibbs_sweeps, 2);
        assert_eq!(config.estimator.potential.position, 10.0);
    }

    #[test]
    fn test_bad_algorithm() {
        let err = ServerConfig::from_toml("[server]\nalgorithm = \"kalman\"").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn test_load_or_default() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("jaal.toml");
        assert_eq!(ServerConfig::load_or_default(&missing).unwrap(), ServerConfig::default());

        let mut file = std::fs::File::create(&missing).unwrap();
        writeln!(file, "[server]\ndefault_particles = 25").unwrap();
        let config = ServerConfig::load_or_default(&missing).unwrap();
        assert_eq!(config.server.default_particles, 25);
    }
}
