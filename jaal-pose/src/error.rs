//! Error types for Jaal pose estimation

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Jaal error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed text input (occupancy file)
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Vector or matrix dimensions disagree
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
        /// Operation that detected the mismatch
        context: &'static str,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Estimator used before `init`
    #[error("Estimator not initialized")]
    NotInitialized,

    /// Particle and weight bookkeeping disagree
    #[error("Inconsistent state: {particles} particles but {weights} weights")]
    InconsistentState {
        /// Number of particles
        particles: usize,
        /// Number of weights
        weights: usize,
    },
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl Error {
    /// Shorthand for a dimension check that returns an error on mismatch.
    pub(crate) fn check_dim(expected: usize, actual: usize, context: &'static str) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected,
                actual,
                context,
            })
        }
    }
}
