//! Error types for the Jaal server

/// Result type alias
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or unsupported request
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Estimator failure
    #[error("Estimator error: {0}")]
    Estimator(#[from] jaal_pose::Error),
}

impl From<toml::de::Error> for ServerError {
    fn from(e: toml::de::Error) -> Self {
        ServerError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(e: serde_json::Error) -> Self {
        ServerError::Protocol(e.to_string())
    }
}
