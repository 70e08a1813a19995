use thiserror::Error;

/// Error type for the kpstat library edges (config, runtime, CLI).
///
/// The sampling path itself never produces these: sensor failures degrade
/// to `None` fields and placeholder labels instead.
#[derive(Error, Debug)]
pub enum KpError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sampler runtime error: {0}")]
    Runtime(String),
}

/// Result type alias for kpstat
pub type Result<T> = std::result::Result<T, KpError>;

impl KpError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        KpError::Config(msg.into())
    }

    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        KpError::Runtime(msg.into())
    }
}
