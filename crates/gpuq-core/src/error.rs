//! Error types for gpuq

use thiserror::Error;

/// Main error type for gpuq
#[derive(Error, Debug)]
pub enum GpuqError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A job command could not be started
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A job command was malformed before launch
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// The non-blocking exit check for a slot's process failed
    #[error("Liveness check failed for slot {slot}: {source}")]
    Liveness {
        slot: usize,
        #[source]
        source: std::io::Error,
    },

    /// Job file error
    #[error("Job file error: {0}")]
    JobFile(String),
}

impl GpuqError {
    /// Whether the error means a submission never started
    ///
    /// The slot the job was headed for is left empty in that case, so the
    /// caller is free to retry or give up.
    pub fn is_launch_failure(&self) -> bool {
        matches!(self, GpuqError::Launch { .. } | GpuqError::InvalidCommand(_))
    }
}

/// Result type for gpuq operations
pub type GpuqResult<T> = Result<T, GpuqError>;

impl From<toml::de::Error> for GpuqError {
    fn from(err: toml::de::Error) -> Self {
        GpuqError::Config(err.to_string())
    }
}
