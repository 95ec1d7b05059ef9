//! Error types for the simulator

use thiserror::Error;

/// Main error type for the simulator
///
/// The engine itself never fails once built; these variants cover the
/// application shell around it (settings, logging, console input, shutdown).
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),
}
