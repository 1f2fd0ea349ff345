// Engine error types: readiness failures, module load failures, config parsing

use thiserror::Error;

/// Errors surfaced by the engine handle and the bundled world module
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Engine module is still loading")]
    NotReady,
    #[error("Engine module failed to initialize: {0}")]
    InitFailed(String),
    #[error("Engine has been destroyed")]
    Destroyed,
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to serialize entities: {0}")]
    Serialization(String),
}

/// Errors produced while parsing configuration values from strings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown backend '{0}' (expected software, opengl or vulkan)")]
    UnknownBackend(String),
    #[error("Invalid resolution '{0}' (expected WIDTHxHEIGHT)")]
    InvalidResolution(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}
