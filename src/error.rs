//! Error types for Plant Pulse
//!
//! The engine itself never fails on a sample. These errors only surface at the
//! edges: decoding transport frames, loading configuration and moving state
//! in and out of JSON or a key-value store.

use thiserror::Error;

/// Errors that can occur around the engine boundary
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse sensor frame: {0}")]
    FrameError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
