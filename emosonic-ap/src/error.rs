//! Error types for emosonic-ap
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//! Per-frame operations never return these; they surface from startup
//! (configuration, sample loading, audio device, replay input).

use thiserror::Error;

/// Main error type for emosonic-ap
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(#[from] emosonic_common::Error),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Detection replay input errors
    #[error("Replay error: {0}")]
    Replay(String),

    /// Malformed JSON in replay input
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using emosonic-ap Error
pub type Result<T> = std::result::Result<T, Error>;
