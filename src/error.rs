//! # Error Types
//!
//! Custom error types for the ESC telemetry collector using `thiserror`.

use thiserror::Error;

/// Main error type for the ESC telemetry collector
#[derive(Debug, Error)]
pub enum EscTelemetryError {
    /// OpenYGE protocol errors (frame construction)
    #[error("OpenYGE protocol error: {0}")]
    Protocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial ports could be opened
    #[error("Serial port not found, tried: {0}")]
    SerialPortNotFound(String),

    /// Session recording errors
    #[error("Session error: {0}")]
    Session(String),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the ESC telemetry collector
pub type Result<T> = std::result::Result<T, EscTelemetryError>;
