//! # Error Types
//!
//! Custom error types for S.Port telemetry using `thiserror`.

use thiserror::Error;

/// Main error type for S.Port telemetry
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial link errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// No serial device could be opened
    #[error("S.Port device not found (tried: {0})")]
    SerialPortNotFound(String),

    /// Telemetry state could not be allocated
    #[error("Failed to allocate telemetry state: {0}")]
    Allocation(#[from] std::collections::TryReserveError),
}

/// Result type alias for S.Port telemetry
pub type Result<T> = std::result::Result<T, TelemetryError>;
