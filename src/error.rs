//! # Error Types
//!
//! Custom error types for Flightlog Viewer using `thiserror`.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Flightlog Viewer
#[derive(Debug, Error)]
pub enum FlightLogError {
    /// Source log file or artifact does not exist
    #[error("Input not found: {}", path.display())]
    InputMissing { path: PathBuf },

    /// Dict-literal payload could not be parsed
    #[error("Literal syntax error at offset {offset}: {message}")]
    Literal { offset: usize, message: String },

    /// Envelope pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Artifact (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlightLogError {
    /// Map an I/O error from opening `path`, turning `NotFound` into `InputMissing`
    pub fn from_open(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            FlightLogError::InputMissing { path: path.into() }
        } else {
            FlightLogError::Io(err)
        }
    }
}

/// Result type alias for Flightlog Viewer
pub type Result<T> = std::result::Result<T, FlightLogError>;
