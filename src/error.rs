//! Error types
//!
//! Grid access and configuration failures are programmer errors surfaced
//! through [`ArenaError`]. Settings persistence has its own [`SettingsError`].

use thiserror::Error;

/// Failures raised by the simulation core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// A coordinate fell outside the padded grid
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    /// Settings or tuning values outside their documented ranges
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Failures while saving or loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file access failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ArenaError),
}

/// Result alias used across the simulation
pub type ArenaResult<T> = Result<T, ArenaError>;
