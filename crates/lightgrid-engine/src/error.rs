//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure that can stop the engine during
//! startup. Once the frame loop is running nothing can fail.

use std::path::PathBuf;

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: lightgrid_core::config::ConfigError,
    },

    /// Simulation clock initialization failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: lightgrid_core::clock::ClockError,
    },

    /// The activity grid file could not be read.
    #[error("failed to read activity grid {}: {source}", path.display())]
    ActivityGridIo {
        /// Path that was read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The activity grid file is not a valid 7x52 matrix.
    #[error("invalid activity grid {}: {source}", path.display())]
    ActivityGridParse {
        /// Path that was parsed.
        path: PathBuf,
        /// The underlying JSON or shape error.
        source: serde_json::Error,
    },

    /// Observer API server failed.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: lightgrid_observer::ServerError,
    },
}
