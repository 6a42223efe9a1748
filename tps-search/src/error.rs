//! Error types for tps-search
//!
//! Per-trial failures are never errors: they are recorded as failed search
//! steps. Errors here are precondition violations and I/O around the run.

use thiserror::Error;

/// Main error type for tps-search
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Search parameters violate a precondition; no trial was run
    #[error("Invalid search parameters: {0}")]
    InvalidParameters(String),

    /// Report could not be written or read back
    #[error("Report export error: {0}")]
    Export(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors from the shared library (config files, logging)
    #[error(transparent)]
    Common(#[from] tps_common::Error),

    /// Trial runner could not be set up
    #[error("Trial runner error: {0}")]
    Runner(String),
}

/// Convenience Result type using tps-search Error
pub type Result<T> = std::result::Result<T, Error>;
