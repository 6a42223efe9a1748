//! # TPS Search Common Library
//!
//! Shared code for the throughput search tooling:
//! - Error type and result alias
//! - TOML configuration file resolution and loading
//! - Logging configuration and tracing initialization

pub mod config;
pub mod error;
pub mod logging;

pub use config::{load_toml_config, resolve_config_path, ConfigPathSource, LoggingConfig};
pub use error::{Error, Result};
pub use logging::init_tracing;
