//! # TPS Search Library (tps-search)
//!
//! Finds the maximum sustained transaction throughput of a system under test.
//!
//! **Purpose:** Bisect a configurable rate range with short trials, then run a
//! longer confirmation search around the discovered maximum and aggregate
//! every decision into one exportable report.
//!
//! **Architecture:** Synchronous engine (`engine`) driving an opaque
//! [`runner::TrialRunner`]; configuration, artifact layout and the
//! command-line binary sit around it.

pub mod artifacts;
pub mod config;
pub mod engine;
pub mod error;
pub mod runner;

pub use config::SearchConfig;
pub use error::{Error, Result};
pub use runner::{CommandTrialRunner, TrialRunner};
