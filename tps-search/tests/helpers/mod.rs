//! Test helpers for tps-search integration tests
//!
//! Deterministic stand-ins for the trial runner:
//! - CapacityRunner: models a system that sustains a fixed rate
//! - ScriptedRunner: returns pre-scripted verdicts in call order

#![allow(dead_code, unused_imports)]

pub mod stub_runner;

pub use stub_runner::{report_at, CapacityRunner, ScriptedRunner};

use tps_search::engine::{SearchSettings, TrialParams};

/// Install a subscriber once per test binary; later calls are no-ops
pub fn init_test_logging() {
    let config = tps_common::LoggingConfig {
        level: "debug".to_string(),
        file: None,
    };
    let _ = tps_common::init_tracing(&config);
}

/// Settings matching the tool's defaults with a custom range and step
pub fn settings(max_tps_to_test: i64, min_step: i64) -> SearchSettings {
    SearchSettings {
        max_tps_to_test,
        min_step,
        coarse_duration_secs: 150,
        confirmation_duration_secs: 300,
        params: TrialParams {
            generator_rate_cap: 4000,
            extra_prune_blocks: 2,
        },
    }
}
