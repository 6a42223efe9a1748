//! # Adaptive Throughput Search Engine
//!
//! Determines the maximum sustained transaction rate the system under test
//! can handle.
//!
//! **Algorithm:** Two-phase search:
//! - Phase 1: Coarse bisection over `[0, max_tps_to_test]` with short trials
//! - Phase 2: Confirmation bisection within three steps of the coarse result,
//!   with longer trials
//!
//! Every tested rate is snapped to the `min_step` grid and recorded, pass or
//! fail, in the phase's [`SearchOutcome`].

pub mod evaluator;
pub mod orchestrator;
pub mod report;
pub mod search;
pub mod system_info;
pub mod types;

pub use evaluator::{evaluate, Evaluation, FailureReason, RATE_TOLERANCE};
pub use orchestrator::{
    confirmation_interval, SearchEvent, SearchOrchestrator, SearchPhase, SearchSettings,
    TwoPhaseOutcome,
};
pub use report::{CliFormatter, CombinedReport};
pub use search::{
    binary_search_max_rate, binary_search_max_rate_with_progress, next_target, SearchPlan,
};
pub use system_info::EnvironmentInfo;
pub use types::{RateInterval, SearchOutcome, SearchRecord, TrialParams, TrialReport, TrialRequest};
