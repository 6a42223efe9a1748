//! Pass/fail evaluation of a single trial
//!
//! A trial passes only when all three conditions hold:
//! - **Rate:** achieved average rate reaches the target, or falls short of it
//!   by less than [`RATE_TOLERANCE`]
//! - **Count:** observed transaction count equals the expected count exactly
//! - **Runner verdict:** the trial runner reported success
//!
//! The tolerance band is absolute, not relative to the target.

use crate::engine::types::TrialReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Allowed shortfall of the achieved average rate below the target (exclusive)
pub const RATE_TOLERANCE: f64 = 100.0;

/// Which pass condition a trial missed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Achieved rate below target by `RATE_TOLERANCE` or more
    RateBelowTarget,
    /// Observed transaction count differs from expected
    TransactionCountMismatch,
    /// Trial runner reported the trial itself as failed
    TrialFailed,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateBelowTarget => write!(f, "rate below target"),
            Self::TransactionCountMismatch => write!(f, "transaction count mismatch"),
            Self::TrialFailed => write!(f, "trial failed"),
        }
    }
}

/// Decision record for one trial against its target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub target_rate: i64,
    pub achieved_avg_rate: f64,
    pub expected_transaction_count: u64,
    pub observed_transaction_count: u64,
    pub rate_expect_met: bool,
    pub count_expect_met: bool,
    pub trial_succeeded: bool,
    pub passed: bool,
    pub artifacts_path: String,
    pub trial_start: DateTime<Utc>,
    pub trial_end: DateTime<Utc>,
}

impl Evaluation {
    /// Failed conditions in fixed order; empty when the trial passed
    pub fn failure_reasons(&self) -> Vec<FailureReason> {
        let mut reasons = Vec::new();
        if !self.rate_expect_met {
            reasons.push(FailureReason::RateBelowTarget);
        }
        if !self.count_expect_met {
            reasons.push(FailureReason::TransactionCountMismatch);
        }
        if !self.trial_succeeded {
            reasons.push(FailureReason::TrialFailed);
        }
        reasons
    }
}

/// Rate condition alone
pub fn rate_expectation_met(target: i64, achieved_avg_rate: f64) -> bool {
    let target = target as f64;
    achieved_avg_rate >= target || (target - achieved_avg_rate).abs() < RATE_TOLERANCE
}

/// Evaluate one trial report against the rate it was asked to sustain
pub fn evaluate(target: i64, report: &TrialReport) -> Evaluation {
    let rate_expect_met = rate_expectation_met(target, report.achieved_avg_rate);
    let count_expect_met =
        report.observed_transaction_count == report.expected_transaction_count;
    let trial_succeeded = report.trial_succeeded;

    Evaluation {
        target_rate: target,
        achieved_avg_rate: report.achieved_avg_rate,
        expected_transaction_count: report.expected_transaction_count,
        observed_transaction_count: report.observed_transaction_count,
        rate_expect_met,
        count_expect_met,
        trial_succeeded,
        passed: rate_expect_met && count_expect_met && trial_succeeded,
        artifacts_path: report.artifacts_path.clone(),
        trial_start: report.start_timestamp,
        trial_end: report.end_timestamp,
    }
}
