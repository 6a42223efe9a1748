//! Search data model
//!
//! Plain typed records shared by the evaluator, the search controller and the
//! report aggregator. Every field is always present so the exported report
//! keeps the same shape even when a run ends early.

use crate::engine::evaluator::Evaluation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed interval of candidate rates (transactions per second)
///
/// Rates are signed: a failed trial at the floor moves the ceiling below it,
/// which may be below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateInterval {
    pub floor: i64,
    pub ceiling: i64,
}

impl RateInterval {
    pub fn new(floor: i64, ceiling: i64) -> Self {
        Self { floor, ceiling }
    }

    /// Whether any rate is left to test
    pub fn is_active(&self) -> bool {
        self.ceiling >= self.floor
    }
}

impl std::fmt::Display for RateInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.floor, self.ceiling)
    }
}

/// Load generation parameters shared by every trial of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrialParams {
    /// Maximum rate a single generator instance may be asked to produce
    pub generator_rate_cap: u64,

    /// Extra non-empty blocks trimmed from each end of the measured range
    pub extra_prune_blocks: u64,
}

/// One trial as handed to the trial runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRequest {
    pub target_rate: i64,
    pub duration_secs: u64,
    pub generator_rate_cap: u64,
    pub extra_prune_blocks: u64,
}

impl TrialRequest {
    pub fn new(target_rate: i64, duration_secs: u64, params: &TrialParams) -> Self {
        Self {
            target_rate,
            duration_secs,
            generator_rate_cap: params.generator_rate_cap,
            extra_prune_blocks: params.extra_prune_blocks,
        }
    }
}

/// Result of one trial, produced by the trial runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialReport {
    /// Average rate measured over the trial window
    pub achieved_avg_rate: f64,

    /// Transactions actually observed by the system under test
    pub observed_transaction_count: u64,

    /// Transactions the generators were configured to send
    pub expected_transaction_count: u64,

    /// Runner's own verdict (false on crashes, infra errors, timeouts)
    pub trial_succeeded: bool,

    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: DateTime<Utc>,

    /// Directory holding this trial's logs and artifacts
    #[serde(default)]
    pub artifacts_path: String,

    /// Runner-specific structured detail, carried through untouched
    #[serde(default)]
    pub raw_detail: Value,
}

impl TrialReport {
    /// Report for a trial the runner could not execute or measure
    pub fn failed(request: &TrialRequest, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            achieved_avg_rate: 0.0,
            observed_transaction_count: 0,
            expected_transaction_count: 0,
            trial_succeeded: false,
            start_timestamp: now,
            end_timestamp: now,
            artifacts_path: String::new(),
            raw_detail: serde_json::json!({
                "error": reason.into(),
                "target_rate": request.target_rate,
                "duration_secs": request.duration_secs,
            }),
        }
    }
}

/// One search step: where the interval stood, what was tested, how it went
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub target: i64,
    pub floor_at_step: i64,
    pub ceiling_at_step: i64,
    pub passed: bool,
    pub evaluation: Evaluation,
    pub trial_report: TrialReport,
}

/// Result of one bisection search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Highest passing target, 0 if no step passed
    pub max_rate_achieved: i64,

    /// Steps in the order they were run
    pub records: Vec<SearchRecord>,

    /// `raw_detail` of the trial that set `max_rate_achieved`, `{}` if none
    pub max_rate_detail: Value,
}

impl SearchOutcome {
    pub fn empty() -> Self {
        Self {
            max_rate_achieved: 0,
            records: Vec::new(),
            max_rate_detail: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn passed_count(&self) -> usize {
        self.records.iter().filter(|r| r.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.records.len() - self.passed_count()
    }

    /// Tested targets in step order
    pub fn targets(&self) -> Vec<i64> {
        self.records.iter().map(|r| r.target).collect()
    }
}

impl Default for SearchOutcome {
    fn default() -> Self {
        Self::empty()
    }
}
