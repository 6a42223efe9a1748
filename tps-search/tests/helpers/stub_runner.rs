//! Stub trial runners

use chrono::{Duration, Utc};
use std::collections::VecDeque;
use tps_search::engine::{TrialReport, TrialRequest};
use tps_search::TrialRunner;

/// Successful trial report with the given achieved rate and matching counts
pub fn report_at(request: &TrialRequest, achieved_avg_rate: f64) -> TrialReport {
    let start = Utc::now();
    let expected = request.target_rate.max(0) as u64 * request.duration_secs;
    TrialReport {
        achieved_avg_rate,
        observed_transaction_count: expected,
        expected_transaction_count: expected,
        trial_succeeded: true,
        start_timestamp: start,
        end_timestamp: start + Duration::seconds(request.duration_secs as i64),
        artifacts_path: format!("stub/{}tps", request.target_rate),
        raw_detail: serde_json::json!({
            "target_rate": request.target_rate,
            "duration_secs": request.duration_secs,
        }),
    }
}

/// System under test that sustains `capacity` tps for short trials and
/// `long_capacity` tps for trials of at least `long_trial_secs`
#[derive(Debug, Clone)]
pub struct CapacityRunner {
    pub capacity: i64,
    pub long_capacity: i64,
    pub long_trial_secs: u64,
    pub version: Option<String>,
    pub requests: Vec<TrialRequest>,
}

impl CapacityRunner {
    pub fn new(capacity: i64) -> Self {
        Self {
            capacity,
            long_capacity: capacity,
            long_trial_secs: u64::MAX,
            version: None,
            requests: Vec::new(),
        }
    }

    pub fn with_long_capacity(mut self, long_capacity: i64, long_trial_secs: u64) -> Self {
        self.long_capacity = long_capacity;
        self.long_trial_secs = long_trial_secs;
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn targets(&self) -> Vec<i64> {
        self.requests.iter().map(|r| r.target_rate).collect()
    }
}

impl TrialRunner for CapacityRunner {
    fn run(&mut self, request: &TrialRequest) -> TrialReport {
        self.requests.push(request.clone());
        let capacity = if request.duration_secs >= self.long_trial_secs {
            self.long_capacity
        } else {
            self.capacity
        };
        report_at(request, request.target_rate.min(capacity) as f64)
    }

    fn target_version(&self) -> Option<String> {
        self.version.clone()
    }
}

/// Returns scripted verdicts in call order; once exhausted every trial fails
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    verdicts: VecDeque<bool>,
    pub requests: Vec<TrialRequest>,
}

impl ScriptedRunner {
    pub fn new(verdicts: impl IntoIterator<Item = bool>) -> Self {
        Self {
            verdicts: verdicts.into_iter().collect(),
            requests: Vec::new(),
        }
    }
}

impl TrialRunner for ScriptedRunner {
    fn run(&mut self, request: &TrialRequest) -> TrialReport {
        self.requests.push(request.clone());
        if self.verdicts.pop_front().unwrap_or(false) {
            report_at(request, request.target_rate as f64)
        } else {
            TrialReport::failed(request, "scripted failure")
        }
    }
}
