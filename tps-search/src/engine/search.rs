//! Bisection search for the maximum sustainable rate
//!
//! Each step tests the grid-snapped midpoint of the remaining interval,
//! rounded toward the ceiling:
//!
//! `target = floor + ceil(ceil((ceiling - floor) / min_step) / 2) * min_step`
//!
//! A pass raises the floor to `target + min_step`; a fail lowers the ceiling
//! to `target - min_step`. The search ends when `ceiling < floor`. No rate is
//! tested twice and every tested rate is `floor + k * min_step` for the
//! starting floor.

use crate::engine::evaluator::evaluate;
use crate::engine::types::{RateInterval, SearchOutcome, SearchRecord, TrialParams, TrialRequest};
use crate::runner::TrialRunner;
use crate::{Error, Result};
use tracing::{debug, info};

/// Parameters of one bisection search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPlan {
    pub interval: RateInterval,
    pub min_step: i64,
    pub duration_secs: u64,
    pub params: TrialParams,
}

impl SearchPlan {
    /// Check the preconditions; nothing is run if these fail
    pub fn validate(&self) -> Result<()> {
        if self.min_step <= 0 {
            return Err(Error::InvalidParameters(format!(
                "min_step must be positive, got {}",
                self.min_step
            )));
        }
        if self.interval.floor < 0 {
            return Err(Error::InvalidParameters(format!(
                "rate floor must be non-negative, got {}",
                self.interval.floor
            )));
        }
        // A target can land up to one step above the ceiling and a pass then
        // moves the floor one more step up.
        let headroom = self.min_step.checked_mul(2);
        if headroom
            .and_then(|h| self.interval.ceiling.checked_add(h))
            .is_none()
        {
            return Err(Error::InvalidParameters(format!(
                "rate ceiling {} with min_step {} exceeds the representable range",
                self.interval.ceiling, self.min_step
            )));
        }
        Ok(())
    }
}

/// Next rate to test for an active interval.
///
/// Caller guarantees `ceiling >= floor` and `min_step > 0`. When the span is
/// smaller than one step the target may land above `ceiling`.
pub fn next_target(floor: i64, ceiling: i64, min_step: i64) -> i64 {
    let span = ceiling - floor;
    let steps = (span + min_step - 1) / min_step;
    floor + ((steps + 1) / 2) * min_step
}

/// Run one bisection search, calling the trial runner once per step.
///
/// Failed trials (including infrastructure failures reported by the runner)
/// lower the ceiling; they never abort the search. An interval with
/// `floor > ceiling` runs no trials and yields an empty outcome.
pub fn binary_search_max_rate<R>(runner: &mut R, plan: &SearchPlan) -> Result<SearchOutcome>
where
    R: TrialRunner + ?Sized,
{
    binary_search_max_rate_with_progress(runner, plan, &mut |_| {})
}

/// Same as [`binary_search_max_rate`], calling `on_step` with each record as
/// soon as its trial has been evaluated
pub fn binary_search_max_rate_with_progress<R>(
    runner: &mut R,
    plan: &SearchPlan,
    on_step: &mut dyn FnMut(&SearchRecord),
) -> Result<SearchOutcome>
where
    R: TrialRunner + ?Sized,
{
    plan.validate()?;

    let mut floor = plan.interval.floor;
    let mut ceiling = plan.interval.ceiling;
    let mut outcome = SearchOutcome::empty();

    while ceiling >= floor {
        let target = next_target(floor, ceiling, plan.min_step);
        info!(
            floor,
            target,
            ceiling,
            duration_secs = plan.duration_secs,
            "Running search step"
        );

        let request = TrialRequest::new(target, plan.duration_secs, &plan.params);
        let report = runner.run(&request);
        let evaluation = evaluate(target, &report);

        debug!(
            target,
            achieved_avg_rate = evaluation.achieved_avg_rate,
            expected_txns = evaluation.expected_transaction_count,
            observed_txns = evaluation.observed_transaction_count,
            rate_expect_met = evaluation.rate_expect_met,
            count_expect_met = evaluation.count_expect_met,
            trial_succeeded = evaluation.trial_succeeded,
            "Trial evaluated"
        );

        let passed = evaluation.passed;
        if passed {
            outcome.max_rate_achieved = target;
            outcome.max_rate_detail = report.raw_detail.clone();
        }

        let record = SearchRecord {
            target,
            floor_at_step: floor,
            ceiling_at_step: ceiling,
            passed,
            evaluation,
            trial_report: report,
        };
        on_step(&record);
        outcome.records.push(record);

        if passed {
            floor = target + plan.min_step;
        } else {
            ceiling = target - plan.min_step;
        }
        info!(target, passed, floor, ceiling, "Search step complete");
    }

    info!(
        max_rate_achieved = outcome.max_rate_achieved,
        steps = outcome.records.len(),
        "Search finished"
    );
    Ok(outcome)
}
