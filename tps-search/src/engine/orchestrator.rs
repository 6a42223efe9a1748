//! Two-phase search orchestration
//!
//! **Phase 1 (coarse):** bisect `[0, max_tps_to_test]` with short trials.
//!
//! **Phase 2 (confirmation):** bisect
//! `[max(coarse_max - 3 * min_step, 0), coarse_max + 3 * min_step]` with the
//! longer trial duration, to check the coarse result holds under sustained
//! load.
//!
//! Both phases share one search implementation and the same trial runner.

use crate::engine::report::CombinedReport;
use crate::engine::search::{binary_search_max_rate_with_progress, SearchPlan};
use crate::engine::system_info::EnvironmentInfo;
use crate::engine::types::{RateInterval, SearchOutcome, SearchRecord, TrialParams};
use crate::runner::TrialRunner;
use crate::{Error, Result};
use chrono::Utc;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

/// Confirmation margin on each side of the coarse result, in steps
pub const CONFIRMATION_MARGIN_STEPS: i64 = 3;

/// Engine parameters for a full two-phase run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub max_tps_to_test: i64,
    pub min_step: i64,
    pub coarse_duration_secs: u64,
    pub confirmation_duration_secs: u64,
    pub params: TrialParams,
}

impl SearchSettings {
    pub fn validate(&self) -> Result<()> {
        if self.min_step <= 0 {
            return Err(Error::InvalidParameters(format!(
                "min_step must be positive, got {}",
                self.min_step
            )));
        }
        if self.max_tps_to_test < 0 {
            return Err(Error::InvalidParameters(format!(
                "max_tps_to_test must be non-negative, got {}",
                self.max_tps_to_test
            )));
        }
        // The coarse result can sit up to one step above max_tps_to_test; the
        // confirmation ceiling adds the margin and its trials need two more.
        let headroom = self.min_step.checked_mul(CONFIRMATION_MARGIN_STEPS + 3);
        if headroom
            .and_then(|h| self.max_tps_to_test.checked_add(h))
            .is_none()
        {
            return Err(Error::InvalidParameters(format!(
                "max_tps_to_test {} with min_step {} exceeds the representable range",
                self.max_tps_to_test, self.min_step
            )));
        }
        Ok(())
    }

    fn coarse_plan(&self) -> SearchPlan {
        SearchPlan {
            interval: RateInterval::new(0, self.max_tps_to_test),
            min_step: self.min_step,
            duration_secs: self.coarse_duration_secs,
            params: self.params,
        }
    }

    fn confirmation_plan(&self, coarse_max: i64) -> SearchPlan {
        SearchPlan {
            interval: confirmation_interval(coarse_max, self.min_step),
            min_step: self.min_step,
            duration_secs: self.confirmation_duration_secs,
            params: self.params,
        }
    }
}

/// Interval searched by the confirmation phase
pub fn confirmation_interval(coarse_max: i64, min_step: i64) -> RateInterval {
    let margin = CONFIRMATION_MARGIN_STEPS * min_step;
    RateInterval::new((coarse_max - margin).max(0), coarse_max + margin)
}

/// Which search a progress event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Coarse,
    Confirmation,
}

impl SearchPhase {
    /// 1-based phase number for display
    pub fn number(&self) -> u8 {
        match self {
            Self::Coarse => 1,
            Self::Confirmation => 2,
        }
    }
}

impl std::fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coarse => write!(f, "Coarse search"),
            Self::Confirmation => write!(f, "Confirmation search"),
        }
    }
}

/// Progress notification emitted while a run is in flight
#[derive(Debug, Clone, Copy)]
pub enum SearchEvent<'a> {
    /// A phase is about to test its first rate
    PhaseStarted {
        phase: SearchPhase,
        plan: &'a SearchPlan,
    },
    /// A trial finished and was evaluated
    Step {
        phase: SearchPhase,
        record: &'a SearchRecord,
    },
}

/// Results of both phases
#[derive(Debug, Clone, PartialEq)]
pub struct TwoPhaseOutcome {
    pub coarse: SearchOutcome,
    pub confirmation: SearchOutcome,
}

/// Runs the coarse and confirmation searches in sequence
#[derive(Debug, Clone)]
pub struct SearchOrchestrator {
    settings: SearchSettings,
}

impl SearchOrchestrator {
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Run both phases. Fails only on invalid settings, before any trial.
    pub fn run<R>(&self, runner: &mut R) -> Result<TwoPhaseOutcome>
    where
        R: TrialRunner + ?Sized,
    {
        self.run_with_progress(runner, &mut |_| {})
    }

    /// Run both phases, reporting each phase start and each step to `on_event`
    pub fn run_with_progress<R>(
        &self,
        runner: &mut R,
        on_event: &mut dyn FnMut(SearchEvent<'_>),
    ) -> Result<TwoPhaseOutcome>
    where
        R: TrialRunner + ?Sized,
    {
        self.settings.validate()?;

        let coarse_plan = self.settings.coarse_plan();
        info!(
            interval = %coarse_plan.interval,
            min_step = coarse_plan.min_step,
            duration_secs = coarse_plan.duration_secs,
            "Starting coarse search"
        );
        let coarse = run_phase(runner, SearchPhase::Coarse, &coarse_plan, on_event)?;
        info!("Successful rate of: {}", coarse.max_rate_achieved);

        let confirmation_plan = self.settings.confirmation_plan(coarse.max_rate_achieved);
        info!(
            interval = %confirmation_plan.interval,
            min_step = confirmation_plan.min_step,
            duration_secs = confirmation_plan.duration_secs,
            "Starting confirmation search"
        );
        let confirmation = run_phase(
            runner,
            SearchPhase::Confirmation,
            &confirmation_plan,
            on_event,
        )?;
        info!(
            "Long running test - successful rate of: {}",
            confirmation.max_rate_achieved
        );

        Ok(TwoPhaseOutcome {
            coarse,
            confirmation,
        })
    }

    /// Run both phases and aggregate them with run metadata into one report
    pub fn run_with_report<R>(&self, runner: &mut R, config_snapshot: Value) -> Result<CombinedReport>
    where
        R: TrialRunner + ?Sized,
    {
        self.run_with_report_and_progress(runner, config_snapshot, &mut |_| {})
    }

    /// [`Self::run_with_report`] with live progress events
    pub fn run_with_report_and_progress<R>(
        &self,
        runner: &mut R,
        config_snapshot: Value,
        on_event: &mut dyn FnMut(SearchEvent<'_>),
    ) -> Result<CombinedReport>
    where
        R: TrialRunner + ?Sized,
    {
        let run_start = Utc::now();
        let outcome = self.run_with_progress(runner, on_event)?;
        let run_finish = Utc::now();

        let environment = EnvironmentInfo::detect().with_target_version(runner.target_version());

        Ok(CombinedReport::build(
            Uuid::new_v4(),
            outcome.coarse,
            outcome.confirmation,
            config_snapshot,
            run_start,
            run_finish,
            environment,
        ))
    }
}

fn run_phase<R>(
    runner: &mut R,
    phase: SearchPhase,
    plan: &SearchPlan,
    on_event: &mut dyn FnMut(SearchEvent<'_>),
) -> Result<SearchOutcome>
where
    R: TrialRunner + ?Sized,
{
    on_event(SearchEvent::PhaseStarted { phase, plan });
    binary_search_max_rate_with_progress(runner, plan, &mut |record| {
        on_event(SearchEvent::Step { phase, record })
    })
}
