//! Trial runner abstraction
//!
//! The search engine never starts processes itself. It hands a
//! [`TrialRequest`] to a [`TrialRunner`] and consumes the [`TrialReport`]
//! that comes back. Anything that goes wrong inside a trial (crash, timeout,
//! garbage output) is reported as `trial_succeeded = false`, never as an
//! error, so the search treats it as an ordinary failed step.

use crate::config::TrialCommandConfig;
use crate::engine::types::{TrialReport, TrialRequest};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Executes one throughput trial and reports what happened
pub trait TrialRunner {
    /// Run a trial at `request.target_rate` for `request.duration_secs`.
    fn run(&mut self, request: &TrialRequest) -> TrialReport;

    /// Version string of the system under test, if the runner knows it
    fn target_version(&self) -> Option<String> {
        None
    }
}

impl<F> TrialRunner for F
where
    F: FnMut(&TrialRequest) -> TrialReport,
{
    fn run(&mut self, request: &TrialRequest) -> TrialReport {
        self(request)
    }
}

/// Maximum time allowed for the version query
const VERSION_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs an external trial-helper program once per trial.
///
/// The helper receives the request as arguments appended to the configured
/// base arguments:
/// `--target-tps N --duration-sec N --tps-limit-per-generator N
/// --num-blocks-to-prune N --log-dir DIR [--save-json]`
/// and must print a JSON [`TrialReport`] on stdout. The trial is killed if it
/// runs longer than its duration plus the configured grace period.
pub struct CommandTrialRunner {
    program: PathBuf,
    base_args: Vec<String>,
    version_args: Vec<String>,
    timeout_grace: Duration,
    log_dir: PathBuf,
    save_trial_reports: bool,
    trial_count: u32,
    runtime: tokio::runtime::Runtime,
}

impl CommandTrialRunner {
    /// Create a runner writing per-trial artifacts under `log_dir`
    pub fn new(config: &TrialCommandConfig, log_dir: impl Into<PathBuf>) -> Result<Self> {
        let program = config
            .program
            .clone()
            .ok_or_else(|| Error::Runner("no trial helper program configured".to_string()))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Runner(format!("failed to create tokio runtime: {}", e)))?;

        Ok(Self {
            program,
            base_args: config.args.clone(),
            version_args: config.version_args.clone(),
            timeout_grace: Duration::from_secs(config.timeout_grace_secs),
            log_dir: log_dir.into(),
            save_trial_reports: false,
            trial_count: 0,
            runtime,
        })
    }

    /// Ask the helper to keep its own per-trial JSON report
    #[must_use]
    pub fn with_save_trial_reports(mut self, save: bool) -> Self {
        self.save_trial_reports = save;
        self
    }

    /// Override the grace period added to each trial's duration
    #[must_use]
    pub fn with_timeout_grace(mut self, grace: Duration) -> Self {
        self.timeout_grace = grace;
        self
    }

    /// Number of trials started so far
    pub fn trial_count(&self) -> u32 {
        self.trial_count
    }

    fn trial_args(&self, request: &TrialRequest, trial_dir: &Path) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.extend([
            "--target-tps".to_string(),
            request.target_rate.to_string(),
            "--duration-sec".to_string(),
            request.duration_secs.to_string(),
            "--tps-limit-per-generator".to_string(),
            request.generator_rate_cap.to_string(),
            "--num-blocks-to-prune".to_string(),
            request.extra_prune_blocks.to_string(),
            "--log-dir".to_string(),
            trial_dir.display().to_string(),
        ]);
        if self.save_trial_reports {
            args.push("--save-json".to_string());
        }
        args
    }
}

impl TrialRunner for CommandTrialRunner {
    fn run(&mut self, request: &TrialRequest) -> TrialReport {
        self.trial_count += 1;
        let trial_dir = self.log_dir.join(format!(
            "trial-{:03}-{}tps",
            self.trial_count, request.target_rate
        ));
        let args = self.trial_args(request, &trial_dir);
        let deadline = Duration::from_secs(request.duration_secs) + self.timeout_grace;

        debug!(
            program = %self.program.display(),
            target_rate = request.target_rate,
            duration_secs = request.duration_secs,
            deadline_secs = deadline.as_secs_f64(),
            "Launching trial helper"
        );

        let output = self
            .runtime
            .block_on(run_with_deadline(&self.program, &args, deadline));

        match output {
            Ok(output) => interpret_output(request, &trial_dir, output),
            Err(reason) => {
                warn!(target_rate = request.target_rate, "Trial could not run: {}", reason);
                TrialReport::failed(request, reason)
            }
        }
    }

    fn target_version(&self) -> Option<String> {
        if self.version_args.is_empty() {
            return None;
        }

        match self.runtime.block_on(run_with_deadline(
            &self.program,
            &self.version_args,
            VERSION_QUERY_TIMEOUT,
        )) {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                (!version.is_empty()).then_some(version)
            }
            Ok(output) => {
                warn!("Version query exited with {}", output.status);
                None
            }
            Err(reason) => {
                warn!("Version query failed: {}", reason);
                None
            }
        }
    }
}

async fn run_with_deadline(
    program: &Path,
    args: &[String],
    deadline: Duration,
) -> std::result::Result<std::process::Output, String> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("failed to spawn {}: {}", program.display(), e))?;

    // Dropping the wait future on timeout drops the child, which kills it.
    match tokio::time::timeout(deadline, child.wait_with_output()).await {
        Err(_) => Err(format!(
            "trial helper exceeded deadline of {:.1}s",
            deadline.as_secs_f64()
        )),
        Ok(Err(e)) => Err(format!("failed waiting for trial helper: {}", e)),
        Ok(Ok(output)) => Ok(output),
    }
}

fn interpret_output(
    request: &TrialRequest,
    trial_dir: &Path,
    output: std::process::Output,
) -> TrialReport {
    let exit_ok = output.status.success();

    let Some(mut report) = parse_report(&output.stdout) else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = format!(
            "trial helper ({}) produced no parsable report: {}",
            output.status,
            last_line(&stderr)
        );
        warn!(target_rate = request.target_rate, "{}", reason);
        return TrialReport::failed(request, reason);
    };

    if !exit_ok {
        info!(
            target_rate = request.target_rate,
            "Trial helper exited with {}, marking trial failed", output.status
        );
        report.trial_succeeded = false;
    }
    if report.artifacts_path.is_empty() {
        report.artifacts_path = trial_dir.display().to_string();
    }
    report
}

/// Accept either a bare JSON document or log lines followed by a JSON line
fn parse_report(stdout: &[u8]) -> Option<TrialReport> {
    if let Ok(report) = serde_json::from_slice::<TrialReport>(stdout) {
        return Some(report);
    }

    String::from_utf8_lossy(stdout)
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with('{'))
        .and_then(|line| serde_json::from_str(line).ok())
}

fn last_line(text: &str) -> &str {
    text.lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}
