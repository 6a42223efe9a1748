//! Report aggregation and formatting
//!
//! **Purpose:** Merge both search outcomes with run metadata into one
//! exportable report, and render human-readable CLI output.

use crate::engine::system_info::EnvironmentInfo;
use crate::engine::types::{SearchOutcome, SearchRecord};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Report schema version, bumped on incompatible key changes
pub const REPORT_FORMAT_VERSION: &str = "1.0";

/// Complete two-phase search report
///
/// Built once at the end of a full run and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedReport {
    pub format_version: String,

    /// Unique identifier of this run
    pub run_id: Uuid,

    /// Coarse search over `[0, max_tps_to_test]`
    pub coarse: SearchOutcome,

    /// Confirmation search around the coarse result
    pub confirmation: SearchOutcome,

    /// Effective configuration the run used
    pub config: Value,

    pub run_start: DateTime<Utc>,
    pub run_finish: DateTime<Utc>,

    pub environment: EnvironmentInfo,
}

impl CombinedReport {
    /// Assemble the report from finished outcomes. No I/O; the same inputs
    /// always produce an equal report.
    pub fn build(
        run_id: Uuid,
        coarse: SearchOutcome,
        confirmation: SearchOutcome,
        config: Value,
        run_start: DateTime<Utc>,
        run_finish: DateTime<Utc>,
        environment: EnvironmentInfo,
    ) -> Self {
        Self {
            format_version: REPORT_FORMAT_VERSION.to_string(),
            run_id,
            coarse,
            confirmation,
            config,
            run_start,
            run_finish,
            environment,
        }
    }

    /// Rate sustained through the long-running confirmation trials
    pub fn max_rate_achieved(&self) -> i64 {
        self.confirmation.max_rate_achieved
    }

    /// Wall-clock duration of the run in whole seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.run_finish - self.run_start).num_seconds()
    }

    /// Total trials across both phases
    pub fn trial_count(&self) -> usize {
        self.coarse.records.len() + self.confirmation.records.len()
    }

    /// Export report to a pretty-printed JSON file
    ///
    /// The report is written to a sibling `.tmp` file and renamed into place,
    /// so `path` either holds a complete report or is left untouched.
    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        let tmp_path = temp_sibling(path);

        let written = write_file(&tmp_path, json.as_bytes())
            .and_then(|()| std::fs::rename(&tmp_path, path));
        if let Err(e) = written {
            // tmp file may not exist if creation itself failed
            let _ = std::fs::remove_file(&tmp_path);
            return Err(Error::Export(format!("{}: {}", path.display(), e)));
        }
        Ok(())
    }

    /// Import report from a JSON file
    pub fn import_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let report: CombinedReport = serde_json::from_reader(file)?;
        Ok(report)
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// CLI formatter for search progress and results
pub struct CliFormatter;

impl CliFormatter {
    /// Format phase header
    ///
    /// Example: `Phase 1: Coarse search over [0, 50000]...`
    pub fn format_phase_header(phase: u8, description: &str) -> String {
        format!("\nPhase {}: {}...\n", phase, description)
    }

    /// Format one search step
    ///
    /// Example: `[✓] 2000 tps in [500, 3500]: PASS (avg 1999.5 tps, 60000/60000 txns)`
    pub fn format_step_progress(record: &SearchRecord) -> String {
        let eval = &record.evaluation;
        let (symbol, verdict) = if record.passed {
            ("✓", "PASS".to_string())
        } else {
            let reasons: Vec<String> = eval
                .failure_reasons()
                .iter()
                .map(|r| r.to_string())
                .collect();
            ("✗", format!("FAIL: {}", reasons.join(", ")))
        };

        format!(
            "[{}] {} tps in [{}, {}]: {} (avg {:.1} tps, {}/{} txns)",
            symbol,
            record.target,
            record.floor_at_step,
            record.ceiling_at_step,
            verdict,
            eval.achieved_avg_rate,
            eval.observed_transaction_count,
            eval.expected_transaction_count
        )
    }

    /// Format all steps of one phase as a table
    pub fn format_outcome_table(title: &str, outcome: &SearchOutcome) -> String {
        let mut output = String::new();

        output.push_str(&format!("\n{}:\n", title));
        output.push_str("┌────────────┬────────────┬────────┐\n");
        output.push_str("│ Target tps │ Avg tps    │ Result │\n");
        output.push_str("├────────────┼────────────┼────────┤\n");

        for record in &outcome.records {
            let result = if record.passed { "PASS  " } else { "FAIL  " };
            output.push_str(&format!(
                "│ {:>10} │ {:>10.1} │ {} │\n",
                record.target, record.evaluation.achieved_avg_rate, result
            ));
        }

        output.push_str("└────────────┴────────────┴────────┘\n");
        output.push_str(&format!("Max rate achieved: {}\n", outcome.max_rate_achieved));

        output
    }

    pub fn format_environment(info: &EnvironmentInfo) -> String {
        format!(
            "System: {} ({}), release {}, {}",
            info.system, info.os_family, info.release, info.cpu
        )
    }

    /// Format session summary
    pub fn format_session_summary(report: &CombinedReport) -> String {
        let mut output = String::new();

        output.push_str("\n╔════════════════════════════════════════╗\n");
        output.push_str("║      Throughput Search Complete        ║\n");
        output.push_str("╚════════════════════════════════════════╝\n\n");

        output.push_str(&format!(
            "Coarse max rate: {} tps ({} trials)\n",
            report.coarse.max_rate_achieved,
            report.coarse.records.len()
        ));
        output.push_str(&format!(
            "Confirmed max rate: {} tps ({} trials)\n",
            report.confirmation.max_rate_achieved,
            report.confirmation.records.len()
        ));
        output.push_str(&format!("Duration: {} seconds\n", report.duration_seconds()));
        output.push_str(&format!("{}\n", Self::format_environment(&report.environment)));
        if let Some(version) = &report.environment.target_version {
            output.push_str(&format!("Target version: {}\n", version));
        }

        output
    }
}
