//! Throughput search tool (tps-search) - Main entry point
//!
//! Finds the highest transaction rate the system under test sustains, first
//! with short coarse trials, then with long confirmation trials around the
//! coarse result.
//!
//! **Usage:**
//! ```bash
//! tps-search --trial-program ./trial-helper [--max-tps-to-test 50000] \
//!     [--save-json] [--keep-logs] [-- <trial helper args>]
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{error, info, warn};

use tps_search::artifacts::ArtifactLayout;
use tps_search::engine::{CliFormatter, CombinedReport, SearchEvent, SearchOrchestrator};
use tps_search::{CommandTrialRunner, SearchConfig};

/// Command-line arguments for tps-search
#[derive(Parser, Debug)]
#[command(name = "tps-search")]
#[command(about = "Search for the maximum sustainable transaction rate")]
#[command(version)]
struct Args {
    /// Config file (defaults to $TPS_SEARCH_CONFIG, then the user config dir)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Upper bound of the coarse search
    #[arg(long)]
    max_tps_to_test: Option<i64>,

    /// Trial duration during the coarse search (seconds)
    #[arg(long)]
    test_iteration_duration_sec: Option<u64>,

    /// Search grid step
    #[arg(long)]
    test_iteration_min_step: Option<i64>,

    /// Trial duration during the confirmation search (seconds)
    #[arg(long)]
    final_iterations_duration_sec: Option<u64>,

    /// Maximum rate per generator instance
    #[arg(long)]
    tps_limit_per_generator: Option<u64>,

    /// Extra non-empty blocks pruned from each end of a trial's window
    #[arg(long)]
    num_blocks_to_prune: Option<u64>,

    /// Save the combined report as report.json in the run directory
    #[arg(long)]
    save_json: bool,

    /// Ask the trial helper to save a report per trial
    #[arg(long)]
    save_test_json: bool,

    /// Only print the final summary
    #[arg(long)]
    quiet: bool,

    /// Keep run directory and trial logs after the run
    #[arg(long)]
    keep_logs: bool,

    /// Root directory for run directories
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,

    /// Trial helper executable
    #[arg(long, value_name = "PROGRAM", env = "TPS_SEARCH_TRIAL_PROGRAM")]
    trial_program: Option<PathBuf>,

    /// Extra arguments for the trial helper, after `--`
    #[arg(last = true)]
    trial_args: Vec<String>,
}

impl Args {
    /// Command-line values take precedence over the config file
    fn apply_to(&self, config: &mut SearchConfig) {
        if let Some(v) = self.max_tps_to_test {
            config.max_tps_to_test = v;
        }
        if let Some(v) = self.test_iteration_duration_sec {
            config.coarse_duration_secs = v;
        }
        if let Some(v) = self.test_iteration_min_step {
            config.min_step = v;
        }
        if let Some(v) = self.final_iterations_duration_sec {
            config.confirmation_duration_secs = v;
        }
        if let Some(v) = self.tps_limit_per_generator {
            config.generator_rate_cap = v;
        }
        if let Some(v) = self.num_blocks_to_prune {
            config.extra_prune_blocks = v;
        }
        if let Some(dir) = &self.log_dir {
            config.log_root = dir.clone();
        }
        if let Some(program) = &self.trial_program {
            config.trial.program = Some(program.clone());
        }
        config.trial.args.extend(self.trial_args.iter().cloned());

        config.save_report |= self.save_json;
        config.save_trial_reports |= self.save_test_json;
        config.quiet |= self.quiet;
        config.keep_logs |= self.keep_logs;
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
    }
}

fn main() {
    let args = Args::parse();

    let (config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = tps_common::init_tracing(&config.logging) {
        eprintln!("Error: failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    match source {
        Some(source) => info!("Configuration loaded from {}", source),
        None => info!("No config file found, using defaults"),
    }

    let start_time = Instant::now();
    match run(&config) {
        Ok(report) => {
            info!(
                "Search complete in {:.1} seconds, max rate {} tps",
                start_time.elapsed().as_secs_f64(),
                report.max_rate_achieved()
            );
        }
        Err(e) => {
            error!("Search failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Load, override and validate the configuration
fn load_config(args: &Args) -> Result<(SearchConfig, Option<tps_common::ConfigPathSource>)> {
    let (mut config, source) =
        SearchConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply_to(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok((config, source))
}

/// Run the two-phase search and handle its artifacts
///
/// The run directory is cleaned up whether or not the search completes,
/// unless `keep_logs` is set.
fn run(config: &SearchConfig) -> Result<CombinedReport> {
    let layout = ArtifactLayout::new(&config.log_root, Utc::now());
    layout
        .create()
        .context("Failed to create artifact directories")?;
    info!("Run directory: {}", layout.run_dir().display());

    let result = run_search(config, &layout);

    if !config.keep_logs {
        // keep the run dir only when it holds an exported report
        layout.cleanup(layout.report_path().is_file());
    }

    result
}

fn run_search(config: &SearchConfig, layout: &ArtifactLayout) -> Result<CombinedReport> {
    let mut runner = CommandTrialRunner::new(&config.trial, layout.trial_logs_dir())
        .context("Failed to set up trial runner")?
        .with_save_trial_reports(config.save_trial_reports);

    let snapshot = config.snapshot().context("Failed to snapshot configuration")?;
    let orchestrator = SearchOrchestrator::new(config.settings());

    let quiet = config.quiet;
    let report = orchestrator
        .run_with_report_and_progress(&mut runner, snapshot, &mut |event| {
            if !quiet {
                print_progress(event);
            }
        })
        .context("Search did not complete")?;

    display_results(&report, quiet);

    if config.save_report {
        let path = layout.report_path();
        match report.export_json(&path) {
            Ok(()) => println!("\n✓ Report exported to: {}", path.display()),
            Err(e) => warn!("Failed to export report: {}", e),
        }
    }

    Ok(report)
}

/// Print each step as soon as its trial finishes
fn print_progress(event: SearchEvent<'_>) {
    match event {
        SearchEvent::PhaseStarted { phase, plan } => println!(
            "{}",
            CliFormatter::format_phase_header(
                phase.number(),
                &format!("{} over {}", phase, plan.interval)
            )
        ),
        SearchEvent::Step { record, .. } => {
            println!("{}", CliFormatter::format_step_progress(record))
        }
    }
}

fn display_results(report: &CombinedReport, quiet: bool) {
    if !quiet {
        println!(
            "{}",
            CliFormatter::format_outcome_table("Coarse search", &report.coarse)
        );
        println!(
            "{}",
            CliFormatter::format_outcome_table("Confirmation search", &report.confirmation)
        );
    }

    println!("{}", CliFormatter::format_session_summary(report));
}
