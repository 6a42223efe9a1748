//! Run directory layout
//!
//! ```text
//! <log_root>/
//!   <UTC %Y-%m-%d_%H-%M-%S>/     run directory, holds report.json
//!     testRunLogs/               per-trial artifacts
//! ```

use crate::Result;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Timestamp format of run directory names
pub const RUN_DIR_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Subdirectory holding the trial helper's logs
pub const TRIAL_LOGS_DIR: &str = "testRunLogs";

/// File name of the exported report inside the run directory
pub const REPORT_FILE_NAME: &str = "report.json";

/// Directories used by one search run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
    run_dir: PathBuf,
    trial_logs_dir: PathBuf,
}

impl ArtifactLayout {
    pub fn new(log_root: impl Into<PathBuf>, started_at: DateTime<Utc>) -> Self {
        let root = log_root.into();
        let run_dir = root.join(started_at.format(RUN_DIR_FORMAT).to_string());
        let trial_logs_dir = run_dir.join(TRIAL_LOGS_DIR);
        Self {
            root,
            run_dir,
            trial_logs_dir,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn trial_logs_dir(&self) -> &Path {
        &self.trial_logs_dir
    }

    pub fn report_path(&self) -> PathBuf {
        self.run_dir.join(REPORT_FILE_NAME)
    }

    /// Create any missing directories of the layout
    pub fn create(&self) -> Result<()> {
        for dir in [&self.root, &self.run_dir, &self.trial_logs_dir] {
            if !dir.is_dir() {
                info!("Creating test artifacts dir: {}", dir.display());
                std::fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }

    /// Remove run artifacts.
    ///
    /// When the report was saved only the trial logs go, keeping
    /// `report.json`; otherwise the whole run directory is removed. Failures
    /// are logged and otherwise ignored.
    pub fn cleanup(&self, save_report: bool) {
        let target = if save_report {
            &self.trial_logs_dir
        } else {
            &self.run_dir
        };

        if !target.is_dir() {
            debug!("Nothing to clean up at {}", target.display());
            return;
        }

        info!("Cleaning up test artifacts dir: {}", target.display());
        if let Err(e) = std::fs::remove_dir_all(target) {
            warn!("Failed to remove {}: {}", target.display(), e);
        }
    }
}
