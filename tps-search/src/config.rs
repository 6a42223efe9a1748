//! Search configuration
//!
//! Loaded from TOML (see `tps_common::config` for path resolution), then
//! overridden by command-line flags in the binary. Every field has a default
//! so a missing file or a partial file is never an error.

use crate::engine::{SearchSettings, TrialParams};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tps_common::{load_toml_config, resolve_config_path, ConfigPathSource, LoggingConfig};
use tracing::info;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TPS_SEARCH_CONFIG";

/// Directory name under the user config dir
pub const APP_NAME: &str = "tps-search";

/// Full configuration of a search run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Upper bound of the coarse search
    #[serde(default = "default_max_tps_to_test")]
    pub max_tps_to_test: i64,

    /// Search grid step
    #[serde(default = "default_min_step")]
    pub min_step: i64,

    /// Trial duration during the coarse search
    #[serde(default = "default_coarse_duration_secs")]
    pub coarse_duration_secs: u64,

    /// Trial duration during the confirmation search
    #[serde(default = "default_confirmation_duration_secs")]
    pub confirmation_duration_secs: u64,

    /// Maximum rate per generator instance
    #[serde(default = "default_generator_rate_cap")]
    pub generator_rate_cap: u64,

    /// Extra non-empty blocks pruned from each end of a trial's window
    #[serde(default = "default_extra_prune_blocks")]
    pub extra_prune_blocks: u64,

    /// Write the combined report into the run directory
    #[serde(default)]
    pub save_report: bool,

    /// Ask the trial helper to save its own per-trial report
    #[serde(default)]
    pub save_trial_reports: bool,

    /// Keep the run directory and trial logs after the run
    #[serde(default)]
    pub keep_logs: bool,

    /// Suppress human-readable progress output
    #[serde(default)]
    pub quiet: bool,

    /// Root directory for run directories
    #[serde(default = "default_log_root")]
    pub log_root: PathBuf,

    #[serde(default)]
    pub trial: TrialCommandConfig,

    /// Cluster settings, passed through to the trial helper untouched
    #[serde(default)]
    pub cluster: toml::Table,

    /// Trial helper settings, passed through untouched
    #[serde(default)]
    pub trial_helper: toml::Table,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How to invoke the external trial helper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialCommandConfig {
    /// Trial helper executable
    #[serde(default)]
    pub program: Option<PathBuf>,

    /// Arguments placed before the per-trial arguments
    #[serde(default)]
    pub args: Vec<String>,

    /// Seconds allowed past the trial duration before the helper is killed
    #[serde(default = "default_timeout_grace_secs")]
    pub timeout_grace_secs: u64,

    /// Arguments that make the program print the target's version
    #[serde(default)]
    pub version_args: Vec<String>,
}

impl Default for TrialCommandConfig {
    fn default() -> Self {
        Self {
            program: None,
            args: Vec::new(),
            timeout_grace_secs: default_timeout_grace_secs(),
            version_args: Vec::new(),
        }
    }
}

fn default_max_tps_to_test() -> i64 {
    50000
}

fn default_min_step() -> i64 {
    500
}

fn default_coarse_duration_secs() -> u64 {
    150
}

fn default_confirmation_duration_secs() -> u64 {
    300
}

fn default_generator_rate_cap() -> u64 {
    4000
}

fn default_extra_prune_blocks() -> u64 {
    2
}

fn default_log_root() -> PathBuf {
    PathBuf::from("performance_test")
}

fn default_timeout_grace_secs() -> u64 {
    60
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_tps_to_test: default_max_tps_to_test(),
            min_step: default_min_step(),
            coarse_duration_secs: default_coarse_duration_secs(),
            confirmation_duration_secs: default_confirmation_duration_secs(),
            generator_rate_cap: default_generator_rate_cap(),
            extra_prune_blocks: default_extra_prune_blocks(),
            save_report: false,
            save_trial_reports: false,
            keep_logs: false,
            quiet: false,
            log_root: default_log_root(),
            trial: TrialCommandConfig::default(),
            cluster: toml::Table::new(),
            trial_helper: toml::Table::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Resolve and load the config file, falling back to defaults when none
    /// is found. Returns where the file came from, if anywhere.
    pub fn load(cli_path: Option<&Path>) -> Result<(Self, Option<ConfigPathSource>)> {
        match resolve_config_path(cli_path, CONFIG_ENV_VAR, APP_NAME) {
            Some((path, source)) => {
                let config: SearchConfig = load_toml_config(&path)?;
                info!("Loaded config from {} ({})", path.display(), source);
                Ok((config, Some(source)))
            }
            None => Ok((Self::default(), None)),
        }
    }

    /// Check the search preconditions
    pub fn validate(&self) -> Result<()> {
        if self.min_step <= 0 {
            return Err(Error::Config(format!(
                "min_step must be positive, got {}",
                self.min_step
            )));
        }
        if self.max_tps_to_test < 0 {
            return Err(Error::Config(format!(
                "max_tps_to_test must be non-negative, got {}",
                self.max_tps_to_test
            )));
        }
        if self.trial.program.is_none() {
            return Err(Error::Config(
                "no trial helper program configured (set trial.program or --trial-program)"
                    .to_string(),
            ));
        }
        self.settings()
            .validate()
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// JSON snapshot of the effective config for the report
    pub fn snapshot(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Engine parameters for the orchestrator
    pub fn settings(&self) -> SearchSettings {
        SearchSettings {
            max_tps_to_test: self.max_tps_to_test,
            min_step: self.min_step,
            coarse_duration_secs: self.coarse_duration_secs,
            confirmation_duration_secs: self.confirmation_duration_secs,
            params: TrialParams {
                generator_rate_cap: self.generator_rate_cap,
                extra_prune_blocks: self.extra_prune_blocks,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn with_program(mut config: SearchConfig) -> SearchConfig {
        config.trial.program = Some(PathBuf::from("/opt/trial-helper"));
        config
    }

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.max_tps_to_test, 50000);
        assert_eq!(config.min_step, 500);
        assert_eq!(config.coarse_duration_secs, 150);
        assert_eq!(config.confirmation_duration_secs, 300);
        assert_eq!(config.generator_rate_cap, 4000);
        assert_eq!(config.extra_prune_blocks, 2);
        assert_eq!(config.log_root, PathBuf::from("performance_test"));
        assert_eq!(config.trial.timeout_grace_secs, 60);
        assert!(!config.save_report && !config.keep_logs && !config.quiet);
        assert_eq!(config.trial.program, None);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: SearchConfig = toml::from_str(
            r#"
            max_tps_to_test = 20000
            save_report = true

            [trial]
            program = "/usr/local/bin/trial-helper"
            args = ["--topo", "mesh"]

            [cluster]
            producer_nodes = 1
            validation_nodes = 1

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_tps_to_test, 20000);
        assert_eq!(config.min_step, 500);
        assert!(config.save_report);
        assert_eq!(
            config.trial.program,
            Some(PathBuf::from("/usr/local/bin/trial-helper"))
        );
        assert_eq!(config.trial.timeout_grace_secs, 60);
        assert_eq!(config.cluster["producer_nodes"].as_integer(), Some(1));
        assert!(config.trial_helper.is_empty());
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validate() {
        let mut config = with_program(SearchConfig {
            min_step: 0,
            ..SearchConfig::default()
        });
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.min_step = 500;
        config.max_tps_to_test = -1;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        // zero upper bound is allowed
        config.max_tps_to_test = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_program() {
        let config = SearchConfig::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("trial.program")));

        assert!(with_program(SearchConfig::default()).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unrepresentable_bound() {
        let config = with_program(SearchConfig {
            max_tps_to_test: i64::MAX - 100,
            ..SearchConfig::default()
        });
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_settings_projection() {
        let config = SearchConfig {
            max_tps_to_test: 8000,
            generator_rate_cap: 1000,
            ..SearchConfig::default()
        };
        let settings = config.settings();

        assert_eq!(settings.max_tps_to_test, 8000);
        assert_eq!(settings.min_step, 500);
        assert_eq!(settings.coarse_duration_secs, 150);
        assert_eq!(settings.confirmation_duration_secs, 300);
        assert_eq!(settings.params.generator_rate_cap, 1000);
        assert_eq!(settings.params.extra_prune_blocks, 2);
    }

    #[test]
    fn test_snapshot_includes_pass_through_tables() {
        let mut config = SearchConfig::default();
        config
            .cluster
            .insert("topology".to_string(), toml::Value::String("mesh".to_string()));

        let snapshot = config.snapshot().unwrap();
        assert_eq!(snapshot["max_tps_to_test"], 50000);
        assert_eq!(snapshot["cluster"]["topology"], "mesh");
        assert_eq!(snapshot["logging"]["level"], "info");
    }

    #[test]
    #[serial]
    fn test_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("search.toml");
        std::fs::write(&path, "min_step = 250\n").unwrap();

        let (config, source) = SearchConfig::load(Some(&path)).unwrap();
        assert_eq!(config.min_step, 250);
        assert_eq!(source, Some(ConfigPathSource::CommandLine));
    }

    #[test]
    #[serial]
    fn test_load_from_env_var() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("env.toml");
        std::fs::write(&path, "max_tps_to_test = 1234\n").unwrap();

        std::env::set_var(CONFIG_ENV_VAR, &path);
        let result = SearchConfig::load(None);
        std::env::remove_var(CONFIG_ENV_VAR);

        let (config, source) = result.unwrap();
        assert_eq!(config.max_tps_to_test, 1234);
        assert_eq!(source, Some(ConfigPathSource::Environment));
    }

    #[test]
    #[serial]
    fn test_load_missing_explicit_path_fails() {
        let err = SearchConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, Error::Common(_)));
    }

    #[test]
    #[serial]
    fn test_load_malformed_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "min_step = \"five hundred\"\n").unwrap();

        let err = SearchConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(
            err,
            Error::Common(tps_common::Error::TomlParse { .. })
        ));
    }
}
