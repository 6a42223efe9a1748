//! Configuration file resolution and loading
//!
//! Config file lookup follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. `<user config dir>/<app>/config.toml`
//! 4. No file (caller falls back to compiled defaults)

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where a resolved config path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPathSource {
    CommandLine,
    Environment,
    UserConfigDir,
}

impl std::fmt::Display for ConfigPathSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CommandLine => write!(f, "command line"),
            Self::Environment => write!(f, "environment"),
            Self::UserConfigDir => write!(f, "user config dir"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolve which config file to load.
///
/// An explicit command-line path is returned even if it does not exist so the
/// subsequent load reports it. Environment and user-dir candidates are only
/// returned when the file exists. `None` means "use compiled defaults".
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    app_name: &str,
) -> Option<(PathBuf, ConfigPathSource)> {
    if let Some(path) = cli_arg {
        return Some((path.to_path_buf(), ConfigPathSource::CommandLine));
    }

    if let Ok(value) = std::env::var(env_var_name) {
        let path = PathBuf::from(value.trim());
        if !value.trim().is_empty() && path.exists() {
            return Some((path, ConfigPathSource::Environment));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join(app_name).join("config.toml"))?;
    if user_config.exists() {
        return Some((user_config, ConfigPathSource::UserConfigDir));
    }

    None
}

/// Read and deserialize a TOML file
pub fn load_toml_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
    })?;

    toml::from_str(&content).map_err(|source| Error::TomlParse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
        #[serde(default)]
        logging: LoggingConfig,
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.file.is_none());
    }

    #[test]
    fn test_cli_arg_wins_even_if_missing() {
        let path = PathBuf::from("/definitely/not/here.toml");
        let (resolved, source) =
            resolve_config_path(Some(&path), "TPS_COMMON_TEST_UNUSED", "tps-test").unwrap();
        assert_eq!(resolved, path);
        assert_eq!(source, ConfigPathSource::CommandLine);
    }

    #[test]
    #[serial]
    fn test_env_var_used_when_file_exists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("from_env.toml");
        std::fs::write(&path, "name = \"env\"\n").unwrap();

        std::env::set_var("TPS_COMMON_TEST_CONFIG", &path);
        let resolved = resolve_config_path(None, "TPS_COMMON_TEST_CONFIG", "tps-test-none");
        std::env::remove_var("TPS_COMMON_TEST_CONFIG");

        let (resolved, source) = resolved.unwrap();
        assert_eq!(resolved, path);
        assert_eq!(source, ConfigPathSource::Environment);
    }

    #[test]
    #[serial]
    fn test_env_var_ignored_when_file_missing() {
        std::env::set_var("TPS_COMMON_TEST_CONFIG", "/nope/missing.toml");
        let resolved =
            resolve_config_path(None, "TPS_COMMON_TEST_CONFIG", "tps-test-app-that-does-not-exist");
        std::env::remove_var("TPS_COMMON_TEST_CONFIG");

        assert!(resolved.is_none());
    }

    #[test]
    fn test_load_toml_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.toml");
        std::fs::write(&path, "name = \"abc\"\n[logging]\nlevel = \"debug\"\n").unwrap();

        let sample: Sample = load_toml_config(&path).unwrap();
        assert_eq!(sample.name, "abc");
        assert_eq!(sample.logging.level, "debug");
    }

    #[test]
    fn test_load_toml_config_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "name = = oops").unwrap();

        let err = load_toml_config::<Sample>(&path).unwrap_err();
        assert!(matches!(err, Error::TomlParse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_load_toml_config_missing_file() {
        let err = load_toml_config::<Sample>(Path::new("/no/such/file.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
