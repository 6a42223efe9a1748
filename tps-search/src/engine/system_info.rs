//! Host environment detection
//!
//! **Purpose:** Record where a search ran (OS, kernel release, CPU) and which
//! version of the system under test it measured.

use serde::{Deserialize, Serialize};
#[cfg(target_os = "linux")]
use std::fs;

const UNKNOWN: &str = "Unknown";

/// Environment information embedded in every report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    /// Operating system name (e.g., "linux", "macos")
    pub system: String,

    /// OS family (e.g., "unix", "windows")
    pub os_family: String,

    /// Kernel or OS release string
    pub release: String,

    /// CPU model/name
    pub cpu: String,

    /// Version reported by the system under test, if known
    pub target_version: Option<String>,
}

impl EnvironmentInfo {
    /// Detect host information
    ///
    /// **Platform support:**
    /// - Linux: Reads /proc/cpuinfo and /proc/sys/kernel/osrelease
    /// - macOS: sysctl and uname
    /// - Others: std::env::consts only
    pub fn detect() -> Self {
        Self {
            system: std::env::consts::OS.to_string(),
            os_family: std::env::consts::FAMILY.to_string(),
            release: Self::detect_release(),
            cpu: Self::detect_cpu(),
            target_version: None,
        }
    }

    /// Set the version of the system under test
    pub fn with_target_version(mut self, version: Option<String>) -> Self {
        self.target_version = version;
        self
    }

    fn detect_release() -> String {
        #[cfg(target_os = "linux")]
        {
            if let Ok(content) = fs::read_to_string("/proc/sys/kernel/osrelease") {
                let release = content.trim();
                if !release.is_empty() {
                    return release.to_string();
                }
            }
        }

        #[cfg(unix)]
        {
            if let Some(release) = command_output("uname", &["-r"]) {
                return release;
            }
        }

        UNKNOWN.to_string()
    }

    fn detect_cpu() -> String {
        #[cfg(target_os = "linux")]
        {
            if let Ok(content) = fs::read_to_string("/proc/cpuinfo") {
                if let Some(cpu) = parse_cpuinfo_model(&content) {
                    return cpu;
                }
            }
        }

        #[cfg(target_os = "macos")]
        {
            if let Some(cpu) = command_output("sysctl", &["-n", "machdep.cpu.brand_string"]) {
                return cpu;
            }
        }

        UNKNOWN.to_string()
    }
}

/// First "model name" value in /proc/cpuinfo content
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_cpuinfo_model(content: &str) -> Option<String> {
    content
        .lines()
        .filter(|line| line.starts_with("model name"))
        .find_map(|line| line.split_once(':'))
        .map(|(_, name)| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Trimmed stdout of a successful command, None on any failure or empty output
#[cfg(unix)]
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = std::process::Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
