//! Agent configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Filesystem locations shared with the print engine
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the staged print data (at most one file)
    pub print_data_dir: PathBuf,
    /// Print settings blob written before `APPLYPRINTSETTINGS`
    pub print_settings_file: PathBuf,
    /// Printer settings served by `/settings`
    pub settings_file: PathBuf,
    /// JSON status document published by the engine
    pub status_file: PathBuf,
    /// Command pipe read by the engine
    pub command_pipe: PathBuf,
    /// Program invoked with the firmware package path
    pub firmware_upgrade_program: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            print_data_dir: "/var/smith/download".into(),
            print_settings_file: "/tmp/print_settings".into(),
            settings_file: "/var/smith/config/settings".into(),
            status_file: "/tmp/PrinterStatus".into(),
            command_pipe: "/tmp/CommandPipe".into(),
            firmware_upgrade_program: "/usr/sbin/firmware-upgrade".into(),
        }
    }
}

/// HTTP download limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Seconds allowed to establish a connection
    pub connect_timeout_secs: u64,
    /// Seconds a single read may stall before the download fails
    pub read_timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            read_timeout_secs: 60,
        }
    }
}

impl DownloadConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs.max(1))
    }
}

/// Configuration for the printer agent
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Printer ID used in server endpoints
    pub printer_id: String,
    /// Base URL of the controlling server
    pub server_url: String,
    /// Seconds between status reports
    pub status_interval_secs: u64,
    /// Bind address of the settings HTTP surface
    pub http_bind: String,
    pub download: DownloadConfig,
    pub paths: PathsConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            printer_id: "printer-001".into(),
            server_url: "http://127.0.0.1:3000".into(),
            status_interval_secs: 5,
            http_bind: "0.0.0.0:8080".into(),
            download: DownloadConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Interval between status reports
    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs.max(1))
    }

    /// Parse a TOML configuration document
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("invalid configuration")
    }

    /// Load configuration from a TOML file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                Self::from_toml(&raw)
            }
            None => Ok(Self::default()),
        }
    }
}
