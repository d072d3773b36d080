//! Print engine connection over a status file and a command pipe

use super::{is_home, Device, SettingsCommand};
use crate::config::PathsConfig;
use crate::error::DeviceError;
use async_trait::async_trait;
use printer_agent_shared::TelemetrySnapshot;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

const CMD_START_PRINT_DATA_LOAD: &str = "STARTPRINTDATALOAD";
const CMD_PROCESS_PRINT_DATA: &str = "PROCESSPRINTDATA";

/// Device backed by the engine's status file and command pipe
pub struct PipeDevice {
    status_file: PathBuf,
    command_pipe: PathBuf,
    print_data_dir: PathBuf,
    firmware_upgrade_program: PathBuf,
}

impl PipeDevice {
    /// Create a device from the configured paths
    pub fn new(paths: &PathsConfig) -> Self {
        Self {
            status_file: paths.status_file.clone(),
            command_pipe: paths.command_pipe.clone(),
            print_data_dir: paths.print_data_dir.clone(),
            firmware_upgrade_program: paths.firmware_upgrade_program.clone(),
        }
    }

    /// Write a command word to the engine
    pub async fn send_command(&self, command: &str) -> Result<(), DeviceError> {
        debug!("[DEVICE] Sending command {}", command);

        let mut pipe = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&self.command_pipe)
            .await?;
        pipe.write_all(format!("{}\n", command).as_bytes()).await?;
        pipe.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl Device for PipeDevice {
    async fn telemetry(&self) -> Result<TelemetrySnapshot, DeviceError> {
        let raw = tokio::fs::read_to_string(&self.status_file).await?;
        Ok(TelemetrySnapshot::from_json(&raw)?)
    }

    async fn purge_print_data_dir(&self) -> Result<(), DeviceError> {
        tokio::fs::create_dir_all(&self.print_data_dir).await?;

        let mut entries = tokio::fs::read_dir(&self.print_data_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                tokio::fs::remove_dir_all(&path).await?;
            } else {
                tokio::fs::remove_file(&path).await?;
            }
            debug!("[DEVICE] Purged {}", path.display());
        }
        Ok(())
    }

    async fn load_print_data(&self) -> Result<(), DeviceError> {
        self.validate_state(is_home).await?;
        self.send_command(CMD_START_PRINT_DATA_LOAD).await
    }

    async fn process_print_data(&self) -> Result<(), DeviceError> {
        self.validate_state(is_home).await?;
        self.send_command(CMD_PROCESS_PRINT_DATA).await
    }

    async fn apply_settings(&self, command: SettingsCommand) -> Result<(), DeviceError> {
        self.send_command(command.as_str()).await
    }

    async fn apply_firmware(&self, path: &Path) -> Result<(), DeviceError> {
        info!(
            "[DEVICE] Running {} {}",
            self.firmware_upgrade_program.display(),
            path.display()
        );

        let output = Command::new(&self.firmware_upgrade_program)
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                DeviceError::Apply(format!(
                    "failed to run {}: {}",
                    self.firmware_upgrade_program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeviceError::Apply(format!(
                "{} ({})",
                stderr.trim(),
                output.status
            )));
        }
        Ok(())
    }
}
