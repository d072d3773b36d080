//! Print data command handler
//!
//! Streams the print file into the print data directory, then has the
//! engine load and process it and apply the accompanying print settings.

use crate::command::{Acknowledger, Command, CommandContext};
use crate::device::{is_home, SettingsCommand};
use crate::error::DeviceError;
use async_trait::async_trait;
use printer_agent_shared::{AckState, CommandType, PrintDataPayload};
use reqwest::Url;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Print files are fetched from the URL as given
const MAX_REDIRECTS: usize = 0;

/// Handle a `print_data` command.
///
/// Nothing is acknowledged when the printer is not home or the download
/// fails; only a completed staging attempt is acknowledged.
pub struct PrintDataCommand {
    ack: Acknowledger,
    ctx: CommandContext,
    payload: PrintDataPayload,
}

impl PrintDataCommand {
    pub fn new(command_id: impl Into<String>, payload: PrintDataPayload, ctx: CommandContext) -> Self {
        let ack = Acknowledger::new(
            command_id,
            CommandType::PrintData,
            ctx.device.clone(),
            ctx.channel.clone(),
        );
        Self { ack, ctx, payload }
    }

    /// Deferred part of the lifecycle
    async fn run(mut self) {
        // The engine expects a single file in the print data directory
        if let Err(e) = self.ctx.device.purge_print_data_dir().await {
            error!("[PRINT_DATA] Could not purge print data directory: {}", e);
            return;
        }

        let Some(destination) = self.destination() else {
            error!(
                "[PRINT_DATA] No file name in {}, aborting print_data command handling",
                self.payload.file_url
            );
            return;
        };

        if !self.download(&destination).await {
            return;
        }

        if let Err(e) = self.stage().await {
            match e {
                DeviceError::InvalidState { .. } => {
                    error!("[PRINT_DATA] {}, aborting print_data command handling", e);
                }
                e => error!("[PRINT_DATA] Staging print data failed: {}", e),
            }
        }

        self.ack.acknowledge(AckState::Completed, "").await;
    }

    /// Path of the downloaded file inside the print data directory
    fn destination(&self) -> Option<PathBuf> {
        file_name_from_url(&self.payload.file_url).map(|name| self.ctx.print_data_dir.join(name))
    }

    /// Stream the print data to `destination`, logging failure
    async fn download(&self, destination: &Path) -> bool {
        let url = &self.payload.file_url;

        let mut file = match tokio::fs::File::create(destination).await {
            Ok(file) => file,
            Err(e) => {
                error!(
                    "[PRINT_DATA] Could not open {}: {}",
                    destination.display(),
                    e
                );
                return false;
            }
        };

        let result = self
            .ctx
            .downloader
            .get(url, MAX_REDIRECTS, &mut file)
            .await;

        // Close the file before anything reads it
        if let Err(e) = file.flush().await {
            warn!(
                "[PRINT_DATA] Failed to flush {}: {}",
                destination.display(),
                e
            );
        }
        drop(file);

        match result {
            Ok(bytes) => {
                info!(
                    "[PRINT_DATA] Print data download of {} complete, {} bytes downloaded to {}",
                    url,
                    bytes,
                    destination.display()
                );
                true
            }
            Err(e) => {
                error!("[PRINT_DATA] Error downloading print data from {}: {}", url, e);
                false
            }
        }
    }

    /// Load and process the staged data, then apply its settings
    async fn stage(&self) -> Result<(), DeviceError> {
        let device = &self.ctx.device;

        device.load_print_data().await?;
        device.process_print_data().await?;

        tokio::fs::write(&self.ctx.print_settings_file, &self.payload.settings).await?;
        device
            .apply_settings(SettingsCommand::ApplyPrintSettings)
            .await
    }
}

#[async_trait]
impl Command for PrintDataCommand {
    fn id(&self) -> &str {
        self.ack.command_id()
    }

    fn command_type(&self) -> CommandType {
        CommandType::PrintData
    }

    async fn handle(self: Box<Self>) -> Option<JoinHandle<()>> {
        // Only start a download if the printer is in the home state
        if let Err(e) = self.ctx.device.validate_state(is_home).await {
            error!(
                "[PRINT_DATA] {}, not downloading print data, aborting print_data command handling",
                e
            );
            return None;
        }

        Some(tokio::spawn(async move { self.run().await }))
    }
}

/// Last non-empty path segment of `url`
fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let name = parsed.path_segments()?.rev().find(|s| !s.is_empty())?;
    if name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}
