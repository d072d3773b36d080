//! Firmware upgrade command handler
//!
//! Downloads the package named in the payload to a temp file and hands it
//! to the device. The temp file is removed whatever the outcome.

use crate::command::{messages, Acknowledger, Command, CommandContext};
use async_trait::async_trait;
use printer_agent_shared::{AckState, CommandType, FirmwareUpgradePayload};
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Redirect hops allowed when fetching the package
const MAX_REDIRECTS: usize = 1;

const TEMP_FILE_PREFIX: &str = "firmware_upgrade_package";

/// Handle a `firmware_upgrade` command
pub struct FirmwareUpgradeCommand {
    ack: Acknowledger,
    ctx: CommandContext,
    payload: FirmwareUpgradePayload,
}

impl FirmwareUpgradeCommand {
    pub fn new(
        command_id: impl Into<String>,
        payload: FirmwareUpgradePayload,
        ctx: CommandContext,
    ) -> Self {
        let ack = Acknowledger::new(
            command_id,
            CommandType::FirmwareUpgrade,
            ctx.device.clone(),
            ctx.channel.clone(),
        );
        Self { ack, ctx, payload }
    }

    /// Deferred part of the lifecycle
    async fn run(mut self) {
        let package = match tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .tempfile_in(&self.ctx.temp_dir)
        {
            Ok(package) => package,
            Err(e) => {
                error!("[FIRMWARE_UPGRADE] Could not create package file: {}", e);
                self.ack
                    .acknowledge(AckState::Failed, &messages::exception_brief(&e))
                    .await;
                return;
            }
        };

        // `package` deletes itself on drop, so early returns and panics below
        // still release it. The explicit close reports removal errors.
        if self.download(&package).await {
            self.upgrade(package.path()).await;
        }

        if let Err(e) = package.close() {
            warn!("[FIRMWARE_UPGRADE] Failed to remove package file: {}", e);
        }
    }

    /// Fetch the package into `package`, acknowledging failure
    async fn download(&mut self, package: &NamedTempFile) -> bool {
        let url = &self.payload.package_url;

        let result = match package.reopen() {
            Ok(file) => {
                let mut file = tokio::fs::File::from_std(file);
                self.ctx
                    .downloader
                    .get(url, MAX_REDIRECTS, &mut file)
                    .await
            }
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(bytes) => {
                info!(
                    "[FIRMWARE_UPGRADE] Downloaded {} ({} bytes) to {}",
                    url,
                    bytes,
                    package.path().display()
                );
                true
            }
            Err(e) => {
                error!("[FIRMWARE_UPGRADE] Error downloading {}: {}", url, e);
                let message = messages::firmware_download_error(url);
                self.ack.acknowledge(AckState::Failed, &message).await;
                false
            }
        }
    }

    /// Apply the downloaded package
    async fn upgrade(&mut self, path: &Path) {
        match self.ctx.device.apply_firmware(path).await {
            Ok(()) => {
                info!("[FIRMWARE_UPGRADE] Firmware upgrade successful");
                self.ack
                    .acknowledge(AckState::Completed, messages::FIRMWARE_UPGRADE_SUCCESS)
                    .await;
            }
            Err(e) => {
                error!("[FIRMWARE_UPGRADE] Firmware upgrade failed: {}", e);
                self.ack
                    .acknowledge(AckState::Failed, &messages::exception_brief(&e))
                    .await;
            }
        }
    }
}

#[async_trait]
impl Command for FirmwareUpgradeCommand {
    fn id(&self) -> &str {
        self.ack.command_id()
    }

    fn command_type(&self) -> CommandType {
        CommandType::FirmwareUpgrade
    }

    async fn handle(self: Box<Self>) -> Option<JoinHandle<()>> {
        let mut command = self;
        command.ack.acknowledge(AckState::Received, "").await;

        Some(tokio::spawn(async move { command.run().await }))
    }
}
