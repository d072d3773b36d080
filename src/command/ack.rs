//! Shared acknowledgement helper

use crate::channel::ServerChannel;
use crate::device::Device;
use printer_agent_shared::{ack_payload, AckLifecycle, AckState, CommandType, TelemetrySnapshot};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Sends the acknowledgements of one command.
///
/// Each acknowledgement carries a fresh telemetry read. Send failures are
/// logged and swallowed; a lost acknowledgement never fails the command.
pub struct Acknowledger {
    command_id: String,
    command_type: CommandType,
    device: Arc<dyn Device>,
    channel: Arc<dyn ServerChannel>,
    lifecycle: AckLifecycle,
}

impl Acknowledger {
    pub fn new(
        command_id: impl Into<String>,
        command_type: CommandType,
        device: Arc<dyn Device>,
        channel: Arc<dyn ServerChannel>,
    ) -> Self {
        Self {
            command_id: command_id.into(),
            command_type,
            device,
            channel,
            lifecycle: AckLifecycle::new(),
        }
    }

    pub fn command_id(&self) -> &str {
        &self.command_id
    }

    /// Last state acknowledged
    pub fn state(&self) -> Option<AckState> {
        self.lifecycle.state()
    }

    /// Acknowledge `state` with `message`
    pub async fn acknowledge(&mut self, state: AckState, message: &str) {
        if let Err(e) = self.lifecycle.advance(state) {
            error!("[ACK] Command {}: {}", self.command_id, e);
            return;
        }

        let snapshot = match self.device.telemetry().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("[ACK] Telemetry unavailable, acknowledging without it: {}", e);
                TelemetrySnapshot::default()
            }
        };

        let payload = ack_payload(self.command_type, state, message, &snapshot);

        info!(
            "[ACK] {} command {} {:?} {}",
            self.command_type, self.command_id, state, message
        );

        if let Err(e) = self
            .channel
            .send_acknowledgement(&self.command_id, &payload)
            .await
        {
            error!(
                "[ACK] Failed to send {:?} acknowledgement for command {}: {}",
                state, self.command_id, e
            );
        }
    }
}
