//! Outbound reports to the controlling server

mod http;

pub use http::HttpServerChannel;

use crate::error::ChannelError;
use async_trait::async_trait;
use printer_agent_shared::{AcknowledgementPayload, StatusPayload};

/// One-way channel to the server
#[async_trait]
pub trait ServerChannel: Send + Sync {
    /// Report a command acknowledgement
    async fn send_acknowledgement(
        &self,
        command_id: &str,
        payload: &AcknowledgementPayload,
    ) -> Result<(), ChannelError>;

    /// Report printer status
    async fn send_status(&self, payload: &StatusPayload) -> Result<(), ChannelError>;
}
