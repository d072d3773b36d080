//! Server channel over HTTP POST

use super::ServerChannel;
use crate::error::ChannelError;
use async_trait::async_trait;
use printer_agent_shared::{AcknowledgementPayload, StatusPayload};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

/// Posts JSON reports to the server's printer endpoints
#[derive(Clone)]
pub struct HttpServerChannel {
    client: Client,
    server_url: String,
    printer_id: String,
}

impl HttpServerChannel {
    pub fn new(server_url: impl Into<String>, printer_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
            printer_id: printer_id.into(),
        }
    }

    /// Endpoint receiving acknowledgements for `command_id`
    pub fn acknowledgement_url(&self, command_id: &str) -> String {
        format!(
            "{}/printers/{}/commands/{}/acknowledgements",
            self.server_url, self.printer_id, command_id
        )
    }

    /// Endpoint receiving status reports
    pub fn status_url(&self) -> String {
        format!("{}/printers/{}/status", self.server_url, self.printer_id)
    }

    async fn post<T: Serialize + Sync>(&self, url: &str, body: &T) -> Result<(), ChannelError> {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::Status(status.as_u16()));
        }
        debug!("[CHANNEL] POST {} -> {}", url, status);
        Ok(())
    }
}

#[async_trait]
impl ServerChannel for HttpServerChannel {
    async fn send_acknowledgement(
        &self,
        command_id: &str,
        payload: &AcknowledgementPayload,
    ) -> Result<(), ChannelError> {
        self.post(&self.acknowledgement_url(command_id), payload).await
    }

    async fn send_status(&self, payload: &StatusPayload) -> Result<(), ChannelError> {
        self.post(&self.status_url(), payload).await
    }
}
