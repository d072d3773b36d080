//! Inbound command types and acknowledgement states

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Commands the agent knows how to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    FirmwareUpgrade,
    PrintData,
}

impl CommandType {
    /// Wire name of the command
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::FirmwareUpgrade => "firmware_upgrade",
            CommandType::PrintData => "print_data",
        }
    }
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgement state of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckState {
    Received,
    Completed,
    Failed,
}

impl AckState {
    /// Completed and Failed end the lifecycle
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AckState::Received)
    }
}

/// Errors raised while decoding a command payload
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Unknown command type: {0}")]
    UnknownCommand(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A command as delivered by the command router.
///
/// The command type is kept as a string so that unknown commands can be
/// reported instead of failing the whole decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundCommand {
    pub id: String,
    pub command: String,
    #[serde(default)]
    pub payload: Value,
}

impl InboundCommand {
    /// Decode a command from its JSON representation
    pub fn from_json(raw: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Resolve the command type
    pub fn command_type(&self) -> Result<CommandType, PayloadError> {
        serde_json::from_value(Value::String(self.command.clone()))
            .map_err(|_| PayloadError::UnknownCommand(self.command.clone()))
    }

    /// Decode the payload into a firmware upgrade payload
    pub fn firmware_upgrade_payload(&self) -> Result<FirmwareUpgradePayload, PayloadError> {
        let payload: FirmwareUpgradePayload = serde_json::from_value(self.payload.clone())?;
        if payload.package_url.trim().is_empty() {
            return Err(PayloadError::MissingField("package_url"));
        }
        Ok(payload)
    }

    /// Decode the payload into a print data payload
    pub fn print_data_payload(&self) -> Result<PrintDataPayload, PayloadError> {
        let payload: PrintDataPayload = serde_json::from_value(self.payload.clone())?;
        if payload.file_url.trim().is_empty() {
            return Err(PayloadError::MissingField("file_url"));
        }
        Ok(payload)
    }
}

/// Payload of a `firmware_upgrade` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareUpgradePayload {
    pub package_url: String,
}

/// Payload of a `print_data` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintDataPayload {
    pub file_url: String,
    /// Opaque settings blob, written verbatim to the print settings file
    #[serde(default)]
    pub settings: String,
}
