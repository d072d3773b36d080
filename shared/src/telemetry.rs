//! Printer telemetry
//!
//! The status document the print engine publishes, as the agent reads it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Print engine state as reported in the status document.
///
/// States the agent does not know about keep their raw name so they are
/// reported back exactly as the engine published them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PrinterState {
    PrinterOn,
    DoorClosed,
    Initializing,
    Homing,
    Home,
    PrintSetup,
    MovingToStartPosition,
    Printing,
    Paused,
    ConfirmCancel,
    EndingPrint,
    Error,
    /// Anything else, including a missing state (empty name)
    Unknown(String),
}

const STATE_NAMES: [(PrinterState, &str); 12] = [
    (PrinterState::PrinterOn, "PrinterOnState"),
    (PrinterState::DoorClosed, "DoorClosedState"),
    (PrinterState::Initializing, "InitializingState"),
    (PrinterState::Homing, "HomingState"),
    (PrinterState::Home, "HomeState"),
    (PrinterState::PrintSetup, "PrintSetupState"),
    (PrinterState::MovingToStartPosition, "MovingToStartPositionState"),
    (PrinterState::Printing, "PrintingState"),
    (PrinterState::Paused, "PausedState"),
    (PrinterState::ConfirmCancel, "ConfirmCancelState"),
    (PrinterState::EndingPrint, "EndingPrintState"),
    (PrinterState::Error, "ErrorState"),
];

impl PrinterState {
    /// Name used in the status document
    pub fn as_str(&self) -> &str {
        if let PrinterState::Unknown(raw) = self {
            return raw;
        }
        STATE_NAMES
            .iter()
            .find(|(state, _)| state == self)
            .map(|(_, name)| *name)
            .unwrap_or_default()
    }
}

impl Default for PrinterState {
    fn default() -> Self {
        PrinterState::Unknown(String::new())
    }
}

impl From<String> for PrinterState {
    fn from(raw: String) -> Self {
        STATE_NAMES
            .iter()
            .find(|(_, name)| *name == raw)
            .map(|(state, _)| state.clone())
            .unwrap_or(PrinterState::Unknown(raw))
    }
}

impl From<PrinterState> for String {
    fn from(state: PrinterState) -> Self {
        match state {
            PrinterState::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for PrinterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrinterState::Unknown(raw) => write!(f, "{}", raw),
            known => write!(f, "{:?}", known),
        }
    }
}

/// A point-in-time read of the printer status.
///
/// Fields the agent does not interpret are kept in `extra` so the full
/// document can be forwarded to the server unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    #[serde(default)]
    pub state: PrinterState,
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub error_message: String,
    /// Empty when no job is active
    #[serde(default)]
    pub job_state: String,
    #[serde(default)]
    pub job_id: String,
    /// Current layer
    #[serde(default)]
    pub layer: u32,
    #[serde(default)]
    pub total_layers: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TelemetrySnapshot {
    /// Parse a status document
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Whether the engine reports an active job (or local printable data)
    pub fn has_job(&self) -> bool {
        !self.job_state.is_empty()
    }
}
