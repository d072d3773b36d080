//! Printer Agent Shared Protocol Types
//!
//! This crate provides the command, telemetry and acknowledgement types
//! exchanged between the printer agent and the controlling server, along with
//! the pure builders that turn a command outcome and a telemetry snapshot into
//! the payloads the server expects.

pub mod command;
pub mod payload;
pub mod state_machine;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use command::{
    AckState, CommandType, FirmwareUpgradePayload, InboundCommand, PayloadError, PrintDataPayload,
};
pub use payload::{
    ack_payload, job_fields, status_payload, AckData, AcknowledgementPayload, JobFields,
    StatusPayload,
};
pub use state_machine::{AckLifecycle, InvalidTransition};
pub use telemetry::{PrinterState, TelemetrySnapshot};
