//! Printer device abstraction
//!
//! Commands never talk to the print engine directly; they go through the
//! [`Device`] trait so that the engine transport can be swapped out.

mod pipe;

pub use pipe::PipeDevice;

use crate::error::DeviceError;
use async_trait::async_trait;
use printer_agent_shared::{PrinterState, TelemetrySnapshot};
use std::path::Path;

/// Predicate evaluated against the current printer state
pub type StatePredicate = fn(&PrinterState) -> bool;

/// Settings reload requests understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsCommand {
    /// Load the print settings staged alongside new print data
    ApplyPrintSettings,
    /// Reload the printer settings file
    ApplySettingsFile,
}

impl SettingsCommand {
    /// Engine command word
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsCommand::ApplyPrintSettings => "APPLYPRINTSETTINGS",
            SettingsCommand::ApplySettingsFile => "APPLYSETTINGS",
        }
    }
}

/// Operations the agent needs from the printer
#[async_trait]
pub trait Device: Send + Sync {
    /// Read the current status
    async fn telemetry(&self) -> Result<TelemetrySnapshot, DeviceError>;

    /// Fail with [`DeviceError::InvalidState`] unless `predicate` holds for the current state
    async fn validate_state(&self, predicate: StatePredicate) -> Result<(), DeviceError> {
        let snapshot = self.telemetry().await?;
        if predicate(&snapshot.state) {
            Ok(())
        } else {
            Err(DeviceError::InvalidState {
                state: snapshot.state,
            })
        }
    }

    /// Remove everything from the print data directory
    async fn purge_print_data_dir(&self) -> Result<(), DeviceError>;

    /// Load the staged print data
    async fn load_print_data(&self) -> Result<(), DeviceError>;

    /// Process the loaded print data
    async fn process_print_data(&self) -> Result<(), DeviceError>;

    /// Ask the engine to reload settings
    async fn apply_settings(&self, command: SettingsCommand) -> Result<(), DeviceError>;

    /// Flash the firmware package at `path`
    async fn apply_firmware(&self, path: &Path) -> Result<(), DeviceError>;
}

/// True only in the home state
pub fn is_home(state: &PrinterState) -> bool {
    *state == PrinterState::Home
}
