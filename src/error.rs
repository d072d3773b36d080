//! Error types shared by the device, download and channel layers

use printer_agent_shared::PrinterState;
use thiserror::Error;

/// Errors raised by the printer
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The printer is not in a state that allows the operation
    #[error("Printer in invalid state: {state}")]
    InvalidState { state: PrinterState },

    /// Firmware could not be applied
    #[error("Firmware upgrade failed: {0}")]
    Apply(String),

    #[error("Printer communication error: {0}")]
    Communication(#[from] std::io::Error),

    #[error("Malformed printer status: {0}")]
    Status(#[from] serde_json::Error),
}

/// Errors raised while fetching remote content
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server responded with status {0}")]
    Status(u16),

    #[error("Too many redirects (max: {0})")]
    TooManyRedirects(usize),

    #[error("Invalid redirect location: {0}")]
    InvalidRedirect(String),

    #[error("Write error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while talking to the server
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server rejected report with status {0}")]
    Status(u16),
}
