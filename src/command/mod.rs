//! Command execution infrastructure for the printer agent
//!
//! This module handles:
//! - Decoding commands delivered by the server
//! - Dispatching to the per-type command handlers
//! - Sending acknowledgements as each command moves through its lifecycle
//! - Tracking deferred command work

mod ack;
mod executor;
pub mod handlers;
pub mod messages;

pub use ack::Acknowledger;
pub use executor::{CommandExecutor, DispatchResult};
pub use handlers::{FirmwareUpgradeCommand, PrintDataCommand};

use crate::channel::ServerChannel;
use crate::device::Device;
use crate::download::Downloader;
use async_trait::async_trait;
use printer_agent_shared::CommandType;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Collaborators and filesystem locations a command runs against
#[derive(Clone)]
pub struct CommandContext {
    pub device: Arc<dyn Device>,
    pub downloader: Arc<dyn Downloader>,
    pub channel: Arc<dyn ServerChannel>,
    /// Directory holding the staged print data
    pub print_data_dir: PathBuf,
    /// Where the print settings blob is written
    pub print_settings_file: PathBuf,
    /// Directory for firmware package temp files
    pub temp_dir: PathBuf,
}

/// One inbound instruction
#[async_trait]
pub trait Command: Send {
    /// Server-assigned command id
    fn id(&self) -> &str;

    fn command_type(&self) -> CommandType;

    /// Run the command lifecycle.
    ///
    /// Returns as soon as the work has been scheduled; the returned handle
    /// resolves when the deferred work is done. `None` means nothing was
    /// scheduled.
    async fn handle(self: Box<Self>) -> Option<JoinHandle<()>>;
}
