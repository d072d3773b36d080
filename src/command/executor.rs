//! Command executor - decodes and dispatches incoming commands

use super::handlers::{FirmwareUpgradeCommand, PrintDataCommand};
use super::{Command, CommandContext};
use printer_agent_shared::{CommandType, InboundCommand, PayloadError};
use std::time::Instant;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Result of dispatching a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// Command accepted, work runs asynchronously
    Scheduled,
    /// Command handled without scheduling work
    Skipped,
    /// Command could not be decoded
    Rejected { message: String },
}

/// Executes commands received from the server
pub struct CommandExecutor {
    ctx: CommandContext,
    pending_commands: RwLock<Vec<PendingCommand>>,
}

/// A command whose deferred work is still running
#[derive(Debug)]
pub struct PendingCommand {
    pub command_id: String,
    pub cmd_type: CommandType,
    pub started_at: Instant,
    handle: JoinHandle<()>,
}

impl CommandExecutor {
    /// Create a new command executor
    pub fn new(ctx: CommandContext) -> Self {
        Self {
            ctx,
            pending_commands: RwLock::new(Vec::new()),
        }
    }

    /// Build the handler for an inbound command
    pub fn build(&self, inbound: &InboundCommand) -> Result<Box<dyn Command>, PayloadError> {
        let command: Box<dyn Command> = match inbound.command_type()? {
            CommandType::FirmwareUpgrade => Box::new(FirmwareUpgradeCommand::new(
                inbound.id.clone(),
                inbound.firmware_upgrade_payload()?,
                self.ctx.clone(),
            )),
            CommandType::PrintData => Box::new(PrintDataCommand::new(
                inbound.id.clone(),
                inbound.print_data_payload()?,
                self.ctx.clone(),
            )),
        };
        Ok(command)
    }

    /// Execute a command.
    ///
    /// Returns once the command has been acknowledged as received and its
    /// work scheduled; the work itself is tracked as pending.
    pub async fn execute(&self, inbound: &InboundCommand) -> DispatchResult {
        info!(
            "[EXECUTOR] Executing command: id={} type={}",
            inbound.id, inbound.command
        );

        let command = match self.build(inbound) {
            Ok(command) => command,
            Err(e) => {
                warn!("[EXECUTOR] Rejected command {}: {}", inbound.id, e);
                return DispatchResult::Rejected {
                    message: e.to_string(),
                };
            }
        };

        let command_id = command.id().to_string();
        let cmd_type = command.command_type();

        match command.handle().await {
            Some(handle) => {
                debug!("[EXECUTOR] Command {} executing asynchronously", command_id);
                let mut pending = self.pending_commands.write().await;
                pending.retain(|c| !c.handle.is_finished());
                pending.push(PendingCommand {
                    command_id,
                    cmd_type,
                    started_at: Instant::now(),
                    handle,
                });
                DispatchResult::Scheduled
            }
            None => DispatchResult::Skipped,
        }
    }

    /// Get pending command count
    pub async fn pending_count(&self) -> usize {
        let mut pending = self.pending_commands.write().await;
        pending.retain(|c| !c.handle.is_finished());
        pending.len()
    }

    /// Wait for every pending command to finish
    pub async fn drain(&self) {
        let pending: Vec<PendingCommand> = self.pending_commands.write().await.drain(..).collect();

        for command in pending {
            match command.handle.await {
                Ok(()) => debug!(
                    "[EXECUTOR] Command {} ({}) finished after {:?}",
                    command.command_id,
                    command.cmd_type,
                    command.started_at.elapsed()
                ),
                Err(e) => error!(
                    "[EXECUTOR] Command {} ({}) aborted: {}",
                    command.command_id, command.cmd_type, e
                ),
            }
        }
    }
}
