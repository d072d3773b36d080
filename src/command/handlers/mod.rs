//! Command handlers for different command types

mod firmware_upgrade;
mod print_data;

pub use firmware_upgrade::FirmwareUpgradeCommand;
pub use print_data::PrintDataCommand;
