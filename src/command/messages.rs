//! Acknowledgement messages reported to the server

use std::fmt::Display;

pub const FIRMWARE_UPGRADE_SUCCESS: &str = "firmware upgrade success";

pub fn firmware_download_error(url: &str) -> String {
    format!("firmware download error: {}", url)
}

/// Short description of an error raised while executing a command
pub fn exception_brief(err: &dyn Display) -> String {
    format!("exception brief: {}", err)
}
