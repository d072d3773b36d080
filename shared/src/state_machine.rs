//! Acknowledgement State Machine
//!
//! Defines the valid acknowledgement transitions for a single command.
//!
//! ```text
//!   (none) ──► Received ──► Completed
//!     │            └──────► Failed
//!     └──► Completed | Failed
//! ```
//!
//! A command may skip `Received` entirely (print data only acknowledges once),
//! but it never re-enters `Received` and never leaves a terminal state.

use crate::AckState;
use thiserror::Error;

/// Rejected acknowledgement transition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid acknowledgement transition from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub from: Option<AckState>,
    pub to: AckState,
}

/// Tracks the acknowledgement state of one command
#[derive(Debug, Default, Clone)]
pub struct AckLifecycle {
    current: Option<AckState>,
}

impl AckLifecycle {
    /// Create a lifecycle with nothing acknowledged yet
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Last acknowledged state
    pub fn state(&self) -> Option<AckState> {
        self.current
    }

    /// Whether a terminal acknowledgement has been sent
    pub fn is_finished(&self) -> bool {
        self.current.map(|s| s.is_terminal()).unwrap_or(false)
    }

    /// Check a transition without applying it
    pub fn can_advance(&self, next: AckState) -> bool {
        use AckState::*;

        matches!(
            (self.current, next),
            (None, _) | (Some(Received), Completed) | (Some(Received), Failed)
        )
    }

    /// Apply a transition
    pub fn advance(&mut self, next: AckState) -> Result<AckState, InvalidTransition> {
        if !self.can_advance(next) {
            return Err(InvalidTransition {
                from: self.current,
                to: next,
            });
        }
        self.current = Some(next);
        Ok(next)
    }
}
