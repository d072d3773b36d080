//! Acknowledgement and status payload builders
//!
//! Pure functions, no I/O. Both payload kinds carry the job fields when the
//! printer reports an active job.

use serde::Serialize;

use crate::{AckState, CommandType, PrinterState, TelemetrySnapshot};

/// Job id reported when the engine has printable data but no server job id
pub const LOCAL_JOB_ID: &str = "local";

/// Error code sent with a failed acknowledgement
pub const FAILED_ERROR_CODE: u16 = 500;

/// Job fields appended to payloads while a job is active
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobFields {
    pub job_id: String,
    pub job_status: String,
    /// Fraction of layers done, 0.0 when the layer total is unknown
    pub job_progress: f64,
}

/// Periodic printer status report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusPayload {
    pub printer_status: PrinterState,
    pub error_code: i64,
    pub error_message: String,
    pub data: TelemetrySnapshot,
    #[serde(flatten)]
    pub job: Option<JobFields>,
}

/// Body of an acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AckData {
    pub command: CommandType,
    pub message: String,
    pub state: AckState,
}

/// Command acknowledgement report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcknowledgementPayload {
    pub printer_status: PrinterState,
    pub progress: u8,
    pub error_code: u16,
    pub error_message: String,
    pub data: AckData,
    #[serde(flatten)]
    pub job: Option<JobFields>,
}

/// Build a status report from a telemetry snapshot
pub fn status_payload(snapshot: &TelemetrySnapshot) -> StatusPayload {
    StatusPayload {
        printer_status: snapshot.state.clone(),
        error_code: snapshot.error_code,
        error_message: snapshot.error_message.clone(),
        data: snapshot.clone(),
        job: job_fields(snapshot),
    }
}

/// Build an acknowledgement for `command` in `state`
pub fn ack_payload(
    command: CommandType,
    state: AckState,
    message: &str,
    snapshot: &TelemetrySnapshot,
) -> AcknowledgementPayload {
    AcknowledgementPayload {
        printer_status: snapshot.state.clone(),
        progress: progress(state),
        error_code: error_code(state),
        error_message: message.to_string(),
        data: AckData {
            command,
            message: message.to_string(),
            state,
        },
        job: job_fields(snapshot),
    }
}

/// 0 until the command leaves `Received`
pub fn progress(state: AckState) -> u8 {
    match state {
        AckState::Received => 0,
        AckState::Completed | AckState::Failed => 1,
    }
}

/// 500 for a failed command, 0 otherwise
pub fn error_code(state: AckState) -> u16 {
    match state {
        AckState::Failed => FAILED_ERROR_CODE,
        AckState::Received | AckState::Completed => 0,
    }
}

/// Job fields for a snapshot, `None` when no job is active
pub fn job_fields(snapshot: &TelemetrySnapshot) -> Option<JobFields> {
    if !snapshot.has_job() {
        return None;
    }

    let job_id = if snapshot.job_id.is_empty() {
        LOCAL_JOB_ID.to_string()
    } else {
        snapshot.job_id.clone()
    };

    let job_progress = if snapshot.total_layers == 0 {
        0.0
    } else {
        snapshot.layer as f64 / snapshot.total_layers as f64
    };

    Some(JobFields {
        job_id,
        job_status: snapshot.job_state.clone(),
        job_progress,
    })
}
