//! In-memory collaborators for tests

use crate::channel::ServerChannel;
use crate::command::CommandContext;
use crate::device::{Device, SettingsCommand};
use crate::download::Downloader;
use crate::error::{ChannelError, DeviceError, DownloadError};
use async_trait::async_trait;
use printer_agent_shared::{
    AckState, AcknowledgementPayload, PrinterState, StatusPayload, TelemetrySnapshot,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Firmware package seen by the device at apply time
#[derive(Debug, Clone)]
pub struct AppliedFirmware {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

/// Device that records every call
pub struct FakeDevice {
    snapshot: Mutex<TelemetrySnapshot>,
    print_data_dir: PathBuf,
    calls: Mutex<Vec<String>>,
    firmware: Mutex<Vec<AppliedFirmware>>,
    firmware_error: Option<String>,
    reject_load: bool,
    settings_error: bool,
}

impl FakeDevice {
    pub fn new(state: PrinterState, print_data_dir: &Path) -> Self {
        Self {
            snapshot: Mutex::new(TelemetrySnapshot {
                state,
                ..Default::default()
            }),
            print_data_dir: print_data_dir.to_path_buf(),
            calls: Mutex::new(Vec::new()),
            firmware: Mutex::new(Vec::new()),
            firmware_error: None,
            reject_load: false,
            settings_error: false,
        }
    }

    /// Make `apply_firmware` fail with `message`
    pub fn failing_firmware(mut self, message: &str) -> Self {
        self.firmware_error = Some(message.to_string());
        self
    }

    /// Make `load_print_data` fail with an invalid state
    pub fn rejecting_load(mut self) -> Self {
        self.reject_load = true;
        self
    }

    /// Make `apply_settings` fail as if the command pipe were gone
    pub fn failing_settings(mut self) -> Self {
        self.settings_error = true;
        self
    }

    pub fn set_snapshot(&self, snapshot: TelemetrySnapshot) {
        *self.snapshot.lock().unwrap() = snapshot;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn applied_firmware(&self) -> Vec<AppliedFirmware> {
        self.firmware.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl Device for FakeDevice {
    async fn telemetry(&self) -> Result<TelemetrySnapshot, DeviceError> {
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn purge_print_data_dir(&self) -> Result<(), DeviceError> {
        self.record("purge");
        if self.print_data_dir.exists() {
            std::fs::remove_dir_all(&self.print_data_dir)?;
        }
        std::fs::create_dir_all(&self.print_data_dir)?;
        Ok(())
    }

    async fn load_print_data(&self) -> Result<(), DeviceError> {
        self.record("load");
        if self.reject_load {
            return Err(DeviceError::InvalidState {
                state: PrinterState::Printing,
            });
        }
        Ok(())
    }

    async fn process_print_data(&self) -> Result<(), DeviceError> {
        self.record("process");
        Ok(())
    }

    async fn apply_settings(&self, command: SettingsCommand) -> Result<(), DeviceError> {
        self.record(format!("apply_settings:{}", command.as_str()));
        if self.settings_error {
            return Err(DeviceError::Communication(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "command pipe missing",
            )));
        }
        Ok(())
    }

    async fn apply_firmware(&self, path: &Path) -> Result<(), DeviceError> {
        self.record("apply_firmware");
        self.firmware.lock().unwrap().push(AppliedFirmware {
            path: path.to_path_buf(),
            contents: std::fs::read(path)?,
        });
        match &self.firmware_error {
            Some(message) => Err(DeviceError::Apply(message.clone())),
            None => Ok(()),
        }
    }
}

/// Canned download outcome
#[derive(Debug, Clone)]
pub enum FakeResponse {
    /// Deliver every chunk, then succeed
    Chunks(Vec<&'static str>),
    /// Deliver the chunks, then fail as if the connection dropped
    FailAfter(Vec<&'static str>),
}

/// Downloader replaying a canned response
pub struct FakeDownloader {
    response: FakeResponse,
    requests: Mutex<Vec<(String, usize)>>,
}

impl FakeDownloader {
    pub fn new(response: FakeResponse) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// (url, max_redirects) of every request made
    pub fn requests(&self) -> Vec<(String, usize)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn get(
        &self,
        url: &str,
        max_redirects: usize,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, DownloadError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), max_redirects));

        let (chunks, fail) = match &self.response {
            FakeResponse::Chunks(chunks) => (chunks.clone(), false),
            FakeResponse::FailAfter(chunks) => (chunks.clone(), true),
        };

        let mut total = 0u64;
        for chunk in chunks {
            sink.write_all(chunk.as_bytes()).await?;
            total += chunk.len() as u64;
        }
        if fail {
            return Err(DownloadError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset mid-transfer",
            )));
        }
        sink.flush().await?;
        Ok(total)
    }
}

/// Channel keeping every report in memory
#[derive(Default)]
pub struct RecordingChannel {
    acks: Mutex<Vec<(String, AcknowledgementPayload)>>,
    statuses: Mutex<Vec<StatusPayload>>,
}

impl RecordingChannel {
    pub fn acks(&self) -> Vec<(String, AcknowledgementPayload)> {
        self.acks.lock().unwrap().clone()
    }

    /// (state, message) of every acknowledgement, in send order
    pub fn ack_summary(&self) -> Vec<(AckState, String)> {
        self.acks()
            .into_iter()
            .map(|(_, p)| (p.data.state, p.data.message))
            .collect()
    }

    pub fn statuses(&self) -> Vec<StatusPayload> {
        self.statuses.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServerChannel for RecordingChannel {
    async fn send_acknowledgement(
        &self,
        command_id: &str,
        payload: &AcknowledgementPayload,
    ) -> Result<(), ChannelError> {
        self.acks
            .lock()
            .unwrap()
            .push((command_id.to_string(), payload.clone()));
        Ok(())
    }

    async fn send_status(&self, payload: &StatusPayload) -> Result<(), ChannelError> {
        self.statuses.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

/// A command context over fakes rooted in a scratch directory
pub struct Harness {
    pub dir: TempDir,
    pub device: Arc<FakeDevice>,
    pub downloader: Arc<FakeDownloader>,
    pub channel: Arc<RecordingChannel>,
}

impl Harness {
    pub fn new(state: PrinterState, response: FakeResponse) -> Self {
        Self::with_device(response, |dir| FakeDevice::new(state, dir))
    }

    pub fn with_device(response: FakeResponse, device: impl FnOnce(&Path) -> FakeDevice) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("tmp")).unwrap();
        let print_data_dir = dir.path().join("print_data");
        let device = Arc::new(device(print_data_dir.as_path()));

        Self {
            dir,
            device,
            downloader: Arc::new(FakeDownloader::new(response)),
            channel: Arc::new(RecordingChannel::default()),
        }
    }

    pub fn context(&self) -> CommandContext {
        CommandContext {
            device: self.device.clone(),
            downloader: self.downloader.clone(),
            channel: self.channel.clone(),
            print_data_dir: self.print_data_dir(),
            print_settings_file: self.print_settings_file(),
            temp_dir: self.temp_dir(),
        }
    }

    pub fn print_data_dir(&self) -> PathBuf {
        self.dir.path().join("print_data")
    }

    pub fn print_settings_file(&self) -> PathBuf {
        self.dir.path().join("print_settings")
    }

    /// Scratch directory for firmware packages
    pub fn temp_dir(&self) -> PathBuf {
        self.dir.path().join("tmp")
    }

    /// Names of the files left in a directory
    pub fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().to_string())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}
