mod channel;
mod command;
mod config;
mod device;
mod download;
mod error;
mod web;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use channel::{HttpServerChannel, ServerChannel};
use clap::Parser;
use command::{CommandContext, CommandExecutor, DispatchResult};
use config::AgentConfig;
use device::{Device, PipeDevice};
use download::HttpDownloader;
use printer_agent_shared::{status_payload, InboundCommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "printer-agent", about = "Executes server commands on a resin printer")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let config = AgentConfig::load(cli.config.as_deref())?;

    info!("Printer agent starting: {}", config.printer_id);
    info!("  Server: {}", config.server_url);
    info!("  Status interval: {:?}", config.status_interval());

    let device: Arc<dyn Device> = Arc::new(PipeDevice::new(&config.paths));
    let channel: Arc<dyn ServerChannel> = Arc::new(HttpServerChannel::new(
        config.server_url.clone(),
        config.printer_id.clone(),
    ));
    let downloader = Arc::new(
        HttpDownloader::new(&config.download).context("failed to build HTTP client")?,
    );

    let executor = CommandExecutor::new(CommandContext {
        device: device.clone(),
        downloader,
        channel: channel.clone(),
        print_data_dir: config.paths.print_data_dir.clone(),
        print_settings_file: config.paths.print_settings_file.clone(),
        temp_dir: std::env::temp_dir(),
    });

    // Settings HTTP surface
    let listener = tokio::net::TcpListener::bind(&config.http_bind)
        .await
        .with_context(|| format!("failed to bind {}", config.http_bind))?;
    info!("Settings server listening on {}", config.http_bind);
    let app = web::router(web::SettingsState {
        device: device.clone(),
        settings_file: Arc::new(config.paths.settings_file.clone()),
    });
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("[WEB] Settings server stopped: {}", e);
        }
    });

    // Spawn status reporting task
    let status_device = device.clone();
    let status_channel = channel.clone();
    let status_interval = config.status_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(status_interval);
        loop {
            ticker.tick().await;
            report_status(status_device.as_ref(), status_channel.as_ref()).await;
        }
    });

    // Main command loop, one JSON command per line
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(&executor, &line).await,
                Ok(None) => {
                    info!("Command input closed");
                    break;
                }
                Err(e) => {
                    error!("Failed to read command input: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    info!(
        "Waiting for {} pending command(s)",
        executor.pending_count().await
    );
    executor.drain().await;
    info!("Printer agent stopped");
    Ok(())
}

async fn handle_line(executor: &CommandExecutor, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let inbound = match InboundCommand::from_json(line) {
        Ok(inbound) => inbound,
        Err(e) => {
            warn!("Ignoring undecodable command: {}", e);
            return;
        }
    };

    match executor.execute(&inbound).await {
        DispatchResult::Scheduled => debug!("Command {} scheduled", inbound.id),
        DispatchResult::Skipped => debug!("Command {} skipped", inbound.id),
        DispatchResult::Rejected { message } => {
            warn!("Command {} rejected: {}", inbound.id, message)
        }
    }
}

/// Send one status report built from the current telemetry
async fn report_status(device: &dyn Device, channel: &dyn ServerChannel) {
    let snapshot = match device.telemetry().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("[STATUS] Failed to read telemetry: {}", e);
            return;
        }
    };

    if let Err(e) = channel.send_status(&status_payload(&snapshot)).await {
        error!("[STATUS] Failed to send status: {}", e);
    }
}
