//! Axum routes reading and writing the printer settings file

use crate::device::{Device, SettingsCommand};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// State shared by the settings handlers
#[derive(Clone)]
pub struct SettingsState {
    pub device: Arc<dyn Device>,
    pub settings_file: Arc<PathBuf>,
}

/// Creates the router serving `/settings`
pub fn router(state: SettingsState) -> Router {
    Router::new()
        .route("/settings", get(get_settings).put(put_settings))
        .with_state(state)
}

/// Helper to create a JSON error response with a message and status code
fn json_error(message: &str, status: StatusCode) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

async fn get_settings(State(state): State<SettingsState>) -> Response {
    match tokio::fs::read_to_string(state.settings_file.as_path()).await {
        Ok(raw) => ([(header::CONTENT_TYPE, "application/json")], raw).into_response(),
        Err(e) => {
            error!("[WEB] Failed to read settings: {}", e);
            json_error(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn put_settings(State(state): State<SettingsState>, body: String) -> Response {
    let settings: serde_json::Value = match serde_json::from_str(&body) {
        Ok(settings) => settings,
        Err(e) => return json_error(&e.to_string(), StatusCode::BAD_REQUEST),
    };

    let contents = match serde_json::to_string_pretty(&settings) {
        Ok(contents) => contents,
        Err(e) => return json_error(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
    };

    if let Err(e) = tokio::fs::write(state.settings_file.as_path(), contents).await {
        error!("[WEB] Failed to write settings: {}", e);
        return json_error(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    if let Err(e) = state
        .device
        .apply_settings(SettingsCommand::ApplySettingsFile)
        .await
    {
        error!("[WEB] Failed to apply settings: {}", e);
        return json_error(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    info!("[WEB] Settings updated");
    Json(serde_json::json!({})).into_response()
}
