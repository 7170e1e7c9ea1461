//! Sandbox and validator routes: `/api/preview` and `/api/validate`.

use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::builder::ProjectFileSet;
use crate::builder::validator::{ValidationError, detect_errors};
use crate::sandbox::{ErrorOverlay, PreviewSandbox, SandboxMessage};

#[derive(Debug, Deserialize)]
pub struct FilesRequest {
    #[serde(default)]
    pub files: ProjectFileSet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    /// The full sandbox document.
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<ErrorOverlay>,
    /// Outbound sandbox messages emitted during mount.
    pub messages: Vec<SandboxMessage>,
    /// Symbols rendered as placeholders.
    pub stubs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub validation_errors: Vec<ValidationError>,
}

/// `POST /api/preview` — mount the files in a fresh sandbox.
///
/// Rendering is synchronous and CPU-bound, so it runs on the blocking pool.
pub async fn preview(Json(body): Json<FilesRequest>) -> Result<Json<PreviewResponse>, StatusCode> {
    let files = body.files;
    let response = tokio::task::spawn_blocking(move || {
        let mut sandbox = PreviewSandbox::mount(&files);
        PreviewResponse {
            html: sandbox.document(),
            overlay: sandbox.overlay().cloned(),
            messages: sandbox.take_messages(),
            stubs: sandbox.stubs().iter().cloned().collect(),
        }
    })
    .await
    .map_err(|e| {
        error!(error = %e, "preview: sandbox task failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    debug!(overlay = response.overlay.is_some(), stubs = response.stubs.len(), "preview: rendered");
    Ok(Json(response))
}

/// `POST /api/validate` — static validation only, no model call.
pub async fn validate(Json(body): Json<FilesRequest>) -> Json<ValidateResponse> {
    Json(ValidateResponse { validation_errors: detect_errors(&body.files.to_updates()) })
}
