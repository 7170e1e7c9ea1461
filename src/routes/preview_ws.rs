//! Preview WebSocket — live visual-edit channel.
//!
//! DESIGN
//! ======
//! One socket per preview frame, one [`PreviewSandbox`] per socket. The host
//! page relays the frame bridge's pointer events here and posts each `PATCH`
//! reply back into the iframe, so outlines and the edit cursor track the
//! sandbox's own tree.
//!
//! Frame processing is pure: [`process_inbound_text`] takes the session and
//! one inbound text frame and returns the outbound frames. The socket loop
//! only moves text in and out.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → connection id assigned, no sandbox yet
//! 2. `MOUNT {files}` → `DOCUMENT` + `VISUAL_EDITING_READY` (again on remount)
//! 3. Host messages (`VISUAL_EDITING_TOGGLE`, `POINTER_OVER`, `POINTER_OUT`,
//!    `CLICK`) → `PATCH` plus any `ELEMENT_SELECTED`
//! 4. Close → sandbox dropped

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::builder::ProjectFileSet;
use crate::error::ErrorCode;
use crate::sandbox::{ErrorOverlay, FramePatch, PreviewSandbox, SandboxError, SandboxMessage};

const MOUNT_TYPE: &str = "MOUNT";

// =============================================================================
// FRAMES
// =============================================================================

#[derive(Debug, Deserialize)]
struct MountFrame {
    #[serde(default)]
    files: ProjectFileSet,
}

/// Freshly rendered document for the frame's `srcdoc`.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename = "DOCUMENT")]
pub struct DocumentFrame {
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<ErrorOverlay>,
    pub stubs: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename = "ERROR")]
pub struct ErrorFrame {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    Document(DocumentFrame),
    Patch(FramePatch),
    Sandbox(SandboxMessage),
    Error(ErrorFrame),
}

#[derive(Debug, thiserror::Error)]
enum SessionError {
    #[error("no preview is mounted on this connection")]
    NotMounted,
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotMounted => "E_PREVIEW_NOT_MOUNTED",
            Self::Sandbox(e) => e.error_code(),
        }
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

/// `GET /api/preview/ws`
pub async fn preview_socket(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(run_preview_ws)
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_preview_ws(mut socket: WebSocket) {
    let conn_id = Uuid::new_v4();
    info!(%conn_id, "ws: preview connected");

    let mut session: Option<PreviewSandbox> = None;

    'conn: loop {
        let Some(msg) = socket.recv().await else { break };
        let Ok(msg) = msg else { break };
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        // Rendering is CPU-bound; the session rides along to the blocking pool.
        let task = tokio::task::spawn_blocking(move || {
            let frames = process_inbound_text(&mut session, text.as_str());
            (session, frames)
        });
        let frames = match task.await {
            Ok((returned, frames)) => {
                session = returned;
                frames
            }
            Err(e) => {
                error!(%conn_id, error = %e, "ws: preview task failed");
                break;
            }
        };

        for frame in &frames {
            if send_frame(&mut socket, frame).await.is_err() {
                break 'conn;
            }
        }
    }

    info!(%conn_id, "ws: preview disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Apply one inbound text frame to the session and collect the replies.
/// Failures become a single `ERROR` frame; the session stays usable.
pub fn process_inbound_text(session: &mut Option<PreviewSandbox>, text: &str) -> Vec<Outbound> {
    match dispatch(session, text) {
        Ok(frames) => frames,
        Err(e) => {
            warn!(code = e.error_code(), error = %e, "ws: preview frame rejected");
            vec![Outbound::Error(ErrorFrame { code: e.error_code(), message: e.to_string() })]
        }
    }
}

fn dispatch(session: &mut Option<PreviewSandbox>, text: &str) -> Result<Vec<Outbound>, SessionError> {
    let value: Value = serde_json::from_str(text).map_err(SandboxError::from)?;
    if value.get("type").and_then(Value::as_str) == Some(MOUNT_TYPE) {
        let MountFrame { files } = serde_json::from_value(value).map_err(SandboxError::from)?;
        return Ok(mount(session, &files));
    }

    let sandbox = session.as_mut().ok_or(SessionError::NotMounted)?;
    let patch = sandbox.handle_raw_message(text)?;
    debug!(state = ?sandbox.editor_state(), styles = patch.styles.len(), "ws: host message applied");

    let mut frames = vec![Outbound::Patch(patch)];
    frames.extend(sandbox.take_messages().into_iter().map(Outbound::Sandbox));
    Ok(frames)
}

fn mount(session: &mut Option<PreviewSandbox>, files: &ProjectFileSet) -> Vec<Outbound> {
    let sandbox = match session.take() {
        Some(mut sandbox) => {
            sandbox.reload(files);
            sandbox
        }
        None => PreviewSandbox::mount(files),
    };
    let sandbox = session.insert(sandbox);
    debug!(files = files.len(), overlay = sandbox.overlay().is_some(), "ws: preview mounted");

    let document = DocumentFrame {
        html: sandbox.document(),
        overlay: sandbox.overlay().cloned(),
        stubs: sandbox.stubs().iter().cloned().collect(),
    };
    let mut frames = vec![Outbound::Document(document)];
    frames.extend(sandbox.take_messages().into_iter().map(Outbound::Sandbox));
    frames
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Outbound) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "preview_ws_test.rs"]
mod tests;
