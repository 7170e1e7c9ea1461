//! Turn routes: `/api/chat` and `/api/generate`.
//!
//! Both answer with the same [`TurnResponse`] shape, on success and on
//! failure, so the UI can always render a reply bubble.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::builder::ProjectFileSet;
use crate::builder::validator::ValidationError;
use crate::error::ErrorCode;
use crate::llm::types::Message;
use crate::rate_limit::RateLimitError;
use crate::sandbox::SelectedElement;
use crate::services::trace::ThoughtStep;
use crate::services::turn::{FAILURE_MESSAGE, Orchestrator, TurnFailure, TurnOutcome};
use crate::state::AppState;

pub const CLIENT_ID_HEADER: &str = "x-client-id";

const NOT_CONFIGURED_MESSAGE: &str = "The site builder has no model provider configured.";
const INVALID_REQUEST_CODE: &str = "E_INVALID_REQUEST";
const RATE_LIMITED_MESSAGE: &str = "You're sending requests too quickly. Please wait a moment and try again.";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub current_files: ProjectFileSet,
    #[serde(default)]
    pub selection_context: Option<SelectedElement>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub brief: String,
    #[serde(default)]
    pub vibe: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub message: String,
    pub files: ProjectFileSet,
    pub thought_steps: Vec<ThoughtStep>,
    pub validation_errors: Vec<ValidationError>,
    pub fix_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Set on failures the client may retry unchanged.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

impl From<TurnOutcome> for TurnResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            message: outcome.message,
            files: outcome.files,
            thought_steps: outcome.trace,
            validation_errors: outcome.errors,
            fix_attempts: outcome.fix_attempts,
            code: None,
            retryable: false,
        }
    }
}

impl TurnResponse {
    fn failure(message: &str, files: ProjectFileSet, thought_steps: Vec<ThoughtStep>, code: &str, retryable: bool) -> Self {
        Self {
            message: message.to_string(),
            files,
            thought_steps,
            validation_errors: Vec::new(),
            fix_attempts: 0,
            code: Some(code.to_string()),
            retryable,
        }
    }

    fn from_error(message: &str, files: ProjectFileSet, thought_steps: Vec<ThoughtStep>, err: &dyn ErrorCode) -> Self {
        Self::failure(message, files, thought_steps, err.error_code(), err.retryable())
    }
}

/// Why a turn request was turned away before reaching the model.
#[derive(Debug, thiserror::Error)]
enum AdmitError {
    #[error("no model provider configured")]
    NotConfigured,
    #[error(transparent)]
    RateLimited(#[from] RateLimitError),
}

impl ErrorCode for AdmitError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotConfigured => "E_LLM_NOT_CONFIGURED",
            Self::RateLimited(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::NotConfigured => false,
            Self::RateLimited(e) => e.retryable(),
        }
    }
}

impl AdmitError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn user_message(&self) -> &'static str {
        match self {
            Self::NotConfigured => NOT_CONFIGURED_MESSAGE,
            Self::RateLimited(_) => RATE_LIMITED_MESSAGE,
        }
    }

    fn reply(&self, files: ProjectFileSet) -> TurnReply {
        (self.status(), Json(TurnResponse::from_error(self.user_message(), files, Vec::new(), self)))
    }
}

type TurnReply = (StatusCode, Json<TurnResponse>);

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/chat` — run one turn over the caller's files.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> TurnReply {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return rejected(&rejection),
    };
    let client_id = client_id(&headers);
    info!(%client_id, messages = body.messages.len(), files = body.current_files.len(), "chat: turn requested");
    let orchestrator = match admit(&state, client_id) {
        Ok(orchestrator) => orchestrator,
        Err(e) => return e.reply(body.current_files),
    };
    let result = orchestrator
        .run_turn(&body.messages, &body.current_files, body.selection_context.as_ref())
        .await;
    respond(result, body.current_files)
}

/// `POST /api/generate` — build a first version of the site from a brief.
pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> TurnReply {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return rejected(&rejection),
    };
    let client_id = client_id(&headers);
    info!(%client_id, brief_len = body.brief.len(), vibe = body.vibe.as_deref(), "chat: generation requested");
    let orchestrator = match admit(&state, client_id) {
        Ok(orchestrator) => orchestrator,
        Err(e) => return e.reply(ProjectFileSet::new()),
    };
    let result = orchestrator.generate_site(&body.brief, body.vibe.as_deref()).await;
    respond(result, ProjectFileSet::new())
}

// =============================================================================
// HELPERS
// =============================================================================

/// Client key for rate limiting. Missing or malformed headers share the nil UUID.
pub(crate) fn client_id(headers: &HeaderMap) -> Uuid {
    headers
        .get(CLIENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .unwrap_or(Uuid::nil())
}

fn admit(state: &AppState, client_id: Uuid) -> Result<Arc<Orchestrator>, AdmitError> {
    let orchestrator = state.orchestrator.clone().ok_or(AdmitError::NotConfigured)?;
    if let Err(e) = state.rate_limiter.check_and_record(client_id) {
        warn!(%client_id, error = %e, "chat: rate limited");
        return Err(e.into());
    }
    Ok(orchestrator)
}

/// An unreadable body keeps the rejection's status but answers in the turn shape.
fn rejected(rejection: &JsonRejection) -> TurnReply {
    let detail = rejection.body_text();
    warn!(status = %rejection.status(), error = %detail, "chat: request rejected");
    let message = format!("The request could not be read: {detail}");
    (
        rejection.status(),
        Json(TurnResponse::failure(&message, ProjectFileSet::new(), Vec::new(), INVALID_REQUEST_CODE, false)),
    )
}

/// The caller's own files come back unchanged on failure.
fn respond(result: Result<TurnOutcome, TurnFailure>, current_files: ProjectFileSet) -> TurnReply {
    match result {
        Ok(outcome) => (StatusCode::OK, Json(outcome.into())),
        Err(failure) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TurnResponse::from_error(FAILURE_MESSAGE, current_files, failure.trace, &failure.error)),
        ),
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
