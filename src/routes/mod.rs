//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! JSON API consumed by the builder front end:
//! - `POST /api/chat`: one conversational turn over the caller's files
//! - `POST /api/generate`: first version of a site from a brief
//! - `POST /api/preview`: render a file set in the preview sandbox
//! - `POST /api/validate`: run the static validator only
//! - `GET /api/preview/ws`: live preview session; the host relays the
//!   frame's visual-edit events and receives style patches
//!
//! The service is stateless per project; every request carries its files.
//! A preview socket holds one sandbox for as long as it stays open.

pub mod chat;
pub mod preview;
pub mod preview_ws;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Requests carry whole projects; allow more than axum's 2 MB default.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat::chat))
        .route("/api/generate", post(chat::generate))
        .route("/api/preview", post(preview::preview))
        .route("/api/validate", post(preview::validate))
        .route("/api/preview/ws", get(preview_ws::preview_socket))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
