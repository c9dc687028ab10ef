//! Router for the chat API

use std::sync::{Arc, RwLock};

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

/// Run one turn of a conversation. Creates the session when the
/// request doesn't name one.
async fn chat_handler(
    State(state): State<SharedState>,
    axum::Json(payload): axum::Json<public::ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = payload
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // Clone the session handle out before awaiting so the state lock
    // is never held across a suspension point
    let session = {
        let mut shared = state.write().expect("Unable to write shared state");
        shared.get_or_create_session(&session_id)
    };

    let reply = {
        let mut orchestrator = session.lock().await;
        orchestrator.next_turn(&payload.message).await?
    };

    Ok(axum::Json(public::ChatResponse {
        session_id,
        message: reply.text,
        history: reply.history,
    }))
}

/// Clear a conversation: history and state are replaced wholesale.
async fn clear_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = {
        let shared = state.read().expect("Unable to read shared state");
        shared.get_session(&id)
    };

    let Some(session) = session else {
        return Ok((
            StatusCode::NOT_FOUND,
            format!("Chat session {} not found", id),
        )
            .into_response());
    };

    session.lock().await.clear();

    Ok(axum::Json(public::ClearResponse {
        session_id: id,
        cleared: true,
    })
    .into_response())
}

/// List the ids of all live sessions
async fn sessions_handler(
    State(state): State<SharedState>,
) -> Result<axum::Json<public::ChatSessionsResponse>, ApiError> {
    let sessions = state
        .read()
        .expect("Unable to read shared state")
        .session_ids();
    Ok(axum::Json(public::ChatSessionsResponse { sessions }))
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(chat_handler))
        .route("/sessions", get(sessions_handler))
        .route("/{id}/clear", post(clear_handler))
}
