//! Session handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use ward_orchestrator::SessionId;

use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::{
    AnswerResponse, HistoryEntry, HistoryResponse, SendMessageRequest, SessionCreatedResponse,
    SessionListResponse,
};

/// GET /api/sessions - List all sessions.
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    let sessions: Vec<String> = state
        .orchestrator
        .sessions()
        .ids()
        .await
        .iter()
        .map(ToString::to_string)
        .collect();
    let total = sessions.len();

    Json(SessionListResponse { sessions, total })
}

/// POST /api/sessions - Start a new session.
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionCreatedResponse>) {
    let id = state.orchestrator.create_session().await;
    (
        StatusCode::CREATED,
        Json(SessionCreatedResponse {
            session_id: id.to_string(),
        }),
    )
}

/// POST /api/sessions/:id/messages - Ask a question.
///
/// Unknown session ids start a new session.
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<AnswerResponse>> {
    let session_id = SessionId::from(id);
    let answer = state
        .orchestrator
        .handle_turn(&session_id, &req.message)
        .await?;

    info!(session_id = %session_id, failed = answer.failed, "Answered message");

    Ok(Json(AnswerResponse {
        session_id: session_id.to_string(),
        answer: answer.text,
        failed: answer.failed,
    }))
}

/// GET /api/sessions/:id/history - Conversation so far.
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>> {
    let session_id = SessionId::from(id);
    let messages = state.orchestrator.history(&session_id).await?;

    Ok(Json(HistoryResponse {
        session_id: session_id.to_string(),
        messages: messages.iter().map(HistoryEntry::from).collect(),
    }))
}

/// DELETE /api/sessions/:id - Forget a session.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let session_id = SessionId::from(id);
    if state.orchestrator.sessions().remove(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("session not found: {}", session_id)))
    }
}
