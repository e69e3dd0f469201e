//! Speech synthesis handler.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::SpeechRequest;

/// POST /api/speech - Read text aloud, returning WAV audio.
pub async fn synthesize_speech(
    State(state): State<AppState>,
    Json(req): Json<SpeechRequest>,
) -> Result<Response> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text is empty".to_string()));
    }

    let speech = state
        .speech
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("speech not configured".to_string()))?;

    let audio = speech
        .synthesize(&req.text, req.voice.as_deref())
        .await
        .map_err(|e| {
            warn!(error = %e, "Speech synthesis failed");
            ApiError::BadGateway("speech synthesis failed".to_string())
        })?;

    Ok(([(header::CONTENT_TYPE, "audio/wav")], audio).into_response())
}
