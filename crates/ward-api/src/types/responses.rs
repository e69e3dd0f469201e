//! Response DTOs for the API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ward_orchestrator::{Message, MessageRole};

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

/// Session created response.
#[derive(Debug, Clone, Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: String,
}

/// Session list response.
#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    /// Session IDs.
    pub sessions: Vec<String>,
    /// Total count.
    pub total: usize,
}

/// Answer to one message.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    pub session_id: String,
    pub answer: String,
    /// The turn could not be completed.
    pub failed: bool,
}

/// One history entry.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            timestamp: message.timestamp,
        }
    }
}

/// Session history response.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub messages: Vec<HistoryEntry>,
}
