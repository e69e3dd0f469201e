//! Conversation sessions and the store that holds them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;
use ward_agent::{ConversationHistory, Message};

/// Identifier of a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One conversation: its history and turn counter.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub history: ConversationHistory,
    /// Turns started so far.
    pub turns: u64,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            history: ConversationHistory::new(),
            turns: 0,
            created_at: Utc::now(),
        }
    }
}

/// Shared handle to a session; held locked for a whole turn.
pub type SessionHandle = Arc<Mutex<Session>>;

/// All live sessions, keyed by id.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session with a fresh id.
    pub async fn create(&self) -> SessionId {
        let id = SessionId::new();
        self.get_or_create(&id).await;
        id
    }

    pub async fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Existing session for `id`, or a new empty one.
    pub async fn get_or_create(&self, id: &SessionId) -> SessionHandle {
        if let Some(session) = self.get(id).await {
            return session;
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(id.clone()).or_insert_with(|| {
            info!(session_id = %id, "Creating session");
            Arc::new(Mutex::new(Session::new(id.clone())))
        }))
    }

    /// Session ids in sorted order.
    pub async fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Snapshot of a session's history.
    ///
    /// Waits for any turn in progress on that session to finish.
    pub async fn history(&self, id: &SessionId) -> Option<Vec<Message>> {
        let session = self.get(id).await?;
        let session = session.lock().await;
        Some(session.history.messages().to_vec())
    }

    /// Remove a session. Returns whether it existed.
    pub async fn remove(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!(session_id = %id, "Removed session");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
