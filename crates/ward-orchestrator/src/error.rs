//! Error types for the orchestrator.

use thiserror::Error;

/// Orchestrator-specific errors.
///
/// Faults inside a turn never appear here; they become the generic answer.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The message was empty or whitespace.
    #[error("Message is empty")]
    EmptyMessage,

    /// Session not found.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Agent setup failed.
    #[error("Agent error: {0}")]
    Agent(#[from] ward_agent::AgentError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ward_core::ConfigError),
}

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
