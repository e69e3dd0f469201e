//! CLI error types.

use thiserror::Error;

/// Errors surfaced to the terminal.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ward_core::ConfigError),

    #[error(transparent)]
    Agent(#[from] ward_agent::AgentError),

    #[error(transparent)]
    Orchestrator(#[from] ward_orchestrator::OrchestratorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, CliError>;
