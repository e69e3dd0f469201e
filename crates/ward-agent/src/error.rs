//! Error types for the agent crate.

use thiserror::Error;

/// Errors that can occur in agent operations.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Missing or invalid configuration (API key, base URL).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request never produced an HTTP response.
    #[error("model request failed: {0}")]
    Transport(String),

    /// The request timed out.
    #[error("model request timed out: {0}")]
    Timeout(String),

    /// The endpoint answered with a non-success status.
    #[error("model API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Body or message returned by the endpoint.
        message: String,
    },

    /// The endpoint answered but without any content.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// The reply did not match the expected structure.
    #[error("failed to parse response: {0}")]
    ResponseParse(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AgentError {
    /// Whether a fresh attempt could succeed.
    ///
    /// Rate limits and server errors are transient; other 4xx responses and
    /// configuration problems are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Configuration(_) => false,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Transport(_)
            | Self::Timeout(_)
            | Self::EmptyResponse
            | Self::ResponseParse(_)
            | Self::Serialization(_) => true,
        }
    }
}

impl From<ward_core::ConfigError> for AgentError {
    fn from(err: ward_core::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
