//! Request DTOs for the API.

use serde::Deserialize;

/// Send message to session request.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    /// Message content.
    pub message: String,
}

/// Speech synthesis request.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechRequest {
    /// Text to read aloud.
    pub text: String,
    /// Voice to use instead of the configured one.
    pub voice: Option<String>,
}
