//! OpenAI-compatible chat completions client.
//!
//! Both agents call the model through [`ChatModel`]. [`GroqClient`] is the
//! production implementation; it performs exactly one HTTP request per call
//! and leaves retries to the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use ward_core::LlmSettings;

use crate::config::ModelConfig;
use crate::context::{Message, MessageRole};
use crate::error::{AgentError, Result};

/// A message in the chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: String,

    /// Text content of the message.
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    /// Convert from a history message.
    pub fn from_message(msg: &Message) -> Self {
        match msg.role {
            MessageRole::User => Self::user(&msg.content),
            MessageRole::Assistant => Self::assistant(&msg.content),
        }
    }
}

/// One model call: a system prompt followed by conversation messages.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    /// Ask the endpoint to return a JSON object.
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            messages: Vec::new(),
            json_mode: false,
        }
    }

    /// Append history messages in order.
    pub fn with_history(mut self, history: &[Message]) -> Self {
        self.messages
            .extend(history.iter().map(ChatMessage::from_message));
        self
    }

    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    /// System prompt plus messages, as sent on the wire.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.push(ChatMessage::system(&self.system));
        messages.extend(self.messages.iter().cloned());
        messages
    }
}

/// A text-generation backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion and return the reply text.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// Chat completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// Requested output format.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

/// Chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub choices: Vec<ChatChoice>,
    pub usage: Option<ChatUsage>,
}

impl ChatResponse {
    /// Text of the first choice, if any.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Client for Groq's OpenAI-compatible API.
#[derive(Clone)]
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    config: ModelConfig,
}

impl GroqClient {
    pub fn new(api_key: impl Into<String>, config: ModelConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            config,
        }
    }

    /// Create a client from loaded settings.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let api_key = settings.require_api_key()?;
        Ok(Self::new(api_key, ModelConfig::from_settings(settings)))
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: request.to_messages(),
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            response_format: request.json_mode.then(ResponseFormat::json_object),
        }
    }
}

#[async_trait]
impl ChatModel for GroqClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let body = self.build_request(&request);
        trace!("Sending chat request: {:?}", body);

        let response = self
            .client
            .post(self.config.completions_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AgentError::Timeout(e.to_string())
                } else {
                    AgentError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let response: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AgentError::Timeout(e.to_string())
            } else {
                AgentError::ResponseParse(format!("Failed to parse response: {}", e))
            }
        })?;

        debug!(
            model = %self.config.model,
            tokens = response.usage.as_ref().map_or(0, |u| u.total_tokens),
            "Chat response received"
        );

        response
            .content()
            .map(str::to_string)
            .ok_or(AgentError::EmptyResponse)
    }
}
