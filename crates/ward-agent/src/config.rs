//! Model configuration for the agents' LLM endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use ward_core::config::{DEFAULT_CHAT_MODEL, DEFAULT_LLM_BASE_URL};
use ward_core::LlmSettings;

/// Model configuration shared by both agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier (e.g., "llama-3.3-70b-versatile").
    pub model: String,

    /// OpenAI-compatible base URL, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum tokens to generate in responses.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for response generation (0.0 to 2.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Deadline for one request, from connect to the last body byte.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

fn default_base_url() -> String {
    DEFAULT_LLM_BASE_URL.to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_CHAT_MODEL.into(),
            base_url: default_base_url(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout: default_timeout(),
        }
    }
}

impl ModelConfig {
    /// Create a new model configuration with the given model ID.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Build from loaded settings.
    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self {
            model: settings.chat_model.clone(),
            base_url: settings.base_url.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: settings.timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature, clamped to the range the API accepts.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Chat completions URL.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_config_default() {
        let config = ModelConfig::default();
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(
            config.completions_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_model_config_builder() {
        let config = ModelConfig::new("test-model")
            .with_base_url("http://localhost:9000/v1/")
            .with_max_tokens(256)
            .with_temperature(5.0)
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.model, "test-model");
        assert_eq!(config.completions_url(), "http://localhost:9000/v1/chat/completions");
        assert_eq!(config.max_tokens, 256);
        assert_eq!(config.temperature, 2.0);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_serialization_defaults() {
        let config: ModelConfig = serde_json::from_str(r#"{"model": "m"}"#).unwrap();
        assert_eq!(config.model, "m");
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.base_url, DEFAULT_LLM_BASE_URL);
    }
}
