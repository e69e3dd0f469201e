//! Text-to-speech for spoken answers.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use tracing::debug;
use ward_core::LlmSettings;

use crate::error::{AgentError, Result};

/// Longest text sent for synthesis.
const MAX_SPEECH_CHARS: usize = 1000;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

static MARKDOWN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_`#>\[\]()~|]+").expect("Invalid markdown regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Make an answer safe to read aloud.
///
/// Drops markdown and anything other than ASCII letters, digits, whitespace
/// and basic punctuation, collapses whitespace, and truncates long text.
pub fn clean_for_speech(text: &str) -> String {
    let stripped = MARKDOWN.replace_all(text, " ");
    let kept: String = stripped
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || ".,!?-'".contains(*c))
        .collect();
    let collapsed = WHITESPACE.replace_all(kept.trim(), " ");

    if collapsed.chars().count() > MAX_SPEECH_CHARS {
        let truncated: String = collapsed.chars().take(MAX_SPEECH_CHARS).collect();
        format!("{}...", truncated.trim_end())
    } else {
        collapsed.into_owned()
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

/// Client for an OpenAI-compatible `/audio/speech` endpoint.
#[derive(Clone)]
pub struct SpeechClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    voice: String,
    timeout: Duration,
}

impl SpeechClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        voice: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            voice: voice.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Deadline for one synthesis request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let api_key = settings.require_api_key()?;
        Ok(Self::new(
            api_key,
            &settings.base_url,
            &settings.tts_model,
            &settings.tts_voice,
        )
        .with_timeout(settings.timeout))
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    /// Synthesize `text` and return WAV audio.
    ///
    /// The text is cleaned first; `voice` overrides the configured voice.
    pub async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Vec<u8>> {
        let input = clean_for_speech(text);
        if input.is_empty() {
            return Err(AgentError::Configuration(
                "Nothing to speak after cleaning text".into(),
            ));
        }

        let body = SpeechRequest {
            model: &self.model,
            voice: voice.unwrap_or(&self.voice),
            input: &input,
            response_format: "wav",
        };
        debug!(voice = body.voice, chars = input.len(), "Synthesizing speech");

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(self.timeout)
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

        let audio = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                AgentError::Timeout(e.to_string())
            } else {
                AgentError::Transport(e.to_string())
            }
        })?;
        if audio.is_empty() {
            return Err(AgentError::EmptyResponse);
        }
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;

    async fn spawn_endpoint(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    #[test]
    fn test_clean_strips_markdown() {
        assert_eq!(
            clean_for_speech("**Urgent:** the ventilator is in `ICU`, Floor 2."),
            "Urgent the ventilator is in ICU , Floor 2."
        );
        assert_eq!(clean_for_speech("Room 5 \u{2013} caf\u{e9}"), "Room 5 caf");
        assert_eq!(clean_for_speech("  \n\t "), "");
    }

    #[test]
    fn test_clean_truncates() {
        let long = "a".repeat(MAX_SPEECH_CHARS + 50);
        let cleaned = clean_for_speech(&long);
        assert_eq!(cleaned.len(), MAX_SPEECH_CHARS + 3);
        assert!(cleaned.ends_with("..."));
    }

    #[tokio::test]
    async fn test_synthesize_posts_cleaned_text() {
        let router = Router::new().route(
            "/v1/audio/speech",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["input"], "The ECG is in Room 4.");
                assert_eq!(body["voice"], "Fritz-PlayAI");
                assert_eq!(body["response_format"], "wav");
                b"RIFF0000WAVE".to_vec()
            }),
        );
        let base = spawn_endpoint(router).await;
        let client = SpeechClient::new("key", base, "playai-tts", "Judy-PlayAI");

        let audio = client
            .synthesize("The **ECG** is in Room 4.", Some("Fritz-PlayAI"))
            .await
            .unwrap();
        assert_eq!(audio, b"RIFF0000WAVE");
    }

    #[tokio::test]
    async fn test_synthesize_api_error() {
        let router = Router::new().route(
            "/v1/audio/speech",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let base = spawn_endpoint(router).await;
        let client = SpeechClient::new("key", base, "playai-tts", "Judy-PlayAI");

        let err = client.synthesize("Hello", None).await.unwrap_err();
        assert!(matches!(err, AgentError::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_synthesize_times_out_on_silent_endpoint() {
        let router = Router::new().route(
            "/v1/audio/speech",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Vec::<u8>::new()
            }),
        );
        let base = spawn_endpoint(router).await;
        let client = SpeechClient::new("key", base, "playai-tts", "Judy-PlayAI")
            .with_timeout(Duration::from_millis(200));

        let err = tokio::time::timeout(Duration::from_secs(10), client.synthesize("Hello", None))
            .await
            .expect("request should hit its own deadline first")
            .unwrap_err();
        assert!(matches!(err, AgentError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_synthesize_rejects_blank_text() {
        let client = SpeechClient::new("key", "http://127.0.0.1:9", "playai-tts", "Judy-PlayAI");
        assert!(client.synthesize("**", None).await.is_err());
    }
}
