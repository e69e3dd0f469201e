//! Shared configuration for Ward Assist.
//!
//! Settings come from environment variables. `load_env` pulls `.env` and
//! `.env.local` into the process environment first, so secrets can live in
//! either file during development.
//!
//! # Environment Variables
//!
//! - `GROQ_API_KEY`: API key for the text-generation and speech endpoints
//! - `WARD_LLM_BASE_URL`: OpenAI-compatible base URL
//! - `WARD_CHAT_MODEL`, `WARD_TEMPERATURE`, `WARD_MAX_TOKENS`
//! - `WARD_LLM_TIMEOUT_SECS`: per-request deadline for model calls
//! - `WARD_TTS_MODEL`, `WARD_TTS_VOICE`
//! - `SUPABASE_URL`, `SUPABASE_KEY`: remote data store
//! - `WARD_SQL_PROCEDURE`, `WARD_QUERY_TIMEOUT_SECS`
//! - `WARD_MAX_RETRIES`, `WARD_RETRY_DELAY_SECS`
//! - `WARD_HISTORY_WINDOW`: messages of history handed to the agents
//! - `WARD_API_HOST`, `WARD_API_PORT`
//! - `WARD_STATE_DIR`: override the base state directory

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::retry::RetryPolicy;

/// REPL line-history file name inside the state directory.
pub const HISTORY_FILE: &str = "repl_history";

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "WARD_STATE_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".ward-assist";

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TTS_MODEL: &str = "playai-tts";
pub const DEFAULT_TTS_VOICE: &str = "Judy-PlayAI";
pub const DEFAULT_SQL_PROCEDURE: &str = "execute_sql";

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
const DEFAULT_HISTORY_WINDOW: usize = 20;
const DEFAULT_API_HOST: &str = "127.0.0.1";
const DEFAULT_API_PORT: u16 = 8780;

/// Errors raised while reading configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid value for {key}: {value:?}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Raw value found.
        value: String,
    },
}

/// Text-generation and speech endpoint settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub tts_model: String,
    pub tts_voice: String,
}

impl LlmSettings {
    /// The API key, or `ConfigError::Missing` when unset.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::Missing("GROQ_API_KEY"))
    }
}

/// Remote SQL procedure settings.
#[derive(Debug, Clone)]
pub struct QuerySettings {
    pub url: Option<String>,
    pub key: Option<String>,
    pub procedure: String,
    pub timeout: Duration,
}

impl QuerySettings {
    /// Base URL and key, both of which must be present to reach the store.
    pub fn require_credentials(&self) -> Result<(&str, &str), ConfigError> {
        let url = self.url.as_deref().ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let key = self.key.as_deref().ok_or(ConfigError::Missing("SUPABASE_KEY"))?;
        Ok((url, key))
    }
}

/// HTTP API bind settings.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_API_HOST.to_string(),
            port: DEFAULT_API_PORT,
        }
    }
}

/// Complete runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub llm: LlmSettings,
    pub query: QuerySettings,
    pub retry: RetryPolicy,
    pub history_window: usize,
    pub api: ApiSettings,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let text = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let llm = LlmSettings {
            api_key: get("GROQ_API_KEY"),
            base_url: text("WARD_LLM_BASE_URL", DEFAULT_LLM_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            chat_model: text("WARD_CHAT_MODEL", DEFAULT_CHAT_MODEL),
            temperature: parse_or(&get, "WARD_TEMPERATURE", DEFAULT_TEMPERATURE)?.clamp(0.0, 2.0),
            max_tokens: parse_or(&get, "WARD_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            timeout: Duration::from_secs(parse_or(
                &get,
                "WARD_LLM_TIMEOUT_SECS",
                DEFAULT_LLM_TIMEOUT_SECS,
            )?),
            tts_model: text("WARD_TTS_MODEL", DEFAULT_TTS_MODEL),
            tts_voice: text("WARD_TTS_VOICE", DEFAULT_TTS_VOICE),
        };

        let query = QuerySettings {
            url: get("SUPABASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            key: get("SUPABASE_KEY"),
            procedure: text("WARD_SQL_PROCEDURE", DEFAULT_SQL_PROCEDURE),
            timeout: Duration::from_secs(parse_or(
                &get,
                "WARD_QUERY_TIMEOUT_SECS",
                DEFAULT_QUERY_TIMEOUT_SECS,
            )?),
        };

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy::new(
            parse_or(&get, "WARD_MAX_RETRIES", defaults.max_retries)?,
            Duration::from_secs(parse_or(
                &get,
                "WARD_RETRY_DELAY_SECS",
                defaults.delay.as_secs(),
            )?),
        );

        let api = ApiSettings {
            host: text("WARD_API_HOST", DEFAULT_API_HOST),
            port: parse_or(&get, "WARD_API_PORT", DEFAULT_API_PORT)?,
        };

        let settings = Self {
            llm,
            query,
            retry,
            history_window: parse_or(&get, "WARD_HISTORY_WINDOW", DEFAULT_HISTORY_WINDOW)?,
            api,
        };
        debug!(
            chat_model = %settings.llm.chat_model,
            max_retries = settings.retry.max_retries,
            history_window = settings.history_window,
            "Settings loaded"
        );
        Ok(settings)
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

/// Load `.env`, then `.env.local`, then `<state_dir>/.env.local`.
///
/// Variables already present in the environment are never overwritten.
pub fn load_env() {
    let _ = dotenvy::dotenv();
    let _ = dotenvy::from_filename(".env.local");
    let state_env = state_dir().join(".env.local");
    if state_env.exists() {
        let _ = dotenvy::from_path(&state_env);
    }
}

/// Get the Ward Assist state directory.
///
/// 1. `WARD_STATE_DIR` if set
/// 2. `~/.ward-assist` if a home directory is available
/// 3. `.ward-assist` in the current directory
pub fn state_dir() -> PathBuf {
    std::env::var(STATE_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(DEFAULT_STATE_DIR))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
        })
}

/// REPL line-history file.
pub fn history_file() -> PathBuf {
    state_dir().join(HISTORY_FILE)
}
