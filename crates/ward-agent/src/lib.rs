//! Agents for the Ward Assist query pipeline.
//!
//! Two agents share one LLM client:
//!
//! - [`Interpreter`] (first agent): splits a user message into sub-questions,
//!   classifies each one, and produces SQL, an explanation, both, or a
//!   clarifying question.
//! - [`Summarizer`] (second agent): turns query results and explanations into
//!   a single plain-language answer that never exposes SQL or schema names.
//!
//! The LLM sits behind the [`ChatModel`] trait; [`GroqClient`] talks to an
//! OpenAI-compatible endpoint.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod intent;
pub mod interpreter;
pub mod prompts;
pub mod speech;
pub mod summarizer;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{ChatMessage, ChatModel, CompletionRequest, GroqClient};
pub use config::ModelConfig;
pub use context::{ConversationHistory, Message, MessageRole};
pub use error::{AgentError, Result};
pub use intent::{Intent, Interpretation, SqlRejection, SqlRequest, SubQuestion};
pub use interpreter::Interpreter;
pub use speech::{clean_for_speech, SpeechClient};
pub use summarizer::{Answer, Finding, FindingKind, Summarizer};
