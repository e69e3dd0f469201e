//! Turn orchestration for Ward Assist.
//!
//! This crate provides the [`Orchestrator`], which runs each user message
//! through the full pipeline and keeps per-session conversation history.
//!
//! # Overview
//!
//! A turn moves through these states:
//!
//! ```text
//! Received -> Interpreted -> Executing(n) -> Executed -> Summarized -> Appended
//!     \__________\_______________________________________________ Failed
//! ```
//!
//! - The interpreter splits the message into sub-questions.
//! - Every generated statement runs concurrently, each with its own retries.
//! - The summarizer composes one answer covering every sub-question in order.
//!
//! # Example
//!
//! ```ignore
//! use ward_orchestrator::Orchestrator;
//!
//! # async fn example() -> ward_orchestrator::Result<()> {
//! let settings = ward_core::Settings::from_env()?;
//! let orchestrator = Orchestrator::from_settings(&settings)?;
//!
//! let session = orchestrator.create_session().await;
//! let answer = orchestrator.handle_turn(&session, "Where is the ventilator?").await?;
//! println!("{}", answer.text);
//! # Ok(())
//! # }
//! ```

mod error;
mod orchestrator;
mod session;

pub use error::{OrchestratorError, Result};
pub use orchestrator::{Orchestrator, TurnState, DEFAULT_HISTORY_WINDOW, GENERIC_FAILURE_MESSAGE};
pub use session::{Session, SessionHandle, SessionId, SessionStore};

// Re-export commonly used types from ward-agent
pub use ward_agent::{Answer, Message, MessageRole};
