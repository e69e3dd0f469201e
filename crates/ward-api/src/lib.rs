//! REST API for Ward Assist.
//!
//! This crate exposes the question-answering pipeline over HTTP:
//! - Session management (create, list, history, delete)
//! - Sending a message and receiving the answer
//! - Speech synthesis of answer text
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ward_api::{serve, ApiConfig, AppState};
//! use ward_orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ward_core::Settings::from_env()?;
//!     let orchestrator = Orchestrator::from_settings(&settings)?;
//!     let config = ApiConfig::from_settings(&settings.api);
//!     let state = AppState::new(config.clone(), Arc::new(orchestrator), None);
//!
//!     serve(config, state).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod types;

pub use config::ApiConfig;
pub use error::{ApiError, Result};
pub use router::{create_router, serve};
pub use state::AppState;
