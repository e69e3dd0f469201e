//! Ward Core - shared plumbing for every Ward Assist crate.
//!
//! - **config**: environment-driven settings and state directory paths
//! - **retry**: the fixed-delay retry policy applied to every remote call

pub mod config;
pub mod retry;

pub use config::{
    history_file, load_env, state_dir, ApiSettings, ConfigError, LlmSettings, QuerySettings,
    Settings,
};
pub use retry::{with_retry, with_retry_if, RetryPolicy};
